use clap::Parser;
use log::info;

use traffic_flow_sim::simulation::SimWorld;

#[derive(Parser)]
#[command(name = "traffic_flow_sim")]
#[command(about = "Grid traffic flow simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "600")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of spawned vehicles with no following distance
    #[arg(long, default_value = "0.3")]
    slow_fraction: f32,

    /// Draw the grid map after each simulated second
    #[arg(long)]
    map: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    println!("Running grid traffic flow simulation...");
    println!("Ticks: {}, Delta: {}s", cli.ticks, cli.delta);

    let mut world = match cli.seed {
        Some(seed) => SimWorld::create_demo_world_with_seed(seed),
        None => SimWorld::create_demo_world(),
    };
    world.set_slow_fraction(cli.slow_fraction);

    let ticks_per_second = (1.0 / cli.delta).ceil().max(1.0) as u32;

    println!("Initial state:");
    world.print_summary();
    if cli.map {
        world.draw_map();
    }
    println!();

    let mut tick = 0;
    while tick < cli.ticks {
        let ticks_to_run = ticks_per_second.min(cli.ticks - tick);

        for _ in 0..ticks_to_run {
            tick += 1;
            world.spawn();
            let summary = world.tick(cli.delta);

            // This is where the original hooked its crash sound effect
            for cell in &summary.crash_cells {
                info!("crash at ({}, {}) on tick {}", cell.x, cell.y, tick);
            }
        }

        println!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            world.time()
        );
        world.print_summary();
        if cli.map {
            world.draw_map();
        }
        println!();
    }

    println!("=== Final State ===");
    world.print_summary();
    if cli.map {
        world.draw_map();
    }
}
