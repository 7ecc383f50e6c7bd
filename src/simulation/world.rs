//! Main simulation world that ties everything together
//!
//! The world owns the roads, the derived intersection index, the simulation
//! clock, and the spawn policy. One tick at a time; the outer loop paces
//! ticks and calls `spawn` and `tick` only at tick boundaries.

use anyhow::{Context, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use super::intersections::IntersectionIndex;
use super::road::{RoadConfig, SimRoad};
use super::types::{
    Cell, FollowingDistance, RoadId, SimId, VehicleId, DEFAULT_SLOW_FRACTION,
    DEFAULT_SPAWN_INTERVAL,
};
use super::vehicle::SimVehicle;

/// Running totals for a simulation
#[derive(Debug, Clone, Copy, Default)]
pub struct SimStats {
    pub vehicles_spawned: usize,
    /// Vehicles that reached the end of their path
    pub vehicles_arrived: usize,
    /// Vehicles removed by collision resolution
    pub vehicles_crashed: usize,
    /// Collision events (one per crash cell)
    pub collisions: usize,
}

/// What happened during one tick
///
/// `crash_cells` is the event surface external collaborators consume: the
/// original implementation played a crash sound and recolored these cells.
/// Each cell appears at most once per tick.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    pub crash_cells: Vec<Cell>,
    /// Vehicles removed at their path end this tick
    pub arrivals: usize,
    /// Successful advances this tick
    pub advanced: usize,
}

/// The main simulation world
pub struct SimWorld {
    roads: HashMap<RoadId, SimRoad>,

    /// Which roads share at least one cell; rebuilt when a road is added,
    /// read-only during ticks
    intersections: IntersectionIndex,

    /// Next ID to assign
    next_id: usize,

    /// Simulation clock; the core never reads the wall clock
    time: f32,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,

    spawn_interval: f32,
    last_spawn_time: f32,
    slow_fraction: f32,

    stats: SimStats,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    fn new_internal(rng: Option<StdRng>) -> Self {
        Self {
            roads: HashMap::new(),
            intersections: IntersectionIndex::new(),
            next_id: 0,
            time: 0.0,
            rng,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            last_spawn_time: 0.0,
            slow_fraction: DEFAULT_SLOW_FRACTION,
            stats: SimStats::default(),
        }
    }

    pub fn new() -> Self {
        Self::new_internal(None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(seed: u64) -> Self {
        Self::new_internal(Some(StdRng::seed_from_u64(seed)))
    }

    /// Get a random boolean with the given probability, using seeded RNG if available
    fn random_bool(&mut self, probability: f64) -> bool {
        match &mut self.rng {
            Some(rng) => rng.random_bool(probability),
            None => rand::rng().random_bool(probability),
        }
    }

    /// Choose a random element from a slice, using seeded RNG if available
    fn choose_random<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            return None;
        }
        match &mut self.rng {
            Some(rng) => slice.choose(rng),
            None => slice.choose(&mut rand::rng()),
        }
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a road to the world and rebuild the intersection index
    ///
    /// Topology is static: roads are added during setup, never mid-run, so
    /// the index is never rebuilt during a tick.
    pub fn add_road(&mut self, config: RoadConfig) -> Result<RoadId> {
        let id = RoadId(self.next_sim_id());
        let road = SimRoad::new(id, config)?;
        debug!("added road {:?} ({})", id, road.name());
        self.roads.insert(id, road);
        self.intersections = IntersectionIndex::build(self.roads.values());
        Ok(id)
    }

    pub fn road(&self, id: RoadId) -> Option<&SimRoad> {
        self.roads.get(&id)
    }

    pub fn roads(&self) -> impl Iterator<Item = &SimRoad> {
        self.roads.values()
    }

    /// Road ids in creation order
    pub fn road_ids(&self) -> Vec<RoadId> {
        let mut ids: Vec<RoadId> = self.roads.keys().copied().collect();
        ids.sort();
        ids
    }

    /// All roads intersecting the given road
    pub fn intersecting(&self, road: RoadId) -> Vec<RoadId> {
        self.intersections.intersecting(road)
    }

    pub fn intersection_index(&self) -> &IntersectionIndex {
        &self.intersections
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    /// Total vehicles currently on all roads
    pub fn vehicle_count(&self) -> usize {
        self.roads.values().map(|road| road.vehicle_count()).sum()
    }

    /// Seconds between spawn attempts
    pub fn set_spawn_interval(&mut self, interval: f32) {
        self.spawn_interval = interval.max(0.0);
    }

    /// Fraction of spawned vehicles given the `Disabled` following distance
    pub fn set_slow_fraction(&mut self, fraction: f32) {
        self.slow_fraction = fraction.clamp(0.0, 1.0);
    }

    fn neighbor_roads(&self, road_id: RoadId) -> Vec<&SimRoad> {
        self.intersections
            .intersecting(road_id)
            .into_iter()
            .filter_map(|id| self.roads.get(&id))
            .collect()
    }

    /// Place a new vehicle at the start of a road, bypassing the spawn policy
    ///
    /// The vehicle takes the road's speed limit as its move delay.
    pub fn spawn_vehicle(
        &mut self,
        road_id: RoadId,
        following_distance: FollowingDistance,
    ) -> Result<VehicleId> {
        let id = VehicleId(self.next_sim_id());
        let now = self.time;
        let road = self
            .roads
            .get_mut(&road_id)
            .with_context(|| format!("road {:?} not found", road_id))?;
        let vehicle = SimVehicle::new(id, road.move_delay(), following_distance);
        road.add_vehicle(vehicle, now);
        self.stats.vehicles_spawned += 1;
        debug!(
            "spawned vehicle {:?} on {} at t={:.2}",
            id,
            road.name(),
            now
        );
        Ok(id)
    }

    /// Timed random spawn
    ///
    /// On a fixed interval against the simulation clock, picks one road at
    /// random and places a vehicle at its start unless the start cell is
    /// occupied. Only the start cell is checked; a vehicle one cell beyond
    /// start does not block spawning. With probability `slow_fraction` the
    /// vehicle gets the `Disabled` following distance.
    pub fn spawn(&mut self) -> Option<VehicleId> {
        if self.time - self.last_spawn_time < self.spawn_interval {
            return None;
        }
        self.last_spawn_time = self.time;

        let road_ids = self.road_ids();
        let road_id = *self.choose_random(&road_ids)?;

        let road = self.roads.get(&road_id)?;
        if road.start_occupied() {
            debug!("spawn skipped: start of {} is occupied", road.name());
            return None;
        }

        let following_distance = if self.random_bool(self.slow_fraction as f64) {
            FollowingDistance::Disabled
        } else {
            FollowingDistance::default()
        };

        self.spawn_vehicle(road_id, following_distance).ok()
    }

    /// Main simulation tick
    ///
    /// Advances the clock, offers every vehicle on every road one advance
    /// (gated by the lookahead check across its road and intersecting
    /// roads), then per road resolves collisions, removes vehicles at the
    /// path end, and flags vehicles newly arrived at stop signs. Vehicles
    /// are iterated over a snapshot, so removals mid-tick never skip or
    /// double-process anyone.
    pub fn tick(&mut self, delta_secs: f32) -> TickSummary {
        self.time += delta_secs;
        let now = self.time;

        let mut summary = TickSummary::default();
        let road_ids = self.road_ids();

        for &road_id in &road_ids {
            let vehicle_ids = match self.roads.get(&road_id) {
                Some(road) => road.vehicle_ids(),
                None => continue,
            };

            for vehicle_id in vehicle_ids {
                let blocked = {
                    let road = match self.roads.get(&road_id) {
                        Some(road) => road,
                        None => continue,
                    };
                    let vehicle = match road.vehicle(vehicle_id) {
                        Some(vehicle) => vehicle,
                        None => continue,
                    };
                    let position = match vehicle.position() {
                        Some(position) => position,
                        None => continue,
                    };
                    let neighbors = self.neighbor_roads(road_id);
                    road.has_lookahead_occupancy(position, vehicle.following_distance, &neighbors)
                };

                if blocked {
                    continue;
                }

                if let Some(road) = self.roads.get_mut(&road_id) {
                    if road.advance_vehicle(vehicle_id, now) {
                        summary.advanced += 1;
                    }
                }
            }
        }

        for &road_id in &road_ids {
            let crash_cells = self.resolve_collisions(road_id);
            summary.crash_cells.extend(crash_cells);

            if let Some(road) = self.roads.get_mut(&road_id) {
                summary.arrivals += road.remove_vehicles_at_end();
                road.apply_stop_sign_dwell();
            }
        }

        self.stats.vehicles_arrived += summary.arrivals;
        summary
    }

    /// Detect and resolve collisions on one road and its intersecting roads
    ///
    /// Every vehicle in a group of two or more sharing a cell is removed
    /// from its owning road; groups of three or more are removed whole. The
    /// returned crash cells are sorted and each appears at most once per
    /// tick: whichever road's resolution runs first clears the cell, so
    /// later roads find no group there.
    pub fn resolve_collisions(&mut self, road_id: RoadId) -> Vec<Cell> {
        let groups = {
            let road = match self.roads.get(&road_id) {
                Some(road) => road,
                None => return Vec::new(),
            };
            let neighbors = self.neighbor_roads(road_id);
            road.detect_collisions(&neighbors)
        };

        let mut crash_cells = Vec::new();
        for (cell, group) in groups {
            if group.len() < 2 {
                continue;
            }
            info!(
                "collision at ({}, {}): removing {} vehicles",
                cell.x,
                cell.y,
                group.len()
            );
            for (vehicle_id, owner_id) in group {
                if let Some(owner) = self.roads.get_mut(&owner_id) {
                    if owner.remove_vehicle(vehicle_id).is_some() {
                        self.stats.vehicles_crashed += 1;
                        debug!("removed vehicle {:?} from {}", vehicle_id, owner.name());
                    }
                }
            }
            self.stats.collisions += 1;
            crash_cells.push(cell);
        }

        crash_cells.sort();
        crash_cells
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Traffic Flow Summary ===");
        println!("Time: {:.2}s", self.time);
        println!(
            "Roads: {}, intersecting pairs: {}",
            self.roads.len(),
            self.intersections.pair_count()
        );
        println!(
            "Vehicles: {} active, {} spawned, {} arrived, {} crashed",
            self.vehicle_count(),
            self.stats.vehicles_spawned,
            self.stats.vehicles_arrived,
            self.stats.vehicles_crashed
        );
        println!("Collisions: {}", self.stats.collisions);

        for id in self.road_ids() {
            if let Some(road) = self.roads.get(&id) {
                println!(
                    "  {}: {} cells, {} vehicles, {} stop signs",
                    road.name(),
                    road.path().len(),
                    road.vehicle_count(),
                    road.stop_sign_cells().len()
                );
            }
        }
    }

    /// Draw a visual map of the grid in the terminal
    pub fn draw_map(&self) {
        let cells: Vec<Cell> = self
            .roads
            .values()
            .flat_map(|road| road.path().cells().iter().copied())
            .collect();
        if cells.is_empty() {
            return;
        }

        let min_x = cells.iter().map(|c| c.x).min().unwrap_or(0);
        let max_x = cells.iter().map(|c| c.x).max().unwrap_or(0);
        let min_y = cells.iter().map(|c| c.y).min().unwrap_or(0);
        let max_y = cells.iter().map(|c| c.y).max().unwrap_or(0);

        let width = (max_x - min_x + 1) as usize;
        let height = (max_y - min_y + 1) as usize;
        let mut grid = vec![vec![' '; width]; height];

        let to_grid =
            |cell: Cell| -> (usize, usize) { ((cell.y - min_y) as usize, (cell.x - min_x) as usize) };

        for road in self.roads.values() {
            for &cell in road.path().cells() {
                let (row, col) = to_grid(cell);
                grid[row][col] = '.';
            }
        }

        for road in self.roads.values() {
            for &cell in road.stop_sign_cells() {
                let (row, col) = to_grid(cell);
                grid[row][col] = 'S';
            }
        }

        for road in self.roads.values() {
            for vehicle in road.vehicles() {
                if let Some(position) = vehicle.position() {
                    let (row, col) = to_grid(position);
                    grid[row][col] = 'V';
                }
            }
        }

        println!("\n=== Grid Map ===");
        println!("Legend: V=Vehicle, S=Stop sign, .=Road");
        println!();
        for row in &grid {
            let line: String = row.iter().collect();
            println!("{}", line);
        }
        println!();
    }

    /// Create the demo world: four highways, two stop-signed yielding roads,
    /// and two exit routes on a 40x40 grid
    pub fn create_demo_world() -> Self {
        Self::build_demo_world(SimWorld::new())
    }

    /// Create the demo world with a seeded RNG for reproducible simulations
    pub fn create_demo_world_with_seed(seed: u64) -> Self {
        Self::build_demo_world(SimWorld::new_with_seed(seed))
    }

    /// Internal helper to build the demo topology
    fn build_demo_world(mut world: SimWorld) -> Self {
        fn row(y: i32, xs: impl Iterator<Item = i32>) -> Vec<Cell> {
            xs.map(|x| Cell::new(x, y)).collect()
        }

        let _ = world.add_road(RoadConfig::new("Highway 1", row(21, (0..40).rev()), 0.1));
        let _ = world.add_road(RoadConfig::new("Highway 2", row(22, (0..40).rev()), 0.1));
        let _ = world.add_road(RoadConfig::new("Highway 3", row(23, 0..40), 0.1));
        let _ = world.add_road(RoadConfig::new("Highway 4", row(24, 0..40), 0.1));

        // Comes down from the top, bends left onto Highway 1, yielding at
        // (8, 20) just before the merge
        let mut yielding_1: Vec<Cell> = (0..12).map(|y| Cell::new(17, y)).collect();
        yielding_1.extend((0..9).map(|i| Cell::new(16 - i, 12 + i)));
        yielding_1.extend((0..8).rev().map(|x| Cell::new(x, 21)));
        let _ = world.add_road(
            RoadConfig::new("Yielding road 1", yielding_1, 0.3)
                .with_stop_signs(vec![Cell::new(8, 20)]),
        );

        // Shares the vertical stretch with Yielding road 1, bends right and
        // crosses all four highways, yielding at (24, 20)
        let mut yielding_2: Vec<Cell> = (0..12).map(|y| Cell::new(17, y)).collect();
        yielding_2.extend((0..7).map(|i| Cell::new(18 + i, 12 + i)));
        yielding_2.extend((19..40).map(|y| Cell::new(24, y)));
        let _ = world.add_road(
            RoadConfig::new("Yielding road 2", yielding_2, 0.3)
                .with_stop_signs(vec![Cell::new(24, 20)]),
        );

        // Follows Highway 4 east, then climbs off the grid to the right edge
        let mut exit_1: Vec<Cell> = (0..32).map(|x| Cell::new(x, 24)).collect();
        exit_1.extend([Cell::new(32, 25), Cell::new(33, 26)]);
        exit_1.extend((27..32).map(|y| Cell::new(34, y)));
        exit_1.extend((35..40).map(|x| Cell::new(x, 32)));
        let _ = world.add_road(RoadConfig::new("Exit route 1", exit_1, 0.1));

        // Follows Highway 1 west, then climbs off the grid to the left edge
        let mut exit_2: Vec<Cell> = (4..40).rev().map(|x| Cell::new(x, 21)).collect();
        exit_2.extend([Cell::new(3, 20), Cell::new(2, 19)]);
        exit_2.extend((14..19).rev().map(|y| Cell::new(2, y)));
        exit_2.extend([Cell::new(1, 13), Cell::new(0, 12)]);
        let _ = world.add_road(RoadConfig::new("Exit route 2", exit_2, 0.1));

        world
    }
}
