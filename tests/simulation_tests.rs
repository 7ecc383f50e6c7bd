//! Advancement, timing, and configuration behavior
//!
//! Exercises the library through its public API with explicit tick deltas,
//! so nothing here depends on the wall clock.

use traffic_flow_sim::simulation::{
    Cell, FollowingDistance, RoadConfig, RoadId, RoadPath, SimId, SimRoad, SimVehicle, SimWorld,
    VehicleId,
};

fn cells(points: &[(i32, i32)]) -> Vec<Cell> {
    points.iter().map(|&point| Cell::from(point)).collect()
}

fn straight_road(points: &[(i32, i32)], move_delay: f32) -> SimRoad {
    SimRoad::new(
        RoadId(SimId(0)),
        RoadConfig::new("test road", cells(points), move_delay),
    )
    .expect("valid road config")
}

#[test]
fn unplaced_vehicle_never_advances() {
    let path = RoadPath::new(cells(&[(0, 0), (1, 0), (2, 0)])).unwrap();
    let mut vehicle = SimVehicle::new(VehicleId(SimId(0)), 0.0, FollowingDistance::default());

    assert!(!vehicle.can_advance(10.0, &path));
    assert!(!vehicle.advance(10.0, &path, 0.0));
    assert_eq!(vehicle.position(), None);
}

#[test]
fn advance_moves_exactly_one_cell_and_index_is_monotonic() {
    let path = RoadPath::new(cells(&[(0, 0), (1, 0), (2, 0), (3, 0)])).unwrap();
    let mut vehicle = SimVehicle::new(VehicleId(SimId(0)), 0.0, FollowingDistance::default());
    vehicle.place(path.start(), 0.0);

    let mut last_index = 0;
    for tick in 1..10 {
        let index_before = path.index_of(vehicle.position().unwrap());
        let moved = vehicle.advance(tick as f32, &path, 0.0);
        let index_after = path.index_of(vehicle.position().unwrap());

        assert!(index_after >= last_index, "index must never decrease");
        if moved {
            assert_eq!(index_after, index_before + 1, "no silent teleport");
        } else {
            assert_eq!(index_after, index_before);
        }
        last_index = index_after;
    }

    // Parked at the end; no further advances
    assert_eq!(vehicle.position(), Some(Cell::new(3, 0)));
}

#[test]
fn move_delay_gates_advancement() {
    let path = RoadPath::new(cells(&[(0, 0), (1, 0), (2, 0)])).unwrap();
    let mut vehicle = SimVehicle::new(VehicleId(SimId(0)), 2.0, FollowingDistance::default());
    vehicle.place(path.start(), 0.0);

    assert!(!vehicle.advance(1.0, &path, 0.0));
    assert!(!vehicle.advance(1.9, &path, 0.0));
    assert!(vehicle.advance(2.0, &path, 0.0));
    assert_eq!(vehicle.position(), Some(Cell::new(1, 0)));

    // The clock restarts from the advance time
    assert!(!vehicle.advance(3.5, &path, 0.0));
    assert!(vehicle.advance(4.0, &path, 0.0));
}

#[test]
#[should_panic(expected = "not a member")]
fn off_path_position_is_a_contract_violation() {
    let path = RoadPath::new(cells(&[(0, 0), (1, 0), (2, 0)])).unwrap();
    path.index_of(Cell::new(9, 9));
}

#[test]
fn malformed_road_configs_are_rejected() {
    let empty = SimRoad::new(
        RoadId(SimId(0)),
        RoadConfig::new("empty", Vec::new(), 0.1),
    );
    assert!(empty.is_err());

    let duplicate = SimRoad::new(
        RoadId(SimId(0)),
        RoadConfig::new("loop", cells(&[(0, 0), (1, 0), (0, 0)]), 0.1),
    );
    assert!(duplicate.is_err());

    let stop_sign_off_path = SimRoad::new(
        RoadId(SimId(0)),
        RoadConfig::new("stray sign", cells(&[(0, 0), (1, 0)]), 0.1)
            .with_stop_signs(vec![Cell::new(5, 5)]),
    );
    assert!(stop_sign_off_path.is_err());

    let negative_delay = SimRoad::new(
        RoadId(SimId(0)),
        RoadConfig::new("backwards", cells(&[(0, 0), (1, 0)]), -1.0),
    );
    assert!(negative_delay.is_err());
}

#[test]
fn lookahead_window_is_distance_plus_one_cells() {
    let mut road = straight_road(&[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 0)], 0.0);

    // Walk a blocker out to index 2
    let blocker = SimVehicle::new(VehicleId(SimId(1)), 0.0, FollowingDistance::Cells(0));
    let blocker_id = road.add_vehicle(blocker, 0.0);
    assert!(road.advance_vehicle(blocker_id, 1.0));
    assert!(road.advance_vehicle(blocker_id, 2.0));

    let start = road.path().start();
    // Distance 0 checks only the immediately next cell (index 1)
    assert!(!road.has_lookahead_occupancy(start, FollowingDistance::Cells(0), &[]));
    // Distance 1 checks indices 1 and 2, finding the blocker
    assert!(road.has_lookahead_occupancy(start, FollowingDistance::Cells(1), &[]));
    // Oversized windows clip to the path bounds without panicking
    assert!(road.has_lookahead_occupancy(start, FollowingDistance::Cells(50), &[]));
    // The sentinel bypasses the check entirely
    assert!(!road.has_lookahead_occupancy(start, FollowingDistance::Disabled, &[]));
}

#[test]
fn vehicle_at_path_end_still_counts_as_occupancy() {
    let mut road = straight_road(&[(0, 0), (1, 0), (2, 0)], 0.0);

    let parked = SimVehicle::new(VehicleId(SimId(1)), 0.0, FollowingDistance::Cells(0));
    let parked_id = road.add_vehicle(parked, 0.0);
    assert!(road.advance_vehicle(parked_id, 1.0));
    assert!(road.advance_vehicle(parked_id, 2.0));
    assert_eq!(
        road.vehicle(parked_id).unwrap().position(),
        Some(Cell::new(2, 0))
    );

    // A follower at index 1 sees the parked vehicle at the end
    let probe = Cell::new(1, 0);
    assert!(road.has_lookahead_occupancy(probe, FollowingDistance::Cells(0), &[]));

    assert_eq!(road.remove_vehicles_at_end(), 1);
    assert!(!road.has_lookahead_occupancy(probe, FollowingDistance::Cells(0), &[]));
}

#[test]
fn removing_an_absent_vehicle_is_a_no_op() {
    let mut road = straight_road(&[(0, 0), (1, 0)], 0.1);
    assert!(road.remove_vehicle(VehicleId(SimId(99))).is_none());
    assert_eq!(road.vehicle_count(), 0);
}

#[test]
fn three_cell_scenario_runs_to_completion() {
    let mut world = SimWorld::new();
    let road_id = world
        .add_road(RoadConfig::new(
            "straight",
            cells(&[(0, 0), (1, 0), (2, 0)]),
            0.0,
        ))
        .unwrap();
    let vehicle_id = world
        .spawn_vehicle(road_id, FollowingDistance::Cells(0))
        .unwrap();

    let first = world.tick(1.0);
    assert_eq!(first.advanced, 1);
    assert_eq!(
        world.road(road_id).unwrap().vehicle(vehicle_id).unwrap().position(),
        Some(Cell::new(1, 0))
    );

    // Second tick reaches (2, 0), the path end; the end-of-tick pass
    // removes the vehicle
    let second = world.tick(1.0);
    assert_eq!(second.advanced, 1);
    assert_eq!(second.arrivals, 1);
    assert!(world.road(road_id).unwrap().vehicle(vehicle_id).is_none());

    // A further tick is a no-op
    let third = world.tick(1.0);
    assert_eq!(third.advanced, 0);
    assert_eq!(third.arrivals, 0);
    assert_eq!(world.vehicle_count(), 0);
    assert_eq!(world.stats().vehicles_arrived, 1);
}

#[test]
fn dwell_gates_advancement_until_duration_elapses() {
    let mut world = SimWorld::new();
    let road_id = world
        .add_road(
            RoadConfig::new("stop road", cells(&[(0, 0), (1, 0), (2, 0), (3, 0)]), 0.0)
                .with_stop_signs(vec![Cell::new(2, 0)])
                .with_dwell_duration(3.0),
        )
        .unwrap();
    let vehicle_id = world
        .spawn_vehicle(road_id, FollowingDistance::Cells(0))
        .unwrap();

    world.tick(1.0); // to (1, 0)
    world.tick(1.0); // to (2, 0), arriving at the stop sign at t=2

    let vehicle = world.road(road_id).unwrap().vehicle(vehicle_id).unwrap();
    assert_eq!(vehicle.position(), Some(Cell::new(2, 0)));
    assert!(vehicle.dwelling);

    // Offered ticks before the dwell duration elapses do nothing
    world.tick(1.0); // t=3, 1s since arrival
    world.tick(1.0); // t=4, 2s since arrival
    let vehicle = world.road(road_id).unwrap().vehicle(vehicle_id).unwrap();
    assert_eq!(vehicle.position(), Some(Cell::new(2, 0)));
    assert!(vehicle.dwelling);

    // 3s since arrival: the vehicle proceeds to (3, 0), the path end,
    // and is removed the same tick
    let summary = world.tick(1.0);
    assert_eq!(summary.advanced, 1);
    assert_eq!(summary.arrivals, 1);
    assert!(world.road(road_id).unwrap().vehicle(vehicle_id).is_none());
}

#[test]
fn following_distance_holds_vehicles_apart() {
    let mut world = SimWorld::new();
    let road_id = world
        .add_road(
            RoadConfig::new(
                "queue road",
                cells(&[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]),
                0.0,
            )
            .with_stop_signs(vec![Cell::new(3, 0)])
            .with_dwell_duration(100.0),
        )
        .unwrap();

    // The leader parks at the stop sign; the follower queues behind it
    let leader = world
        .spawn_vehicle(road_id, FollowingDistance::Cells(0))
        .unwrap();
    world.tick(1.0);
    world.tick(1.0);
    world.tick(1.0); // leader at (3, 0), dwelling
    let follower = world
        .spawn_vehicle(road_id, FollowingDistance::Cells(1))
        .unwrap();
    world.tick(1.0); // follower to (1, 0); window {(2,0),(3,0)} hits the leader
    world.tick(1.0); // follower blocked

    let road = world.road(road_id).unwrap();
    assert_eq!(road.vehicle(leader).unwrap().position(), Some(Cell::new(3, 0)));
    assert_eq!(
        road.vehicle(follower).unwrap().position(),
        Some(Cell::new(1, 0))
    );
}
