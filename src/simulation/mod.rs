//! Grid traffic flow simulation core
//!
//! This module contains all the simulation logic and runs without any
//! rendering or audio dependencies; it can be driven and inspected from a
//! console loop or a test.

mod intersections;
mod path;
mod road;
mod types;
mod vehicle;
mod world;

pub use intersections::IntersectionIndex;
pub use path::RoadPath;
pub use road::{RoadConfig, SimRoad};
pub use types::{
    Cell, FollowingDistance, RoadId, SimId, VehicleId, DEFAULT_DWELL_DURATION,
    DEFAULT_FOLLOWING_DISTANCE, DEFAULT_SLOW_FRACTION, DEFAULT_SPAWN_INTERVAL,
};
pub use vehicle::SimVehicle;
pub use world::{SimStats, SimWorld, TickSummary};
