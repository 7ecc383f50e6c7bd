//! Core types for the grid traffic simulation
//!
//! These are standalone types with no dependency on the driver or renderer.

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimId(pub usize);

/// A wrapper type for road IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoadId(pub SimId);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleId(pub SimId);

/// A single cell of the shared 2D grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// How many cells ahead a vehicle checks for occupancy before advancing
///
/// `Disabled` bypasses the lookahead gate entirely, letting the vehicle
/// drive onto occupied cells. Collisions produced this way are detected
/// and resolved on the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowingDistance {
    /// Check this many cells ahead (plus one; distance 0 still checks the
    /// immediately next cell)
    Cells(usize),
    /// No following distance enforced; deliberately collision-prone
    Disabled,
}

impl Default for FollowingDistance {
    fn default() -> Self {
        Self::Cells(DEFAULT_FOLLOWING_DISTANCE)
    }
}

/// Following distance assigned to normally-behaved spawned vehicles
pub const DEFAULT_FOLLOWING_DISTANCE: usize = 2;

/// Seconds between spawn attempts on the simulation clock
pub const DEFAULT_SPAWN_INTERVAL: f32 = 1.0;

/// Seconds a vehicle waits at a stop sign before it may proceed
pub const DEFAULT_DWELL_DURATION: f32 = 3.0;

/// Fraction of spawned vehicles given the `Disabled` following distance
pub const DEFAULT_SLOW_FRACTION: f32 = 0.3;
