//! Vehicle movement logic for the grid traffic simulation

use log::trace;

use super::path::RoadPath;
use super::types::{Cell, FollowingDistance, VehicleId};

/// A single mobile entity on a road
///
/// Timing is driven entirely by the simulation clock passed into
/// [`can_advance`](Self::can_advance) and [`advance`](Self::advance); the
/// wall clock is never read.
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    /// Current grid cell, or `None` before placement on a road.
    /// Once placed, always a member of the owning road's path.
    pub position: Option<Cell>,
    /// Seconds required between successive advances (the road's speed limit)
    pub move_delay: f32,
    pub following_distance: FollowingDistance,
    /// True only while parked at a stop-sign cell awaiting the dwell timer
    pub dwelling: bool,
    /// Simulation time of the last successful advance or placement
    pub last_advance_time: f32,
}

impl SimVehicle {
    pub fn new(id: VehicleId, move_delay: f32, following_distance: FollowingDistance) -> Self {
        Self {
            id,
            position: None,
            move_delay,
            following_distance,
            dwelling: false,
            last_advance_time: 0.0,
        }
    }

    /// Place the vehicle on a cell and start its advance clock
    pub fn place(&mut self, cell: Cell, now: f32) {
        self.position = Some(cell);
        self.last_advance_time = now;
    }

    pub fn position(&self) -> Option<Cell> {
        self.position
    }

    /// Whether the vehicle is eligible to advance: placed, not at the last
    /// path index, and its move delay has elapsed
    pub fn can_advance(&self, now: f32, path: &RoadPath) -> bool {
        let position = match self.position {
            Some(position) => position,
            None => return false,
        };

        path.index_of(position) < path.last_index()
            && now - self.last_advance_time >= self.move_delay
    }

    /// Attempt to advance one cell along the path
    ///
    /// Returns false without side effects when the vehicle is ineligible,
    /// or when it is dwelling at a stop sign and the dwell duration has not
    /// elapsed since arrival. The dwell clock is the arrival time; setting
    /// the dwell flag never resets it.
    pub fn advance(&mut self, now: f32, path: &RoadPath, dwell_duration: f32) -> bool {
        if !self.can_advance(now, path) {
            return false;
        }

        let position = match self.position {
            Some(position) => position,
            None => return false,
        };

        if self.dwelling {
            if now - self.last_advance_time < dwell_duration {
                return false;
            }
            self.dwelling = false;
        }

        let next = match path.get(path.index_of(position) + 1) {
            Some(next) => next,
            None => return false,
        };

        self.position = Some(next);
        self.last_advance_time = now;
        trace!(
            "vehicle {:?} advanced to ({}, {}) at t={:.2}",
            self.id,
            next.x,
            next.y,
            now
        );
        true
    }
}
