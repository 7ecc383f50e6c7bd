//! Road state and per-road operations
//!
//! A road owns its path and an id-keyed arena of the vehicles currently on
//! it. Cross-road concerns (lookahead past intersections, collision
//! grouping) take the intersecting roads as explicit arguments; the world
//! resolves that relation from the intersection index.

use anyhow::{bail, Result};
use log::debug;
use std::collections::{HashMap, HashSet};

use super::path::RoadPath;
use super::types::{Cell, FollowingDistance, RoadId, VehicleId};
use super::vehicle::SimVehicle;

/// Seed data for one road, provided by the caller at construction time
#[derive(Debug, Clone)]
pub struct RoadConfig {
    pub name: String,
    pub cells: Vec<Cell>,
    /// Speed limit, expressed as seconds per cell
    pub move_delay: f32,
    /// How long a vehicle waits at a stop sign
    pub dwell_duration: f32,
    pub stop_signs: Vec<Cell>,
}

impl RoadConfig {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>, move_delay: f32) -> Self {
        Self {
            name: name.into(),
            cells,
            move_delay,
            dwell_duration: super::types::DEFAULT_DWELL_DURATION,
            stop_signs: Vec::new(),
        }
    }

    pub fn with_stop_signs(mut self, stop_signs: Vec<Cell>) -> Self {
        self.stop_signs = stop_signs;
        self
    }

    pub fn with_dwell_duration(mut self, dwell_duration: f32) -> Self {
        self.dwell_duration = dwell_duration;
        self
    }
}

/// A fixed path through the grid plus the vehicles currently traversing it
pub struct SimRoad {
    pub id: RoadId,
    name: String,
    path: RoadPath,
    move_delay: f32,
    dwell_duration: f32,
    stop_signs: HashSet<Cell>,
    vehicles: HashMap<VehicleId, SimVehicle>,
}

impl SimRoad {
    /// Validate a road config and build the road
    ///
    /// Malformed seed data is rejected here, at configuration time; nothing
    /// past construction re-validates the topology.
    pub fn new(id: RoadId, config: RoadConfig) -> Result<Self> {
        if !config.move_delay.is_finite() || config.move_delay < 0.0 {
            bail!(
                "road {:?}: move delay must be a non-negative number, got {}",
                config.name,
                config.move_delay
            );
        }
        if !config.dwell_duration.is_finite() || config.dwell_duration < 0.0 {
            bail!(
                "road {:?}: dwell duration must be a non-negative number, got {}",
                config.name,
                config.dwell_duration
            );
        }

        let path = RoadPath::new(config.cells)?;

        let mut stop_signs = HashSet::new();
        for cell in config.stop_signs {
            if !path.contains(cell) {
                bail!(
                    "road {:?}: stop sign at ({}, {}) is not on the path",
                    config.name,
                    cell.x,
                    cell.y
                );
            }
            stop_signs.insert(cell);
        }

        Ok(Self {
            id,
            name: config.name,
            path,
            move_delay: config.move_delay,
            dwell_duration: config.dwell_duration,
            stop_signs,
            vehicles: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &RoadPath {
        &self.path
    }

    pub fn move_delay(&self) -> f32 {
        self.move_delay
    }

    pub fn dwell_duration(&self) -> f32 {
        self.dwell_duration
    }

    pub fn stop_sign_cells(&self) -> &HashSet<Cell> {
        &self.stop_signs
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &SimVehicle> {
        self.vehicles.values()
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.get(&id)
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Snapshot of vehicle ids in spawn order
    ///
    /// The tick loop iterates this snapshot so removals during the tick
    /// never skip or double-process a vehicle, and ids are sorted so a
    /// seeded run is reproducible.
    pub fn vehicle_ids(&self) -> Vec<VehicleId> {
        let mut ids: Vec<VehicleId> = self.vehicles.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Place a vehicle at the start of the path and add it to the road
    ///
    /// No capacity limit; the spawn policy decides whether the start cell
    /// is free.
    pub fn add_vehicle(&mut self, mut vehicle: SimVehicle, now: f32) -> VehicleId {
        let id = vehicle.id;
        vehicle.place(self.path.start(), now);
        self.vehicles.insert(id, vehicle);
        id
    }

    /// Remove a vehicle by id; absent ids are a no-op
    pub fn remove_vehicle(&mut self, id: VehicleId) -> Option<SimVehicle> {
        self.vehicles.remove(&id)
    }

    /// Offer one vehicle a chance to advance
    ///
    /// Returns false for unknown ids so the tick loop can treat vehicles
    /// removed mid-tick uniformly.
    pub fn advance_vehicle(&mut self, id: VehicleId, now: f32) -> bool {
        let Self {
            path,
            dwell_duration,
            vehicles,
            ..
        } = self;
        match vehicles.get_mut(&id) {
            Some(vehicle) => vehicle.advance(now, path, *dwell_duration),
            None => false,
        }
    }

    /// Whether any vehicle on this road occupies the given cell
    pub fn occupies(&self, cell: Cell) -> bool {
        self.vehicles
            .values()
            .any(|vehicle| vehicle.position() == Some(cell))
    }

    /// Whether the start cell is occupied (the spawn policy's only check)
    pub fn start_occupied(&self) -> bool {
        self.occupies(self.path.start())
    }

    /// Whether any vehicle sits in the lookahead window ahead of `position`
    ///
    /// The window covers path indices `index(position) + 1` through
    /// `index(position) + distance + 1`, clipped to the path bounds, so a
    /// distance of 0 still checks the immediately next cell. Vehicles on
    /// this road and on every intersecting road count; a vehicle parked at
    /// the path end counts until it is removed at the end of the tick.
    /// `FollowingDistance::Disabled` bypasses the check entirely.
    pub fn has_lookahead_occupancy(
        &self,
        position: Cell,
        following_distance: FollowingDistance,
        neighbors: &[&SimRoad],
    ) -> bool {
        let distance = match following_distance {
            FollowingDistance::Cells(distance) => distance,
            FollowingDistance::Disabled => return false,
        };

        let position_index = self.path.index_of(position);
        for offset in 1..=distance + 1 {
            let cell = match self.path.get(position_index + offset) {
                Some(cell) => cell,
                None => break,
            };
            if self.occupies(cell) || neighbors.iter().any(|road| road.occupies(cell)) {
                return true;
            }
        }
        false
    }

    /// Flag every vehicle newly arrived at a stop-sign cell as dwelling
    ///
    /// The dwell clock is the vehicle's arrival time (its last advance), so
    /// no timer is reset here.
    pub fn apply_stop_sign_dwell(&mut self) {
        if self.stop_signs.is_empty() {
            return;
        }
        for vehicle in self.vehicles.values_mut() {
            if let Some(position) = vehicle.position() {
                if self.stop_signs.contains(&position) && !vehicle.dwelling {
                    debug!(
                        "vehicle {:?} dwelling at stop sign ({}, {}) on {}",
                        vehicle.id, position.x, position.y, self.name
                    );
                    vehicle.dwelling = true;
                }
            }
        }
    }

    /// Remove every vehicle that has reached the path end; returns how many
    pub fn remove_vehicles_at_end(&mut self) -> usize {
        let end = self.path.end();
        let before = self.vehicles.len();
        self.vehicles
            .retain(|_, vehicle| vehicle.position() != Some(end));
        before - self.vehicles.len()
    }

    /// Group every vehicle on this road and its intersecting roads by cell
    ///
    /// Returns all groups, singletons included; groups of two or more are
    /// collisions for the caller to resolve.
    pub fn detect_collisions(
        &self,
        neighbors: &[&SimRoad],
    ) -> HashMap<Cell, Vec<(VehicleId, RoadId)>> {
        let mut groups: HashMap<Cell, Vec<(VehicleId, RoadId)>> = HashMap::new();
        for road in std::iter::once(self).chain(neighbors.iter().copied()) {
            for vehicle in road.vehicles.values() {
                if let Some(position) = vehicle.position() {
                    groups
                        .entry(position)
                        .or_default()
                        .push((vehicle.id, road.id));
                }
            }
        }
        groups
    }
}
