use crate::agents::{VehicleID, VehicleRef};
use crate::road::lane::{Lane, LaneError};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

/// Custom error types for `Road`.
///
/// Lane-change violations indicate a programming error in a behaviour model
/// and are fatal for the caller; the road never silently retries.
#[derive(Debug, Clone)]
pub enum RoadError {
    /// A lane with this index already exists.
    LaneAlreadyExists(usize),
    /// No lane with this index exists.
    UnknownLane(usize),
    /// The vehicle is already present on the road.
    VehicleAlreadyOnRoad(VehicleID),
    /// The vehicle is not present on the road.
    VehicleNotFound(VehicleID),
    /// A lane change may only target an adjacent lane.
    NonAdjacentLaneChange { from: usize, to: usize },
    /// The caller named a current lane that disagrees with the reverse index.
    LaneMismatch {
        vehicle_id: VehicleID,
        stated: usize,
        actual: usize,
    },
}

impl fmt::Display for RoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoadError::LaneAlreadyExists(index) => {
                write!(f, "Lane {} already exists", index)
            }
            RoadError::UnknownLane(index) => {
                write!(f, "Lane {} does not exist", index)
            }
            RoadError::VehicleAlreadyOnRoad(vehicle_id) => {
                write!(f, "Vehicle with ID '{}' is already on the road", vehicle_id)
            }
            RoadError::VehicleNotFound(vehicle_id) => {
                write!(f, "Vehicle with ID '{}' is not on the road", vehicle_id)
            }
            RoadError::NonAdjacentLaneChange { from, to } => {
                write!(f, "Cannot change lane from {} to {}", from, to)
            }
            RoadError::LaneMismatch {
                vehicle_id,
                stated,
                actual,
            } => {
                write!(
                    f,
                    "Vehicle with ID '{}' is in lane {} but the caller stated lane {}",
                    vehicle_id, actual, stated
                )
            }
        }
    }
}

impl std::error::Error for RoadError {}

impl From<LaneError> for RoadError {
    fn from(err: LaneError) -> Self {
        match err {
            LaneError::VehicleNotFound(id) => RoadError::VehicleNotFound(id),
        }
    }
}

/// A straight, uni-directional, multi-lane road of fixed length.
///
/// Lane index 0 is the rightmost (slowest) lane; higher indices are used for
/// overtaking. The road keeps two mappings in lockstep: lane index → lane
/// sequence, and vehicle id → lane index. All insertions, deletions and
/// lateral moves go through the road so the two stay consistent.
#[derive(Debug, Default)]
pub struct Road {
    /// Total length (meters)
    length: f64,
    /// Lane index → lane
    lanes: IndexMap<usize, Lane>,
    /// Vehicle id → lane index (reverse index)
    vehicle_lanes: HashMap<VehicleID, usize>,
}

impl Road {
    /// Creates a road of the given length with no lanes.
    pub fn new(length: f64) -> Self {
        Self {
            length,
            lanes: IndexMap::new(),
            vehicle_lanes: HashMap::new(),
        }
    }

    /// Creates a road of the given length with lanes `0..num_lanes`.
    ///
    /// # Example
    /// ```rust
    /// use multilane_traffic_sim_core::road::Road;
    /// let road = Road::with_lanes(500.0, 3);
    /// assert_eq!(road.num_lanes(), 3);
    /// ```
    pub fn with_lanes(length: f64, num_lanes: usize) -> Self {
        let mut road = Self::new(length);
        for index in 0..num_lanes {
            road.lanes.insert(index, Lane::new());
        }
        road
    }

    /// Total road length (meters).
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Number of lanes.
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Whether a lane with the given index exists.
    pub fn has_lane(&self, index: usize) -> bool {
        self.lanes.contains_key(&index)
    }

    /// Lane indices in ascending order.
    pub fn lane_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.lanes.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Appends a new empty lane, or inserts it at the given index.
    ///
    /// # Arguments
    /// * `index` - Lane index to use; `None` appends at the next free index.
    ///
    /// # Returns
    /// The index of the new lane, or an error if the index is already in use.
    pub fn add_lane(&mut self, index: Option<usize>) -> Result<usize, RoadError> {
        let index = index.unwrap_or(self.lanes.len());
        if self.lanes.contains_key(&index) {
            return Err(RoadError::LaneAlreadyExists(index));
        }
        self.lanes.insert(index, Lane::new());
        Ok(index)
    }

    /// Shared access to a lane.
    pub fn lane(&self, index: usize) -> Result<&Lane, RoadError> {
        self.lanes.get(&index).ok_or(RoadError::UnknownLane(index))
    }

    /// Inserts a vehicle into the given lane and records it in the reverse
    /// index. Both mappings are updated together or not at all.
    pub fn add_vehicle(&mut self, vehicle: VehicleRef, lane_index: usize) -> Result<(), RoadError> {
        let id = vehicle.borrow().id;
        if self.vehicle_lanes.contains_key(&id) {
            return Err(RoadError::VehicleAlreadyOnRoad(id));
        }
        let lane = self
            .lanes
            .get_mut(&lane_index)
            .ok_or(RoadError::UnknownLane(lane_index))?;
        lane.insert(vehicle);
        self.vehicle_lanes.insert(id, lane_index);
        Ok(())
    }

    /// Removes a vehicle from its lane and from the reverse index.
    pub fn delete_vehicle(&mut self, vehicle: &VehicleRef) -> Result<(), RoadError> {
        let id = vehicle.borrow().id;
        let lane_index = *self
            .vehicle_lanes
            .get(&id)
            .ok_or(RoadError::VehicleNotFound(id))?;
        let lane = self
            .lanes
            .get_mut(&lane_index)
            .ok_or(RoadError::UnknownLane(lane_index))?;
        lane.remove(vehicle)?;
        self.vehicle_lanes.remove(&id);
        Ok(())
    }

    /// O(1) lookup of the lane a vehicle currently occupies.
    pub fn current_lane_index(&self, vehicle_id: VehicleID) -> Result<usize, RoadError> {
        self.vehicle_lanes
            .get(&vehicle_id)
            .copied()
            .ok_or(RoadError::VehicleNotFound(vehicle_id))
    }

    /// Whether the vehicle is currently on the road.
    pub fn contains(&self, vehicle_id: VehicleID) -> bool {
        self.vehicle_lanes.contains_key(&vehicle_id)
    }

    /// Total number of vehicles across all lanes.
    pub fn total_vehicles(&self) -> usize {
        self.vehicle_lanes.len()
    }

    /// Moves a vehicle to an adjacent lane.
    ///
    /// # Arguments
    /// * `vehicle` - The vehicle to move.
    /// * `new_lane_index` - Target lane; must exist and be exactly one step
    ///   away from the current lane.
    /// * `current_lane_index` - The lane the caller believes the vehicle is
    ///   in; `None` consults the reverse index.
    ///
    /// The removal from the current lane, the insertion into the target lane
    /// and the reverse-index update happen together.
    pub fn change_lane(
        &mut self,
        vehicle: &VehicleRef,
        new_lane_index: usize,
        current_lane_index: Option<usize>,
    ) -> Result<(), RoadError> {
        let id = vehicle.borrow().id;
        let actual = self.current_lane_index(id)?;
        let current = match current_lane_index {
            Some(stated) if stated != actual => {
                return Err(RoadError::LaneMismatch {
                    vehicle_id: id,
                    stated,
                    actual,
                });
            }
            Some(stated) => stated,
            None => actual,
        };
        if !self.lanes.contains_key(&new_lane_index) {
            return Err(RoadError::UnknownLane(new_lane_index));
        }
        if current.abs_diff(new_lane_index) != 1 {
            return Err(RoadError::NonAdjacentLaneChange {
                from: current,
                to: new_lane_index,
            });
        }

        let current_lane = self
            .lanes
            .get_mut(&current)
            .ok_or(RoadError::UnknownLane(current))?;
        current_lane.remove(vehicle)?;

        let new_lane = self
            .lanes
            .get_mut(&new_lane_index)
            .ok_or(RoadError::UnknownLane(new_lane_index))?;
        new_lane.insert(vehicle.clone());

        self.vehicle_lanes.insert(id, new_lane_index);
        Ok(())
    }
}
