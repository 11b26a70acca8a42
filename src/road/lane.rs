use crate::agents::{Vehicle, VehicleID, VehicleRef};
use std::fmt;

/// Custom error types for `Lane`.
#[derive(Debug, Clone)]
pub enum LaneError {
    /// The vehicle is not present in this lane.
    VehicleNotFound(VehicleID),
}

impl fmt::Display for LaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneError::VehicleNotFound(vehicle_id) => {
                write!(f, "Vehicle with ID '{}' is not in the lane", vehicle_id)
            }
        }
    }
}

impl std::error::Error for LaneError {}

/// An ordered sequence of vehicles sharing one lateral channel.
///
/// Vehicles are kept sorted by descending position: index 0 is the frontmost
/// vehicle (the leader of the whole lane), the last index is the rearmost.
/// Neighbor queries use binary search over the position key, so they cost
/// O(log N) in the size of the lane.
#[derive(Debug, Default)]
pub struct Lane {
    vehicles: Vec<VehicleRef>,
}

impl Lane {
    /// Creates an empty lane.
    pub fn new() -> Self {
        Self { vehicles: Vec::new() }
    }

    /// Number of vehicles currently in the lane.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether the lane holds no vehicles.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Inserts a vehicle at its position-correct slot.
    ///
    /// The sequence is ordered by descending position. A vehicle inserted at
    /// an already-occupied position is placed immediately behind the
    /// equal-position incumbents, so insertion is stable.
    pub fn insert(&mut self, vehicle: VehicleRef) {
        let position = vehicle.borrow().position;
        let index = self
            .vehicles
            .partition_point(|v| v.borrow().position >= position);
        self.vehicles.insert(index, vehicle);
    }

    /// Removes the unique entry with the given vehicle's id.
    ///
    /// The vehicle is located by binary search over its position; if the
    /// sequence order was perturbed since insertion, a full scan still finds
    /// it. Absence is an error.
    pub fn remove(&mut self, vehicle: &VehicleRef) -> Result<(), LaneError> {
        let (position, id) = {
            let v = vehicle.borrow();
            (v.position, v.id)
        };
        if let Some(index) = self.search(position, id) {
            self.vehicles.remove(index);
            return Ok(());
        }
        // Fallback scan tolerating out-of-order positions
        if let Some(index) = self.vehicles.iter().position(|v| v.borrow().id == id) {
            self.vehicles.remove(index);
            return Ok(());
        }
        Err(LaneError::VehicleNotFound(id))
    }

    /// Returns the vehicle immediately ahead of the given one, or `None` if
    /// the vehicle is the frontmost in the lane.
    pub fn leading_of(&self, vehicle: &Vehicle) -> Option<VehicleRef> {
        let index = self
            .search(vehicle.position, vehicle.id)
            .or_else(|| self.vehicles.iter().position(|v| v.borrow().id == vehicle.id))?;
        if index == 0 {
            None
        } else {
            Some(self.vehicles[index - 1].clone())
        }
    }

    /// Returns the closest vehicles around the given position as
    /// `(leader, follower)`.
    ///
    /// The leader slot holds the nearest vehicle strictly ahead of the
    /// position; the follower slot the nearest vehicle at or behind it.
    /// Either side may be `None`. Querying an empty lane yields
    /// `(None, None)`.
    pub fn closest_around(&self, position: f64) -> (Option<VehicleRef>, Option<VehicleRef>) {
        if self.vehicles.is_empty() {
            return (None, None);
        }
        let index = self
            .vehicles
            .partition_point(|v| v.borrow().position > position);
        let leader = if index > 0 {
            Some(self.vehicles[index - 1].clone())
        } else {
            None
        };
        let follower = self.vehicles.get(index).cloned();
        (leader, follower)
    }

    /// The frontmost vehicle, or `None` if the lane is empty.
    pub fn first(&self) -> Option<VehicleRef> {
        self.vehicles.first().cloned()
    }

    /// The rearmost vehicle, or `None` if the lane is empty.
    pub fn last(&self) -> Option<VehicleRef> {
        self.vehicles.last().cloned()
    }

    /// Iterates the sequence leader-first.
    pub fn iter(&self) -> impl Iterator<Item = &VehicleRef> {
        self.vehicles.iter()
    }

    /// Clones the current sequence of handles, leader-first.
    ///
    /// The driver iterates a snapshot so that lane changes requested by
    /// behaviour models mid-tick do not invalidate the iteration.
    pub fn snapshot(&self) -> Vec<VehicleRef> {
        self.vehicles.clone()
    }

    /// Re-sorts the sequence by descending position.
    ///
    /// Only needed by callers that mutate vehicle positions outside the
    /// driver's update loop.
    pub fn resort(&mut self) {
        self.vehicles
            .sort_by(|a, b| b.borrow().position.total_cmp(&a.borrow().position));
    }

    /// Binary search for the entry with the given position and id.
    ///
    /// Lands on the first entry at or behind `position`, then walks the run
    /// of equal positions looking for the id.
    fn search(&self, position: f64, id: VehicleID) -> Option<usize> {
        let mut index = self
            .vehicles
            .partition_point(|v| v.borrow().position > position);
        while index < self.vehicles.len() {
            let v = self.vehicles[index].borrow();
            if v.position != position {
                break;
            }
            if v.id == id {
                return Some(index);
            }
            index += 1;
        }
        None
    }
}
