//! # Road Module
//!
//! The spatial data structure of the simulation: a fixed-length,
//! uni-directional road made of indexed lanes.
//!
//! ## Key Components
//!
//! - [`Lane`] - Position-sorted vehicle sequence with O(log N) neighbor queries
//! - [`Road`] - Lane collection plus a vehicle → lane reverse index
//!
//! ## Invariants
//!
//! - Every lane sequence is sorted by descending position after any public
//!   operation returns.
//! - A vehicle id appears in exactly one lane's sequence iff the reverse
//!   index maps it to that lane.
//!
//! ## Usage
//!
//! ```rust
//! use multilane_traffic_sim_core::agents::Vehicle;
//! use multilane_traffic_sim_core::road::Road;
//!
//! let mut road = Road::with_lanes(500.0, 2);
//! let vehicle = Vehicle::new(1).with_position(0.0).build_ref();
//! road.add_vehicle(vehicle.clone(), 0).unwrap();
//! road.change_lane(&vehicle, 1, Some(0)).unwrap();
//! assert_eq!(road.current_lane_index(1).unwrap(), 1);
//! ```
mod lane;
mod road;

pub use self::{lane::*, road::*};
