//! # Spawning Module
//!
//! Everything that puts new vehicles onto the road.
//!
//! ## Key Components
//!
//! - [`LaneDistribution`] - Partitions a spawn batch over the lanes with a
//!   deterministic largest-remainder rounding rule
//! - [`VehicleFactory`] - Samples driver parameters and allocates vehicle ids
//! - [`VehicleSpawner`] - Draws the per-tick batch size (Poisson or uniform)
//!   and inserts the vehicles
//!
//! ## Usage
//!
//! ```rust
//! use multilane_traffic_sim_core::spawning::{LaneDistribution, LaneDistributionKind};
//!
//! let distribution = LaneDistribution::new(LaneDistributionKind::Triangle, 4);
//! // Ten cars split 4/3/2/1 over four lanes
//! assert_eq!(distribution.cars_per_lane(10), vec![4, 3, 2, 1]);
//! ```
mod factory;
mod lane_distribution;
mod spawner;

pub use self::{factory::*, lane_distribution::*, spawner::*};
