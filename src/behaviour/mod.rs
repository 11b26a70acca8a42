//! # Behaviour Module
//!
//! Car-following policies and the shared lane-change decision procedure.
//!
//! All per-vehicle policy lives here: the simulation driver only advances
//! positions and calls [`Behaviour::update`] once per vehicle per tick.
//!
//! ## Key Components
//!
//! - [`Behaviour`] - The three-method capability interface of a model
//! - [`BehaviourModel`] - Closed sum over the shipped models
//! - [`BehaviourKind`] - Model tags plus the configuration name registry
//! - [`SimpleModel`] / [`SimpleFollowingModel`] / [`SimpleFollowingExtendedModel`] -
//!   Gaussian random-walk drivers of increasing sophistication
//! - [`GippsModel`] - Gipps' safe-velocity model
//! - [`IdmModel`] - The Intelligent Driver Model
//! - [`lane_changing`] - `overtake_if_possible`, `return_if_possible` and the
//!   n-second rule
//!
//! ## Lane-change ordering
//!
//! Every model checks "return" before "overtake": vehicles prefer drifting
//! back to slower lanes when it is safe and only look leftwards when blocked.
//!
//! ## Usage
//!
//! ```rust
//! use multilane_traffic_sim_core::behaviour::{Behaviour, BehaviourModel, GippsModel};
//! use multilane_traffic_sim_core::agents::Vehicle;
//! use multilane_traffic_sim_core::road::Road;
//! use multilane_traffic_sim_core::utils::rand::rng_from_seed;
//!
//! let mut road = Road::with_lanes(500.0, 1);
//! let vehicle = Vehicle::new(1).with_velocity(20.0).build_ref();
//! road.add_vehicle(vehicle.clone(), 0).unwrap();
//!
//! let mut model = BehaviourModel::Gipps(GippsModel::new(2.0, 4.0, 30.0, 1.1));
//! let mut rng = rng_from_seed(42);
//! model.update(&vehicle, &mut road, 0.1, &mut rng).unwrap();
//! assert!(vehicle.borrow().velocity > 20.0);
//! ```
pub mod behaviour;
pub mod lane_changing;

mod gipps;
mod idm;
mod simple;

pub use self::behaviour::{Behaviour, BehaviourKind, BehaviourModel, StandardParameter};
pub use self::gipps::GippsModel;
pub use self::idm::IdmModel;
pub use self::lane_changing::{
    is_outside_n_seconds_rule, overtake_if_possible, return_if_possible, safe_distance_n_seconds,
};
pub use self::simple::{SimpleFollowingExtendedModel, SimpleFollowingModel, SimpleModel};
