//! # Agents Module
//!
//! The vehicle agents driving along the simulated road.
//!
//! ## Key Components
//!
//! - [`Vehicle`] - The primary agent: position, velocity and an owned behaviour model
//! - [`VehicleRef`] - Shared single-threaded handle used by lanes and the driver
//!
//! ## Usage
//!
//! ```rust
//! use multilane_traffic_sim_core::agents::Vehicle;
//! use multilane_traffic_sim_core::behaviour::{BehaviourModel, SimpleModel};
//!
//! // Create a basic vehicle
//! let vehicle = Vehicle::new(1)
//!     .with_position(0.0)
//!     .with_behaviour(BehaviourModel::Simple(SimpleModel::new(27.78)))
//!     .build();
//! ```
//!
//! ## Features
//!
//! - **Builder pattern**: API for vehicle construction
//! - **Owned behaviour**: each vehicle carries its own sampled model parameters
mod vehicle;

pub use self::vehicle::*;
