//! # Utils Module
//!
//! Shared helpers for the simulation kernel.
//!
//! ## Key Components
//!
//! - [`rand::SimRng`] - The seeded random source threaded through the run
//! - [`rand::normal`] / [`rand::poisson`] - Total sampling helpers
//! - [`units`] - km/h ⇄ m/s conversions
//!
//! ## Example
//!
//! ```rust
//! use multilane_traffic_sim_core::utils::rand::{rng_from_seed, poisson};
//! use multilane_traffic_sim_core::utils::units::kmh_to_ms;
//!
//! let mut rng = rng_from_seed(42);
//! let new_cars = poisson(&mut rng, 0.4 * 0.1);
//! assert!(new_cars < 10);
//! assert_eq!(kmh_to_ms(36.0), 10.0);
//! ```
pub mod rand;
pub mod units;
