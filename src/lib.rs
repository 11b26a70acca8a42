//! # multilane_traffic_sim_core
//!
//! Core library for discrete-time microscopic traffic simulation on a
//! straight, uni-directional, multi-lane road.
//!
//! The kernel advances a population of individual vehicles in fixed time
//! steps, applying a pluggable car-following behaviour model to each vehicle
//! on every tick and allowing lane changes when safe. Per-vehicle state
//! samples and completed travel times are recorded for later statistical
//! analysis.
//!
//! ## Modules
//!
//! - [`agents`] – Vehicles and their shared handles
//! - [`road`] – Lanes and the road data structure with neighbor queries
//! - [`behaviour`] – Car-following models and the lane-change procedure
//! - [`spawning`] – Lane distributions, the vehicle factory and the spawner
//! - [`collector`] – Buffered sample and travel-time recording
//! - [`simulation`] – Configuration documents and the tick-by-tick driver
//! - [`utils`] – Seeded sampling helpers and unit conversions
//! - [`verbose`] – Structured logging levels and events
//!
//! ## Quick start
//!
//! ```rust
//! use multilane_traffic_sim_core::simulation::settings::SimulationSettings;
//! use multilane_traffic_sim_core::simulation::simulation::Simulation;
//!
//! let document = r#"{
//!     "name": {"id": "quick_start", "description": "Two-lane Gipps run"},
//!     "road": {"length": 500.0, "lanes": 2},
//!     "simulation": {"time_step": 0.1, "duration": 10.0},
//!     "spawn": {"process": "poisson", "cars_per_second": 0.4},
//!     "vehicle": {
//!         "behavior": ["Gipps Model", {
//!             "maximum_acceleration": {"mu": 1.5, "sigma": 0.0},
//!             "maximum_deceleration": {"mu": 1.0, "sigma": 0.0},
//!             "apparent_reaction_time": {"mu": 1.1, "sigma": 0.0}
//!         }],
//!         "behavior_settings": [27.78, 2.22],
//!         "length": 1.5
//!     },
//!     "lane_distribution": "triangle"
//! }"#;
//! let settings = SimulationSettings::from_json(document).unwrap();
//! let simulation = Simulation::from_settings_in(
//!     settings,
//!     42,
//!     &std::env::temp_dir().join("multilane_traffic_sim_quick_start"),
//! )
//! .unwrap();
//! let summary = simulation.run().unwrap();
//! assert_eq!(summary.steps, 100);
//! ```
pub mod agents;
pub mod behaviour;
pub mod collector;
pub mod road;
pub mod simulation;
pub mod spawning;
pub mod utils;
pub mod verbose;
