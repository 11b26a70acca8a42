//! # Simulation module
//!
//! **Top-level orchestration module** – Coordinates all major components of
//! the multi-lane traffic simulation.
//!
//! This module owns the configuration document, the road, the spawner, the
//! data collector and the run clock, and executes the simulation tick by
//! tick. It is the main entry point for running a configured simulation.
//!
//! ## Simulation pipeline
//!
//! [`Simulation::step()`](crate::simulation::simulation::Simulation::step)
//! executes the following pipeline each tick:
//! ```text
//! 1. Stamp collector time
//! 2. Spawn vehicles           ← spawning module
//! 3. Update vehicles          ← behaviour module (per-lane, leader-first)
//! 4. Depart finished vehicles ← collector records travel times
//! ```
//!
//! ## Components
//!
//! - [`settings::SimulationSettings`] – The configuration document and its validation
//! - [`simulation::Simulation`] – The driver: `step()` / `run()`
//! - [`simulation::StepStats`] / [`simulation::RunSummary`] – Per-tick and per-run results
//! - [`simulation::SimulationError`] – Unified error type for a run
//!
//! ## Usage
//!
//! ```no_run
//! use multilane_traffic_sim_core::simulation::settings::SimulationSettings;
//! use multilane_traffic_sim_core::simulation::simulation::Simulation;
//!
//! let document = std::fs::read_to_string("simulation_settings.json").unwrap();
//! let settings = SimulationSettings::from_json(&document).unwrap();
//! let simulation = Simulation::from_settings(settings, 42).unwrap();
//! let summary = simulation.run().unwrap();
//! println!(
//!     "{} steps in {:.2} s, output in {}",
//!     summary.steps,
//!     summary.runtime_seconds,
//!     summary.output_dir.display()
//! );
//! ```
//!
//! ## Error handling
//!
//! Configuration, road and collector errors are unified under
//! [`simulation::SimulationError`]. The driver finalizes the collector on the
//! error path before propagating, so buffered rows are not lost.
pub mod settings;
pub mod simulation;
