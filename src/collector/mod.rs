//! # Collector Module
//!
//! Bounded-buffer recording of per-tick samples and completed travel times.
//!
//! ## Key Components
//!
//! - [`DataCollector`] - Append-only sink with watermark-based flushing
//! - [`TravelRecord`] - One completed journey (birth, death, travel time)
//! - [`TravelTimeFormat`] - The two accepted `travel_times.csv` schemas
//!
//! ## Output layout
//!
//! The collector owns one directory per run (`tmp/<id>`, suffixed `_<n>` when
//! a non-empty directory of that name already exists) containing
//! `vehicle_data.csv`, `travel_times.csv` and `simulation_settings.json`.
mod data_collector;

pub use self::data_collector::*;
