use crate::agents::VehicleID;
use crate::behaviour::Behaviour;
use crate::collector::{CollectorError, DataCollector};
use crate::road::{Road, RoadError};
use crate::simulation::settings::{ProcessSettings, SettingsError, SimulationSettings};
use crate::spawning::{LaneDistribution, VehicleFactory, VehicleSpawner};
use crate::utils::rand::{SimRng, rng_from_seed};
use crate::verbose::{
    EVENT_DEPARTURE, EVENT_RUN_END, EVENT_RUN_START, EVENT_STEP, EVENT_VEHICLE_UPDATE,
};
use crate::{log_additional, log_all, log_detailed, log_main};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// Unified error type for a simulation run.
#[derive(Debug)]
pub enum SimulationError {
    /// The configuration document is invalid.
    Settings(SettingsError),
    /// A structural violation in the road data structure.
    Road(RoadError),
    /// The data collector could not write.
    Collector(CollectorError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Settings(err) => write!(f, "Invalid configuration: {}", err),
            SimulationError::Road(err) => write!(f, "Structural violation: {}", err),
            SimulationError::Collector(err) => write!(f, "Data collection failed: {}", err),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Settings(err) => Some(err),
            SimulationError::Road(err) => Some(err),
            SimulationError::Collector(err) => Some(err),
        }
    }
}

impl From<SettingsError> for SimulationError {
    fn from(err: SettingsError) -> Self {
        SimulationError::Settings(err)
    }
}

impl From<RoadError> for SimulationError {
    fn from(err: RoadError) -> Self {
        SimulationError::Road(err)
    }
}

impl From<CollectorError> for SimulationError {
    fn from(err: CollectorError) -> Self {
        SimulationError::Collector(err)
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy)]
pub struct StepStats {
    /// Tick index, starting at 0
    pub step: u64,
    /// Simulation time at the start of the tick (seconds)
    pub time: f64,
    /// Vehicles spawned this tick
    pub spawned: usize,
    /// Vehicles whose behaviour was updated this tick
    pub updated: usize,
    /// Vehicles that left the road this tick
    pub departed: usize,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub steps: u64,
    pub runtime_seconds: f64,
    pub vehicles_spawned: u64,
    pub vehicles_departed: u64,
    pub output_dir: PathBuf,
}

/// The simulation driver.
///
/// Owns the road, the spawner, the data collector and the seeded random
/// source, and advances them tick by tick:
///
/// ```text
/// Per tick:
/// 1. Stamp the collector with the tick's simulation time
/// 2. Spawn new vehicles
/// 3. Update vehicles lane by lane (ascending index), leader-first within
///    each lane; sample each vehicle right after its update
/// 4. Depart vehicles whose position exceeds the road length
/// ```
///
/// The update phase iterates a snapshot of each lane and tracks processed
/// vehicle ids, so behaviour-requested lane changes during the iteration
/// cannot update a vehicle twice or skip over the mutation.
pub struct Simulation {
    settings: SimulationSettings,
    road: Road,
    spawner: VehicleSpawner,
    collector: DataCollector,
    rng: SimRng,
    run_id: Uuid,
    time_step: f64,
    steps_total: u64,
    steps_done: u64,
    vehicles_spawned: u64,
    vehicles_departed: u64,
    processed: HashSet<VehicleID>,
}

impl Simulation {
    /// Builds a run from a validated configuration document, writing output
    /// under `tmp` in the current working directory.
    ///
    /// # Arguments
    /// * `settings` - The configuration document.
    /// * `seed` - Seed of the run's random source; the same seed and
    ///   configuration reproduce the same trajectory.
    pub fn from_settings(settings: SimulationSettings, seed: u64) -> Result<Self, SimulationError> {
        Self::build(settings, seed, None)
    }

    /// Like [`Simulation::from_settings`] with an explicit output root.
    pub fn from_settings_in(
        settings: SimulationSettings,
        seed: u64,
        base_dir: &Path,
    ) -> Result<Self, SimulationError> {
        Self::build(settings, seed, Some(base_dir))
    }

    fn build(
        settings: SimulationSettings,
        seed: u64,
        base_dir: Option<&Path>,
    ) -> Result<Self, SimulationError> {
        settings.validate()?;

        let road = Road::with_lanes(settings.road.length, settings.road.lanes);

        let factory = VehicleFactory::new(
            settings.behaviour_kind()?,
            settings
                .vehicle
                .behavior
                .1
                .iter()
                .map(|(key, spec)| (key.clone(), (spec.mu, spec.sigma)))
                .collect(),
            settings.vehicle.behavior_settings.0,
            settings.vehicle.behavior_settings.1,
            settings.vehicle.length,
        );
        let spawner = VehicleSpawner::new(
            settings.spawn_process()?,
            LaneDistribution::new(settings.lane_distribution_kind()?, settings.road.lanes),
            factory.boxed(),
            settings.spawn.cars_per_second,
            settings.simulation.time_step,
        );

        let mut collector_builder = DataCollector::new(settings.name.id.clone())
            .with_travel_time_format(settings.travel_time_format()?);
        if let Some(base_dir) = base_dir {
            collector_builder = collector_builder.with_base_dir(base_dir);
        }
        let collector = collector_builder.build()?;

        Ok(Self {
            time_step: settings.simulation.time_step,
            steps_total: settings.steps(),
            settings,
            road,
            spawner,
            collector,
            rng: rng_from_seed(seed),
            run_id: Uuid::new_v4(),
            steps_done: 0,
            vehicles_spawned: 0,
            vehicles_departed: 0,
            processed: HashSet::new(),
        })
    }

    /// Unique identifier of this run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The road being simulated.
    pub fn road(&self) -> &Road {
        &self.road
    }

    /// Simulation time at the start of the next tick.
    pub fn current_time(&self) -> f64 {
        self.steps_done as f64 * self.time_step
    }

    /// Ticks executed so far.
    pub fn steps_done(&self) -> u64 {
        self.steps_done
    }

    /// Ticks a full run executes.
    pub fn steps_total(&self) -> u64 {
        self.steps_total
    }

    /// The output directory of this run.
    pub fn output_dir(&self) -> &Path {
        self.collector.path()
    }

    /// Executes one tick: spawn, update, depart.
    pub fn step(&mut self) -> Result<StepStats, SimulationError> {
        let step = self.steps_done;
        let time = self.current_time();
        self.collector.set_current_time(time);

        let spawned = self
            .spawner
            .spawn(&mut self.road, &mut self.collector, time, &mut self.rng)?;
        self.vehicles_spawned += spawned as u64;

        let updated = self.update_vehicles()?;
        let departed = self.depart_vehicles(time)?;
        self.vehicles_departed += departed as u64;

        self.steps_done += 1;
        log_detailed!(
            EVENT_STEP,
            "Tick complete",
            step = step,
            spawned = spawned,
            updated = updated,
            departed = departed
        );
        Ok(StepStats {
            step,
            time,
            spawned,
            updated,
            departed,
        })
    }

    /// The update phase: lanes in ascending index order, vehicles
    /// leader-first within each lane.
    fn update_vehicles(&mut self) -> Result<usize, SimulationError> {
        self.processed.clear();
        let mut updated = 0;

        for lane_index in self.road.lane_indices() {
            // Snapshot: behaviour models may move vehicles between lanes
            // while this lane is being iterated.
            let snapshot = self.road.lane(lane_index)?.snapshot();
            for vehicle in snapshot {
                let id = vehicle.borrow().id;
                // A vehicle that migrated laterally mid-tick is updated at
                // most once.
                if !self.processed.insert(id) {
                    continue;
                }

                vehicle.borrow_mut().advance(self.time_step);

                // The model is taken out as a value so it can freely borrow
                // the vehicle and mutate the road; writing it back preserves
                // transient diagnostics.
                let mut behaviour = vehicle.borrow().behaviour.clone();
                behaviour.update(&vehicle, &mut self.road, self.time_step, &mut self.rng)?;
                vehicle.borrow_mut().behaviour = behaviour;

                let current_lane = self.road.current_lane_index(id)?;
                log_all!(
                    EVENT_VEHICLE_UPDATE,
                    "Vehicle updated",
                    vehicle_id = id,
                    lane = current_lane,
                    position = vehicle.borrow().position,
                    velocity = vehicle.borrow().velocity
                );
                self.collector.on_sample(&vehicle.borrow(), current_lane)?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// The departure phase: pop every lane's frontmost vehicle while it is
    /// beyond the end of the road.
    fn depart_vehicles(&mut self, time: f64) -> Result<usize, SimulationError> {
        let mut departed = 0;
        for lane_index in self.road.lane_indices() {
            loop {
                let front = match self.road.lane(lane_index)?.first() {
                    Some(front) => front,
                    None => break,
                };
                if front.borrow().position <= self.road.length() {
                    break;
                }
                self.collector.on_death(&front.borrow(), time)?;
                self.road.delete_vehicle(&front)?;
                log_additional!(
                    EVENT_DEPARTURE,
                    "Vehicle left the road",
                    vehicle_id = front.borrow().id,
                    lane = lane_index,
                    time = time
                );
                departed += 1;
            }
        }
        Ok(departed)
    }

    /// Runs all ticks and finalizes the collector.
    ///
    /// The collector's finalize routine runs on the error path too, so
    /// buffered rows survive an aborted run.
    pub fn run(mut self) -> Result<RunSummary, SimulationError> {
        log_main!(
            EVENT_RUN_START,
            "Simulation run starting",
            run_id = tracing::field::display(self.run_id),
            simulation_id = self.settings.name.id.as_str(),
            steps = self.steps_total
        );
        let started = Instant::now();

        let mut outcome: Result<(), SimulationError> = Ok(());
        while self.steps_done < self.steps_total {
            if let Err(err) = self.step() {
                outcome = Err(err);
                break;
            }
        }

        let runtime = started.elapsed().as_secs_f64();
        let finalized = self.finalize(runtime);
        outcome?;
        finalized?;

        log_main!(
            EVENT_RUN_END,
            "Simulation run complete",
            run_id = tracing::field::display(self.run_id),
            steps = self.steps_done,
            runtime = runtime,
            spawned = self.vehicles_spawned,
            departed = self.vehicles_departed
        );
        Ok(RunSummary {
            run_id: self.run_id,
            steps: self.steps_done,
            runtime_seconds: runtime,
            vehicles_spawned: self.vehicles_spawned,
            vehicles_departed: self.vehicles_departed,
            output_dir: self.collector.path().to_path_buf(),
        })
    }

    /// Flushes the collector and writes the configuration document with the
    /// `process` block appended.
    fn finalize(&mut self, runtime: f64) -> Result<(), SimulationError> {
        let mut document = self.settings.clone();
        document.process = Some(ProcessSettings {
            steps: self.steps_done,
            runtime,
        });
        let value = serde_json::to_value(&document).map_err(CollectorError::Json)?;
        self.collector.finalize(&value)?;
        Ok(())
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("run_id", &self.run_id)
            .field("steps_done", &self.steps_done)
            .field("steps_total", &self.steps_total)
            .field("vehicles_spawned", &self.vehicles_spawned)
            .field("vehicles_departed", &self.vehicles_departed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::settings::{
        NameSettings, RoadSettings, SpawnSettings, TimeSettings, VehicleSettings,
    };
    use std::collections::BTreeMap;

    fn minimal_settings(id: &str) -> SimulationSettings {
        SimulationSettings {
            name: NameSettings {
                id: id.to_string(),
                description: "driver test".to_string(),
            },
            road: RoadSettings {
                length: 200.0,
                lanes: 2,
            },
            simulation: TimeSettings {
                time_step: 1.0,
                duration: 10.0,
            },
            spawn: SpawnSettings {
                process: "equal".to_string(),
                cars_per_second: 1.0,
            },
            vehicle: VehicleSettings {
                behavior: ("Simple Model".to_string(), BTreeMap::new()),
                behavior_settings: (20.0, 0.0),
                length: 1.5,
            },
            lane_distribution: "equal".to_string(),
            travel_time_format: None,
            process: None,
        }
    }

    fn temp_base(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mlts_sim_test_{}_{}", tag, Uuid::new_v4()))
    }

    #[test]
    fn test_step_counts_are_consistent() {
        let base = temp_base("counts");
        let mut simulation =
            Simulation::from_settings_in(minimal_settings("counts"), 42, &base).unwrap();
        let mut on_road: i64 = 0;
        for _ in 0..10 {
            let stats = simulation.step().unwrap();
            on_road += stats.spawned as i64 - stats.departed as i64;
            assert_eq!(
                simulation.road().total_vehicles() as i64,
                on_road,
                "Road population must equal spawned minus departed"
            );
        }
        std::fs::remove_dir_all(&base).ok();
    }

    #[test]
    fn test_same_seed_reproduces_run() {
        let base = temp_base("repro");
        let run = |seed: u64, tag: &str| -> Vec<(u64, f64)> {
            let mut simulation = Simulation::from_settings_in(
                {
                    let mut settings = minimal_settings(tag);
                    settings.spawn.process = "poisson".to_string();
                    settings
                },
                seed,
                &base,
            )
            .unwrap();
            let mut trace = Vec::new();
            for _ in 0..10 {
                simulation.step().unwrap();
                for lane_index in simulation.road().lane_indices() {
                    for vehicle in simulation.road().lane(lane_index).unwrap().iter() {
                        let v = vehicle.borrow();
                        trace.push((v.id, v.position));
                    }
                }
            }
            trace
        };
        assert_eq!(
            run(7, "repro_a"),
            run(7, "repro_b"),
            "Same seed and settings must give the same trajectory"
        );
        assert_ne!(
            run(7, "repro_c"),
            run(8, "repro_d"),
            "Different seeds should diverge"
        );
        std::fs::remove_dir_all(&base).ok();
    }

    #[test]
    fn test_run_finalizes_output() {
        let base = temp_base("finalize");
        let simulation =
            Simulation::from_settings_in(minimal_settings("finalize"), 42, &base).unwrap();
        let summary = simulation.run().unwrap();
        assert_eq!(summary.steps, 10);
        let settings_file = summary.output_dir.join("simulation_settings.json");
        let document: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(settings_file).unwrap()).unwrap();
        assert_eq!(document["process"]["steps"], 10);
        assert!(document["process"]["runtime"].as_f64().unwrap() >= 0.0);
        std::fs::remove_dir_all(&base).ok();
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut settings = minimal_settings("invalid");
        settings.road.lanes = 0;
        assert!(matches!(
            Simulation::from_settings(settings, 42),
            Err(SimulationError::Settings(SettingsError::ZeroLanes))
        ));
    }
}
