use crate::agents::Vehicle;
use crate::collector::DataCollector;
use crate::road::{Road, RoadError};
use crate::spawning::lane_distribution::LaneDistribution;
use crate::utils::rand::{SimRng, poisson};
use crate::verbose::{EVENT_SPAWN, EVENT_SPAWN_VEHICLE};
use crate::{log_additional, log_detailed};
use std::fmt;
use std::rc::Rc;

/// The stochastic process drawing the batch size of new vehicles per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnProcess {
    /// `N ~ Poisson(rate · Δt)` per tick.
    Poisson,
    /// `N = round(rate · Δt)` per tick, deterministic.
    Uniform,
}

impl SpawnProcess {
    /// Parses a configuration-document process name.
    ///
    /// The deterministic process is spelled `equal` in configuration
    /// documents.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "poisson" => Some(SpawnProcess::Poisson),
            "equal" => Some(SpawnProcess::Uniform),
            _ => None,
        }
    }

    /// The configuration-document name.
    pub fn name(&self) -> &'static str {
        match self {
            SpawnProcess::Poisson => "poisson",
            SpawnProcess::Uniform => "equal",
        }
    }

    /// Draws the number of new vehicles for one tick.
    pub fn draw(&self, rng: &mut SimRng, cars_per_second: f64, time_step: f64) -> usize {
        let expected = cars_per_second * time_step;
        match self {
            SpawnProcess::Poisson => poisson(rng, expected) as usize,
            SpawnProcess::Uniform => expected.round().max(0.0) as usize,
        }
    }
}

impl fmt::Display for SpawnProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-tick vehicle source.
///
/// Draws a batch size from its process, partitions it over the lanes through
/// the lane distribution, builds each vehicle with the factory closure and
/// hands it to the road, notifying the data collector of every birth.
pub struct VehicleSpawner {
    process: SpawnProcess,
    lane_distribution: LaneDistribution,
    vehicle_factory: Box<dyn FnMut(&mut SimRng) -> Vehicle>,
    cars_per_second: f64,
    time_step: f64,
}

impl VehicleSpawner {
    pub fn new(
        process: SpawnProcess,
        lane_distribution: LaneDistribution,
        vehicle_factory: Box<dyn FnMut(&mut SimRng) -> Vehicle>,
        cars_per_second: f64,
        time_step: f64,
    ) -> Self {
        Self {
            process,
            lane_distribution,
            vehicle_factory,
            cars_per_second,
            time_step,
        }
    }

    pub fn process(&self) -> SpawnProcess {
        self.process
    }

    /// Spawns this tick's batch of vehicles onto the road.
    ///
    /// # Returns
    /// The number of vehicles inserted, which always equals the sum of the
    /// lane distribution's counts.
    pub fn spawn(
        &mut self,
        road: &mut Road,
        data_collector: &mut DataCollector,
        simulation_time: f64,
        rng: &mut SimRng,
    ) -> Result<usize, RoadError> {
        let num_new_cars = self
            .process
            .draw(rng, self.cars_per_second, self.time_step);
        let cars_per_lane = self.lane_distribution.cars_per_lane(num_new_cars);

        let mut spawned = 0;
        for (lane_index, count) in cars_per_lane.iter().enumerate() {
            for _ in 0..*count {
                let vehicle = (self.vehicle_factory)(rng);
                data_collector.on_birth(&vehicle, simulation_time);
                log_detailed!(
                    EVENT_SPAWN_VEHICLE,
                    "New vehicle enters the road",
                    vehicle_id = vehicle.id,
                    lane = lane_index,
                    velocity = vehicle.velocity
                );
                road.add_vehicle(Rc::new(std::cell::RefCell::new(vehicle)), lane_index)?;
                spawned += 1;
            }
        }

        if spawned > 0 {
            log_additional!(
                EVENT_SPAWN,
                "Spawned new vehicles",
                time = simulation_time,
                count = spawned
            );
        }
        Ok(spawned)
    }
}

impl fmt::Debug for VehicleSpawner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehicleSpawner")
            .field("process", &self.process)
            .field("lane_distribution", &self.lane_distribution)
            .field("cars_per_second", &self.cars_per_second)
            .field("time_step", &self.time_step)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::Vehicle;
    use crate::spawning::lane_distribution::LaneDistributionKind;
    use crate::utils::rand::rng_from_seed;

    fn counting_factory() -> Box<dyn FnMut(&mut SimRng) -> Vehicle> {
        let mut next_id = 1;
        Box::new(move |_rng| {
            let vehicle = Vehicle::new(next_id).with_velocity(10.0).build();
            next_id += 1;
            vehicle
        })
    }

    #[test]
    fn test_process_parse() {
        assert_eq!(SpawnProcess::parse("poisson"), Some(SpawnProcess::Poisson));
        assert_eq!(SpawnProcess::parse("equal"), Some(SpawnProcess::Uniform));
        assert_eq!(SpawnProcess::parse("bernoulli"), None);
    }

    #[test]
    fn test_uniform_draw_is_deterministic() {
        let mut rng = rng_from_seed(1);
        let process = SpawnProcess::Uniform;
        assert_eq!(process.draw(&mut rng, 2.0, 1.0), 2);
        assert_eq!(process.draw(&mut rng, 0.4, 0.1), 0);
        assert_eq!(process.draw(&mut rng, 6.0, 0.1), 1);
    }

    #[test]
    fn test_poisson_zero_rate_spawns_nothing() {
        let mut rng = rng_from_seed(1);
        assert_eq!(SpawnProcess::Poisson.draw(&mut rng, 0.0, 0.1), 0);
    }

    #[test]
    fn test_spawn_inserts_distribution_counts() {
        let temp = std::env::temp_dir().join(format!(
            "mlts_spawner_test_{}",
            uuid::Uuid::new_v4()
        ));
        let mut collector = DataCollector::new("spawner_test")
            .with_base_dir(&temp)
            .build()
            .unwrap();

        let mut road = Road::with_lanes(500.0, 4);
        let mut spawner = VehicleSpawner::new(
            SpawnProcess::Uniform,
            LaneDistribution::new(LaneDistributionKind::Triangle, 4),
            counting_factory(),
            10.0,
            1.0,
        );
        let mut rng = rng_from_seed(42);
        let spawned = spawner
            .spawn(&mut road, &mut collector, 0.0, &mut rng)
            .unwrap();

        assert_eq!(spawned, 10, "Uniform draw of 10 must insert 10 vehicles");
        assert_eq!(road.total_vehicles(), 10);
        assert_eq!(road.lane(0).unwrap().len(), 4);
        assert_eq!(road.lane(1).unwrap().len(), 3);
        assert_eq!(road.lane(2).unwrap().len(), 2);
        assert_eq!(road.lane(3).unwrap().len(), 1);

        std::fs::remove_dir_all(&temp).ok();
    }
}
