use crate::agents::{Vehicle, VehicleID};
use crate::behaviour::{
    BehaviourKind, BehaviourModel, GippsModel, IdmModel, SimpleFollowingExtendedModel,
    SimpleFollowingModel, SimpleModel,
};
use crate::utils::rand::{SimRng, normal};
use std::collections::BTreeMap;

/// Sampled parameters stay strictly positive: a Gaussian draw below this
/// floor is lifted to it.
const PARAMETER_FLOOR: f64 = 0.01;

/// Builds vehicles with freshly sampled driver parameters.
///
/// Every created vehicle gets the next id of a monotone counter (never reset,
/// so identities are unique across the whole run), a desired velocity drawn
/// from `N(mu, sigma)` and model parameters drawn from their per-parameter
/// Gaussians, floored at 0.01 to avoid non-positive values.
pub struct VehicleFactory {
    kind: BehaviourKind,
    /// Configuration key → (mu, sigma)
    parameters: BTreeMap<String, (f64, f64)>,
    desired_velocity_mu: f64,
    desired_velocity_sigma: f64,
    vehicle_length: f64,
    next_id: VehicleID,
}

impl VehicleFactory {
    pub fn new(
        kind: BehaviourKind,
        parameters: BTreeMap<String, (f64, f64)>,
        desired_velocity_mu: f64,
        desired_velocity_sigma: f64,
        vehicle_length: f64,
    ) -> Self {
        Self {
            kind,
            parameters,
            desired_velocity_mu,
            desired_velocity_sigma,
            vehicle_length,
            next_id: 1,
        }
    }

    /// Creates one vehicle at position 0 with a sampled behaviour model and
    /// a sampled initial velocity.
    pub fn create(&mut self, rng: &mut SimRng) -> Vehicle {
        let id = self.next_id;
        self.next_id += 1;

        let desired_velocity = normal(
            rng,
            self.desired_velocity_mu,
            self.desired_velocity_sigma,
        )
        .max(PARAMETER_FLOOR);
        let behaviour = self.sample_model(desired_velocity, rng);

        let mut vehicle = Vehicle::new(id)
            .with_position(0.0)
            .with_length(self.vehicle_length)
            .with_behaviour(behaviour)
            .build();
        vehicle.sample_initial_velocity(rng);
        vehicle
    }

    /// Wraps the factory into the closure shape the spawner consumes.
    pub fn boxed(self) -> Box<dyn FnMut(&mut SimRng) -> Vehicle> {
        let mut factory = self;
        Box::new(move |rng| factory.create(rng))
    }

    /// Samples one parameter by key: Gaussian around the configured mean,
    /// floored at 0.01. Unconfigured keys use the model's standard mean.
    fn parameter(&self, key: &str, rng: &mut SimRng) -> f64 {
        let configured = self
            .parameters
            .get(key)
            .copied()
            .or_else(|| self.alias_of(key).and_then(|alias| self.parameters.get(alias).copied()));
        let (mu, sigma) = match configured {
            Some(spec) => spec,
            None => (self.kind.standard_default(key).unwrap_or(0.0), 0.0),
        };
        normal(rng, mu, sigma).max(PARAMETER_FLOOR)
    }

    /// Legacy spelling accepted for backwards compatibility with older
    /// configuration documents.
    fn alias_of(&self, key: &str) -> Option<&'static str> {
        match key {
            "save_time" => Some("safe_time"),
            _ => None,
        }
    }

    fn sample_model(&self, desired_velocity: f64, rng: &mut SimRng) -> BehaviourModel {
        match self.kind {
            BehaviourKind::Simple => BehaviourModel::Simple(
                SimpleModel::new(desired_velocity).with_deviations(
                    self.parameter("initial_velocity_deviation", rng),
                    self.parameter("update_velocity_deviation", rng),
                ),
            ),
            BehaviourKind::SimpleFollowing => BehaviourModel::SimpleFollowing(
                SimpleFollowingModel::new(desired_velocity, self.parameter("save_time", rng))
                    .with_deviations(
                        self.parameter("initial_velocity_deviation", rng),
                        self.parameter("update_velocity_deviation", rng),
                    ),
            ),
            BehaviourKind::SimpleFollowingExtended => BehaviourModel::SimpleFollowingExtended(
                SimpleFollowingExtendedModel::new(
                    desired_velocity,
                    self.parameter("save_time", rng),
                )
                .with_deviations(
                    self.parameter("initial_velocity_deviation", rng),
                    self.parameter("update_velocity_deviation", rng),
                ),
            ),
            BehaviourKind::Gipps => BehaviourModel::Gipps(
                GippsModel::new(
                    self.parameter("maximum_acceleration", rng),
                    self.parameter("maximum_deceleration", rng),
                    desired_velocity,
                    self.parameter("apparent_reaction_time", rng),
                )
                .with_comfortable_distance(self.parameter("comfortable_distance", rng)),
            ),
            BehaviourKind::IntelligentDriver => BehaviourModel::Idm(IdmModel::new(
                desired_velocity,
                self.parameter("time_headway", rng),
                self.parameter("max_acceleration", rng),
                self.parameter("comfortable_braking_deceleration", rng),
                self.parameter("minimum_spacing", rng),
                self.parameter("acceleration_exponent", rng),
            )),
        }
    }
}

impl std::fmt::Debug for VehicleFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleFactory")
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .field("desired_velocity_mu", &self.desired_velocity_mu)
            .field("desired_velocity_sigma", &self.desired_velocity_sigma)
            .field("vehicle_length", &self.vehicle_length)
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rand::rng_from_seed;

    fn exact(value: f64) -> (f64, f64) {
        (value, 0.0)
    }

    #[test]
    fn test_ids_are_monotone() {
        let mut factory = VehicleFactory::new(
            BehaviourKind::Simple,
            BTreeMap::new(),
            27.78,
            0.0,
            1.5,
        );
        let mut rng = rng_from_seed(42);
        let ids: Vec<VehicleID> = (0..5).map(|_| factory.create(&mut rng).id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_exact_parameters_reach_the_model() {
        let mut parameters = BTreeMap::new();
        parameters.insert("time_headway".to_string(), exact(1.5));
        parameters.insert("max_acceleration".to_string(), exact(2.0));
        parameters.insert("comfortable_braking_deceleration".to_string(), exact(3.0));
        parameters.insert("minimum_spacing".to_string(), exact(2.0));
        parameters.insert("acceleration_exponent".to_string(), exact(4.0));
        let mut factory = VehicleFactory::new(
            BehaviourKind::IntelligentDriver,
            parameters,
            27.78,
            0.0,
            1.5,
        );
        let mut rng = rng_from_seed(42);
        let vehicle = factory.create(&mut rng);
        match &vehicle.behaviour {
            BehaviourModel::Idm(model) => {
                assert_eq!(model.desired_velocity, 27.78);
                assert_eq!(model.time_headway, 1.5);
                assert_eq!(model.max_acceleration, 2.0);
                assert_eq!(model.comfortable_braking_deceleration, 3.0);
                assert_eq!(model.minimum_spacing, 2.0);
                assert_eq!(model.acceleration_exponent, 4.0);
            }
            other => panic!("Expected an IDM model, got {:?}", other),
        }
    }

    #[test]
    fn test_parameters_are_floored() {
        let mut parameters = BTreeMap::new();
        parameters.insert("save_time".to_string(), exact(-3.0));
        let mut factory = VehicleFactory::new(
            BehaviourKind::SimpleFollowing,
            parameters,
            27.78,
            0.0,
            1.5,
        );
        let mut rng = rng_from_seed(42);
        let vehicle = factory.create(&mut rng);
        match &vehicle.behaviour {
            BehaviourModel::SimpleFollowing(model) => {
                assert_eq!(
                    model.safe_time, 0.01,
                    "Non-positive samples must be lifted to the floor"
                );
            }
            other => panic!("Expected a following model, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_parameters_use_standard_defaults() {
        let mut factory = VehicleFactory::new(
            BehaviourKind::Gipps,
            BTreeMap::new(),
            27.78,
            0.0,
            1.5,
        );
        let mut rng = rng_from_seed(42);
        let vehicle = factory.create(&mut rng);
        match &vehicle.behaviour {
            BehaviourModel::Gipps(model) => {
                assert_eq!(model.maximum_acceleration, 2.0);
                assert_eq!(model.maximum_deceleration, 4.0);
                assert_eq!(model.apparent_reaction_time, 2.0);
                assert_eq!(model.comfortable_distance, 2.0);
            }
            other => panic!("Expected a Gipps model, got {:?}", other),
        }
    }

    #[test]
    fn test_safe_time_alias() {
        let mut parameters = BTreeMap::new();
        parameters.insert("safe_time".to_string(), exact(3.5));
        let mut factory = VehicleFactory::new(
            BehaviourKind::SimpleFollowing,
            parameters,
            27.78,
            0.0,
            1.5,
        );
        let mut rng = rng_from_seed(42);
        let vehicle = factory.create(&mut rng);
        match &vehicle.behaviour {
            BehaviourModel::SimpleFollowing(model) => assert_eq!(model.safe_time, 3.5),
            other => panic!("Expected a following model, got {:?}", other),
        }
    }

    #[test]
    fn test_vehicle_length_applied() {
        let mut factory =
            VehicleFactory::new(BehaviourKind::Simple, BTreeMap::new(), 27.78, 0.0, 4.2);
        let mut rng = rng_from_seed(42);
        assert_eq!(factory.create(&mut rng).length, 4.2);
    }
}
