use crate::agents::{Vehicle, VehicleRef};
use crate::road::{Lane, Road, RoadError};
use crate::utils::rand::SimRng;
use crate::utils::units::kmh_to_ms;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

use super::gipps::GippsModel;
use super::idm::IdmModel;
use super::simple::{SimpleFollowingExtendedModel, SimpleFollowingModel, SimpleModel};

/// Car-following policy of a single driver.
///
/// Every model exposes three capabilities: sampling the initial velocity at
/// construction, the per-tick update (which writes the next velocity and may
/// request a lane change through the shared helpers), and the safety
/// predicate consulted by those helpers.
///
/// The simulation driver computes no accelerations, no safety margins and no
/// lane choices itself; all policy lives behind this interface.
pub trait Behaviour {
    /// Sets the vehicle's velocity at construction time, typically by
    /// sampling a normal distribution around the model's desired velocity.
    fn set_initial_velocity(&self, vehicle: &mut Vehicle, rng: &mut SimRng);

    /// Per-tick hook. Inspects the vehicle's lane and neighbors through the
    /// road, may move the vehicle laterally via the lane-change helpers, and
    /// writes the vehicle's next velocity (never below zero).
    fn update(
        &mut self,
        vehicle: &VehicleRef,
        road: &mut Road,
        delta_t: f64,
        rng: &mut SimRng,
    ) -> Result<(), RoadError>;

    /// Whether the model considers the candidate lane safe to move into.
    fn considers_lane_safe(&self, vehicle: &Vehicle, lane: &Lane, delta_t: f64) -> bool;
}

/// The closed set of car-following models shipped with the simulator.
///
/// Dispatch is a direct `match` per vehicle per tick; the enum also
/// implements [`Behaviour`] by delegation so generic code can treat all
/// models uniformly.
#[derive(Debug, Clone)]
pub enum BehaviourModel {
    Simple(SimpleModel),
    SimpleFollowing(SimpleFollowingModel),
    SimpleFollowingExtended(SimpleFollowingExtendedModel),
    Gipps(GippsModel),
    Idm(IdmModel),
}

impl BehaviourModel {
    /// The kind tag of this model.
    pub fn kind(&self) -> BehaviourKind {
        match self {
            BehaviourModel::Simple(_) => BehaviourKind::Simple,
            BehaviourModel::SimpleFollowing(_) => BehaviourKind::SimpleFollowing,
            BehaviourModel::SimpleFollowingExtended(_) => BehaviourKind::SimpleFollowingExtended,
            BehaviourModel::Gipps(_) => BehaviourKind::Gipps,
            BehaviourModel::Idm(_) => BehaviourKind::IntelligentDriver,
        }
    }
}

impl Default for BehaviourModel {
    fn default() -> Self {
        BehaviourModel::Simple(SimpleModel::new(kmh_to_ms(100.0)))
    }
}

impl Behaviour for BehaviourModel {
    fn set_initial_velocity(&self, vehicle: &mut Vehicle, rng: &mut SimRng) {
        match self {
            BehaviourModel::Simple(m) => m.set_initial_velocity(vehicle, rng),
            BehaviourModel::SimpleFollowing(m) => m.set_initial_velocity(vehicle, rng),
            BehaviourModel::SimpleFollowingExtended(m) => m.set_initial_velocity(vehicle, rng),
            BehaviourModel::Gipps(m) => m.set_initial_velocity(vehicle, rng),
            BehaviourModel::Idm(m) => m.set_initial_velocity(vehicle, rng),
        }
    }

    fn update(
        &mut self,
        vehicle: &VehicleRef,
        road: &mut Road,
        delta_t: f64,
        rng: &mut SimRng,
    ) -> Result<(), RoadError> {
        match self {
            BehaviourModel::Simple(m) => m.update(vehicle, road, delta_t, rng),
            BehaviourModel::SimpleFollowing(m) => m.update(vehicle, road, delta_t, rng),
            BehaviourModel::SimpleFollowingExtended(m) => m.update(vehicle, road, delta_t, rng),
            BehaviourModel::Gipps(m) => m.update(vehicle, road, delta_t, rng),
            BehaviourModel::Idm(m) => m.update(vehicle, road, delta_t, rng),
        }
    }

    fn considers_lane_safe(&self, vehicle: &Vehicle, lane: &Lane, delta_t: f64) -> bool {
        match self {
            BehaviourModel::Simple(m) => m.considers_lane_safe(vehicle, lane, delta_t),
            BehaviourModel::SimpleFollowing(m) => m.considers_lane_safe(vehicle, lane, delta_t),
            BehaviourModel::SimpleFollowingExtended(m) => {
                m.considers_lane_safe(vehicle, lane, delta_t)
            }
            BehaviourModel::Gipps(m) => m.considers_lane_safe(vehicle, lane, delta_t),
            BehaviourModel::Idm(m) => m.considers_lane_safe(vehicle, lane, delta_t),
        }
    }
}

/// One entry of a model's standard parameter table: display label, the
/// configuration key, the default mean and the unit.
#[derive(Debug, Clone, Copy)]
pub struct StandardParameter {
    pub label: &'static str,
    pub key: &'static str,
    pub default: f64,
    pub unit: &'static str,
}

const SIMPLE_PARAMETERS: &[StandardParameter] = &[
    StandardParameter {
        label: "Initial Velocity Deviation",
        key: "initial_velocity_deviation",
        default: 4.0 / 3.6,
        unit: "m/s",
    },
    StandardParameter {
        label: "Update Velocity Deviation",
        key: "update_velocity_deviation",
        default: 1.0 / 3.6,
        unit: "m/s",
    },
];

const SIMPLE_FOLLOWING_PARAMETERS: &[StandardParameter] = &[
    StandardParameter {
        label: "Initial Velocity Deviation",
        key: "initial_velocity_deviation",
        default: 4.0 / 3.6,
        unit: "m/s",
    },
    StandardParameter {
        label: "Update Velocity Deviation",
        key: "update_velocity_deviation",
        default: 1.0 / 3.6,
        unit: "m/s",
    },
    StandardParameter {
        label: "Save Time",
        key: "save_time",
        default: 2.0,
        unit: "s",
    },
];

const GIPPS_PARAMETERS: &[StandardParameter] = &[
    StandardParameter {
        label: "Max Acceleration",
        key: "maximum_acceleration",
        default: 2.0,
        unit: "m/s^2",
    },
    StandardParameter {
        label: "Max Deceleration",
        key: "maximum_deceleration",
        default: 4.0,
        unit: "m/s^2",
    },
    StandardParameter {
        label: "Apparent Reaction Time",
        key: "apparent_reaction_time",
        default: 2.0,
        unit: "s",
    },
    StandardParameter {
        label: "Comfortable Distance",
        key: "comfortable_distance",
        default: 2.0,
        unit: "m",
    },
];

const IDM_PARAMETERS: &[StandardParameter] = &[
    StandardParameter {
        label: "Time Headway",
        key: "time_headway",
        default: 1.5,
        unit: "s",
    },
    StandardParameter {
        label: "Max Acceleration",
        key: "max_acceleration",
        default: 2.0,
        unit: "m/s^2",
    },
    StandardParameter {
        label: "Comfortable Braking Deceleration",
        key: "comfortable_braking_deceleration",
        default: 3.0,
        unit: "m/s^2",
    },
    StandardParameter {
        label: "Minimum Spacing",
        key: "minimum_spacing",
        default: 2.0,
        unit: "m",
    },
    StandardParameter {
        label: "Acceleration Exponent",
        key: "acceleration_exponent",
        default: 4.0,
        unit: "",
    },
];

/// Identifies a car-following model without carrying its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviourKind {
    Simple,
    SimpleFollowing,
    SimpleFollowingExtended,
    Gipps,
    IntelligentDriver,
}

lazy_static! {
    /// Configuration-document model names → kind.
    static ref MODEL_NAMES: HashMap<&'static str, BehaviourKind> = {
        let mut names = HashMap::new();
        names.insert("Simple Model", BehaviourKind::Simple);
        names.insert("Simple Following Model", BehaviourKind::SimpleFollowing);
        names.insert(
            "Simple Following Extended Model",
            BehaviourKind::SimpleFollowingExtended,
        );
        names.insert("Gipps Model", BehaviourKind::Gipps);
        names.insert("Intelligent Driver Model", BehaviourKind::IntelligentDriver);
        names
    };
}

impl BehaviourKind {
    /// Resolves a configuration-document model name.
    ///
    /// # Example
    /// ```rust
    /// use multilane_traffic_sim_core::behaviour::BehaviourKind;
    ///
    /// assert_eq!(
    ///     BehaviourKind::from_name("Gipps Model"),
    ///     Some(BehaviourKind::Gipps)
    /// );
    /// assert_eq!(BehaviourKind::from_name("Nagel-Schreckenberg"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        MODEL_NAMES.get(name).copied()
    }

    /// The configuration-document name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            BehaviourKind::Simple => "Simple Model",
            BehaviourKind::SimpleFollowing => "Simple Following Model",
            BehaviourKind::SimpleFollowingExtended => "Simple Following Extended Model",
            BehaviourKind::Gipps => "Gipps Model",
            BehaviourKind::IntelligentDriver => "Intelligent Driver Model",
        }
    }

    /// The standard parameter table of this kind: configuration keys, default
    /// means and units.
    pub fn standard_parameters(&self) -> &'static [StandardParameter] {
        match self {
            BehaviourKind::Simple => SIMPLE_PARAMETERS,
            BehaviourKind::SimpleFollowing | BehaviourKind::SimpleFollowingExtended => {
                SIMPLE_FOLLOWING_PARAMETERS
            }
            BehaviourKind::Gipps => GIPPS_PARAMETERS,
            BehaviourKind::IntelligentDriver => IDM_PARAMETERS,
        }
    }

    /// Default mean for a parameter key, if the kind knows it.
    pub fn standard_default(&self, key: &str) -> Option<f64> {
        self.standard_parameters()
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.default)
    }
}

impl fmt::Display for BehaviourKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_registry() {
        assert_eq!(
            BehaviourKind::from_name("Simple Model"),
            Some(BehaviourKind::Simple)
        );
        assert_eq!(
            BehaviourKind::from_name("Simple Following Model"),
            Some(BehaviourKind::SimpleFollowing)
        );
        assert_eq!(
            BehaviourKind::from_name("Simple Following Extended Model"),
            Some(BehaviourKind::SimpleFollowingExtended)
        );
        assert_eq!(
            BehaviourKind::from_name("Gipps Model"),
            Some(BehaviourKind::Gipps)
        );
        assert_eq!(
            BehaviourKind::from_name("Intelligent Driver Model"),
            Some(BehaviourKind::IntelligentDriver)
        );
        assert_eq!(
            BehaviourKind::from_name("Krauss Model"),
            None,
            "Unknown model names must not resolve"
        );
    }

    #[test]
    fn test_name_round_trip() {
        for kind in [
            BehaviourKind::Simple,
            BehaviourKind::SimpleFollowing,
            BehaviourKind::SimpleFollowingExtended,
            BehaviourKind::Gipps,
            BehaviourKind::IntelligentDriver,
        ] {
            assert_eq!(BehaviourKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_standard_defaults() {
        assert_eq!(
            BehaviourKind::IntelligentDriver.standard_default("time_headway"),
            Some(1.5)
        );
        assert_eq!(
            BehaviourKind::Gipps.standard_default("comfortable_distance"),
            Some(2.0)
        );
        assert_eq!(BehaviourKind::Simple.standard_default("save_time"), None);
    }

    #[test]
    fn test_model_kind() {
        let model = BehaviourModel::default();
        assert_eq!(model.kind(), BehaviourKind::Simple);
    }
}
