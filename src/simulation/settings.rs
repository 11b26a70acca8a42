use crate::behaviour::BehaviourKind;
use crate::collector::TravelTimeFormat;
use crate::spawning::{LaneDistributionKind, SpawnProcess};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Custom error types for configuration validation.
///
/// All of these are fatal before the first tick.
#[derive(Debug, Clone)]
pub enum SettingsError {
    UnknownBehaviourModel(String),
    UnknownSpawnProcess(String),
    UnknownLaneDistribution(String),
    UnknownTravelTimeFormat(String),
    NegativeSpawnRate(f64),
    ZeroLanes,
    NonPositiveTimeStep(f64),
    NonPositiveRoadLength(f64),
    NegativeDuration(f64),
    NegativeDeviation { parameter: String, value: f64 },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::UnknownBehaviourModel(name) => {
                write!(f, "Unknown behavior model name: '{}'", name)
            }
            SettingsError::UnknownSpawnProcess(name) => {
                write!(f, "Unknown spawn process: '{}'", name)
            }
            SettingsError::UnknownLaneDistribution(name) => {
                write!(f, "Unknown lane distribution: '{}'", name)
            }
            SettingsError::UnknownTravelTimeFormat(name) => {
                write!(f, "Unknown travel time format: '{}'", name)
            }
            SettingsError::NegativeSpawnRate(rate) => {
                write!(f, "Spawn rate must be nonnegative, got {}", rate)
            }
            SettingsError::ZeroLanes => {
                write!(f, "The road needs at least one lane")
            }
            SettingsError::NonPositiveTimeStep(step) => {
                write!(f, "Time step must be positive, got {}", step)
            }
            SettingsError::NonPositiveRoadLength(length) => {
                write!(f, "Road length must be positive, got {}", length)
            }
            SettingsError::NegativeDuration(duration) => {
                write!(f, "Duration must be nonnegative, got {}", duration)
            }
            SettingsError::NegativeDeviation { parameter, value } => {
                write!(
                    f,
                    "Deviation of '{}' must be nonnegative, got {}",
                    parameter, value
                )
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Run identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSettings {
    pub id: String,
    pub description: String,
}

/// Road geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadSettings {
    /// Total length (meters)
    pub length: f64,
    /// Number of lanes
    pub lanes: usize,
}

/// Clock parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSettings {
    /// Tick length (seconds)
    pub time_step: f64,
    /// Total simulated time (seconds)
    pub duration: f64,
}

/// Spawn process parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSettings {
    /// `"poisson"` or `"equal"`
    pub process: String,
    pub cars_per_second: f64,
}

/// Mean and deviation of one Gaussian-sampled model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSettings {
    pub mu: f64,
    pub sigma: f64,
}

/// Vehicle template: the behaviour model with its parameter distributions,
/// the desired-velocity distribution and the physical length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSettings {
    /// `[model_name, {parameter: {mu, sigma}, ...}]`
    pub behavior: (String, BTreeMap<String, ParameterSettings>),
    /// `[desired_velocity_mu, desired_velocity_sigma]` (m/s)
    pub behavior_settings: (f64, f64),
    /// Physical length (meters)
    pub length: f64,
}

/// Wall-clock statistics appended by the collector on finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSettings {
    /// Ticks executed
    pub steps: u64,
    /// Wall-clock runtime (seconds)
    pub runtime: f64,
}

/// The full configuration document of one run.
///
/// External collaborators produce this document (usually as JSON); the core
/// validates it, runs it, and writes it back verbatim into the output
/// directory with a `process` block appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub name: NameSettings,
    pub road: RoadSettings,
    pub simulation: TimeSettings,
    pub spawn: SpawnSettings,
    pub vehicle: VehicleSettings,
    pub lane_distribution: String,
    /// Optional `travel_times.csv` schema selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_time_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessSettings>,
}

impl SimulationSettings {
    /// Parses a JSON configuration document.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    /// The resolved behaviour model kind.
    pub fn behaviour_kind(&self) -> Result<BehaviourKind, SettingsError> {
        BehaviourKind::from_name(&self.vehicle.behavior.0)
            .ok_or_else(|| SettingsError::UnknownBehaviourModel(self.vehicle.behavior.0.clone()))
    }

    /// The resolved spawn process.
    pub fn spawn_process(&self) -> Result<SpawnProcess, SettingsError> {
        SpawnProcess::parse(&self.spawn.process)
            .ok_or_else(|| SettingsError::UnknownSpawnProcess(self.spawn.process.clone()))
    }

    /// The resolved lane distribution kind.
    pub fn lane_distribution_kind(&self) -> Result<LaneDistributionKind, SettingsError> {
        LaneDistributionKind::parse(&self.lane_distribution)
            .ok_or_else(|| SettingsError::UnknownLaneDistribution(self.lane_distribution.clone()))
    }

    /// The resolved travel-time schema; absent means [`TravelTimeFormat::Simple`].
    pub fn travel_time_format(&self) -> Result<TravelTimeFormat, SettingsError> {
        match &self.travel_time_format {
            None => Ok(TravelTimeFormat::Simple),
            Some(name) => TravelTimeFormat::parse(name)
                .ok_or_else(|| SettingsError::UnknownTravelTimeFormat(name.clone())),
        }
    }

    /// Number of ticks a run of this configuration executes.
    pub fn steps(&self) -> u64 {
        (self.simulation.duration / self.simulation.time_step).floor() as u64
    }

    /// Checks the whole document; any violation is fatal before the first
    /// tick.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.behaviour_kind()?;
        self.spawn_process()?;
        self.lane_distribution_kind()?;
        self.travel_time_format()?;
        if self.road.lanes == 0 {
            return Err(SettingsError::ZeroLanes);
        }
        if !(self.road.length > 0.0) {
            return Err(SettingsError::NonPositiveRoadLength(self.road.length));
        }
        if !(self.simulation.time_step > 0.0) {
            return Err(SettingsError::NonPositiveTimeStep(self.simulation.time_step));
        }
        if self.simulation.duration < 0.0 {
            return Err(SettingsError::NegativeDuration(self.simulation.duration));
        }
        if self.spawn.cars_per_second < 0.0 {
            return Err(SettingsError::NegativeSpawnRate(self.spawn.cars_per_second));
        }
        if self.vehicle.behavior_settings.1 < 0.0 {
            return Err(SettingsError::NegativeDeviation {
                parameter: "behavior_settings".to_string(),
                value: self.vehicle.behavior_settings.1,
            });
        }
        for (parameter, spec) in &self.vehicle.behavior.1 {
            if spec.sigma < 0.0 {
                return Err(SettingsError::NegativeDeviation {
                    parameter: parameter.clone(),
                    value: spec.sigma,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_document() -> String {
        r#"{
            "name": {"id": "idm_test", "description": "IDM reference run"},
            "road": {"length": 5000.0, "lanes": 3},
            "simulation": {"time_step": 0.1, "duration": 3600.0},
            "spawn": {"process": "poisson", "cars_per_second": 0.3},
            "vehicle": {
                "behavior": ["Intelligent Driver Model", {
                    "time_headway": {"mu": 1.5, "sigma": 0.15},
                    "max_acceleration": {"mu": 2.0, "sigma": 0.2},
                    "comfortable_braking_deceleration": {"mu": 3.0, "sigma": 0.2},
                    "minimum_spacing": {"mu": 2.0, "sigma": 0.2},
                    "acceleration_exponent": {"mu": 4.0, "sigma": 0.2}
                }],
                "behavior_settings": [27.78, 2.78],
                "length": 1.5
            },
            "lane_distribution": "triangle"
        }"#
        .to_string()
    }

    #[test]
    fn test_parse_reference_document() {
        let settings = SimulationSettings::from_json(&reference_document()).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.name.id, "idm_test");
        assert_eq!(settings.road.lanes, 3);
        assert_eq!(
            settings.behaviour_kind().unwrap(),
            BehaviourKind::IntelligentDriver
        );
        assert_eq!(settings.spawn_process().unwrap(), SpawnProcess::Poisson);
        assert_eq!(
            settings.lane_distribution_kind().unwrap(),
            LaneDistributionKind::Triangle
        );
        assert_eq!(settings.steps(), 36000);
        assert_eq!(
            settings.vehicle.behavior.1["time_headway"],
            ParameterSettings { mu: 1.5, sigma: 0.15 }
        );
    }

    #[test]
    fn test_round_trip() {
        let settings = SimulationSettings::from_json(&reference_document()).unwrap();
        let serialized = serde_json::to_string(&settings).unwrap();
        let reparsed = SimulationSettings::from_json(&serialized).unwrap();
        assert_eq!(settings, reparsed, "Serialization must round-trip");
    }

    #[test]
    fn test_process_block_round_trip() {
        let mut settings = SimulationSettings::from_json(&reference_document()).unwrap();
        settings.process = Some(ProcessSettings {
            steps: 36000,
            runtime: 12.5,
        });
        let serialized = serde_json::to_string(&settings).unwrap();
        let reparsed = SimulationSettings::from_json(&serialized).unwrap();
        assert_eq!(reparsed.process.unwrap().steps, 36000);
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let mut settings = SimulationSettings::from_json(&reference_document()).unwrap();
        settings.vehicle.behavior.0 = "Wiedemann Model".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::UnknownBehaviourModel(_))
        ));
    }

    #[test]
    fn test_unknown_process_is_rejected() {
        let mut settings = SimulationSettings::from_json(&reference_document()).unwrap();
        settings.spawn.process = "exponential".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::UnknownSpawnProcess(_))
        ));
    }

    #[test]
    fn test_zero_lanes_is_rejected() {
        let mut settings = SimulationSettings::from_json(&reference_document()).unwrap();
        settings.road.lanes = 0;
        assert!(matches!(settings.validate(), Err(SettingsError::ZeroLanes)));
    }

    #[test]
    fn test_non_positive_time_step_is_rejected() {
        let mut settings = SimulationSettings::from_json(&reference_document()).unwrap();
        settings.simulation.time_step = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::NonPositiveTimeStep(_))
        ));
    }

    #[test]
    fn test_negative_rate_is_rejected() {
        let mut settings = SimulationSettings::from_json(&reference_document()).unwrap();
        settings.spawn.cars_per_second = -1.0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::NegativeSpawnRate(_))
        ));
    }

    #[test]
    fn test_negative_sigma_is_rejected() {
        let mut settings = SimulationSettings::from_json(&reference_document()).unwrap();
        settings
            .vehicle
            .behavior
            .1
            .insert("time_headway".to_string(), ParameterSettings { mu: 1.5, sigma: -0.1 });
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::NegativeDeviation { .. })
        ));
    }

    #[test]
    fn test_travel_time_format_selection() {
        let mut settings = SimulationSettings::from_json(&reference_document()).unwrap();
        assert_eq!(
            settings.travel_time_format().unwrap(),
            TravelTimeFormat::Simple
        );
        settings.travel_time_format = Some("timestamped".to_string());
        assert_eq!(
            settings.travel_time_format().unwrap(),
            TravelTimeFormat::Timestamped
        );
        settings.travel_time_format = Some("fancy".to_string());
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::UnknownTravelTimeFormat(_))
        ));
    }
}
