use crate::agents::{Vehicle, VehicleRef};
use crate::behaviour::behaviour::Behaviour;
use crate::behaviour::lane_changing::{
    is_outside_n_seconds_rule, overtake_if_possible, return_if_possible,
};
use crate::log_detailed;
use crate::road::{Lane, Road, RoadError};
use crate::utils::rand::{SimRng, normal};
use crate::verbose::EVENT_LANE_CHANGE;

/// Gaussian random-walk driver.
///
/// Each tick the velocity becomes `max(0, N(v, σ_update))`. The model never
/// looks at a leader and never changes lanes; it is the baseline the
/// following variants build on.
#[derive(Debug, Clone)]
pub struct SimpleModel {
    /// Steady-state velocity the driver targets in free flow (m/s)
    pub desired_velocity: f64,
    /// Deviation of the initial velocity sample (m/s)
    pub initial_velocity_deviation: f64,
    /// Deviation of the per-tick velocity walk (m/s)
    pub update_velocity_deviation: f64,
}

impl SimpleModel {
    /// Creates the model with the default deviations (4/3.6 and 1/3.6 m/s).
    pub fn new(desired_velocity: f64) -> Self {
        Self {
            desired_velocity,
            initial_velocity_deviation: 4.0 / 3.6,
            update_velocity_deviation: 1.0 / 3.6,
        }
    }

    /// Overrides both velocity deviations.
    pub fn with_deviations(mut self, initial: f64, update: f64) -> Self {
        self.initial_velocity_deviation = initial;
        self.update_velocity_deviation = update;
        self
    }

    /// Applies the Gaussian velocity walk, clamped at zero.
    pub(crate) fn apply_update(&self, vehicle: &VehicleRef, rng: &mut SimRng) {
        let mut v = vehicle.borrow_mut();
        v.velocity = normal(rng, v.velocity, self.update_velocity_deviation).max(0.0);
    }
}

impl Behaviour for SimpleModel {
    fn set_initial_velocity(&self, vehicle: &mut Vehicle, rng: &mut SimRng) {
        vehicle.velocity = normal(rng, self.desired_velocity, self.initial_velocity_deviation);
    }

    fn update(
        &mut self,
        vehicle: &VehicleRef,
        _road: &mut Road,
        _delta_t: f64,
        rng: &mut SimRng,
    ) -> Result<(), RoadError> {
        self.apply_update(vehicle, rng);
        Ok(())
    }

    /// The simple driver never leaves its lane.
    fn considers_lane_safe(&self, _vehicle: &Vehicle, _lane: &Lane, _delta_t: f64) -> bool {
        false
    }
}

/// Gaussian random-walk driver with leader awareness and lane changes.
///
/// Per tick: return to the slower lane when safe; otherwise, when the gap to
/// the leader is below `safe_time · velocity`, overtake when safe or match
/// the leader's velocity; in free flow apply the base Gaussian walk.
#[derive(Debug, Clone)]
pub struct SimpleFollowingModel {
    pub base: SimpleModel,
    /// Temporal safety margin for the n-second rule (s)
    pub safe_time: f64,
}

impl SimpleFollowingModel {
    pub fn new(desired_velocity: f64, safe_time: f64) -> Self {
        Self {
            base: SimpleModel::new(desired_velocity),
            safe_time,
        }
    }

    /// Overrides both velocity deviations.
    pub fn with_deviations(mut self, initial: f64, update: f64) -> Self {
        self.base = self.base.with_deviations(initial, update);
        self
    }
}

impl Behaviour for SimpleFollowingModel {
    fn set_initial_velocity(&self, vehicle: &mut Vehicle, rng: &mut SimRng) {
        self.base.set_initial_velocity(vehicle, rng);
    }

    fn update(
        &mut self,
        vehicle: &VehicleRef,
        road: &mut Road,
        delta_t: f64,
        rng: &mut SimRng,
    ) -> Result<(), RoadError> {
        if return_if_possible(road, vehicle, self, delta_t)? {
            self.base.apply_update(vehicle, rng);
            return Ok(());
        }

        let (id, position, velocity) = {
            let v = vehicle.borrow();
            (v.id, v.position, v.velocity)
        };
        let current = road.current_lane_index(id)?;
        let lead_vehicle = {
            let lane = road.lane(current)?;
            lane.leading_of(&vehicle.borrow())
        };

        // Now check if the vehicle is too close to the leading vehicle
        if let Some(lead_vehicle) = lead_vehicle {
            let (lead_position, lead_velocity) = {
                let lead = lead_vehicle.borrow();
                (lead.position, lead.velocity)
            };
            if lead_position - position < self.safe_time * velocity {
                if overtake_if_possible(road, vehicle, self, delta_t)? {
                    self.base.apply_update(vehicle, rng);
                } else {
                    // Too close and nowhere to go: match the leader
                    vehicle.borrow_mut().velocity = lead_velocity;
                }
                return Ok(());
            }
        }

        self.base.apply_update(vehicle, rng);
        Ok(())
    }

    fn considers_lane_safe(&self, vehicle: &Vehicle, lane: &Lane, _delta_t: f64) -> bool {
        is_outside_n_seconds_rule(vehicle, lane, self.safe_time)
    }
}

/// Variant of [`SimpleFollowingModel`] with a pull toward the desired
/// velocity and smoother braking.
///
/// Differences from the plain following model:
/// - returning to the slower lane requires a gap of `1.5 × safe_time`
///   seconds, so returning is harder than staying;
/// - the free-flow update is `0.99 · N(v, σ_update) + 0.01 · v_desired`,
///   clamped at zero;
/// - when blocked without an overtaking option the velocity decays toward
///   the leader: `min(v · 0.9^Δt, v_lead)`.
#[derive(Debug, Clone)]
pub struct SimpleFollowingExtendedModel {
    pub base: SimpleModel,
    /// Temporal safety margin for the n-second rule (s)
    pub safe_time: f64,
}

impl SimpleFollowingExtendedModel {
    pub fn new(desired_velocity: f64, safe_time: f64) -> Self {
        Self {
            base: SimpleModel::new(desired_velocity),
            safe_time,
        }
    }

    /// Overrides both velocity deviations.
    pub fn with_deviations(mut self, initial: f64, update: f64) -> Self {
        self.base = self.base.with_deviations(initial, update);
        self
    }

    /// Free-flow update: Gaussian walk with a slow pull toward the desired
    /// velocity, clamped at zero.
    fn apply_drift_update(&self, vehicle: &VehicleRef, rng: &mut SimRng) {
        let mut v = vehicle.borrow_mut();
        let walked = normal(rng, v.velocity, self.base.update_velocity_deviation);
        v.velocity = (0.99 * walked + 0.01 * self.base.desired_velocity).max(0.0);
    }
}

impl Behaviour for SimpleFollowingExtendedModel {
    fn set_initial_velocity(&self, vehicle: &mut Vehicle, rng: &mut SimRng) {
        self.base.set_initial_velocity(vehicle, rng);
    }

    fn update(
        &mut self,
        vehicle: &VehicleRef,
        road: &mut Road,
        delta_t: f64,
        rng: &mut SimRng,
    ) -> Result<(), RoadError> {
        let (id, position, velocity) = {
            let v = vehicle.borrow();
            (v.id, v.position, v.velocity)
        };
        let current = road.current_lane_index(id)?;

        // Returning needs a larger gap than staying: the effective safe time
        // for this check alone is 1.5x the configured one.
        if current > 0 {
            let safe = {
                let previous_lane = road.lane(current - 1)?;
                is_outside_n_seconds_rule(&vehicle.borrow(), previous_lane, 1.5 * self.safe_time)
            };
            if safe {
                road.change_lane(vehicle, current - 1, Some(current))?;
                log_detailed!(
                    EVENT_LANE_CHANGE,
                    "Vehicle returned to a slower lane",
                    vehicle_id = id,
                    from_lane = current,
                    to_lane = current - 1
                );
                self.apply_drift_update(vehicle, rng);
                return Ok(());
            }
        }

        let lead_vehicle = {
            let lane = road.lane(current)?;
            lane.leading_of(&vehicle.borrow())
        };

        if let Some(lead_vehicle) = lead_vehicle {
            let (lead_position, lead_velocity) = {
                let lead = lead_vehicle.borrow();
                (lead.position, lead.velocity)
            };
            if lead_position - position < self.safe_time * velocity {
                if overtake_if_possible(road, vehicle, self, delta_t)? {
                    self.apply_drift_update(vehicle, rng);
                } else {
                    // Decay multiplicatively toward the leader
                    let mut v = vehicle.borrow_mut();
                    v.velocity = (v.velocity * 0.9_f64.powf(delta_t)).min(lead_velocity);
                }
                return Ok(());
            }
        }

        self.apply_drift_update(vehicle, rng);
        Ok(())
    }

    fn considers_lane_safe(&self, vehicle: &Vehicle, lane: &Lane, _delta_t: f64) -> bool {
        is_outside_n_seconds_rule(vehicle, lane, self.safe_time)
    }
}
