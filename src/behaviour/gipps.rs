use crate::agents::{Vehicle, VehicleRef};
use crate::behaviour::behaviour::Behaviour;
use crate::behaviour::lane_changing::{
    is_outside_n_seconds_rule, overtake_if_possible, return_if_possible,
};
use crate::road::{Lane, Road, RoadError};
use crate::utils::rand::{SimRng, normal};

/// Gipps' car-following model.
///
/// The next velocity is the minimum of three candidates: the acceleration
/// candidate `v + a·Δt`, the desired-velocity cap, and the safe velocity
/// `a·Δt + √(a²·Δt² + 2·a·(Δx − s₀) + v_l²)` where `Δx` is the net gap to
/// the leader and `s₀` the comfortable distance. With no leader the gap is
/// infinite and the safe candidate drops out.
///
/// Lane changes follow the same return/overtake procedure as the simple
/// following driver, judged by the n-second rule with the apparent reaction
/// time as `n`.
#[derive(Debug, Clone)]
pub struct GippsModel {
    /// Maximum acceleration `a` (m/s²)
    pub maximum_acceleration: f64,
    /// Maximum deceleration (m/s²); carried with the parameter set although
    /// the velocity rule derives braking from the safe-velocity candidate
    pub maximum_deceleration: f64,
    /// Desired velocity (m/s)
    pub desired_velocity: f64,
    /// Apparent reaction time (s), doubles as `n` in the n-second rule
    pub apparent_reaction_time: f64,
    /// Comfortable distance `s₀` (m)
    pub comfortable_distance: f64,
    /// Deviation of the initial velocity sample (m/s)
    pub initial_velocity_deviation: f64,
    /// The three candidates of the last velocity computation, for diagnostics
    pub last_candidates: Option<[f64; 3]>,
}

impl GippsModel {
    pub fn new(
        maximum_acceleration: f64,
        maximum_deceleration: f64,
        desired_velocity: f64,
        apparent_reaction_time: f64,
    ) -> Self {
        Self {
            maximum_acceleration,
            maximum_deceleration,
            desired_velocity,
            apparent_reaction_time,
            comfortable_distance: 2.0,
            initial_velocity_deviation: 0.5,
            last_candidates: None,
        }
    }

    /// Overrides the comfortable distance `s₀`.
    pub fn with_comfortable_distance(mut self, comfortable_distance: f64) -> Self {
        self.comfortable_distance = comfortable_distance;
        self
    }

    /// Computes the next velocity from the three Gipps candidates.
    ///
    /// # Arguments
    /// * `velocity` - Current velocity (m/s).
    /// * `leading_distance` - Net gap to the leader's rear bumper (m); pass
    ///   `f64::INFINITY` when there is no leader.
    /// * `leading_velocity` - Leader's velocity (m/s); 0 when there is no
    ///   leader.
    /// * `delta_t` - Tick length (s).
    ///
    /// A negative radicand in the safe-velocity term describes a full-stop
    /// scenario and is clamped at zero, as is the final velocity.
    pub fn next_velocity(
        &mut self,
        velocity: f64,
        leading_distance: f64,
        leading_velocity: f64,
        delta_t: f64,
    ) -> f64 {
        let acceleration_candidate = velocity + self.maximum_acceleration * delta_t;
        let desired_candidate = self.desired_velocity;
        let safe_candidate = self.safe_velocity(leading_distance, leading_velocity, delta_t);
        self.last_candidates = Some([acceleration_candidate, desired_candidate, safe_candidate]);
        acceleration_candidate
            .min(desired_candidate)
            .min(safe_candidate)
            .max(0.0)
    }

    /// The safe-velocity candidate:
    /// `a·Δt + √(a²·Δt² + 2·a·(Δx − s₀) + v_l²)`.
    fn safe_velocity(&self, leading_distance: f64, leading_velocity: f64, delta_t: f64) -> f64 {
        let a = self.maximum_acceleration;
        let radicand = a * a * delta_t * delta_t
            + 2.0 * a * (leading_distance - self.comfortable_distance)
            + leading_velocity * leading_velocity;
        a * delta_t + radicand.max(0.0).sqrt()
    }

    /// Applies the Gipps rule against the vehicle's current leader.
    fn apply_update(&mut self, vehicle: &VehicleRef, road: &Road, delta_t: f64) -> Result<(), RoadError> {
        let (id, position, velocity) = {
            let v = vehicle.borrow();
            (v.id, v.position, v.velocity)
        };
        let current = road.current_lane_index(id)?;
        let lead_vehicle = {
            let lane = road.lane(current)?;
            lane.leading_of(&vehicle.borrow())
        };
        let (leading_distance, leading_velocity) = match lead_vehicle {
            Some(lead_vehicle) => {
                let lead = lead_vehicle.borrow();
                ((lead.position - lead.length) - position, lead.velocity)
            }
            None => (f64::INFINITY, 0.0),
        };
        let next = self.next_velocity(velocity, leading_distance, leading_velocity, delta_t);
        vehicle.borrow_mut().velocity = next;
        Ok(())
    }
}

impl Behaviour for GippsModel {
    fn set_initial_velocity(&self, vehicle: &mut Vehicle, rng: &mut SimRng) {
        vehicle.velocity = normal(rng, self.desired_velocity, self.initial_velocity_deviation);
    }

    fn update(
        &mut self,
        vehicle: &VehicleRef,
        road: &mut Road,
        delta_t: f64,
        _rng: &mut SimRng,
    ) -> Result<(), RoadError> {
        if return_if_possible(road, vehicle, self, delta_t)? {
            self.apply_update(vehicle, road, delta_t)?;
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

        if let Some(lead_vehicle) = lead_vehicle {
            let (lead_position, lead_velocity) = {
                let lead = lead_vehicle.borrow();
                (lead.position, lead.velocity)
            };
            if lead_position - position < self.apparent_reaction_time * velocity {
                if overtake_if_possible(road, vehicle, self, delta_t)? {
                    self.apply_update(vehicle, road, delta_t)?;
                } else {
                    vehicle.borrow_mut().velocity = lead_velocity;
                }
                return Ok(());
            }
        }

        self.apply_update(vehicle, road, delta_t)?;
        Ok(())
    }

    fn considers_lane_safe(&self, vehicle: &Vehicle, lane: &Lane, _delta_t: f64) -> bool {
        is_outside_n_seconds_rule(vehicle, lane, self.apparent_reaction_time)
    }
}
