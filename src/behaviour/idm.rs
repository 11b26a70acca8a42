use crate::agents::{Vehicle, VehicleRef};
use crate::behaviour::behaviour::Behaviour;
use crate::behaviour::lane_changing::{
    is_outside_n_seconds_rule, overtake_if_possible, return_if_possible, safe_distance_n_seconds,
};
use crate::road::{Lane, Road, RoadError};
use crate::utils::rand::{SimRng, normal};

/// The Intelligent Driver Model.
///
/// Free-flow acceleration is `a·(1 − (v/v₀)^δ)`; with a leader the desired
/// dynamic gap
/// `s* = s₀ + max(0, v·T + v·(v − v_l) / (2·√(a·b)))`
/// shrinks the acceleration by `(s*/s)²`. The new velocity is
/// `max(0, v + a·Δt)`.
///
/// Lane changes use the shared return/overtake procedure with the time
/// headway `T` as `n` in the n-second rule.
#[derive(Debug, Clone)]
pub struct IdmModel {
    /// Desired velocity `v₀` (m/s)
    pub desired_velocity: f64,
    /// Time headway `T` (s), doubles as `n` in the n-second rule
    pub time_headway: f64,
    /// Maximum acceleration `a` (m/s²)
    pub max_acceleration: f64,
    /// Comfortable braking deceleration `b` (m/s²)
    pub comfortable_braking_deceleration: f64,
    /// Minimum spacing `s₀` (m)
    pub minimum_spacing: f64,
    /// Acceleration exponent `δ`
    pub acceleration_exponent: f64,
    /// Deviation of the initial velocity sample (m/s)
    pub initial_velocity_deviation: f64,
}

impl IdmModel {
    pub fn new(
        desired_velocity: f64,
        time_headway: f64,
        max_acceleration: f64,
        comfortable_braking_deceleration: f64,
        minimum_spacing: f64,
        acceleration_exponent: f64,
    ) -> Self {
        Self {
            desired_velocity,
            time_headway,
            max_acceleration,
            comfortable_braking_deceleration,
            minimum_spacing,
            acceleration_exponent,
            initial_velocity_deviation: 0.5,
        }
    }

    /// Computes the IDM acceleration.
    ///
    /// # Arguments
    /// * `velocity` - Current velocity (m/s).
    /// * `spacing` - `Some((s, v_l))` with the leader's velocity and the raw
    ///   spacing `s = self.position − lead.position`, or `None` without a
    ///   leader.
    ///
    /// A zero spacing would divide by zero; that degenerate case brakes at
    /// the comfortable deceleration instead.
    pub fn acceleration(&self, velocity: f64, spacing: Option<(f64, f64)>) -> f64 {
        let free_term =
            1.0 - (velocity / self.desired_velocity).powf(self.acceleration_exponent);

        let Some((net_distance, leading_velocity)) = spacing else {
            // No leading vehicle, accelerate toward the desired velocity
            return self.max_acceleration * free_term;
        };

        let dynamic_gap = velocity * self.time_headway
            + velocity * (velocity - leading_velocity)
                / (2.0
                    * (self.max_acceleration * self.comfortable_braking_deceleration).sqrt());
        let desired_gap = self.minimum_spacing + dynamic_gap.max(0.0);

        let ratio = desired_gap / net_distance;
        if !ratio.is_finite() {
            return -self.comfortable_braking_deceleration;
        }

        self.max_acceleration * (free_term - ratio * ratio)
    }

    /// Applies `v ← max(0, v + a·Δt)` against the vehicle's current leader.
    fn apply_update(&self, vehicle: &VehicleRef, road: &Road, delta_t: f64) -> Result<(), RoadError> {
        let (id, position, velocity) = {
            let v = vehicle.borrow();
            (v.id, v.position, v.velocity)
        };
        let current = road.current_lane_index(id)?;
        let lead_vehicle = {
            let lane = road.lane(current)?;
            lane.leading_of(&vehicle.borrow())
        };
        let spacing = lead_vehicle.map(|lead_vehicle| {
            let lead = lead_vehicle.borrow();
            (position - lead.position, lead.velocity)
        });
        let acceleration = self.acceleration(velocity, spacing);
        vehicle.borrow_mut().velocity = (velocity + acceleration * delta_t).max(0.0);
        Ok(())
    }
}

impl Behaviour for IdmModel {
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

        let (id, position) = {
            let v = vehicle.borrow();
            (v.id, v.position)
        };
        let current = road.current_lane_index(id)?;
        let lead_vehicle = {
            let lane = road.lane(current)?;
            lane.leading_of(&vehicle.borrow())
        };

        // Now check if the vehicle is too close to the leading vehicle
        if let Some(lead_vehicle) = lead_vehicle {
            let lead_position = lead_vehicle.borrow().position;
            let save_distance = safe_distance_n_seconds(&vehicle.borrow(), self.time_headway);
            if lead_position - position < save_distance
                && overtake_if_possible(road, vehicle, self, delta_t)?
            {
                self.apply_update(vehicle, road, delta_t)?;
                return Ok(());
            }
        }

        self.apply_update(vehicle, road, delta_t)?;
        Ok(())
    }

    fn considers_lane_safe(&self, vehicle: &Vehicle, lane: &Lane, _delta_t: f64) -> bool {
        is_outside_n_seconds_rule(vehicle, lane, self.time_headway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_model() -> IdmModel {
        IdmModel::new(30.0, 1.5, 2.0, 3.0, 2.0, 4.0)
    }

    #[test]
    fn test_free_flow_acceleration() {
        let model = reference_model();
        let a = model.acceleration(20.0, None);
        let expected = 2.0 * (1.0 - (20.0_f64 / 30.0).powi(4));
        assert!((a - expected).abs() < 1e-12);
    }

    #[test]
    fn test_acceleration_vanishes_at_desired_velocity() {
        let model = reference_model();
        let a = model.acceleration(30.0, None);
        assert!(
            a.abs() < 1e-12,
            "At the desired velocity free-flow acceleration must be 0, got {}",
            a
        );
    }

    #[test]
    fn test_leader_at_twenty_meters() {
        // Leader 20 m ahead, both at 20 m/s: s* = 2 + 20 * 1.5 = 32,
        // a = 2 * (1 - (20/30)^4 - (32/20)^2) ≈ -3.515
        let model = reference_model();
        let a = model.acceleration(20.0, Some((-20.0, 20.0)));
        assert!(
            (a - (-3.515_06)).abs() < 1e-3,
            "Expected roughly -3.515 m/s^2, got {}",
            a
        );
    }

    #[test]
    fn test_zero_spacing_brakes_comfortably() {
        let model = reference_model();
        let a = model.acceleration(20.0, Some((0.0, 20.0)));
        assert_eq!(
            a, -3.0,
            "Degenerate spacing must clamp the acceleration at -b"
        );
    }

    #[test]
    fn test_update_never_goes_negative() {
        use crate::agents::Vehicle;
        use crate::utils::rand::rng_from_seed;

        let mut road = Road::with_lanes(500.0, 1);
        let leader = Vehicle::new(1)
            .with_position(41.0)
            .with_velocity(0.0)
            .build_ref();
        let follower = Vehicle::new(2)
            .with_position(40.0)
            .with_velocity(2.0)
            .build_ref();
        road.add_vehicle(leader, 0).unwrap();
        road.add_vehicle(follower.clone(), 0).unwrap();

        let mut model = reference_model();
        let mut rng = rng_from_seed(1);
        for _ in 0..50 {
            model.update(&follower, &mut road, 0.1, &mut rng).unwrap();
            assert!(
                follower.borrow().velocity >= 0.0,
                "Velocity must stay nonnegative"
            );
        }
    }
}
