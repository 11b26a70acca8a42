use crate::agents::{Vehicle, VehicleRef};
use crate::behaviour::behaviour::Behaviour;
use crate::log_detailed;
use crate::road::{Lane, Road, RoadError};
use crate::verbose::EVENT_LANE_CHANGE;

/// Moves the vehicle one lane leftwards (higher index) if its behaviour model
/// considers that lane safe.
///
/// Returns `false` without touching the road when there is no lane above the
/// current one or when the model rejects the gap.
pub fn overtake_if_possible<B: Behaviour + ?Sized>(
    road: &mut Road,
    vehicle: &VehicleRef,
    model: &B,
    delta_t: f64,
) -> Result<bool, RoadError> {
    let (id, current) = {
        let id = vehicle.borrow().id;
        (id, road.current_lane_index(id)?)
    };

    // If there is no next lane, we cannot overtake
    if !road.has_lane(current + 1) {
        return Ok(false);
    }

    let safe = {
        let next_lane = road.lane(current + 1)?;
        model.considers_lane_safe(&vehicle.borrow(), next_lane, delta_t)
    };
    if !safe {
        return Ok(false);
    }

    road.change_lane(vehicle, current + 1, Some(current))?;
    log_detailed!(
        EVENT_LANE_CHANGE,
        "Vehicle moved to the overtaking lane",
        vehicle_id = id,
        from_lane = current,
        to_lane = current + 1
    );
    Ok(true)
}

/// Moves the vehicle one lane rightwards (lower index) if its behaviour model
/// considers that lane safe.
///
/// Returns `false` when the vehicle already drives in lane 0 or when the
/// model rejects the gap. Behaviour models check this before anything else
/// each tick, so vehicles drift back to slower lanes whenever it is safe.
pub fn return_if_possible<B: Behaviour + ?Sized>(
    road: &mut Road,
    vehicle: &VehicleRef,
    model: &B,
    delta_t: f64,
) -> Result<bool, RoadError> {
    let (id, current) = {
        let id = vehicle.borrow().id;
        (id, road.current_lane_index(id)?)
    };

    // If the vehicle is in the first lane, it cannot return
    if current == 0 {
        return Ok(false);
    }

    let safe = {
        let previous_lane = road.lane(current - 1)?;
        model.considers_lane_safe(&vehicle.borrow(), previous_lane, delta_t)
    };
    if !safe {
        return Ok(false);
    }

    road.change_lane(vehicle, current - 1, Some(current))?;
    log_detailed!(
        EVENT_LANE_CHANGE,
        "Vehicle returned to a slower lane",
        vehicle_id = id,
        from_lane = current,
        to_lane = current - 1
    );
    Ok(true)
}

/// The n-second rule: a candidate lane is safe when both the nearest leader
/// and the nearest follower are at least `velocity * safe_seconds` meters
/// away, rear bumper to front bumper.
pub fn is_outside_n_seconds_rule(vehicle: &Vehicle, lane: &Lane, safe_seconds: f64) -> bool {
    let safe_distance = safe_distance_n_seconds(vehicle, safe_seconds);

    let (leading_vehicle, following_vehicle) = lane.closest_around(vehicle.position);

    if let Some(leading_vehicle) = leading_vehicle {
        let lead = leading_vehicle.borrow();
        if (lead.position - lead.length) - vehicle.position < safe_distance {
            return false;
        }
    }

    if let Some(following_vehicle) = following_vehicle {
        let follower = following_vehicle.borrow();
        if (vehicle.position - vehicle.length) - follower.position < safe_distance {
            return false;
        }
    }

    true
}

/// The distance covered in `safe_seconds` at the vehicle's current velocity.
pub fn safe_distance_n_seconds(vehicle: &Vehicle, safe_seconds: f64) -> f64 {
    vehicle.velocity * safe_seconds
}
