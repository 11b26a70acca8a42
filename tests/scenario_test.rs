use multilane_traffic_sim_core::agents::Vehicle;
use multilane_traffic_sim_core::behaviour::{
    Behaviour, BehaviourModel, GippsModel, IdmModel, SimpleFollowingModel,
};
use multilane_traffic_sim_core::road::Road;
use multilane_traffic_sim_core::simulation::settings::SimulationSettings;
use multilane_traffic_sim_core::simulation::simulation::Simulation;
use multilane_traffic_sim_core::spawning::{LaneDistribution, LaneDistributionKind};
use multilane_traffic_sim_core::utils::rand::rng_from_seed;
use std::path::PathBuf;

fn temp_base(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mlts_scenario_{}_{}", tag, uuid::Uuid::new_v4()))
}

/// A deterministic free-flow run: one lane, no velocity noise, 1000 m at
/// 100 km/h. Every completed journey must take 36 s, give or take one tick.
#[test]
fn test_free_flow_travel_time_is_36_seconds() {
    let document = r#"{
        "name": {"id": "free_flow", "description": "Simple model free flow"},
        "road": {"length": 1000.0, "lanes": 1},
        "simulation": {"time_step": 1.0, "duration": 45.0},
        "spawn": {"process": "equal", "cars_per_second": 1.0},
        "vehicle": {
            "behavior": ["Simple Model", {
                "initial_velocity_deviation": {"mu": 0.0, "sigma": 0.0},
                "update_velocity_deviation": {"mu": 0.0, "sigma": 0.0}
            }],
            "behavior_settings": [27.77777777777778, 0.0],
            "length": 1.5
        },
        "lane_distribution": "equal"
    }"#;
    let base = temp_base("free_flow");
    let settings = SimulationSettings::from_json(document).unwrap();
    let simulation = Simulation::from_settings_in(settings, 42, &base).unwrap();
    let summary = simulation.run().unwrap();
    assert!(summary.vehicles_departed > 0, "Some vehicles must finish");

    let travel_times = std::fs::read_to_string(summary.output_dir.join("travel_times.csv")).unwrap();
    let mut lines = travel_times.lines();
    assert_eq!(lines.next(), Some("Travel Times"));
    let mut rows = 0;
    for line in lines {
        let travel_time: f64 = line.parse().expect("travel time rows must be numeric");
        assert!(
            (travel_time - 36.0).abs() <= 1.0 + 1e-9,
            "Expected ~36 s of travel, got {}",
            travel_time
        );
        rows += 1;
    }
    assert_eq!(rows as u64, summary.vehicles_departed);

    std::fs::remove_dir_all(&base).ok();
}

/// Replicates one driver tick for a hand-built road: advance each vehicle,
/// then run its behaviour update, at most once per vehicle.
fn tick(road: &mut Road, delta_t: f64, rng: &mut multilane_traffic_sim_core::utils::rand::SimRng) {
    let mut processed = std::collections::HashSet::new();
    for lane_index in road.lane_indices() {
        let snapshot: Vec<_> = road.lane(lane_index).unwrap().snapshot();
        for vehicle in snapshot {
            if !processed.insert(vehicle.borrow().id) {
                continue;
            }
            vehicle.borrow_mut().advance(delta_t);
            let mut behaviour = vehicle.borrow().behaviour.clone();
            behaviour.update(&vehicle, road, delta_t, rng).unwrap();
            vehicle.borrow_mut().behaviour = behaviour;
        }
    }
}

/// Two lanes, a slow leader and a fast follower: the follower must move to
/// the free overtaking lane once the two-second gap closes, keeping its
/// velocity.
#[test]
fn test_blocked_follower_overtakes_into_free_lane() {
    let mut road = Road::with_lanes(10_000.0, 2);
    let mut rng = rng_from_seed(42);

    let leader = Vehicle::new(1)
        .with_position(50.0)
        .with_velocity(10.0)
        .with_behaviour(BehaviourModel::SimpleFollowing(
            SimpleFollowingModel::new(10.0, 2.0).with_deviations(0.0, 0.0),
        ))
        .build_ref();
    let follower = Vehicle::new(2)
        .with_position(0.0)
        .with_velocity(20.0)
        .with_behaviour(BehaviourModel::SimpleFollowing(
            SimpleFollowingModel::new(20.0, 2.0).with_deviations(0.0, 0.0),
        ))
        .build_ref();
    road.add_vehicle(leader.clone(), 0).unwrap();
    road.add_vehicle(follower.clone(), 0).unwrap();

    let mut overtook_at = None;
    for step in 0..6 {
        tick(&mut road, 1.0, &mut rng);
        if road.current_lane_index(2).unwrap() == 1 {
            overtook_at = Some(step);
            break;
        }
    }

    // Tick 0: leader 60, follower 20, gap 40 = safe distance. Tick 1:
    // leader 70, follower 40, gap 30 < 40, lane 1 is free for 40 m both
    // ways, so the follower moves.
    assert_eq!(overtook_at, Some(1), "Follower must overtake on the second tick");
    assert_eq!(
        follower.borrow().velocity,
        20.0,
        "Overtaking keeps the follower's velocity"
    );
    assert_eq!(road.current_lane_index(1).unwrap(), 0, "Leader stays put");
}

/// Triangle distribution, four lanes, ten cars: probabilities (0.4, 0.3,
/// 0.2, 0.1) give exactly (4, 3, 2, 1).
#[test]
fn test_triangle_distribution_ten_over_four() {
    let distribution = LaneDistribution::new(LaneDistributionKind::Triangle, 4);
    assert_eq!(distribution.cars_per_lane(10), vec![4, 3, 2, 1]);
}

/// Triangle distribution, three lanes, eleven cars: rounding overshoots by
/// one and the correction lands on lane 0.
#[test]
fn test_triangle_distribution_eleven_over_three() {
    let distribution = LaneDistribution::new(LaneDistributionKind::Triangle, 3);
    assert_eq!(distribution.cars_per_lane(11), vec![5, 4, 2]);
}

/// Gipps with no leader: the acceleration candidate wins.
#[test]
fn test_gipps_free_flow_candidate() {
    let mut model = GippsModel::new(2.0, 4.0, 30.0, 1.1);
    let next = model.next_velocity(28.0, f64::INFINITY, 0.0, 0.1);
    assert!((next - 28.2).abs() < 1e-12, "Expected 28.2, got {}", next);
}

/// IDM reference numbers: leader 20 m ahead, both at 20 m/s.
#[test]
fn test_idm_reference_acceleration() {
    let model = IdmModel::new(30.0, 1.5, 2.0, 3.0, 2.0, 4.0);
    // The spacing keeps the raw self - lead sign convention
    let acceleration = model.acceleration(20.0, Some((-20.0, 20.0)));
    let expected = 2.0 * (1.0 - (20.0_f64 / 30.0).powi(4) - (32.0_f64 / 20.0).powi(2));
    assert!(
        (acceleration - expected).abs() < 1e-12,
        "Expected {}, got {}",
        expected,
        acceleration
    );
    assert!(
        (acceleration + 3.515).abs() < 1e-2,
        "Reference value is about -3.515 m/s^2, got {}",
        acceleration
    );
}

/// A vehicle with no leader and no reachable upper lane behaves as in an
/// empty world.
#[test]
fn test_lone_vehicle_matches_empty_world() {
    let mut rng_alone = rng_from_seed(9);

    let mut road_alone = Road::with_lanes(10_000.0, 1);
    let alone = Vehicle::new(1)
        .with_velocity(20.0)
        .with_behaviour(BehaviourModel::Gipps(GippsModel::new(2.0, 4.0, 30.0, 1.1)))
        .build_ref();
    road_alone.add_vehicle(alone.clone(), 0).unwrap();
    for _ in 0..20 {
        tick(&mut road_alone, 0.1, &mut rng_alone);
    }

    // Same model applied to a bare velocity sequence with an infinite gap
    let mut model = GippsModel::new(2.0, 4.0, 30.0, 1.1);
    let mut velocity = 20.0;
    for _ in 0..20 {
        velocity = model.next_velocity(velocity, f64::INFINITY, 0.0, 0.1);
    }

    assert_eq!(
        alone.borrow().velocity,
        velocity,
        "A lone vehicle must follow the empty-world velocity profile"
    );
}

/// Departure bookkeeping: at 10 m/s over 100 m a vehicle departs exactly
/// once, 10 seconds after its birth.
#[test]
fn test_departure_is_exact() {
    let document = r#"{
        "name": {"id": "departure", "description": "deterministic departures"},
        "road": {"length": 100.0, "lanes": 1},
        "simulation": {"time_step": 1.0, "duration": 20.0},
        "spawn": {"process": "equal", "cars_per_second": 1.0},
        "vehicle": {
            "behavior": ["Simple Model", {
                "initial_velocity_deviation": {"mu": 0.0, "sigma": 0.0},
                "update_velocity_deviation": {"mu": 0.0, "sigma": 0.0}
            }],
            "behavior_settings": [10.0, 0.0],
            "length": 1.5
        },
        "lane_distribution": "equal"
    }"#;
    let base = temp_base("departure");
    let settings = SimulationSettings::from_json(document).unwrap();
    let simulation = Simulation::from_settings_in(settings, 42, &base).unwrap();
    let summary = simulation.run().unwrap();
    assert_eq!(summary.vehicles_spawned, 20, "One spawn per tick for 20 ticks");
    assert_eq!(
        summary.vehicles_departed, 10,
        "Only vehicles born in the first 10 ticks can finish"
    );

    let travel_times = std::fs::read_to_string(summary.output_dir.join("travel_times.csv")).unwrap();
    let rows: Vec<f64> = travel_times
        .lines()
        .skip(1)
        .map(|line| line.parse().unwrap())
        .collect();
    assert_eq!(rows.len(), 10);
    for travel_time in rows {
        assert_eq!(
            travel_time, 10.0,
            "100 m at 10 m/s departs on the 11th tick, 10 s after birth"
        );
    }
    std::fs::remove_dir_all(&base).ok();
}

/// A zero spawn rate produces an empty run with intact output files.
#[test]
fn test_zero_rate_spawns_nothing() {
    let document = r#"{
        "name": {"id": "zero_rate", "description": "no vehicles at all"},
        "road": {"length": 100.0, "lanes": 1},
        "simulation": {"time_step": 1.0, "duration": 5.0},
        "spawn": {"process": "equal", "cars_per_second": 0.0},
        "vehicle": {
            "behavior": ["Simple Model", {}],
            "behavior_settings": [10.0, 0.0],
            "length": 1.5
        },
        "lane_distribution": "equal"
    }"#;
    let base = temp_base("zero_rate");
    let settings = SimulationSettings::from_json(document).unwrap();
    let simulation = Simulation::from_settings_in(settings, 42, &base).unwrap();
    let summary = simulation.run().unwrap();
    assert_eq!(summary.vehicles_spawned, 0);
    assert_eq!(summary.vehicles_departed, 0);

    let travel_times = std::fs::read_to_string(summary.output_dir.join("travel_times.csv")).unwrap();
    assert_eq!(travel_times, "Travel Times\n");
    std::fs::remove_dir_all(&base).ok();
}
