use multilane_traffic_sim_core::agents::Vehicle;
use multilane_traffic_sim_core::road::{Lane, Road};

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn populated_lane(n: u64) -> Lane {
    let mut lane = Lane::new();
    for id in 1..=n {
        lane.insert(
            Vehicle::new(id)
                .with_position(id as f64 * 7.5)
                .with_velocity(25.0)
                .build_ref(),
        );
    }
    lane
}

pub fn benchmark_lane_queries(c: &mut Criterion) {
    let lane = populated_lane(10_000);

    c.bench_function("lane_closest_around", |b| {
        b.iter(|| {
            let (leader, follower) = lane.closest_around(black_box(37_501.0));
            let _ = (leader, follower);
        })
    });

    c.bench_function("lane_insert_remove", |b| {
        let mut lane = populated_lane(10_000);
        let probe = Vehicle::new(1_000_001)
            .with_position(37_501.0)
            .with_velocity(25.0)
            .build_ref();
        b.iter(|| {
            lane.insert(black_box(probe.clone()));
            lane.remove(black_box(&probe)).unwrap();
        })
    });
}

pub fn benchmark_lane_change(c: &mut Criterion) {
    let mut road = Road::with_lanes(100_000.0, 2);
    for id in 1..=5_000u64 {
        let vehicle = Vehicle::new(id)
            .with_position(id as f64 * 15.0)
            .with_velocity(25.0)
            .build_ref();
        road.add_vehicle(vehicle, (id % 2) as usize).unwrap();
    }
    let probe = Vehicle::new(999_999)
        .with_position(37_507.0)
        .with_velocity(25.0)
        .build_ref();
    road.add_vehicle(probe.clone(), 0).unwrap();

    c.bench_function("road_change_lane_round_trip", |b| {
        b.iter(|| {
            road.change_lane(black_box(&probe), 1, Some(0)).unwrap();
            road.change_lane(black_box(&probe), 0, Some(1)).unwrap();
        })
    });
}

criterion_group!(benches, benchmark_lane_queries, benchmark_lane_change);
criterion_main!(benches);
