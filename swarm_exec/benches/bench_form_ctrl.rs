//! # Formation Control Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use swarm_lib::{
    fleet::{layout_positions, Fleet, LayoutParams, Vehicle},
    form_ctrl::{FormCtrl, Params},
    intent::{SeekIntent, SeekParams},
    platform::sim::KinematicSim,
};

fn form_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a large fleet in a simulation ----

    let layout = LayoutParams {
        num_vehicles: 100,
        separation_m: 10.0,
        row_length: 10,
        origin_x_m: 100.0,
        col_spacing_m: 25.0,
        altitude_m: -2.0,
    };

    let seek_params = SeekParams {
        v_max_ms: 1.25,
        min_distance_m: 5.0,
        max_distance_m: 100.0,
        speed_gain: 0.5,
        orbit_radius_m: 10.0,
        orbit_band_m: 2.0,
    };

    let params = Params {
        v_max_ms: 1.25,
        min_distance_m: 5.0,
        max_distance_m: 100.0,
        close_enough_m: 1.0,
        cmd_duration_s: 0.1,
        altitude_m: -2.0,
        waypoints_m: vec![[25.0, 100.0], [100.0, 75.0], [0.0, 0.0]],
        heading_damping: 0.5,
        telem_log_period_ticks: 0,
        status_print_period_ticks: 0,
        cycle_period_s: 0.0,
        max_ticks: None,
    };

    let mut sim = KinematicSim::new(1.0);
    let vehicles = layout_positions(&layout)
        .into_iter()
        .map(|(id, pos)| {
            sim.add_vehicle(&id, [pos.x, pos.y, pos.z], 0.0);
            Vehicle::new(&id, pos)
        })
        .collect();
    let mut fleet = Fleet::new(vehicles, &SeekIntent::factory(seek_params));

    let mut form_ctrl = FormCtrl::new(params).unwrap();

    // ---- Benchmark ----

    c.bench_function("form_ctrl_tick_100", |b| {
        b.iter(|| form_ctrl.proc(&mut fleet, &mut sim).unwrap())
    });
}

criterion_group!(benches, form_ctrl_benchmark);
criterion_main!(benches);
