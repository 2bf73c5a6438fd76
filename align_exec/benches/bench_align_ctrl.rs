//! # Alignment Control Benchmark

use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

use align_lib::align_ctrl::{arbitrate, AlignCtrl, CameraObservation, InputData, Params};
use comms_if::eqpt::vision::{CamId, Detection, DetectionSet};
use util::module::State;

const PARAMS: &str = r#"
    target_lateral_offset_m = 0.0
    max_detection_age_s = 0.5
    window_len = 20
    lost_target_debounce_cycles = 20
    rot_unsettle_debounce_cycles = 4
    end_distance_m = 0.3
    search_rot_rate_rads = 0.5
    fwd_output_scale = 1.0
    lat_output_scale = 1.0
    rot_output_scale = -0.05

    [[cameras]]
    cam = "Right"
    lateral_offset_m = -0.15
    forward_offset_m = 0.0

    [[cameras]]
    cam = "Left"
    lateral_offset_m = 0.15
    forward_offset_m = 0.0

    [rot]
    tolerance = 5.0
    deadband = 10.0
    floor = 1.0
    ceiling = 20.0

    [lat]
    tolerance = 0.05
    deadband = 0.1
    floor = 0.05
    ceiling = 0.5

    [fwd]
    floor = 0.05
    ceiling = 1.0
"#;

fn detections(n: usize) -> Vec<Detection> {
    (0..n)
        .map(|i| Detection {
            marker_id: i as i32,
            forward_m: 1.0 + 0.25 * i as f64,
            lateral_m: 0.05 * i as f64 - 0.2,
            yaw_rad: 3.0,
            ambiguity: 0.01 * (i + 1) as f64,
        })
        .collect()
}

fn align_ctrl_benchmark(c: &mut Criterion) {
    let params: Params = util::params::from_str(PARAMS).unwrap();

    // ---- Arbitration only ----

    let dets = detections(8);
    let observations = vec![
        CameraObservation::from_detections(CamId::Right, &dets, params.max_range_m),
        CameraObservation::from_detections(CamId::Left, &dets[2..], params.max_range_m),
    ];

    c.bench_function("arbitrate", |b| {
        b.iter(|| arbitrate(&observations, &params))
    });

    // ---- Full processing cycle ----

    let mut ctrl = AlignCtrl::from_params(params).unwrap();
    ctrl.schedule(0.2).unwrap();

    let t0 = Utc.timestamp(1_000, 0);
    let mut cycle = 0i64;

    c.bench_function("AlignCtrl::proc", |b| {
        b.iter(|| {
            let now = t0 + Duration::milliseconds(20 * cycle);
            cycle += 1;

            let input = InputData {
                cmd: None,
                frames: vec![
                    (
                        CamId::Right,
                        DetectionSet {
                            timestamp: now,
                            detections: dets.clone(),
                        },
                    ),
                    (CamId::Left, DetectionSet::empty(now)),
                ],
                cycle_time: Some(now),
            };

            ctrl.proc(&input).unwrap()
        })
    });
}

criterion_group!(benches, align_ctrl_benchmark);
criterion_main!(benches);
