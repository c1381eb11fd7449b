//! # Tracking Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::eqpt::det::{BoundingBox, ClassId, DetFrame, Detection};
use track_lib::{
    target_sel::select_target,
    track_ctrl::{InputData, Params, TrackCtrl},
};
use util::module::State;

/// A crowded frame, alternating people and other objects across its width.
fn crowded_frame(num_dets: usize) -> (DetFrame, Vec<Detection>) {
    let frame = DetFrame::new(1280, 720);

    let detections = (0..num_dets)
        .map(|i| {
            let left = (i * 37 % 1200) as f64;
            Detection {
                class_id: ClassId((i % 2) as u32 + 1),
                confidence: 0.5 + (i % 5) as f64 * 0.1,
                bbox: BoundingBox {
                    left,
                    top: 100.0,
                    right: left + 80.0,
                    bottom: 500.0,
                },
            }
        })
        .collect();

    (frame, detections)
}

fn track_ctrl_benchmark(c: &mut Criterion) {
    let (frame, detections) = crowded_frame(100);

    c.bench_function("select_target 100 detections", |b| {
        b.iter(|| select_target(black_box(&detections), black_box(&frame), ClassId(1)))
    });

    let params = Params::default();
    let period_ms = params.period_ms;
    let mut ctrl = TrackCtrl::new(params).unwrap();
    ctrl.start(0.0);

    let mut input = InputData {
        now_ms: 0.0,
        frame,
        detections,
    };

    c.bench_function("TrackCtrl::proc 100 detections", |b| {
        b.iter(|| {
            // Every call must be a full period after the last
            input.now_ms += period_ms;
            ctrl.proc(black_box(&input)).unwrap()
        })
    });
}

criterion_group!(benches, track_ctrl_benchmark);
criterion_main!(benches);
