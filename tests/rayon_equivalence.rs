#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use yolo_post::lowlevel::{
    decode_detections, decode_detections_par, decode_poses, decode_poses_par, DetectView,
    GateParams, PoseView,
};
use yolo_post::{decode_and_suppress, PipelineConfig, ScaleFactors, Task, TensorView};

/// Random head with roughly `hit_rate` of candidates scoring above 0.5.
fn make_head(
    rng: &mut StdRng,
    channels: usize,
    n: usize,
    score_from: usize,
    hit_rate: f64,
) -> Vec<f32> {
    let mut data = vec![0.0f32; channels * n];
    for i in 0..n {
        data[i] = rng.random_range(0.0..640.0);
        data[n + i] = rng.random_range(0.0..640.0);
        data[2 * n + i] = rng.random_range(1.0..120.0);
        data[3 * n + i] = rng.random_range(1.0..120.0);
        for c in score_from..channels {
            data[c * n + i] = rng.random_range(0.0..0.4);
        }
        if rng.random_bool(hit_rate) {
            let c = rng.random_range(score_from..channels);
            data[c * n + i] = rng.random_range(0.5..1.0);
        }
    }
    data
}

#[test]
fn parallel_detect_decode_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 8400;
    let data = make_head(&mut rng, 84, n, 4, 0.01);
    let tensor = TensorView::new(&data, [1, 84, n]).unwrap();
    let view = DetectView::new(tensor, 80).unwrap();
    let scale = ScaleFactors::new(1.5, 0.75).unwrap();

    for max_candidates in [1, 50, 500, usize::MAX] {
        let gate = GateParams {
            score_threshold: 0.45,
            max_candidates,
        };
        let seq = decode_detections(&view, scale, gate);
        let par = decode_detections_par(&view, scale, gate);
        assert_eq!(seq, par, "max_candidates = {max_candidates}");
    }
}

#[test]
fn parallel_pose_decode_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(11);
    let n = 3000;
    let channels = PoseView::expected_channels(17).unwrap();
    let mut data = make_head(&mut rng, channels, n, 5, 0.0);
    for i in 0..n {
        data[4 * n + i] = rng.random_range(0.0..1.0);
    }
    let tensor = TensorView::new(&data, [1, channels, n]).unwrap();
    let view = PoseView::new(tensor, 17).unwrap();
    let gate = GateParams {
        score_threshold: 0.45,
        max_candidates: 1200,
    };

    let seq = decode_poses(&view, ScaleFactors::IDENTITY, gate);
    let par = decode_poses_par(&view, ScaleFactors::IDENTITY, gate);
    assert_eq!(seq.len(), 1200);
    assert_eq!(seq, par);
}

#[test]
fn parallel_pipeline_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(23);
    let n = 8400;
    let data = make_head(&mut rng, 84, n, 4, 0.05);
    let tensor = TensorView::new(&data, [1, 84, n]).unwrap();

    let base = PipelineConfig {
        task: Task::Detect,
        max_candidates: 300,
        ..PipelineConfig::default()
    };
    let seq = decode_and_suppress(tensor, ScaleFactors::IDENTITY, &base).unwrap();
    let par = decode_and_suppress(
        tensor,
        ScaleFactors::IDENTITY,
        &PipelineConfig {
            parallel: true,
            ..base
        },
    )
    .unwrap();
    assert_eq!(seq, par);
}
