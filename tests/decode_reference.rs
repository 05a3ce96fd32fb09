//! Compares the decoders against a straightforward per-candidate reference.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use yolo_post::lowlevel::{decode_detections, DetectView, GateParams};
use yolo_post::{BBox, Detection, ScaleFactors, TensorView};

/// Direct transcription of the decoding rules, one candidate at a time.
fn reference_decode(
    data: &[f32],
    num_classes: usize,
    n: usize,
    scale: ScaleFactors,
    gate: GateParams,
) -> Vec<Detection> {
    let at = |c: usize, i: usize| data[c * n + i];
    let mut out = Vec::new();
    for i in 0..n {
        if out.len() == gate.max_candidates {
            break;
        }
        let mut max_score = 0.0f32;
        let mut class_index = None;
        for c in 0..num_classes {
            if at(4 + c, i) > max_score {
                max_score = at(4 + c, i);
                class_index = Some(c);
            }
        }
        let Some(class_index) = class_index else {
            continue;
        };
        if max_score <= gate.score_threshold {
            continue;
        }
        let width = (at(2, i) * scale.x_ratio).max(0.0);
        let height = (at(3, i) * scale.y_ratio).max(0.0);
        let bbox = BBox::new(
            at(0, i) * scale.x_ratio - 0.5 * width,
            at(1, i) * scale.y_ratio - 0.5 * height,
            width,
            height,
        );
        out.push(Detection {
            bbox,
            class_index,
            score: max_score,
        });
    }
    out
}

fn random_head(rng: &mut StdRng, num_classes: usize, n: usize) -> Vec<f32> {
    let mut data = vec![0.0f32; (4 + num_classes) * n];
    for i in 0..n {
        data[i] = rng.random_range(0.0..640.0);
        data[n + i] = rng.random_range(0.0..640.0);
        data[2 * n + i] = rng.random_range(-5.0..200.0);
        data[3 * n + i] = rng.random_range(-5.0..200.0);
    }
    for c in 0..num_classes {
        for i in 0..n {
            // quantized so equal class scores show up
            data[(4 + c) * n + i] = rng.random_range(-2..10) as f32 / 10.0;
        }
    }
    data
}

#[test]
fn detect_decoder_matches_reference() {
    let mut rng = StdRng::seed_from_u64(42);
    for &(num_classes, n) in &[(1, 17), (3, 64), (80, 203), (7, 1000)] {
        let data = random_head(&mut rng, num_classes, n);
        let tensor = TensorView::new(&data, [1, 4 + num_classes, n]).unwrap();
        let view = DetectView::new(tensor, num_classes).unwrap();
        let scale = ScaleFactors::new(rng.random_range(0.2..3.0), rng.random_range(0.2..3.0))
            .unwrap();

        for &(score_threshold, max_candidates) in &[(0.45, 50), (0.0, 10), (0.75, 1000)] {
            let gate = GateParams {
                score_threshold,
                max_candidates,
            };
            let expected = reference_decode(&data, num_classes, n, scale, gate);
            let got = decode_detections(&view, scale, gate);
            assert_eq!(got, expected, "classes={num_classes} n={n} gate={gate:?}");
        }
    }
}

#[test]
fn non_finite_candidates_are_skipped() {
    let n = 4;
    let mut data = vec![0.0f32; 6 * n];
    for i in 0..n {
        data[i] = 10.0;
        data[n + i] = 10.0;
        data[2 * n + i] = 4.0;
        data[3 * n + i] = 4.0;
        data[4 * n + i] = 0.9;
    }
    data[1] = f32::NAN;
    data[2 * n + 2] = f32::INFINITY;
    let tensor = TensorView::new(&data, [1, 6, n]).unwrap();
    let view = DetectView::new(tensor, 2).unwrap();
    let gate = GateParams {
        score_threshold: 0.45,
        max_candidates: 50,
    };

    let got = decode_detections(&view, ScaleFactors::IDENTITY, gate);
    assert_eq!(got.len(), 2);
    assert!(got.iter().all(|d| d.bbox.is_finite()));
    assert_eq!(got[0].bbox, BBox::new(8.0, 8.0, 4.0, 4.0));
}
