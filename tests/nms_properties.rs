use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use yolo_post::{iou, nms, nms_grouped, BBox};

fn random_boxes(rng: &mut StdRng, count: usize) -> (Vec<BBox>, Vec<f32>) {
    let boxes = (0..count)
        .map(|_| {
            BBox::new(
                rng.random_range(0.0..200.0),
                rng.random_range(0.0..200.0),
                rng.random_range(5.0..60.0),
                rng.random_range(5.0..60.0),
            )
        })
        .collect();
    // coarse scores so ties actually happen
    let scores = (0..count)
        .map(|_| rng.random_range(0..20) as f32 / 20.0)
        .collect();
    (boxes, scores)
}

fn assert_descending(keep: &[usize], scores: &[f32]) {
    for pair in keep.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(
            scores[a] > scores[b] || (scores[a] == scores[b] && a < b),
            "order violated between {a} and {b}"
        );
    }
}

#[test]
fn retained_boxes_never_overlap_past_threshold() {
    let mut rng = StdRng::seed_from_u64(1234);
    for trial in 0..50 {
        let (boxes, scores) = random_boxes(&mut rng, 60);
        let threshold = rng.random_range(0.1..0.9);
        let keep = nms(&boxes, &scores, threshold).unwrap();

        assert!(!keep.is_empty(), "trial {trial}");
        assert_descending(&keep, &scores);
        for (pos, &a) in keep.iter().enumerate() {
            for &b in &keep[pos + 1..] {
                assert!(iou(&boxes[a], &boxes[b]) < threshold, "trial {trial}");
            }
        }
    }
}

#[test]
fn every_dropped_box_overlaps_a_better_kept_box() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..30 {
        let (boxes, scores) = random_boxes(&mut rng, 40);
        let keep = nms(&boxes, &scores, 0.4).unwrap();
        let rank = |i: usize| (std::cmp::Reverse(scores[i].to_bits()), i);
        for dropped in (0..boxes.len()).filter(|i| !keep.contains(i)) {
            assert!(keep
                .iter()
                .any(|&k| rank(k) < rank(dropped) && iou(&boxes[k], &boxes[dropped]) >= 0.4));
        }
    }
}

#[test]
fn grouped_suppression_is_per_group() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..30 {
        let (boxes, scores) = random_boxes(&mut rng, 80);
        let groups: Vec<usize> = (0..boxes.len()).map(|_| rng.random_range(0..4)).collect();
        let keep = nms_grouped(&boxes, &scores, &groups, 0.35).unwrap();
        assert_descending(&keep, &scores);

        for (pos, &a) in keep.iter().enumerate() {
            for &b in &keep[pos + 1..] {
                if groups[a] == groups[b] {
                    assert!(iou(&boxes[a], &boxes[b]) < 0.35);
                }
            }
        }

        // each group on its own must give the same survivors
        for group in 0..4 {
            let members: Vec<usize> = (0..boxes.len()).filter(|&i| groups[i] == group).collect();
            let sub_boxes: Vec<BBox> = members.iter().map(|&i| boxes[i]).collect();
            let sub_scores: Vec<f32> = members.iter().map(|&i| scores[i]).collect();
            let expected: Vec<usize> = nms(&sub_boxes, &sub_scores, 0.35)
                .unwrap()
                .into_iter()
                .map(|i| members[i])
                .collect();
            let got: Vec<usize> = keep.iter().copied().filter(|&i| groups[i] == group).collect();
            assert_eq!(got, expected);
        }
    }
}

#[test]
fn threshold_of_one_only_suppresses_duplicates() {
    let boxes = [
        BBox::new(0.0, 0.0, 10.0, 10.0),
        BBox::new(0.0, 0.0, 10.0, 10.0),
        BBox::new(1.0, 0.0, 10.0, 10.0),
    ];
    let keep = nms(&boxes, &[0.9, 0.8, 0.7], 1.0).unwrap();
    assert_eq!(keep, vec![0, 2]);
}

#[test]
fn zero_area_boxes_only_suppress_at_zero_threshold() {
    let boxes = [BBox::new(5.0, 5.0, 0.0, 0.0), BBox::new(5.0, 5.0, 0.0, 0.0)];
    let keep = nms(&boxes, &[0.9, 0.8], 0.0).unwrap();
    // zero union gives IoU 0, which still meets a threshold of 0
    assert_eq!(keep, vec![0]);
    let keep = nms(&boxes, &[0.9, 0.8], 0.1).unwrap();
    assert_eq!(keep, vec![0, 1]);
}
