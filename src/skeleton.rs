//! COCO keypoint naming and the skeleton drawn over decoded poses.
//!
//! The renderer draws a limb only when both endpoints score above
//! [`KEYPOINT_VISIBILITY_THRESHOLD`] and a keypoint dot when its score is at
//! least that value. Keypoints below the cutoff stay in [`Pose::keypoints`]
//! with their raw score; only the drawing decision filters them.

use crate::decode::{Keypoint, Pose};

/// Fixed visibility cutoff used by the overlay renderer.
pub const KEYPOINT_VISIBILITY_THRESHOLD: f32 = 0.5;

/// The 17 COCO keypoints in model output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeypointKind {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// Number of COCO keypoints.
pub const NUM_COCO_KEYPOINTS: usize = 17;

impl KeypointKind {
    pub const ALL: [KeypointKind; NUM_COCO_KEYPOINTS] = [
        KeypointKind::Nose,
        KeypointKind::LeftEye,
        KeypointKind::RightEye,
        KeypointKind::LeftEar,
        KeypointKind::RightEar,
        KeypointKind::LeftShoulder,
        KeypointKind::RightShoulder,
        KeypointKind::LeftElbow,
        KeypointKind::RightElbow,
        KeypointKind::LeftWrist,
        KeypointKind::RightWrist,
        KeypointKind::LeftHip,
        KeypointKind::RightHip,
        KeypointKind::LeftKnee,
        KeypointKind::RightKnee,
        KeypointKind::LeftAnkle,
        KeypointKind::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            KeypointKind::Nose => "nose",
            KeypointKind::LeftEye => "left_eye",
            KeypointKind::RightEye => "right_eye",
            KeypointKind::LeftEar => "left_ear",
            KeypointKind::RightEar => "right_ear",
            KeypointKind::LeftShoulder => "left_shoulder",
            KeypointKind::RightShoulder => "right_shoulder",
            KeypointKind::LeftElbow => "left_elbow",
            KeypointKind::RightElbow => "right_elbow",
            KeypointKind::LeftWrist => "left_wrist",
            KeypointKind::RightWrist => "right_wrist",
            KeypointKind::LeftHip => "left_hip",
            KeypointKind::RightHip => "right_hip",
            KeypointKind::LeftKnee => "left_knee",
            KeypointKind::RightKnee => "right_knee",
            KeypointKind::LeftAnkle => "left_ankle",
            KeypointKind::RightAnkle => "right_ankle",
        }
    }
}

/// Limbs as pairs of keypoint indices.
pub const COCO_SKELETON: [(usize, usize); 19] = [
    // legs
    (15, 13),
    (13, 11),
    (16, 14),
    (14, 12),
    // hips
    (11, 12),
    // torso
    (5, 11),
    (6, 12),
    // shoulders
    (5, 6),
    // arms
    (5, 7),
    (6, 8),
    (7, 9),
    (8, 10),
    // face
    (1, 2),
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    // ears to shoulders
    (3, 5),
    (4, 6),
];

impl Pose {
    /// Returns the keypoint of a COCO joint, if the head produced it.
    pub fn keypoint(&self, kind: KeypointKind) -> Option<&Keypoint> {
        self.keypoints.get(kind.index())
    }

    /// Skeleton limbs whose endpoints both score strictly above `threshold`.
    pub fn visible_limbs(&self, threshold: f32) -> impl Iterator<Item = (usize, usize)> + '_ {
        COCO_SKELETON.iter().copied().filter(move |&(a, b)| {
            match (self.keypoints.get(a), self.keypoints.get(b)) {
                (Some(kp_a), Some(kp_b)) => kp_a.score > threshold && kp_b.score > threshold,
                _ => false,
            }
        })
    }

    /// Indices of keypoints scoring at least `threshold`.
    pub fn visible_keypoints(&self, threshold: f32) -> impl Iterator<Item = usize> + '_ {
        self.keypoints
            .iter()
            .enumerate()
            .filter(move |(_, kp)| kp.score >= threshold)
            .map(|(idx, _)| idx)
    }
}
