//! Fixed landmark topologies (MediaPipe indexing).

/// 21-point hand skeleton: five finger chains from the wrist plus three palm arcs.
pub const HAND_CONNECTIONS: [(usize, usize); 23] = [
    // thumb
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    // index
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    // middle
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    // ring
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    // pinky
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    // palm
    (5, 9),
    (9, 13),
    (13, 17),
];

pub const HAND_WRIST: usize = 0;
pub const HAND_FINGERTIPS: [usize; 5] = [4, 8, 12, 16, 20];

/// Face-oval subset of the 478-point mesh, in contour order.
pub const FACE_OVAL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

/// Eye, eyebrow, nose and mouth points drawn when full face detail is enabled.
pub const FACE_FEATURES: [usize; 87] = [
    // right eye
    33, 133, 160, 159, 158, 157, 173, 246, 7, 163, 144, 145, 153, 154, 155,
    // left eye
    362, 398, 384, 385, 386, 387, 388, 466, 263, 249, 390, 373, 374, 380, 381, 382,
    // eyebrows
    70, 63, 105, 66, 107, 55, 65, 52, 53, 46, 300, 293, 334, 296, 336, 285, 295, 282, 283, 276,
    // nose
    1, 2, 98, 327, 129, 358,
    // mouth
    61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 78, 191, 80, 81, 82, 13, 312, 311, 310, 415,
    308, 95, 88, 178, 87, 14, 317, 402, 318, 324,
];

/// 33-point body skeleton.
pub const POSE_CONNECTIONS: [(usize, usize); 33] = [
    // face
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    // torso and arms
    (9, 10),
    (11, 12),
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (11, 23),
    (12, 24),
    (23, 24),
    // legs
    (23, 25),
    (25, 27),
    (27, 29),
    (29, 31),
    (27, 31),
    (24, 26),
    (26, 28),
    (28, 30),
    (28, 32),
    (30, 32),
];

/// Nose, shoulders, elbows, wrists, hips, knees.
pub const POSE_KEY_JOINTS: [usize; 11] = [0, 11, 12, 13, 14, 15, 16, 23, 24, 25, 26];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{FACE_POINTS, HAND_POINTS, POSE_POINTS};

    #[test]
    fn topologies_stay_in_range() {
        assert!(HAND_CONNECTIONS
            .iter()
            .all(|&(a, b)| a < HAND_POINTS && b < HAND_POINTS));
        assert!(POSE_CONNECTIONS
            .iter()
            .all(|&(a, b)| a < POSE_POINTS && b < POSE_POINTS));
        assert!(FACE_OVAL
            .iter()
            .chain(FACE_FEATURES.iter())
            .all(|&i| i < FACE_POINTS));
    }
}
