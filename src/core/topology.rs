//! Which landmark indices are connected, per model family.
//!
//! The tables encode each model's fixed output ordering. Face-mesh contours
//! are polylines; every other family is an explicit edge list.

use crate::core::landmarks::{LandmarkPoint, ModelFamily, Point};

pub type Edge = (usize, usize);

pub const FACE_SILHOUETTE: &[usize] = &[
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109, 10,
];
pub const LIPS_UPPER_OUTER: &[usize] = &[61, 185, 40, 39, 37, 0, 267, 269, 270, 409, 291];
pub const LIPS_LOWER_OUTER: &[usize] = &[61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291];
pub const LIPS_UPPER_INNER: &[usize] = &[78, 191, 80, 81, 82, 13, 312, 311, 310, 415, 308];
pub const LIPS_LOWER_INNER: &[usize] = &[78, 95, 88, 178, 87, 14, 317, 402, 318, 324, 308];
pub const RIGHT_EYE_UPPER: &[usize] = &[33, 246, 161, 160, 159, 158, 157, 173, 133];
pub const RIGHT_EYE_LOWER: &[usize] = &[33, 7, 163, 144, 145, 153, 154, 155, 133];
pub const LEFT_EYE_UPPER: &[usize] = &[263, 466, 388, 387, 386, 385, 384, 398, 362];
pub const LEFT_EYE_LOWER: &[usize] = &[263, 249, 390, 373, 374, 380, 381, 382, 362];

pub const FACE_MESH_CONTOURS: &[&[usize]] = &[
    FACE_SILHOUETTE,
    LIPS_UPPER_OUTER,
    LIPS_LOWER_OUTER,
    LIPS_UPPER_INNER,
    LIPS_LOWER_INNER,
    RIGHT_EYE_UPPER,
    RIGHT_EYE_LOWER,
    LEFT_EYE_UPPER,
    LEFT_EYE_LOWER,
];

/// Ring around the iris centre (index 0).
pub const IRIS_EDGES: &[Edge] = &[(1, 2), (2, 3), (3, 4), (4, 1)];

pub const MOVENET_EDGES: &[Edge] = &[
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (5, 6),
    (5, 7),
    (7, 9),
    (6, 8),
    (8, 10),
    (5, 11),
    (6, 12),
    (11, 12),
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
];

pub const BLAZEPOSE_EDGES: &[Edge] = &[
    // face
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    // arms and hands
    (11, 12),
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (17, 19),
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (18, 20),
    // torso and legs
    (11, 23),
    (12, 24),
    (23, 24),
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

/// Edge table of one family.
#[derive(Debug, Clone, Copy)]
pub enum Topology {
    Contours(&'static [&'static [usize]]),
    Edges(&'static [Edge]),
}

impl Topology {
    pub fn for_family(family: ModelFamily) -> Self {
        match family {
            ModelFamily::FaceMesh => Topology::Contours(FACE_MESH_CONTOURS),
            ModelFamily::Iris => Topology::Edges(IRIS_EDGES),
            ModelFamily::MoveNet => Topology::Edges(MOVENET_EDGES),
            ModelFamily::BlazePose => Topology::Edges(BLAZEPOSE_EDGES),
        }
    }

    pub fn edges(&self) -> Box<dyn Iterator<Item = Edge> + '_> {
        match self {
            Topology::Contours(contours) => Box::new(
                contours
                    .iter()
                    .flat_map(|contour| contour.windows(2).map(|w| (w[0], w[1]))),
            ),
            Topology::Edges(edges) => Box::new(edges.iter().copied()),
        }
    }
}

/// Segments whose two endpoints are both present in `points`.
///
/// An absent endpoint drops only its own edges; an index past the end of
/// `points` counts as absent.
pub fn visible_edges(family: ModelFamily, points: &[LandmarkPoint]) -> Vec<(Point, Point)> {
    let point = |i: usize| points.get(i).copied().flatten();
    Topology::for_family(family)
        .edges()
        .filter_map(|(a, b)| Some((point(a)?, point(b)?)))
        .collect()
}
