//! Per-family landmark tensor layouts and their deinterleaving.
//!
//! Each model family writes fixed-width records; the layout table below says
//! where the coordinates live and how a point is accepted. Rejected points
//! are `None`, so a point is either fully present or fully absent.

use crate::common::DecodeError;
use crate::core::gate;
use crate::core::tensor::TensorView;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// `None` marks a point that was not detected or was suppressed.
pub type LandmarkPoint = Option<Point>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    FaceMesh,
    Iris,
    MoveNet,
    BlazePose,
}

/// How points of a family are accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointGate {
    /// One logit after the coordinate block gates every point at once.
    TrailingPresenceLogit { threshold: f32 },
    /// Accepted when both coordinates are non-negative.
    NonNegative,
    /// Per-point score, already a probability, at `offset` in the record.
    Score { offset: usize, threshold: f32 },
    /// Per-point presence logit at `offset` in the record.
    PresenceLogit { offset: usize, threshold: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    XY,
    YX,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyLayout {
    pub record_width: usize,
    pub axis_order: AxisOrder,
    pub gate: PointGate,
}

pub const FACE_MESH_PRESENCE_THRESHOLD: f32 = 0.5;
pub const MOVENET_SCORE_THRESHOLD: f32 = 0.3;
pub const BLAZEPOSE_PRESENCE_THRESHOLD: f32 = 0.5;

/// Points in a full face-mesh output.
pub const FACE_MESH_POINTS: usize = 468;
/// Points in the iris model's iris output.
pub const IRIS_POINTS: usize = 5;
pub const MOVENET_POINTS: usize = 17;
pub const BLAZEPOSE_POINTS: usize = 33;

impl ModelFamily {
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::FaceMesh,
        ModelFamily::Iris,
        ModelFamily::MoveNet,
        ModelFamily::BlazePose,
    ];

    pub const fn layout(self) -> FamilyLayout {
        match self {
            ModelFamily::FaceMesh => FamilyLayout {
                record_width: 3,
                axis_order: AxisOrder::XY,
                gate: PointGate::TrailingPresenceLogit {
                    threshold: FACE_MESH_PRESENCE_THRESHOLD,
                },
            },
            ModelFamily::Iris => FamilyLayout {
                record_width: 3,
                axis_order: AxisOrder::XY,
                gate: PointGate::NonNegative,
            },
            ModelFamily::MoveNet => FamilyLayout {
                record_width: 3,
                axis_order: AxisOrder::YX,
                gate: PointGate::Score {
                    offset: 2,
                    threshold: MOVENET_SCORE_THRESHOLD,
                },
            },
            ModelFamily::BlazePose => FamilyLayout {
                record_width: 5,
                axis_order: AxisOrder::XY,
                gate: PointGate::PresenceLogit {
                    offset: 4,
                    threshold: BLAZEPOSE_PRESENCE_THRESHOLD,
                },
            },
        }
    }

    /// Number of points the model emits.
    pub const fn point_count(self) -> usize {
        match self {
            ModelFamily::FaceMesh => FACE_MESH_POINTS,
            ModelFamily::Iris => IRIS_POINTS,
            ModelFamily::MoveNet => MOVENET_POINTS,
            ModelFamily::BlazePose => BLAZEPOSE_POINTS,
        }
    }

    /// Stride of a complete output of this family.
    pub const fn default_stride(self) -> usize {
        self.point_count() * self.layout().record_width
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModelFamily::FaceMesh => "face_mesh",
            ModelFamily::Iris => "iris",
            ModelFamily::MoveNet => "move_net",
            ModelFamily::BlazePose => "blaze_pose",
        };
        f.write_str(name)
    }
}

/// Decodes `tensor.stride() / record_width` points of `family`.
///
/// For `FaceMesh` the presence logit sits at `tensor[stride]`, so one value
/// beyond the stride is required.
pub fn decode(tensor: TensorView<'_>, family: ModelFamily) -> Result<Vec<LandmarkPoint>, DecodeError> {
    let layout = family.layout();
    let stride = tensor.stride();

    if stride % layout.record_width != 0 {
        return Err(DecodeError::InvalidStride {
            stride,
            reason: format!("not a multiple of the {} record width {}", family, layout.record_width),
        });
    }

    let needed = match layout.gate {
        PointGate::TrailingPresenceLogit { .. } => stride + 1,
        _ => stride,
    };
    tensor.require(needed)?;

    let data = tensor.data();
    let count = stride / layout.record_width;

    // Global gate is decided once for the whole record set.
    let globally_present = match layout.gate {
        PointGate::TrailingPresenceLogit { threshold } => gate::accept_logit(data[stride], threshold),
        _ => true,
    };

    let points = data[..stride]
        .chunks_exact(layout.record_width)
        .map(|record| {
            let (x, y) = match layout.axis_order {
                AxisOrder::XY => (record[0], record[1]),
                AxisOrder::YX => (record[1], record[0]),
            };

            let accepted = match layout.gate {
                PointGate::TrailingPresenceLogit { .. } => globally_present,
                PointGate::NonNegative => x >= 0.0 && y >= 0.0,
                PointGate::Score { offset, threshold } => gate::accept(record[offset], threshold),
                PointGate::PresenceLogit { offset, threshold } => {
                    gate::accept_logit(record[offset], threshold)
                }
            };

            // A NaN coordinate never leaks out as half a point.
            (accepted && x.is_finite() && y.is_finite()).then(|| Point::new(x, y))
        })
        .collect::<Vec<_>>();

    debug_assert_eq!(points.len(), count);
    tracing::debug!(
        "Decoded {} {} points, {} present",
        count,
        family,
        points.iter().filter(|p| p.is_some()).count()
    );

    Ok(points)
}

/// True when the face-mesh presence logit of `tensor` passes its gate.
pub fn face_present(tensor: TensorView<'_>) -> Result<bool, DecodeError> {
    tensor.require(tensor.stride() + 1)?;
    Ok(gate::accept_logit(
        tensor.data()[tensor.stride()],
        FACE_MESH_PRESENCE_THRESHOLD,
    ))
}
