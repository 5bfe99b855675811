use crate::core::crop::CropRegion;
use crate::core::landmarks::{LandmarkPoint, Point};
use serde::Serialize;

/// Maps one axis from model-input units into a target of `target_dimension`
/// pixels placed at `crop_offset`.
#[inline]
pub fn to_frame_space(value: f32, model_input_size: f32, target_dimension: f32, crop_offset: f32) -> f32 {
    value * (target_dimension / model_input_size) + crop_offset
}

/// Scale-then-offset mapping from one stage's space into its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageTransform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl StageTransform {
    pub const IDENTITY: StageTransform = StageTransform {
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Model-input space of a `model_input_size` square model run on `crop`.
    pub fn for_crop(crop: &CropRegion, model_input_size: f32) -> Self {
        Self {
            scale_x: crop.width / model_input_size,
            scale_y: crop.height / model_input_size,
            offset_x: crop.x,
            offset_y: crop.y,
        }
    }

    /// Model-input space of a model run on an uncropped frame.
    pub fn for_frame(frame_width: f32, frame_height: f32, model_input_size: f32) -> Self {
        Self::for_crop(&CropRegion::full(frame_width, frame_height), model_input_size)
    }

    /// Applies `self` first, then `outer`.
    pub fn then(&self, outer: &StageTransform) -> StageTransform {
        StageTransform {
            scale_x: self.scale_x * outer.scale_x,
            scale_y: self.scale_y * outer.scale_y,
            offset_x: self.offset_x * outer.scale_x + outer.offset_x,
            offset_y: self.offset_y * outer.scale_y + outer.offset_y,
        }
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            point.x * self.scale_x + self.offset_x,
            point.y * self.scale_y + self.offset_y,
        )
    }

    pub fn apply_all(&self, points: &[LandmarkPoint]) -> Vec<LandmarkPoint> {
        points.iter().map(|p| p.map(|p| self.apply(p))).collect()
    }
}

/// Composes `points` through `stages`, innermost stage first.
pub fn compose(points: &[LandmarkPoint], stages: &[StageTransform]) -> Vec<LandmarkPoint> {
    let combined = stages
        .iter()
        .fold(StageTransform::IDENTITY, |acc, stage| acc.then(stage));
    combined.apply_all(points)
}
