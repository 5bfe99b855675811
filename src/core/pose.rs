use crate::common::DecodeError;
use crate::core::compose::StageTransform;
use crate::core::landmarks::{self, LandmarkPoint, ModelFamily};
use crate::core::tensor::TensorView;

/// MoveNet reports coordinates normalised to the input.
pub const MOVENET_INPUT_SIZE: f32 = 1.0;
pub const BLAZEPOSE_INPUT_SIZE: f32 = 256.0;

/// Frame a single-stage model ran on, uncropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseGeometry {
    pub frame_width: f32,
    pub frame_height: f32,
    pub model_input_size: f32,
}

impl PoseGeometry {
    pub fn for_family(family: ModelFamily, frame_width: f32, frame_height: f32) -> Self {
        let model_input_size = match family {
            ModelFamily::MoveNet => MOVENET_INPUT_SIZE,
            _ => BLAZEPOSE_INPUT_SIZE,
        };
        Self {
            frame_width,
            frame_height,
            model_input_size,
        }
    }
}

/// Decodes a single-stage pose tensor straight into frame pixels.
pub fn decode_pose(
    tensor: TensorView<'_>,
    family: ModelFamily,
    geometry: &PoseGeometry,
) -> Result<Vec<LandmarkPoint>, DecodeError> {
    let points = landmarks::decode(tensor, family)?;
    let to_frame = StageTransform::for_frame(
        geometry.frame_width,
        geometry.frame_height,
        geometry.model_input_size,
    );
    Ok(to_frame.apply_all(&points))
}
