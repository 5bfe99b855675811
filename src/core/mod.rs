pub mod anchors;
pub mod cascade;
pub mod compose;
pub mod crop;
pub mod detector;
pub mod gate;
pub mod landmarks;
pub mod pose;
pub mod tensor;
pub mod topology;

pub use anchors::{Anchor, GridResolution};
pub use cascade::{CascadeFrame, EyeResult, FaceCascade, Stage, StageTiming};
pub use compose::{to_frame_space, StageTransform};
pub use crop::{CropRegion, EyeCorners};
pub use detector::{BoxDecoderParams, CandidateBox};
pub use landmarks::{LandmarkPoint, ModelFamily, Point};
pub use pose::{decode_pose, PoseGeometry};
pub use tensor::TensorView;
pub use topology::{visible_edges, Topology};
