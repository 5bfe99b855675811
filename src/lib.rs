// Core modules
pub mod common;
pub mod core;
pub mod engine;

// Re-export commonly used types
pub use crate::common::{CascadeError, Config, DecodeError, Result};
pub use crate::core::{
    CandidateBox, CascadeFrame, CropRegion, FaceCascade, LandmarkPoint, ModelFamily, Point, Stage,
    TensorView,
};
pub use crate::engine::{InferenceEngine, ReplayEngine, StageOutput, TensorDump};
