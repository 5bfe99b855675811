//! Boundary to the external inference engine.
//!
//! The cascade never runs a model itself. It asks an `InferenceEngine` for the
//! raw output of each stage, given the crop that stage should see.

pub mod replay;

use crate::common::Result;
use crate::core::cascade::Stage;
use crate::core::crop::CropRegion;
use crate::core::tensor::TensorView;
use std::time::Duration;

pub use replay::{RecordedTensor, ReplayEngine, TensorDump};

/// Raw output of one model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput {
    pub tensor: Vec<f32>,
    pub stride: usize,
    /// Time the engine spent in inference, passed through untouched.
    pub elapsed: Duration,
}

impl StageOutput {
    pub fn new(tensor: Vec<f32>, stride: usize) -> Self {
        Self {
            tensor,
            stride,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn view(&self) -> TensorView<'_> {
        TensorView::new(&self.tensor, self.stride)
    }
}

pub trait InferenceEngine {
    /// Runs the model behind `stage` on `crop`, given in frame pixels.
    fn infer(&mut self, stage: Stage, crop: &CropRegion) -> Result<StageOutput>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for &mut E {
    fn infer(&mut self, stage: Stage, crop: &CropRegion) -> Result<StageOutput> {
        (**self).infer(stage, crop)
    }
}
