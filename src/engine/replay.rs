use crate::common::{CascadeError, Result};
use crate::core::cascade::Stage;
use crate::core::crop::CropRegion;
use crate::engine::{InferenceEngine, StageOutput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// One stage's output as written by a capture tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedTensor {
    pub data: Vec<f32>,
    pub stride: usize,
    #[serde(default)]
    pub elapsed_ms: f64,
}

/// Recorded outputs keyed by stage, e.g. `{"detect": {...}, "landmark": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TensorDump {
    pub stages: HashMap<Stage, RecordedTensor>,
}

impl TensorDump {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| CascadeError::Other(anyhow::anyhow!("Tensor dump parse error: {}", e)))
    }

    pub fn insert(&mut self, stage: Stage, tensor: RecordedTensor) {
        self.stages.insert(stage, tensor);
    }
}

/// Serves recorded tensors in place of a live engine.
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    dump: TensorDump,
    requests: Vec<(Stage, CropRegion)>,
}

impl ReplayEngine {
    pub fn new(dump: TensorDump) -> Self {
        Self {
            dump,
            requests: Vec::new(),
        }
    }

    /// Crops the cascade asked for, in call order.
    pub fn requests(&self) -> &[(Stage, CropRegion)] {
        &self.requests
    }
}

impl InferenceEngine for ReplayEngine {
    fn infer(&mut self, stage: Stage, crop: &CropRegion) -> Result<StageOutput> {
        self.requests.push((stage, *crop));

        let recorded = self
            .dump
            .stages
            .get(&stage)
            .ok_or_else(|| CascadeError::Engine(format!("No recorded tensor for stage {}", stage)))?;

        let elapsed = Duration::from_micros((recorded.elapsed_ms.max(0.0) * 1000.0).round() as u64);
        Ok(StageOutput::new(recorded.data.clone(), recorded.stride).with_elapsed(elapsed))
    }
}
