//! Face → landmark → iris cascade as an explicit stage pipeline.
//!
//! Stages run strictly in order, each taking the previous stage's typed
//! output. A failed stage aborts the pass and leaves the last completed
//! frame untouched.

use crate::common::{Config, Result};
use crate::core::anchors::{self, Anchor};
use crate::core::compose::StageTransform;
use crate::core::crop::{self, CropRegion, EyeCorners};
use crate::core::detector::{self, BoxDecoderParams, CandidateBox};
use crate::core::landmarks::{self, LandmarkPoint, ModelFamily};
use crate::engine::{InferenceEngine, StageOutput};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Detect,
    Landmark,
    EyeLeft,
    EyeRight,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [Stage::Detect, Stage::Landmark, Stage::EyeLeft, Stage::EyeRight];

    /// Stage that follows `self`; the eye stages only exist with iris enabled.
    pub fn next(self, iris_enabled: bool) -> Option<Stage> {
        match self {
            Stage::Detect => Some(Stage::Landmark),
            Stage::Landmark if iris_enabled => Some(Stage::EyeLeft),
            Stage::Landmark => None,
            Stage::EyeLeft => Some(Stage::EyeRight),
            Stage::EyeRight => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Detect => "detect",
            Stage::Landmark => "landmark",
            Stage::EyeLeft => "eye_left",
            Stage::EyeRight => "eye_right",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EyeResult {
    /// Eye crop in frame pixels, as handed to the engine.
    pub region: CropRegion,
    /// The same crop relative to the face crop.
    pub region_in_face: CropRegion,
    /// Iris points in frame pixels.
    pub iris: Vec<LandmarkPoint>,
}

/// Everything one completed pass produced, in frame pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeFrame {
    pub detection: CandidateBox,
    pub face_region: CropRegion,
    pub face_present: bool,
    pub face_landmarks: Vec<LandmarkPoint>,
    pub left_eye: Option<EyeResult>,
    pub right_eye: Option<EyeResult>,
    pub timings: Vec<StageTiming>,
}

struct Detected {
    detection: CandidateBox,
    face_region: CropRegion,
}

struct Landmarked {
    present: bool,
    /// Landmark model-input space; eye regions are derived from these.
    model_points: Vec<LandmarkPoint>,
    frame_points: Vec<LandmarkPoint>,
}

pub struct FaceCascade {
    config: Config,
    anchors: Vec<Anchor>,
    last: Option<CascadeFrame>,
}

impl FaceCascade {
    pub fn new(config: Config) -> Self {
        // Anchors span the frame so decoded centres land in frame pixels.
        let anchors = anchors::generate(
            config.frame.height as f32,
            config.frame.width as f32,
            &config.detector.resolutions,
        );
        tracing::debug!("Generated {} detector anchors", anchors.len());

        Self {
            config,
            anchors,
            last: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn iris_enabled(&self) -> bool {
        self.config.iris.enabled
    }

    /// Most recent completed pass.
    pub fn last_frame(&self) -> Option<&CascadeFrame> {
        self.last.as_ref()
    }

    fn frame_size(&self) -> (f32, f32) {
        (self.config.frame.width as f32, self.config.frame.height as f32)
    }

    /// Runs one pass. On error the previous frame stays in place.
    pub fn run<E: InferenceEngine + ?Sized>(&mut self, engine: &mut E) -> Result<&CascadeFrame> {
        match self.run_pass(engine) {
            Ok(frame) => Ok(&*self.last.insert(frame)),
            Err(e) => {
                tracing::warn!("Cascade pass aborted: {}", e);
                Err(e)
            }
        }
    }

    fn run_pass<E: InferenceEngine + ?Sized>(&self, engine: &mut E) -> Result<CascadeFrame> {
        let mut timings = Vec::with_capacity(Stage::ORDER.len());

        let detected = self.detect(engine, &mut timings)?;
        let landmarked = self.landmark(engine, &detected, &mut timings)?;

        let mut left_eye = None;
        let mut right_eye = None;

        let mut next = if landmarked.present {
            Stage::Landmark.next(self.iris_enabled())
        } else {
            tracing::debug!("Face presence below threshold, skipping iris stages");
            None
        };

        while let Some(stage) = next {
            match stage {
                Stage::EyeLeft => {
                    let corners = &self.config.iris.left_eye;
                    left_eye = self.eye(engine, stage, corners, &detected, &landmarked, &mut timings)?;
                }
                Stage::EyeRight => {
                    let corners = &self.config.iris.right_eye;
                    right_eye = self.eye(engine, stage, corners, &detected, &landmarked, &mut timings)?;
                }
                Stage::Detect | Stage::Landmark => {}
            }
            next = stage.next(self.iris_enabled());
        }

        Ok(CascadeFrame {
            detection: detected.detection,
            face_region: detected.face_region,
            face_present: landmarked.present,
            face_landmarks: landmarked.frame_points,
            left_eye,
            right_eye,
            timings,
        })
    }

    fn invoke<E: InferenceEngine + ?Sized>(
        engine: &mut E,
        stage: Stage,
        crop: &CropRegion,
        timings: &mut Vec<StageTiming>,
    ) -> Result<StageOutput> {
        let output = engine.infer(stage, crop)?;
        tracing::debug!(
            "Stage {} returned {} values (stride {}) in {:?}",
            stage,
            output.tensor.len(),
            output.stride,
            output.elapsed
        );
        timings.push(StageTiming {
            stage,
            elapsed_ms: output.elapsed.as_micros() as f64 / 1000.0,
        });
        Ok(output)
    }

    fn detect<E: InferenceEngine + ?Sized>(
        &self,
        engine: &mut E,
        timings: &mut Vec<StageTiming>,
    ) -> Result<Detected> {
        let (frame_width, frame_height) = self.frame_size();
        let full_frame = CropRegion::full(frame_width, frame_height);
        let output = Self::invoke(engine, Stage::Detect, &full_frame, timings)?;

        let params = BoxDecoderParams::new(
            frame_width,
            frame_height,
            self.config.detector.input_size as f32,
            self.config.landmark.input_size as f32,
        )
        .with_threshold(self.config.detector.confidence_threshold);

        let detection = detector::decode(output.view(), &self.anchors, &params)?;
        if detection.is_fallback() {
            tracing::debug!("No face detected, cropping the fallback box");
        }

        let face_region = crop::expand(
            &detection,
            frame_width,
            frame_height,
            self.config.detector.margin_fraction,
        );

        Ok(Detected {
            detection,
            face_region,
        })
    }

    fn landmark<E: InferenceEngine + ?Sized>(
        &self,
        engine: &mut E,
        detected: &Detected,
        timings: &mut Vec<StageTiming>,
    ) -> Result<Landmarked> {
        let output = Self::invoke(engine, Stage::Landmark, &detected.face_region, timings)?;

        let present = landmarks::face_present(output.view())?;
        let model_points = landmarks::decode(output.view(), ModelFamily::FaceMesh)?;
        let landmark_input = self.config.landmark.input_size as f32;
        let frame_points = StageTransform::for_crop(&detected.face_region, landmark_input).apply_all(&model_points);

        Ok(Landmarked {
            present,
            model_points,
            frame_points,
        })
    }

    fn eye<E: InferenceEngine + ?Sized>(
        &self,
        engine: &mut E,
        stage: Stage,
        corners: &EyeCorners,
        detected: &Detected,
        landmarked: &Landmarked,
        timings: &mut Vec<StageTiming>,
    ) -> Result<Option<EyeResult>> {
        let face = &detected.face_region;
        let Some(region_in_face) = crop::derive_eye_region(
            &landmarked.model_points,
            corners,
            face.width,
            face.height,
            self.config.landmark.input_size as f32,
        ) else {
            tracing::debug!("Eye corners missing from face landmarks, skipping {}", stage);
            return Ok(None);
        };

        let region = region_in_face.translate(face.x, face.y);
        let output = Self::invoke(engine, stage, &region, timings)?;
        let points = landmarks::decode(output.view(), ModelFamily::Iris)?;

        // Eye crop → face crop → frame, innermost first.
        let eye_to_face = StageTransform::for_crop(&region_in_face, self.config.iris.input_size as f32);
        let face_to_frame = StageTransform {
            offset_x: face.x,
            offset_y: face.y,
            ..StageTransform::IDENTITY
        };
        let iris = eye_to_face.then(&face_to_frame).apply_all(&points);

        Ok(Some(EyeResult {
            region,
            region_in_face,
            iris,
        }))
    }
}
