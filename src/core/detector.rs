use crate::common::DecodeError;
use crate::core::anchors::Anchor;
use crate::core::gate;
use crate::core::tensor::TensorView;
use serde::Serialize;

/// Values per detector record: 4 box values followed by 6 keypoints (x, y).
pub const BOX_RECORD_WIDTH: usize = 16;

/// Centre-to-corner multiplier of the detector's box encoding.
///
/// Empirical: the top-left corner sits two box extents from the decoded
/// centre, not half an extent.
pub const BOX_OFFSET_MULTIPLIER: f32 = 2.0;

pub const DETECTION_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// 0.0 marks the fallback box.
    pub confidence: f32,
}

impl CandidateBox {
    /// Full-extent box substituted when no record passes the gate.
    pub fn fallback(size: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size,
            height: size,
            confidence: 0.0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence <= 0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoxDecoderParams {
    pub record_width: usize,
    pub offset_multiplier: f32,
    pub confidence_threshold: f32,
    pub frame_width: f32,
    pub frame_height: f32,
    pub model_input_size: f32,
    /// Extent of the fallback box, sized for the next stage's model input.
    pub fallback_size: f32,
}

impl BoxDecoderParams {
    pub fn new(frame_width: f32, frame_height: f32, model_input_size: f32, fallback_size: f32) -> Self {
        Self {
            record_width: BOX_RECORD_WIDTH,
            offset_multiplier: BOX_OFFSET_MULTIPLIER,
            confidence_threshold: DETECTION_THRESHOLD,
            frame_width,
            frame_height,
            model_input_size,
            fallback_size,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }
}

/// Checks the record block and score block both fit before any indexing.
fn check_layout(tensor: &TensorView<'_>, count: usize, record_width: usize) -> Result<(), DecodeError> {
    let stride = tensor.stride();
    if stride < count * record_width {
        return Err(DecodeError::InvalidStride {
            stride,
            reason: format!(
                "{} records of width {} need a box block of {}",
                count,
                record_width,
                count * record_width
            ),
        });
    }
    tensor.require(stride + count)
}

/// Decodes record `i`, returning `None` when its score is not accepted.
fn decode_record(
    data: &[f32],
    stride: usize,
    i: usize,
    anchor: &Anchor,
    params: &BoxDecoderParams,
) -> Option<CandidateBox> {
    let confidence = gate::probability(data[stride + i]);
    if !gate::accept(confidence, params.confidence_threshold) {
        return None;
    }

    let offset = i * params.record_width;
    let y_center = data[offset] + anchor.y;
    let x_center = data[offset + 1] + anchor.x;
    let height = data[offset + 2];
    let width = data[offset + 3];

    Some(CandidateBox {
        x: x_center - params.offset_multiplier * width,
        y: y_center - params.offset_multiplier * height,
        width: width * params.frame_width / params.model_input_size,
        height: height * params.frame_height / params.model_input_size,
        confidence,
    })
}

/// Returns the highest-confidence accepted box, first seen on ties, or the
/// fallback box when nothing passes the gate.
///
/// The tensor holds `anchors.len()` box records followed, at offset
/// `tensor.stride()`, by one score logit per record.
pub fn decode(
    tensor: TensorView<'_>,
    anchors: &[Anchor],
    params: &BoxDecoderParams,
) -> Result<CandidateBox, DecodeError> {
    check_layout(&tensor, anchors.len(), params.record_width)?;

    let data = tensor.data();
    let mut best: Option<CandidateBox> = None;

    for (i, anchor) in anchors.iter().enumerate() {
        if let Some(candidate) = decode_record(data, tensor.stride(), i, anchor, params) {
            match best {
                Some(ref current) if candidate.confidence <= current.confidence => {}
                _ => best = Some(candidate),
            }
        }
    }

    Ok(best.unwrap_or_else(|| {
        tracing::debug!("No detection above {:.2}, using fallback box", params.confidence_threshold);
        CandidateBox::fallback(params.fallback_size)
    }))
}

/// Every accepted candidate, sorted by descending confidence. Diagnostic only.
pub fn decode_candidates(
    tensor: TensorView<'_>,
    anchors: &[Anchor],
    params: &BoxDecoderParams,
) -> Result<Vec<CandidateBox>, DecodeError> {
    check_layout(&tensor, anchors.len(), params.record_width)?;

    let data = tensor.data();
    let mut candidates: Vec<CandidateBox> = anchors
        .iter()
        .enumerate()
        .filter_map(|(i, anchor)| decode_record(data, tensor.stride(), i, anchor, params))
        .collect();

    // Stable sort keeps index order among equal scores.
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(candidates)
}
