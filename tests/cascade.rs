//! End-to-end cascade passes over synthetic tensors.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use landmark_cascade::core::anchors::GridResolution;
use landmark_cascade::core::detector::BOX_RECORD_WIDTH;
use landmark_cascade::core::landmarks::FACE_MESH_POINTS;
use landmark_cascade::engine::RecordedTensor;
use landmark_cascade::{
    CascadeError, Config, CropRegion, DecodeError, FaceCascade, InferenceEngine, Point,
    ReplayEngine, Stage, StageOutput, TensorDump,
};

const EPS: f32 = 1e-3;

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < EPS,
        "expected {expected}, got {actual}"
    );
}

fn assert_point(actual: Option<Point>, x: f32, y: f32) {
    let p = actual.unwrap_or_else(|| panic!("expected ({x}, {y}), got None"));
    assert_close(p.x, x);
    assert_close(p.y, y);
}

/// 640x480 frame, one 2x2 anchor grid so anchors sit at (160|480, 120|360).
fn config() -> Config {
    let mut config = Config::default();
    config.detector.resolutions = vec![GridResolution::new(2, 1)];
    config
}

/// Detector output with one accepted record on anchor 0.
///
/// Offsets move the centre to (320, 240); a 64x64 model-unit box gives a
/// corner at (192, 112) and a 320x240 frame extent.
fn detect_tensor(logit: f32) -> RecordedTensor {
    let stride = 4 * BOX_RECORD_WIDTH;
    let mut data = vec![0.0; stride];
    data[..4].copy_from_slice(&[120.0, 160.0, 64.0, 64.0]);
    data.extend_from_slice(&[logit, -6.0, -6.0, -6.0]);
    RecordedTensor {
        data,
        stride,
        elapsed_ms: 3.0,
    }
}

fn face_mesh_tensor(logit: f32) -> RecordedTensor {
    let mut points = vec![(96.0, 96.0); FACE_MESH_POINTS];
    // Left eye corners: 362 / 386 / 263 / 374.
    points[362] = (60.0, 60.0);
    points[386] = (72.0, 48.0);
    points[263] = (84.0, 60.0);
    points[374] = (72.0, 72.0);
    // Right eye corners: 33 / 159 / 133 / 145.
    points[33] = (120.0, 60.0);
    points[159] = (132.0, 48.0);
    points[133] = (144.0, 60.0);
    points[145] = (132.0, 72.0);

    let mut data: Vec<f32> = points.iter().flat_map(|&(x, y)| [x, y, 0.0]).collect();
    let stride = data.len();
    data.push(logit);
    RecordedTensor {
        data,
        stride,
        elapsed_ms: 7.0,
    }
}

fn iris_tensor(first_x: f32) -> RecordedTensor {
    let data = vec![
        first_x, 32.0, 0.0, //
        28.0, 32.0, 0.0, //
        32.0, 28.0, 0.0, //
        36.0, 32.0, 0.0, //
        32.0, 36.0, 0.0, //
    ];
    RecordedTensor {
        data,
        stride: 15,
        elapsed_ms: 1.5,
    }
}

fn full_dump() -> TensorDump {
    let mut dump = TensorDump::default();
    dump.insert(Stage::Detect, detect_tensor(3.0));
    dump.insert(Stage::Landmark, face_mesh_tensor(2.0));
    dump.insert(Stage::EyeLeft, iris_tensor(32.0));
    dump.insert(Stage::EyeRight, iris_tensor(-1.0));
    dump
}

#[test]
fn test_full_pass_composes_into_frame_space() {
    let mut cascade = FaceCascade::new(config());
    let mut engine = ReplayEngine::new(full_dump());
    let frame = cascade.run(&mut engine).unwrap().clone();

    // Detection and face crop.
    assert_close(frame.detection.x, 192.0);
    assert_close(frame.detection.y, 112.0);
    assert_close(frame.detection.width, 320.0);
    assert_close(frame.detection.height, 240.0);
    assert_close(frame.face_region.x, 128.0);
    assert_close(frame.face_region.y, 64.0);
    assert_close(frame.face_region.width, 448.0);
    assert_close(frame.face_region.height, 336.0);

    // Face mesh: scale 448/192 and 336/192, offset by the face crop.
    assert!(frame.face_present);
    assert_eq!(frame.face_landmarks.len(), FACE_MESH_POINTS);
    assert!(frame.face_landmarks.iter().all(Option::is_some));
    assert_point(frame.face_landmarks[0], 352.0, 232.0);

    // Left eye crop: (140, 84, 56, 42) inside the face crop.
    let left = frame.left_eye.as_ref().unwrap();
    assert_close(left.region_in_face.x, 140.0);
    assert_close(left.region_in_face.y, 84.0);
    assert_close(left.region_in_face.width, 56.0);
    assert_close(left.region_in_face.height, 42.0);
    assert_close(left.region.x, 268.0);
    assert_close(left.region.y, 148.0);

    // Iris centre: eye crop → face crop → frame.
    assert_point(left.iris[0], 296.0, 169.0);
    assert_eq!(left.iris.len(), 5);

    // Right eye: first iris point has a negative x and is suppressed.
    let right = frame.right_eye.as_ref().unwrap();
    assert_close(right.region_in_face.x, 280.0);
    assert_eq!(right.iris[0], None);
    assert!(right.iris[1..].iter().all(Option::is_some));

    // Engine saw each stage once, in order, with frame-space crops.
    let stages: Vec<Stage> = engine.requests().iter().map(|(s, _)| *s).collect();
    assert_eq!(stages, Stage::ORDER.to_vec());
    assert_eq!(engine.requests()[0].1, CropRegion::full(640.0, 480.0));
    assert_eq!(engine.requests()[1].1, frame.face_region);
    assert_eq!(engine.requests()[2].1, left.region);

    let timings: Vec<f64> = frame.timings.iter().map(|t| t.elapsed_ms).collect();
    assert_eq!(timings, vec![3.0, 7.0, 1.5, 1.5]);
}

#[test]
fn test_absent_face_skips_iris_stages() {
    let mut dump = full_dump();
    dump.insert(Stage::Landmark, face_mesh_tensor(-2.0));

    let mut cascade = FaceCascade::new(config());
    let mut engine = ReplayEngine::new(dump);
    let frame = cascade.run(&mut engine).unwrap();

    assert!(!frame.face_present);
    assert!(frame.face_landmarks.iter().all(Option::is_none));
    assert!(frame.left_eye.is_none());
    assert!(frame.right_eye.is_none());
    assert_eq!(engine.requests().len(), 2);
}

#[test]
fn test_iris_disabled_stops_after_landmarks() {
    let mut config = config();
    config.iris.enabled = false;

    let mut cascade = FaceCascade::new(config);
    let mut engine = ReplayEngine::new(full_dump());
    let frame = cascade.run(&mut engine).unwrap();

    assert!(frame.face_present);
    assert!(frame.left_eye.is_none());
    assert_eq!(engine.requests().len(), 2);
}

#[test]
fn test_no_detection_uses_fallback_box() {
    let mut dump = full_dump();
    dump.insert(Stage::Detect, detect_tensor(-4.0));

    let mut cascade = FaceCascade::new(config());
    let mut engine = ReplayEngine::new(dump);
    let frame = cascade.run(&mut engine).unwrap();

    assert!(frame.detection.is_fallback());
    assert_eq!(
        (frame.detection.x, frame.detection.y, frame.detection.width, frame.detection.height),
        (0.0, 0.0, 192.0, 192.0)
    );
    // 192 + 2 * 64 wide from -64, 192 + 2 * 48 tall from -48, clamped at the origin.
    assert_eq!(frame.face_region, CropRegion::new(0.0, 0.0, 256.0, 240.0));
}

#[test]
fn test_twelve_point_mesh_scaled_by_face_crop() {
    let mut data = Vec::new();
    for i in 0..12 {
        data.extend_from_slice(&[10.0 + i as f32, 20.0 + i as f32, 0.0]);
    }
    data.push(2.0);

    let mut dump = full_dump();
    dump.insert(
        Stage::Landmark,
        RecordedTensor {
            data,
            stride: 36,
            elapsed_ms: 0.0,
        },
    );

    let mut cascade = FaceCascade::new(config());
    let mut engine = ReplayEngine::new(dump);
    let frame = cascade.run(&mut engine).unwrap();

    assert_eq!(frame.face_landmarks.len(), 12);
    assert!(frame.face_landmarks.iter().all(Option::is_some));
    assert_point(frame.face_landmarks[0], 10.0 * 448.0 / 192.0 + 128.0, 20.0 * 1.75 + 64.0);

    // Eye corner indices are beyond a 12-point mesh, so no eye stage runs.
    assert!(frame.left_eye.is_none());
    assert!(frame.right_eye.is_none());
    assert_eq!(engine.requests().len(), 2);
}

#[test]
fn test_malformed_tensor_keeps_previous_frame() {
    let mut cascade = FaceCascade::new(config());
    let first = cascade
        .run(&mut ReplayEngine::new(full_dump()))
        .unwrap()
        .clone();

    let mut broken = full_dump();
    let mut short = face_mesh_tensor(2.0);
    short.data.truncate(100);
    broken.insert(Stage::Landmark, short);

    let err = cascade.run(&mut ReplayEngine::new(broken)).unwrap_err();
    assert!(matches!(
        err,
        CascadeError::Decode(DecodeError::TensorTooShort { .. })
    ));
    assert_eq!(cascade.last_frame(), Some(&first));
}

/// Fails when asked for one particular stage.
struct FailingEngine {
    inner: ReplayEngine,
    fail_on: Stage,
}

impl InferenceEngine for FailingEngine {
    fn infer(&mut self, stage: Stage, crop: &CropRegion) -> landmark_cascade::Result<StageOutput> {
        if stage == self.fail_on {
            return Err(CascadeError::Engine(format!("{} model unavailable", stage)));
        }
        self.inner.infer(stage, crop)
    }
}

#[test]
fn test_engine_failure_aborts_pass() {
    let mut cascade = FaceCascade::new(config());
    let mut engine = FailingEngine {
        inner: ReplayEngine::new(full_dump()),
        fail_on: Stage::EyeRight,
    };

    let err = cascade.run(&mut engine).unwrap_err();
    assert!(err.to_string().contains("eye_right"));
    assert!(cascade.last_frame().is_none());
    assert_eq!(engine.inner.requests().len(), 3);
}

#[test]
fn test_missing_recorded_stage_is_engine_error() {
    let mut dump = TensorDump::default();
    dump.insert(Stage::Detect, detect_tensor(3.0));

    let mut cascade = FaceCascade::new(config());
    let err = cascade.run(&mut ReplayEngine::new(dump)).unwrap_err();
    assert!(matches!(err, CascadeError::Engine(_)));
}
