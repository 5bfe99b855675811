use crate::core::detector::CandidateBox;
use crate::core::landmarks::LandmarkPoint;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Margin added on each side of a detection, as a fraction of the frame.
pub const CROP_MARGIN_FRACTION: f32 = 0.1;

/// Smallest extent a crop may collapse to.
const MIN_EXTENT: f32 = 1.0;

/// Axis-aligned region in the pixel space of its parent image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Landmark indices bounding one eye: `left`/`top` give the near corner's
/// x/y, `right`/`bottom` the far corner's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeCorners {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl EyeCorners {
    pub const fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn indices(&self) -> [usize; 4] {
        [self.left, self.top, self.right, self.bottom]
    }
}

/// Face-mesh contour points around the subject's left eye (image right).
pub const LEFT_EYE_CORNERS: EyeCorners = EyeCorners::new(362, 386, 263, 374);
/// Face-mesh contour points around the subject's right eye (image left).
pub const RIGHT_EYE_CORNERS: EyeCorners = EyeCorners::new(33, 159, 133, 145);

/// Clamps one axis to `[0, limit]`, keeping at least `MIN_EXTENT`.
///
/// Non-finite inputs collapse to the origin.
fn clamp_axis(start: f32, extent: f32, limit: f32) -> (f32, f32) {
    let start = if start.is_finite() { start } else { 0.0 };
    let extent = if extent.is_finite() { extent } else { 0.0 };
    let limit = limit.max(MIN_EXTENT);

    let end = (start + extent).min(limit);
    let start = start.clamp(0.0, limit - MIN_EXTENT);
    let extent = (end - start).max(MIN_EXTENT);
    (start, extent)
}

impl CropRegion {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole of a `width` x `height` frame.
    pub fn full(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Clamps into `[0, frame_width] x [0, frame_height]`, never below 1x1.
    pub fn clamped(&self, frame_width: f32, frame_height: f32) -> Self {
        let (x, width) = clamp_axis(self.x, self.width, frame_width);
        let (y, height) = clamp_axis(self.y, self.height, frame_height);
        Self::new(x, y, width, height)
    }

    /// Moves the region by a parent crop's offset.
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whole-pixel `(x, y, width, height)`, at least 1x1.
    pub fn pixel_rect(&self) -> (u32, u32, u32, u32) {
        let x = self.x.max(0.0).floor();
        let y = self.y.max(0.0).floor();
        let width = (self.right() - x).round().max(MIN_EXTENT);
        let height = (self.bottom() - y).round().max(MIN_EXTENT);
        (x as u32, y as u32, width as u32, height as u32)
    }

    /// Cuts the region out of `frame`, clamped to the frame's bounds.
    pub fn crop_image(&self, frame: &DynamicImage) -> DynamicImage {
        let bounded = self.clamped(frame.width() as f32, frame.height() as f32);
        let (x, y, width, height) = bounded.pixel_rect();
        let width = width.min(frame.width().saturating_sub(x)).max(1);
        let height = height.min(frame.height().saturating_sub(y)).max(1);
        frame.crop_imm(x, y, width, height)
    }
}

/// Grows `detection` by `margin_fraction` of the frame on every side, then
/// clamps it into the frame.
pub fn expand(
    detection: &CandidateBox,
    frame_width: f32,
    frame_height: f32,
    margin_fraction: f32,
) -> CropRegion {
    let margin_x = margin_fraction * frame_width;
    let margin_y = margin_fraction * frame_height;

    CropRegion::new(
        detection.x - margin_x,
        detection.y - margin_y,
        detection.width + 2.0 * margin_x,
        detection.height + 2.0 * margin_y,
    )
    .clamped(frame_width, frame_height)
}

/// Eye region in face-crop pixels, from face landmarks in model-input space.
///
/// Returns `None` when any of the four corner points is absent or out of
/// range. The region is clamped to the face crop and kept at least 1x1.
pub fn derive_eye_region(
    face_landmarks: &[LandmarkPoint],
    corners: &EyeCorners,
    face_crop_cols: f32,
    face_crop_rows: f32,
    model_input_size: f32,
) -> Option<CropRegion> {
    let point = |index: usize| face_landmarks.get(index).copied().flatten();

    let near_x = point(corners.left)?.x;
    let near_y = point(corners.top)?.y;
    let far_x = point(corners.right)?.x;
    let far_y = point(corners.bottom)?.y;

    let scale_x = face_crop_cols / model_input_size;
    let scale_y = face_crop_rows / model_input_size;

    let x = near_x * scale_x;
    let y = near_y * scale_y;
    let region = CropRegion::new(x, y, far_x * scale_x - x, far_y * scale_y - y);

    Some(region.clamped(face_crop_cols, face_crop_rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::landmarks::Point;

    fn boxed(x: f32, y: f32, width: f32, height: f32) -> CandidateBox {
        CandidateBox {
            x,
            y,
            width,
            height,
            confidence: 0.9,
        }
    }

    fn assert_inside(region: &CropRegion, fw: f32, fh: f32) {
        assert!(region.x >= 0.0, "{region:?}");
        assert!(region.y >= 0.0, "{region:?}");
        assert!(region.right() <= fw + 1e-4, "{region:?}");
        assert!(region.bottom() <= fh + 1e-4, "{region:?}");
        assert!(region.width >= 1.0 && region.height >= 1.0, "{region:?}");
    }

    #[test]
    fn test_expand_inside_frame() {
        let region = expand(&boxed(200.0, 150.0, 100.0, 120.0), 640.0, 480.0, 0.1);
        assert!((region.x - 136.0).abs() < 1e-4);
        assert!((region.y - 102.0).abs() < 1e-4);
        assert!((region.width - 228.0).abs() < 1e-4);
        assert!((region.height - 216.0).abs() < 1e-4);
    }

    #[test]
    fn test_expand_clamps_at_edges() {
        let region = expand(&boxed(10.0, 10.0, 620.0, 460.0), 640.0, 480.0, 0.1);
        assert_eq!(region, CropRegion::full(640.0, 480.0));
    }

    #[test]
    fn test_expand_never_leaves_frame() {
        let boxes = [
            boxed(-500.0, -500.0, 10.0, 10.0),
            boxed(2000.0, 2000.0, 50.0, 50.0),
            boxed(-100.0, 300.0, 2000.0, 10.0),
            boxed(600.0, -40.0, 300.0, 900.0),
            boxed(0.0, 0.0, -50.0, -50.0),
            boxed(f32::NAN, f32::NAN, f32::NAN, f32::NAN),
        ];
        for b in &boxes {
            let region = expand(b, 640.0, 480.0, CROP_MARGIN_FRACTION);
            assert_inside(&region, 640.0, 480.0);
        }
    }

    #[test]
    fn test_box_outside_frame_collapses_to_one_pixel() {
        let region = expand(&boxed(2000.0, 10.0, 50.0, 50.0), 640.0, 480.0, 0.0);
        assert_eq!(region.x, 639.0);
        assert_eq!(region.width, 1.0);
    }

    fn face_points() -> Vec<LandmarkPoint> {
        let mut points = vec![Some(Point::new(0.0, 0.0)); 4];
        points[0] = Some(Point::new(40.0, 10.0));
        points[1] = Some(Point::new(50.0, 30.0));
        points[2] = Some(Point::new(80.0, 12.0));
        points[3] = Some(Point::new(60.0, 50.0));
        points
    }

    #[test]
    fn test_derive_eye_region_scales_to_face_crop() {
        let corners = EyeCorners::new(0, 1, 2, 3);
        let region = derive_eye_region(&face_points(), &corners, 384.0, 192.0, 192.0).unwrap();
        assert!((region.x - 80.0).abs() < 1e-4);
        assert!((region.y - 30.0).abs() < 1e-4);
        assert!((region.width - 80.0).abs() < 1e-4);
        assert!((region.height - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_derive_eye_region_missing_point() {
        let mut points = face_points();
        points[2] = None;
        let corners = EyeCorners::new(0, 1, 2, 3);
        assert!(derive_eye_region(&points, &corners, 192.0, 192.0, 192.0).is_none());
        assert!(derive_eye_region(&points, &LEFT_EYE_CORNERS, 192.0, 192.0, 192.0).is_none());
    }

    #[test]
    fn test_derive_eye_region_clamped_to_face_crop() {
        let points = vec![
            Some(Point::new(-20.0, -5.0)),
            Some(Point::new(300.0, 400.0)),
        ];
        let corners = EyeCorners::new(0, 0, 1, 1);
        let region = derive_eye_region(&points, &corners, 192.0, 192.0, 192.0).unwrap();
        assert_inside(&region, 192.0, 192.0);
        assert_eq!(region, CropRegion::full(192.0, 192.0));
    }

    #[test]
    fn test_inverted_corners_become_one_pixel() {
        let corners = EyeCorners::new(2, 3, 0, 1);
        let region = derive_eye_region(&face_points(), &corners, 192.0, 192.0, 192.0).unwrap();
        assert_eq!(region.width, 1.0);
        assert_eq!(region.height, 1.0);
    }

    #[test]
    fn test_pixel_rect_and_crop_image() {
        let frame = DynamicImage::new_rgb8(64, 48);
        let region = CropRegion::new(10.4, 5.6, 20.2, 30.0);
        assert_eq!(region.pixel_rect(), (10, 5, 21, 31));

        let cropped = region.crop_image(&frame);
        assert_eq!((cropped.width(), cropped.height()), (21, 31));

        let overhanging = CropRegion::new(50.0, 40.0, 100.0, 100.0);
        let cropped = overhanging.crop_image(&frame);
        assert_eq!((cropped.width(), cropped.height()), (14, 8));
    }

    #[test]
    fn test_translate() {
        let eye = CropRegion::new(5.0, 6.0, 10.0, 8.0).translate(100.0, 50.0);
        assert_eq!(eye, CropRegion::new(105.0, 56.0, 10.0, 8.0));
    }
}
