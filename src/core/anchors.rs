use serde::{Deserialize, Serialize};

/// One feature-map resolution of a grid detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridResolution {
    pub grid_size: u32,
    pub anchors_per_cell: u32,
}

impl GridResolution {
    pub const fn new(grid_size: u32, anchors_per_cell: u32) -> Self {
        Self {
            grid_size,
            anchors_per_cell,
        }
    }

    pub fn anchor_count(&self) -> usize {
        (self.grid_size as usize).pow(2) * self.anchors_per_cell as usize
    }
}

/// BlazeFace short-range layout: 16x16 with 2 anchors per cell, then 8x8 with 6.
pub const BLAZEFACE_RESOLUTIONS: [GridResolution; 2] =
    [GridResolution::new(16, 2), GridResolution::new(8, 6)];

/// Anchor centre in model-input pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

/// Total anchors produced for `resolutions`.
pub fn anchor_count(resolutions: &[GridResolution]) -> usize {
    resolutions.iter().map(GridResolution::anchor_count).sum()
}

/// Generates anchor centres row-major per resolution, resolutions in order.
///
/// The ordering matches the detector's native output ordering; the box
/// decoder pairs anchors with tensor records by position.
pub fn generate(input_height: f32, input_width: f32, resolutions: &[GridResolution]) -> Vec<Anchor> {
    let mut anchors = Vec::with_capacity(anchor_count(resolutions));

    for res in resolutions {
        let cell_w = input_width / res.grid_size as f32;
        let cell_h = input_height / res.grid_size as f32;
        for y in 0..res.grid_size {
            for x in 0..res.grid_size {
                let anchor = Anchor {
                    x: (x as f32 + 0.5) * cell_w,
                    y: (y as f32 + 0.5) * cell_h,
                };
                for _ in 0..res.anchors_per_cell {
                    anchors.push(anchor);
                }
            }
        }
    }

    anchors
}
