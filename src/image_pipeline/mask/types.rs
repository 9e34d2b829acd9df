use serde::{Deserialize, Serialize};

/// Interior test used when filling self-intersecting polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
}

/// Row-major pixel membership for one ROI on one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoiMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl RoiMask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[self.index(x, y)]
    }

    pub(crate) fn set(&mut self, x: u32, y: u32) {
        let idx = self.index(x, y);
        self.data[idx] = true;
    }

    pub(crate) fn fill_row(&mut self, y: u32, x_start: u32, x_end: u32) {
        let start = self.index(x_start, y);
        let end = self.index(x_end, y);
        self.data[start..=end].fill(true);
    }

    pub fn count(&self) -> u64 {
        self.data.iter().filter(|&&v| v).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Flat pixel indices of included pixels, in row-major order.
    pub fn indices(&self) -> Vec<usize> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| v.then_some(i))
            .collect()
    }

    /// Tightest rectangle around the included pixels.
    pub fn bounding_rect(&self) -> Option<BoundingRect> {
        let width = self.width as usize;
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (i, _) in self.data.iter().enumerate().filter(|(_, v)| **v) {
            let (x, y) = (i % width, i / width);
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        bounds.map(|(x0, y0, x1, y1)| {
            let width = (x1 - x0 + 1) as u32;
            let height = (y1 - y0 + 1) as u32;
            BoundingRect {
                x: x0 as u32,
                y: y0 as u32,
                width,
                height,
                aspect_ratio: width as f64 / height as f64,
            }
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
