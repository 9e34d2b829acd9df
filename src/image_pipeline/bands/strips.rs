use std::ops::Range;

use crate::image_pipeline::bands::types::Band;
use crate::image_pipeline::common::error::{AnalysisError, Result};

/// Consecutive row ranges of at most `chunk_rows` rows covering `0..height`.
#[derive(Debug, Clone)]
pub struct RowStrips {
    height: u32,
    chunk_rows: u32,
    next: u32,
}

impl Iterator for RowStrips {
    type Item = Range<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.height {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.chunk_rows).min(self.height);
        self.next = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.height.saturating_sub(self.next).div_ceil(self.chunk_rows) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RowStrips {}

pub fn row_strips(height: u32, chunk_rows: u32) -> Result<RowStrips> {
    if chunk_rows == 0 {
        return Err(AnalysisError::Compute {
            band: Band::Chromatic,
            reason: "chunk_rows must be positive".to_string(),
        });
    }
    Ok(RowStrips { height, chunk_rows, next: 0 })
}
