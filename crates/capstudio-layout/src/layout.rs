//! Vertical geometry for caption placement.

use capstudio_models::{CaptionPosition, CaptionSpec};
use serde::{Deserialize, Serialize};

use crate::wrap::wrap_caption;

/// Vertical spacing between wrapped lines in pixels.
pub const LINE_SPACING_PX: u32 = 4;

/// Vertical draw position for the text block.
///
/// The top band is a fixed pixel offset; the bottom band is anchored to
/// the frame's bottom edge, whose height is only known at draw time, so
/// it is expressed relative to the FFmpeg frame-height variable `h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawY {
    /// Fixed offset from the top of the (padded) frame
    FromTop(i32),
    /// Offset subtracted from the (padded) frame height
    FromBottom(i32),
}

impl DrawY {
    /// Render as an FFmpeg drawtext `y` expression.
    pub fn to_expr(&self) -> String {
        match self {
            DrawY::FromTop(y) => y.to_string(),
            DrawY::FromBottom(offset) => format!("h-{offset}"),
        }
    }
}

/// Computed caption layout: wrapped text plus draw geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionLayout {
    /// Caption text with `\n` line breaks
    pub wrapped_text: String,
    /// Number of wrapped lines
    pub line_count: u32,
    /// Height of the text block including inter-line spacing
    pub total_text_height_px: u32,
    /// Correction for drawtext anchoring at the glyph baseline
    pub baseline_offset_px: u32,
    /// Vertical draw position
    pub draw_y: DrawY,
}

impl CaptionLayout {
    /// Compute the layout for a caption spec.
    ///
    /// Pure function of the spec: wraps the trimmed text, sizes the text
    /// block, and centers it within the caption band on the chosen side.
    pub fn compute(spec: &CaptionSpec) -> Self {
        let wrapped_text = wrap_caption(spec.trimmed_text(), spec.max_chars_per_line);
        let line_count = wrapped_text.split('\n').count() as u32;

        let total_text_height_px =
            line_count * spec.font_size_px + (line_count - 1) * LINE_SPACING_PX;

        // drawtext anchors at the baseline, not the visual center
        let baseline_offset_px = (spec.font_size_px as f64 * 0.2).floor() as u32;

        let half_band = (spec.band_height_px / 2) as i32;
        let half_text = (total_text_height_px / 2) as i32;
        let baseline = baseline_offset_px as i32;

        let draw_y = match spec.position {
            CaptionPosition::Top => DrawY::FromTop(half_band - half_text + baseline),
            CaptionPosition::Bottom => DrawY::FromBottom(half_band + half_text - baseline),
        };

        Self {
            wrapped_text,
            line_count,
            total_text_height_px,
            baseline_offset_px,
            draw_y,
        }
    }
}
