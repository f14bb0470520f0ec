//! Caption specification and placement definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum caption length in characters (after trimming).
pub const MAX_CAPTION_CHARS: usize = 150;

/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE_PX: u32 = 36;

/// Default caption band height in pixels.
pub const DEFAULT_BAND_HEIGHT_PX: u32 = 100;

/// Default maximum characters per wrapped line.
pub const DEFAULT_MAX_CHARS_PER_LINE: usize = 50;

/// Where the caption band is placed on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPosition {
    /// Band padded above the original picture
    #[default]
    Top,
    /// Band padded below the original picture
    Bottom,
}

impl CaptionPosition {
    /// All available positions.
    pub const ALL: &'static [CaptionPosition] = &[CaptionPosition::Top, CaptionPosition::Bottom];

    /// Returns the position name as used in filenames and query params.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionPosition::Top => "top",
            CaptionPosition::Bottom => "bottom",
        }
    }
}

impl fmt::Display for CaptionPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CaptionPosition {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(CaptionPosition::Top),
            "bottom" => Ok(CaptionPosition::Bottom),
            _ => Err(PositionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown caption position: {0}")]
pub struct PositionParseError(String);

/// Validation failures for a caption spec.
///
/// Raised before any engine interaction; a spec that fails validation
/// never creates a render job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Caption text is empty")]
    EmptyText,

    #[error("Caption text exceeds {MAX_CAPTION_CHARS} characters ({0})")]
    TextTooLong(usize),

    #[error("Font size must be non-zero")]
    ZeroFontSize,

    #[error("Band height must be non-zero")]
    ZeroBandHeight,
}

/// A caption to burn into a video.
///
/// Pure value object: layout is a deterministic function of this spec,
/// nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSpec {
    /// Caption text, 1..=150 chars after trimming
    pub text: String,
    /// Band placement
    pub position: CaptionPosition,
    /// Font size in pixels
    pub font_size_px: u32,
    /// Font color (FFmpeg color name or 0xRRGGBB)
    pub font_color: String,
    /// Solid fill color of the caption band
    pub band_color: String,
    /// Height of the padded caption band in pixels
    pub band_height_px: u32,
    /// Greedy wrap limit per line
    pub max_chars_per_line: usize,
}

impl CaptionSpec {
    /// Create a spec with default styling.
    pub fn new(text: impl Into<String>, position: CaptionPosition) -> Self {
        Self {
            text: text.into(),
            position,
            font_size_px: DEFAULT_FONT_SIZE_PX,
            font_color: "black".to_string(),
            band_color: "white".to_string(),
            band_height_px: DEFAULT_BAND_HEIGHT_PX,
            max_chars_per_line: DEFAULT_MAX_CHARS_PER_LINE,
        }
    }

    /// The caption text with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Validate the spec.
    ///
    /// Empty (or whitespace-only) and over-long text are rejected here so
    /// invalid input never reaches the engine.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let trimmed = self.trimmed_text();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let len = trimmed.chars().count();
        if len > MAX_CAPTION_CHARS {
            return Err(ValidationError::TextTooLong(len));
        }
        if self.font_size_px == 0 {
            return Err(ValidationError::ZeroFontSize);
        }
        if self.band_height_px == 0 {
            return Err(ValidationError::ZeroBandHeight);
        }
        Ok(())
    }
}
