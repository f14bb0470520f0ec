//! Shared data models for the caption studio pipeline.

pub mod caption;
pub mod render;

pub use caption::{CaptionPosition, CaptionSpec, PositionParseError, ValidationError};
pub use render::{RenderSnapshot, RenderStatus};
