//! Deterministic caption layout.
//!
//! Pure transformations from a [`CaptionSpec`](capstudio_models::CaptionSpec)
//! to wrapped text, vertical geometry and an FFmpeg filter graph. No I/O,
//! no hidden state: identical inputs always produce identical outputs.

pub mod filters;
pub mod layout;
pub mod wrap;

pub use filters::build_caption_filter;
pub use layout::{CaptionLayout, DrawY, LINE_SPACING_PX};
pub use wrap::wrap_caption;
