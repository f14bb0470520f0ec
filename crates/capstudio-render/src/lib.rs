//! Render job controller.
//!
//! Orchestrates one caption burn-in job at a time: resolves source
//! bytes, computes the layout, drives the codec session through the
//! burn-in command sequence, streams progress to the caller, and keeps
//! resource discipline (one live output URL, one live engine, no
//! interleaved jobs).

pub mod controller;
pub mod error;
pub mod output;
pub mod sources;

pub use controller::{RenderRequest, Studio, StudioConfig};
pub use error::{StudioError, StudioResult};
pub use output::{InMemoryOutputRegistry, OutputRegistry, RenderOutput};
pub use sources::{
    CachingVideoSource, FontSource, HttpFontSource, HttpVideoSource, MetricsUsageCounter,
    NoopUsageCounter, SourceError, UsageCounter, VideoSource,
};
