//! Codec session management.
//!
//! The engine runtime is an isolated video-processing instance with its
//! own file namespace, reached only through asynchronous calls. This
//! crate defines the runtime interface ([`EngineRuntime`]), asynchronous
//! acquisition ([`EngineLoader`]), the cached session wrapper
//! ([`CodecSession`]) and a concrete runtime backed by the `ffmpeg` CLI
//! ([`FfmpegEngine`]).

pub mod error;
pub mod ffmpeg;
pub mod probe;
pub mod runtime;
pub mod session;

pub use error::{EngineError, EngineResult};
pub use ffmpeg::{FfmpegEngine, FfmpegLoader};
pub use runtime::{EngineLoader, EngineRuntime};
pub use session::CodecSession;
