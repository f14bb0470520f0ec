//! Engine runtime interface.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::EngineResult;

/// A loaded video-processing engine instance.
///
/// The engine owns an isolated file namespace ("virtual filesystem")
/// used to pass bytes across the caller/engine boundary. The namespace
/// is not safe for concurrent unrelated operations: callers must
/// serialize jobs against a single instance.
#[async_trait]
pub trait EngineRuntime: Send + Sync {
    /// Write a file into the engine's filesystem.
    async fn write_file(&self, name: &str, bytes: &[u8]) -> EngineResult<()>;

    /// Read a file back from the engine's filesystem.
    async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>>;

    /// Delete a file from the engine's filesystem.
    async fn delete_file(&self, name: &str) -> EngineResult<()>;

    /// Check whether a file exists in the engine's filesystem.
    async fn file_exists(&self, name: &str) -> bool;

    /// Run the engine with the given arguments.
    ///
    /// Suspends until the run completes; progress is published on the
    /// [`progress`](Self::progress) stream for its duration. A run
    /// interrupted by [`terminate`](Self::terminate) fails with
    /// [`EngineError::Terminated`](crate::EngineError::Terminated).
    async fn exec(&self, args: &[String]) -> EngineResult<()>;

    /// Subscribe to exec progress as a ratio in `0.0..=1.0`.
    ///
    /// Values are scoped to the current exec and reset to zero when a
    /// new one starts. Subscribers should hold the receiver for exactly
    /// one run and drop it on every exit path.
    fn progress(&self) -> watch::Receiver<f64>;

    /// Terminate the engine instance.
    ///
    /// Idempotent. Abandons any in-flight exec; the instance must not
    /// be used afterwards.
    async fn terminate(&self);
}

/// Asynchronous engine acquisition.
///
/// Loading may involve network fetches and instantiation of an isolated
/// execution context; failures surface to the caller and are never
/// silently retried.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// Load a fresh engine instance.
    async fn load(&self) -> EngineResult<Arc<dyn EngineRuntime>>;
}
