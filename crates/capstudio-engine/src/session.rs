//! Cached codec session.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::EngineResult;
use crate::runtime::{EngineLoader, EngineRuntime};

/// Owns at most one live engine instance at a time.
///
/// `acquire` loads lazily and caches the handle; concurrent or rapid
/// callers converge on the same in-flight load instead of double-loading.
/// `release` terminates the instance and clears the cache so the next
/// `acquire` starts fresh.
pub struct CodecSession {
    loader: Arc<dyn EngineLoader>,
    slot: Mutex<Option<Arc<dyn EngineRuntime>>>,
}

impl CodecSession {
    /// Create a session backed by the given loader. No engine is loaded
    /// until the first `acquire`.
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            slot: Mutex::new(None),
        }
    }

    /// Get the live engine handle, loading one if needed.
    ///
    /// The cache slot is held locked across the load, so a second caller
    /// arriving mid-load waits and then reuses the freshly loaded handle.
    /// Load failures are returned to the caller and leave the slot empty;
    /// the next `acquire` attempts a fresh load.
    pub async fn acquire(&self) -> EngineResult<Arc<dyn EngineRuntime>> {
        let mut slot = self.slot.lock().await;

        if let Some(engine) = slot.as_ref() {
            debug!("Reusing cached engine instance");
            return Ok(engine.clone());
        }

        info!("Loading engine instance");
        let engine = self.loader.load().await?;
        *slot = Some(engine.clone());
        Ok(engine)
    }

    /// Terminate the live engine, if any, and clear the cache.
    ///
    /// Idempotent: safe on a never-acquired or already-released session.
    /// Never fails; termination errors are the runtime's to swallow.
    pub async fn release(&self) {
        let engine = self.slot.lock().await.take();
        if let Some(engine) = engine {
            info!("Terminating engine instance");
            engine.terminate().await;
        }
    }

    /// Whether a live engine is currently cached.
    pub async fn is_live(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::watch;

    use crate::error::EngineError;

    struct NullEngine {
        progress: watch::Sender<f64>,
        terminated: AtomicUsize,
    }

    impl NullEngine {
        fn new() -> Self {
            let (progress, _) = watch::channel(0.0);
            Self {
                progress,
                terminated: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EngineRuntime for NullEngine {
        async fn write_file(&self, _name: &str, _bytes: &[u8]) -> EngineResult<()> {
            Ok(())
        }
        async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
            Err(EngineError::FileNotFound(name.to_string()))
        }
        async fn delete_file(&self, _name: &str) -> EngineResult<()> {
            Ok(())
        }
        async fn file_exists(&self, _name: &str) -> bool {
            false
        }
        async fn exec(&self, _args: &[String]) -> EngineResult<()> {
            Ok(())
        }
        fn progress(&self) -> watch::Receiver<f64> {
            self.progress.subscribe()
        }
        async fn terminate(&self) {
            self.terminated.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingLoader {
        loads: AtomicUsize,
        fail: bool,
    }

    impl CountingLoader {
        fn new(fail: bool) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl EngineLoader for CountingLoader {
        async fn load(&self) -> EngineResult<Arc<dyn EngineRuntime>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EngineError::load_failed("asset fetch failed"));
            }
            Ok(Arc::new(NullEngine::new()))
        }
    }

    #[tokio::test]
    async fn test_acquire_caches_handle() {
        let loader = Arc::new(CountingLoader::new(false));
        let session = CodecSession::new(loader.clone());

        assert!(!session.is_live().await);
        session.acquire().await.unwrap();
        session.acquire().await.unwrap();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert!(session.is_live().await);
    }

    #[tokio::test]
    async fn test_concurrent_acquire_converges() {
        let loader = Arc::new(CountingLoader::new(false));
        let session = Arc::new(CodecSession::new(loader.clone()));

        let (a, b) = tokio::join!(session.acquire(), session.acquire());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let loader = Arc::new(CountingLoader::new(false));
        let session = CodecSession::new(loader);

        // never-acquired: no-op
        session.release().await;

        session.acquire().await.unwrap();
        session.release().await;
        session.release().await;
        assert!(!session.is_live().await);
    }

    #[tokio::test]
    async fn test_acquire_after_release_loads_fresh() {
        let loader = Arc::new(CountingLoader::new(false));
        let session = CodecSession::new(loader.clone());

        session.acquire().await.unwrap();
        session.release().await;
        session.acquire().await.unwrap();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_load_failure_surfaces_and_is_not_cached() {
        let loader = Arc::new(CountingLoader::new(true));
        let session = CodecSession::new(loader.clone());

        assert!(matches!(
            session.acquire().await,
            Err(EngineError::LoadFailed { .. })
        ));
        assert!(!session.is_live().await);

        // resubmission triggers a fresh attempt
        assert!(session.acquire().await.is_err());
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
    }
}
