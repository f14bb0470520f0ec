//! Render output and revocable output references.
//!
//! The registry models browser object URLs: a reference to a blob that
//! holds memory until revoked. The controller keeps exactly one live
//! reference per studio, revoking the previous one before creating the
//! next.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// MIME type of rendered outputs.
pub const OUTPUT_MIME_TYPE: &str = "video/mp4";

/// A finished render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Rendered video bytes
    pub blob: Arc<Vec<u8>>,
    /// Revocable reference to the blob
    pub url: String,
    /// Display title for download naming
    pub title: String,
    /// Always `video/mp4`
    pub mime_type: &'static str,
}

/// Creates and revokes blob references.
pub trait OutputRegistry: Send + Sync {
    /// Register a blob and return a reference to it.
    fn create_url(&self, blob: &Arc<Vec<u8>>) -> String;

    /// Revoke a previously created reference. Unknown references are
    /// ignored.
    fn revoke(&self, url: &str);
}

/// In-process registry tracking live references.
#[derive(Debug, Default)]
pub struct InMemoryOutputRegistry {
    next_id: AtomicU64,
    live: Mutex<HashSet<String>>,
}

impl InMemoryOutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently live references.
    pub fn live_count(&self) -> usize {
        self.live.lock().expect("registry lock poisoned").len()
    }
}

impl OutputRegistry for InMemoryOutputRegistry {
    fn create_url(&self, _blob: &Arc<Vec<u8>>) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let url = format!("blob:capstudio/{id}");
        self.live
            .lock()
            .expect("registry lock poisoned")
            .insert(url.clone());
        url
    }

    fn revoke(&self, url: &str) {
        self.live.lock().expect("registry lock poisoned").remove(url);
    }
}
