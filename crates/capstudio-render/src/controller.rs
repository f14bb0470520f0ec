//! The studio render job controller.
//!
//! State machine: `idle -> running -> {succeeded|failed|cancelled} -> idle`.
//! One job at a time: the engine's file namespace is exclusive, so a
//! submission while running is rejected rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info};

use capstudio_engine::{CodecSession, EngineLoader, EngineRuntime};
use capstudio_layout::{build_caption_filter, CaptionLayout};
use capstudio_models::{CaptionSpec, RenderSnapshot, RenderStatus};

use crate::error::{StudioError, StudioResult};
use crate::output::{OutputRegistry, RenderOutput, OUTPUT_MIME_TYPE};
use crate::sources::{FontSource, UsageCounter, VideoSource};

/// Fixed file names and encoding settings for burn-in jobs.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Source video name in the engine filesystem
    pub input_file: String,
    /// Output video name in the engine filesystem
    pub output_file: String,
    /// Wrapped caption side file read by the drawtext filter
    pub text_file: String,
    /// Font asset name, provisioned once per session
    pub font_file: String,
    /// Video codec for the burn-in encode
    pub video_codec: String,
    /// Encoding preset; fast by default to minimize latency
    pub preset: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            input_file: "input.mp4".to_string(),
            output_file: "output.mp4".to_string(),
            text_file: "caption.txt".to_string(),
            font_file: "font.ttf".to_string(),
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
        }
    }
}

/// One caption burn-in submission.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Identity of the source video
    pub video_id: String,
    /// Display title, carried onto the output for download naming
    pub title: String,
    /// Caption text and styling
    pub spec: CaptionSpec,
}

/// Orchestrates caption burn-in jobs against one codec session.
///
/// Owns the current job and the session it uses. The owning layer is
/// contractually required to call [`dispose`](Studio::dispose) exactly
/// once when done; the method is idempotent.
pub struct Studio {
    session: CodecSession,
    video_source: Arc<dyn VideoSource>,
    font_source: Arc<dyn FontSource>,
    usage: Arc<dyn UsageCounter>,
    registry: Arc<dyn OutputRegistry>,
    config: StudioConfig,

    snapshot: Mutex<RenderSnapshot>,
    progress_tx: watch::Sender<u8>,
    output: Mutex<Option<RenderOutput>>,

    running: AtomicBool,
    cancelled: AtomicBool,
    disposed: AtomicBool,
}

impl Studio {
    /// Create a studio with default file names and encoding settings.
    pub fn new(
        loader: Arc<dyn EngineLoader>,
        video_source: Arc<dyn VideoSource>,
        font_source: Arc<dyn FontSource>,
        usage: Arc<dyn UsageCounter>,
        registry: Arc<dyn OutputRegistry>,
    ) -> Self {
        Self::with_config(
            loader,
            video_source,
            font_source,
            usage,
            registry,
            StudioConfig::default(),
        )
    }

    /// Create a studio with explicit configuration.
    pub fn with_config(
        loader: Arc<dyn EngineLoader>,
        video_source: Arc<dyn VideoSource>,
        font_source: Arc<dyn FontSource>,
        usage: Arc<dyn UsageCounter>,
        registry: Arc<dyn OutputRegistry>,
        config: StudioConfig,
    ) -> Self {
        let (progress_tx, _) = watch::channel(0);
        Self {
            session: CodecSession::new(loader),
            video_source,
            font_source,
            usage,
            registry,
            config,
            snapshot: Mutex::new(RenderSnapshot::idle()),
            progress_tx,
            output: Mutex::new(None),
            running: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Submit a burn-in job and wait for its result.
    ///
    /// Rejects synchronously, before any engine interaction, on invalid
    /// caption text; rejects with [`StudioError::Busy`] while another
    /// job is running. Engine and IO failures are terminal for the job
    /// and are not retried.
    pub async fn process_video(&self, request: RenderRequest) -> StudioResult<RenderOutput> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(StudioError::Disposed);
        }
        request.spec.validate()?;

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StudioError::Busy);
        }

        info!("Starting render job for video {}", request.video_id);
        self.cancelled.store(false, Ordering::SeqCst);
        *self.lock_snapshot() = RenderSnapshot::new(&request.video_id);
        self.progress_tx.send_replace(0);

        let result = self.run_job(&request).await;
        self.running.store(false, Ordering::SeqCst);

        match result {
            Ok(bytes) if !self.cancelled.load(Ordering::SeqCst) => {
                let blob = Arc::new(bytes);

                // Exactly one live output reference: revoke the previous
                // one before creating the next.
                if let Some(prev) = self.output.lock().expect("output lock poisoned").take() {
                    self.registry.revoke(&prev.url);
                }
                let url = self.registry.create_url(&blob);

                let output = RenderOutput {
                    blob,
                    url,
                    title: request.title.clone(),
                    mime_type: OUTPUT_MIME_TYPE,
                };
                *self.output.lock().expect("output lock poisoned") = Some(output.clone());

                // Fire-and-forget; the counter swallows its own failures
                self.usage.record_render(&request.video_id);

                self.lock_snapshot().complete();
                self.progress_tx.send_replace(100);
                info!("Render job succeeded for video {}", request.video_id);
                Ok(output)
            }
            Ok(_) => {
                // Finished right as the user cancelled; honor the cancel
                self.lock_snapshot().cancel();
                Err(StudioError::Cancelled)
            }
            Err(e) => {
                if self.cancelled.load(Ordering::SeqCst) || matches!(e, StudioError::Cancelled) {
                    self.lock_snapshot().cancel();
                    self.progress_tx.send_replace(0);
                    info!("Render job cancelled for video {}", request.video_id);
                    Err(StudioError::Cancelled)
                } else {
                    self.lock_snapshot().fail(e.to_string());
                    Err(e)
                }
            }
        }
    }

    /// The burn-in command sequence against an acquired engine.
    async fn run_job(&self, request: &RenderRequest) -> StudioResult<Vec<u8>> {
        let cfg = &self.config;
        let engine = self.session.acquire().await?;

        let bytes = self
            .video_source
            .fetch(&request.video_id)
            .await
            .map_err(StudioError::Source)?;
        engine.write_file(&cfg.input_file, &bytes).await?;

        // Provision the font once; it is reused across jobs for the
        // lifetime of the session.
        if !engine.file_exists(&cfg.font_file).await {
            debug!("Provisioning caption font");
            let font = self.font_source.fetch().await.map_err(StudioError::Source)?;
            engine.write_file(&cfg.font_file, &font).await?;
        }

        let layout = CaptionLayout::compute(&request.spec);
        engine
            .write_file(&cfg.text_file, layout.wrapped_text.as_bytes())
            .await?;

        let filter = build_caption_filter(&request.spec, &layout, &cfg.font_file, &cfg.text_file);
        let args = burn_in_args(cfg, &filter);

        self.drive_exec(engine.as_ref(), &args).await?;

        let output_bytes = engine.read_file(&cfg.output_file).await?;

        // Best-effort temp cleanup; never masks the render result
        for name in [&cfg.input_file, &cfg.text_file, &cfg.output_file] {
            if let Err(e) = engine.delete_file(name).await {
                debug!("Temp cleanup failed for {} (ignored): {}", name, e);
            }
        }

        Ok(output_bytes)
    }

    /// Run the engine while forwarding its progress stream.
    ///
    /// The subscription lives for exactly one run and is dropped on
    /// every exit path. Values are passed through as reported; the
    /// engine, not the controller, owns monotonicity.
    async fn drive_exec(&self, engine: &dyn EngineRuntime, args: &[String]) -> StudioResult<()> {
        let mut rx = engine.progress();
        let exec = engine.exec(args);
        tokio::pin!(exec);

        loop {
            tokio::select! {
                res = &mut exec => {
                    res?;
                    return Ok(());
                }
                changed = rx.changed() => {
                    if changed.is_ok() {
                        let ratio = *rx.borrow_and_update();
                        let pct = (ratio * 100.0).round().clamp(0.0, 100.0) as u8;
                        self.set_progress(pct);
                    } else {
                        // progress stream ended; just wait the run out
                        (&mut exec).await?;
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Cancel the running job.
    ///
    /// Destructive: the engine has no mid-filter cancel primitive, so
    /// the whole session is terminated and the cache invalidated; the
    /// next submission acquires a fresh engine. No-op when idle.
    pub async fn cancel(&self) {
        if !self.running.load(Ordering::SeqCst) {
            debug!("Cancel ignored: no job running");
            return;
        }
        info!("Cancelling render job");
        self.cancelled.store(true, Ordering::SeqCst);
        self.session.release().await;
        self.progress_tx.send_replace(0);
        self.lock_snapshot().cancel();
    }

    /// Return to `idle` from any state.
    ///
    /// Clears output references without revoking them; revocation
    /// happens on the next successful output or on dispose.
    pub fn reset(&self) {
        *self.output.lock().expect("output lock poisoned") = None;
        self.progress_tx.send_replace(0);
        self.lock_snapshot().reset();
    }

    /// Release everything the studio holds. Idempotent.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Disposing studio");
        if let Some(output) = self.output.lock().expect("output lock poisoned").take() {
            self.registry.revoke(&output.url);
        }
        // Best-effort teardown; release never fails
        self.session.release().await;
        self.progress_tx.send_replace(0);
        self.lock_snapshot().reset();
    }

    /// Subscribe to progress updates (0-100).
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress_tx.subscribe()
    }

    /// Current progress percent.
    pub fn current_progress(&self) -> u8 {
        *self.progress_tx.borrow()
    }

    /// Current state-machine status.
    pub fn status(&self) -> RenderStatus {
        self.lock_snapshot().status
    }

    /// Whether a job is running.
    pub fn is_loading(&self) -> bool {
        self.status() == RenderStatus::Running
    }

    /// Snapshot of the current job for pollers.
    pub fn snapshot(&self) -> RenderSnapshot {
        self.lock_snapshot().clone()
    }

    /// The last successful output, if any.
    pub fn output(&self) -> Option<RenderOutput> {
        self.output.lock().expect("output lock poisoned").clone()
    }

    fn set_progress(&self, pct: u8) {
        self.progress_tx.send_replace(pct);
        self.lock_snapshot().set_progress(pct);
    }

    fn lock_snapshot(&self) -> std::sync::MutexGuard<'_, RenderSnapshot> {
        self.snapshot.lock().expect("snapshot lock poisoned")
    }
}

/// Engine argv for one burn-in: filter the video, copy audio unmodified,
/// encode with the configured fast preset.
fn burn_in_args(config: &StudioConfig, filter: &str) -> Vec<String> {
    vec![
        "-i".to_string(),
        config.input_file.clone(),
        "-vf".to_string(),
        filter.to_string(),
        "-c:v".to_string(),
        config.video_codec.clone(),
        "-preset".to_string(),
        config.preset.clone(),
        "-c:a".to_string(),
        "copy".to_string(),
        config.output_file.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = StudioConfig::default();
        assert_eq!(cfg.input_file, "input.mp4");
        assert_eq!(cfg.output_file, "output.mp4");
        assert_eq!(cfg.preset, "ultrafast");
    }

    #[test]
    fn test_burn_in_args() {
        let cfg = StudioConfig::default();
        let args = burn_in_args(&cfg, "pad=...,drawtext=...");

        assert_eq!(args[0], "-i");
        assert_eq!(args[1], "input.mp4");
        assert!(args.contains(&"-vf".to_string()));
        assert!(args.contains(&"pad=...,drawtext=...".to_string()));
        // audio passes through unmodified
        let a_pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[a_pos + 1], "copy");
        assert_eq!(args.last().unwrap(), "output.mp4");
    }
}
