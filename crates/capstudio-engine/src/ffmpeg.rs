//! FFmpeg-backed engine runtime.
//!
//! The virtual filesystem is a scratch [`TempDir`]; `exec` spawns an
//! `ffmpeg` process in it and parses the `-progress pipe:2` key=value
//! stream. The progress ratio is derived from the input's probed
//! duration when available.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::probe::probe_duration;
use crate::runtime::{EngineLoader, EngineRuntime};

/// Maximum stderr lines retained for error reporting.
const STDERR_TAIL_LINES: usize = 40;

/// Engine runtime backed by the `ffmpeg` CLI.
pub struct FfmpegEngine {
    scratch: TempDir,
    progress_tx: watch::Sender<f64>,
    child: Mutex<Option<Child>>,
    terminated: AtomicBool,
}

impl FfmpegEngine {
    /// Instantiate the engine: locate the binary and create the scratch
    /// namespace. Fails with a load error if `ffmpeg` is missing.
    pub fn new() -> EngineResult<Self> {
        which::which("ffmpeg")
            .map_err(|_| EngineError::load_failed("ffmpeg not found in PATH"))?;

        let scratch = TempDir::new()?;
        let (progress_tx, _) = watch::channel(0.0);

        debug!("FFmpeg engine scratch dir: {}", scratch.path().display());

        Ok(Self {
            scratch,
            progress_tx,
            child: Mutex::new(None),
            terminated: AtomicBool::new(false),
        })
    }

    fn resolve(&self, name: &str) -> EngineResult<PathBuf> {
        validate_name(name)?;
        Ok(self.scratch.path().join(name))
    }

    fn check_live(&self) -> EngineResult<()> {
        if self.terminated.load(Ordering::SeqCst) {
            return Err(EngineError::Terminated);
        }
        Ok(())
    }

    /// Probe the exec input (the argument after `-i`) for a duration to
    /// scale progress against. Best effort: without it, only completion
    /// is reported.
    async fn duration_hint(&self, args: &[String]) -> Option<f64> {
        let input = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))?;
        let path = self.resolve(input).ok()?;

        match probe_duration(&path).await {
            Ok(duration) if duration > 0.0 => Some(duration),
            Ok(_) => None,
            Err(e) => {
                warn!("Duration probe failed, progress will be coarse: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl EngineRuntime for FfmpegEngine {
    async fn write_file(&self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        self.check_live()?;
        let path = self.resolve(name)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
        self.check_live()?;
        let path = self.resolve(name)?;
        if !path.exists() {
            return Err(EngineError::FileNotFound(name.to_string()));
        }
        Ok(tokio::fs::read(&path).await?)
    }

    async fn delete_file(&self, name: &str) -> EngineResult<()> {
        self.check_live()?;
        let path = self.resolve(name)?;
        tokio::fs::remove_file(&path).await?;
        Ok(())
    }

    async fn file_exists(&self, name: &str) -> bool {
        match self.resolve(name) {
            Ok(path) => path.exists(),
            Err(_) => false,
        }
    }

    async fn exec(&self, args: &[String]) -> EngineResult<()> {
        self.check_live()?;

        let duration = self.duration_hint(args).await;
        let full_args = build_exec_args(args);
        debug!("Running FFmpeg: ffmpeg {}", full_args.join(" "));

        // Reset the progress stream for this run
        self.progress_tx.send_replace(0.0);

        let mut child = Command::new("ffmpeg")
            .args(&full_args)
            .current_dir(self.scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::exec_failed("stderr not captured", None, None))?;

        // Park the child so terminate() can kill it mid-run
        *self.child.lock().await = Some(child);

        let mut reader = BufReader::new(stderr).lines();
        let mut progress = ExecProgress::default();
        let mut stderr_tail: Vec<String> = Vec::new();

        while let Ok(Some(line)) = reader.next_line().await {
            match parse_progress_line(&line, &mut progress) {
                LineKind::ProgressUpdate => {
                    if let Some(ratio) = progress_ratio(&progress, duration) {
                        self.progress_tx.send_replace(ratio);
                    }
                }
                LineKind::ProgressKey => {}
                LineKind::Other => {
                    if stderr_tail.len() == STDERR_TAIL_LINES {
                        stderr_tail.remove(0);
                    }
                    stderr_tail.push(line);
                }
            }
        }

        let child = self.child.lock().await.take();
        let status = match child {
            Some(mut child) => child.wait().await?,
            None => return Err(EngineError::Terminated),
        };

        if self.terminated.load(Ordering::SeqCst) {
            info!("FFmpeg run abandoned by termination");
            return Err(EngineError::Terminated);
        }

        if status.success() {
            self.progress_tx.send_replace(1.0);
            Ok(())
        } else {
            Err(EngineError::exec_failed(
                "FFmpeg exited with non-zero status",
                if stderr_tail.is_empty() {
                    None
                } else {
                    Some(stderr_tail.join("\n"))
                },
                status.code(),
            ))
        }
    }

    fn progress(&self) -> watch::Receiver<f64> {
        self.progress_tx.subscribe()
    }

    async fn terminate(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Terminating FFmpeg engine");
        if let Some(child) = self.child.lock().await.as_mut() {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill FFmpeg process: {}", e);
            }
        }
    }
}

/// Loader producing fresh [`FfmpegEngine`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegLoader;

#[async_trait]
impl EngineLoader for FfmpegLoader {
    async fn load(&self) -> EngineResult<Arc<dyn EngineRuntime>> {
        Ok(Arc::new(FfmpegEngine::new()?))
    }
}

/// Reject names that could escape the scratch namespace.
fn validate_name(name: &str) -> EngineResult<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name.contains("..")
    {
        return Err(EngineError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// Assemble the full argv: fixed flags, then the caller's arguments.
fn build_exec_args(args: &[String]) -> Vec<String> {
    let mut full = vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-progress".to_string(),
        "pipe:2".to_string(),
    ];
    full.extend_from_slice(args);
    full
}

/// Accumulated state from FFmpeg's `-progress` output.
#[derive(Debug, Clone, Default)]
struct ExecProgress {
    out_time_ms: i64,
    is_complete: bool,
}

enum LineKind {
    /// A `progress=` line: the accumulated state is ready to publish
    ProgressUpdate,
    /// Any other known progress key
    ProgressKey,
    /// Not progress output (engine error text)
    Other,
}

/// Parse one line of FFmpeg's `-progress` output.
fn parse_progress_line(line: &str, current: &mut ExecProgress) -> LineKind {
    let line = line.trim();

    let Some((key, value)) = line.split_once('=') else {
        return LineKind::Other;
    };

    match key {
        "out_time_ms" | "out_time_us" => {
            // Both keys report microseconds in modern FFmpeg builds
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
            LineKind::ProgressKey
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            LineKind::ProgressUpdate
        }
        "frame" | "fps" | "bitrate" | "total_size" | "out_time" | "dup_frames"
        | "drop_frames" | "speed" => LineKind::ProgressKey,
        k if k.starts_with("stream_") => LineKind::ProgressKey,
        _ => LineKind::Other,
    }
}

/// Convert accumulated progress to a ratio against the probed duration.
fn progress_ratio(progress: &ExecProgress, duration_secs: Option<f64>) -> Option<f64> {
    if progress.is_complete {
        return Some(1.0);
    }
    let duration = duration_secs?;
    if duration <= 0.0 {
        return None;
    }
    Some(((progress.out_time_ms as f64 / 1000.0) / duration).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("input.mp4").is_ok());
        assert!(validate_name("caption.txt").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../etc/passwd").is_err());
        assert!(validate_name("a/b.mp4").is_err());
        assert!(validate_name("a\\b.mp4").is_err());
    }

    #[test]
    fn test_build_exec_args_prefix() {
        let args = build_exec_args(&["-i".to_string(), "input.mp4".to_string()]);
        assert_eq!(&args[..5], &["-y", "-v", "error", "-progress", "pipe:2"]);
        assert_eq!(&args[5..], &["-i", "input.mp4"]);
    }

    #[test]
    fn test_progress_parsing() {
        let mut progress = ExecProgress::default();

        assert!(matches!(
            parse_progress_line("out_time_ms=5000000", &mut progress),
            LineKind::ProgressKey
        ));
        assert_eq!(progress.out_time_ms, 5000);

        assert!(matches!(
            parse_progress_line("speed=1.5x", &mut progress),
            LineKind::ProgressKey
        ));

        assert!(matches!(
            parse_progress_line("progress=continue", &mut progress),
            LineKind::ProgressUpdate
        ));
        assert!(!progress.is_complete);

        assert!(matches!(
            parse_progress_line("progress=end", &mut progress),
            LineKind::ProgressUpdate
        ));
        assert!(progress.is_complete);
    }

    #[test]
    fn test_error_lines_are_not_progress() {
        let mut progress = ExecProgress::default();
        assert!(matches!(
            parse_progress_line("No such filter: 'drawtxt'", &mut progress),
            LineKind::Other
        ));
    }

    #[test]
    fn test_progress_ratio() {
        let progress = ExecProgress {
            out_time_ms: 5000,
            is_complete: false,
        };
        let ratio = progress_ratio(&progress, Some(10.0)).unwrap();
        assert!((ratio - 0.5).abs() < 1e-9);

        // no duration hint: nothing to publish until completion
        assert!(progress_ratio(&progress, None).is_none());

        let done = ExecProgress {
            out_time_ms: 0,
            is_complete: true,
        };
        assert_eq!(progress_ratio(&done, None), Some(1.0));
    }

    #[test]
    fn test_progress_ratio_clamped() {
        let progress = ExecProgress {
            out_time_ms: 20_000,
            is_complete: false,
        };
        assert_eq!(progress_ratio(&progress, Some(10.0)), Some(1.0));
    }
}
