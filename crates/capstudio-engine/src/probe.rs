//! FFprobe duration probe.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{EngineError, EngineResult};

/// FFprobe JSON output format (format section only).
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a media file's duration in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> EngineResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EngineError::FileNotFound(path.display().to_string()));
    }

    which::which("ffprobe")
        .map_err(|_| EngineError::load_failed("ffprobe not found in PATH"))?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(EngineError::exec_failed(
            "ffprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
            output.status.code(),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| EngineError::exec_failed("ffprobe reported no duration", None, None))
}
