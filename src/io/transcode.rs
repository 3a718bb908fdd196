//! MP3 encoding through an external ffmpeg binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::core::SampleBuffer;
use crate::error::PitchError;
use crate::io::wav::write_wav_file;

/// Binary looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Encoder default bitrate for MP3 output.
pub const DEFAULT_BITRATE_KBPS: u32 = 128;

/// Lines of encoder stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 5;

/// Encoder invocation settings. The binary path is injected here rather than
/// read from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoder {
    pub ffmpeg_path: PathBuf,
    pub bitrate_kbps: u32,
    /// Directory for the staged WAV; the system temp dir when `None`.
    pub staging_dir: Option<PathBuf>,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG),
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            staging_dir: None,
        }
    }
}

impl Transcoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ..Self::default()
        }
    }

    pub fn with_bitrate(mut self, bitrate_kbps: u32) -> Self {
        self.bitrate_kbps = bitrate_kbps;
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Encodes `buffer` to an MP3 file at `output`.
    ///
    /// The buffer is staged as a temporary WAV file which is removed on every
    /// exit path.
    ///
    /// # Errors
    /// [`PitchError::EncodeFailure`] if the WAV cannot be staged, or if the
    /// binary cannot be started or exits unsuccessfully; the message carries
    /// the end of its stderr.
    pub fn encode_mp3(&self, buffer: &SampleBuffer, output: &Path) -> Result<(), PitchError> {
        if self.bitrate_kbps == 0 {
            return Err(PitchError::InvalidParameter(
                "MP3 bitrate must be positive".to_string(),
            ));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("voxshift-").suffix(".wav");
        let staging = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| PitchError::EncodeFailure(format!("could not stage WAV: {}", e)))?;
        write_wav_file(staging.path(), buffer).map_err(|e| match e {
            PitchError::IoError(msg) => {
                PitchError::EncodeFailure(format!("could not stage WAV: {}", msg))
            }
            other => other,
        })?;

        debug!(
            ffmpeg = %self.ffmpeg_path.display(),
            output = %output.display(),
            bitrate_kbps = self.bitrate_kbps,
            "encoding mp3"
        );
        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .args(["-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(staging.path())
            .args(["-codec:a", "libmp3lame"])
            .arg("-b:a")
            .arg(format!("{}k", self.bitrate_kbps))
            .arg(output)
            .output()
            .map_err(|e| {
                PitchError::EncodeFailure(format!(
                    "could not run {}: {}",
                    self.ffmpeg_path.display(),
                    e
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PitchError::EncodeFailure(format!(
                "{} exited with {}: {}",
                self.ffmpeg_path.display(),
                result.status,
                stderr_tail(&stderr)
            )));
        }
        Ok(())
    }
}

/// Last few non-empty lines of `stderr`, joined on one line.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
