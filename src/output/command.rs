//! Playback through an external player program (mpv, ffplay, afplay, ...).

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::info;

use super::AudioOutput;
use crate::tts::TtsError;

/// Runs `<program> [flags] <file>` and waits for it to exit.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandPlayer {
    /// Resolve `program` on `PATH` (or as a path) and pick its quiet flags.
    pub fn new(program: &str) -> Result<Self, TtsError> {
        let program = program.trim();
        let resolved = which::which(program).map_err(|_| {
            TtsError::PlaybackError(format!("Audio player '{}' not found on PATH", program))
        })?;
        let args = default_args(&resolved);
        Ok(Self {
            program: resolved,
            args,
        })
    }

    fn display_name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Flags that make common players exit when the file ends and stay quiet.
fn default_args(program: &Path) -> Vec<String> {
    let name = program
        .file_stem()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let args: &[&str] = match name.as_str() {
        "ffplay" => &["-nodisp", "-autoexit", "-loglevel", "quiet"],
        "mpv" => &["--no-video", "--really-quiet"],
        "mpg123" => &["-q"],
        _ => &[],
    };
    args.iter().map(|a| a.to_string()).collect()
}

impl AudioOutput for CommandPlayer {
    fn play_file(&self, path: &Path) -> Result<(), TtsError> {
        info!(player = %self.display_name(), path = %path.display(), "Playing with external player");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| {
                TtsError::PlaybackError(format!("Failed to start {}: {}", self.display_name(), e))
            })?;

        if !status.success() {
            return Err(TtsError::PlaybackError(format!(
                "{} exited with {}",
                self.display_name(),
                status
            )));
        }
        Ok(())
    }

    fn name(&self) -> String {
        self.display_name()
    }
}
