//! Output sinks for synthesized audio.
//!
//! - File-and-play: write to a unique temp file, play it, remove it.
//! - Raw bytes: write the MP3 stream to a writer (stdout) and flush.

pub mod command;
pub mod playback;

use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

pub use command::CommandPlayer;
pub use playback::DevicePlayer;

use crate::tts::TtsError;

/// Something that can play an audio file to completion.
pub trait AudioOutput: Send {
    /// Play the file, blocking until playback finishes.
    fn play_file(&self, path: &Path) -> Result<(), TtsError>;

    fn name(&self) -> String;
}

/// Pick the player: an external program when one is configured, otherwise
/// the built-in device player.
pub fn create_audio_output(
    player: Option<&str>,
    volume: f32,
) -> Result<Box<dyn AudioOutput>, TtsError> {
    match player.map(str::trim).filter(|p| !p.is_empty()) {
        Some(program) => Ok(Box::new(CommandPlayer::new(program)?)),
        None => Ok(Box::new(DevicePlayer::new(volume))),
    }
}

/// Write `audio` to a uniquely named temp file, play it, then delete it.
///
/// The file is removed on every path out of this function, including
/// playback failure.
pub fn play_through_temp_file(audio: &[u8], output: &dyn AudioOutput) -> Result<(), TtsError> {
    let mut file = tempfile::Builder::new()
        .prefix("voice-speak-")
        .suffix(".mp3")
        .tempfile()?;
    file.write_all(audio)?;
    file.flush()?;
    debug!(path = %file.path().display(), bytes = audio.len(), "Wrote temp audio file");

    let result = output.play_file(file.path());

    let path = file.path().to_path_buf();
    if let Err(e) = file.close() {
        warn!(path = %path.display(), "Failed to remove temp audio file: {}", e);
    }
    result
}

/// Write the raw audio stream and flush. Nothing else goes to `out`.
pub fn write_raw<W: Write>(audio: &[u8], out: &mut W) -> Result<(), TtsError> {
    out.write_all(audio)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod fake {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use super::AudioOutput;
    use crate::tts::TtsError;

    /// Records what it was asked to play; optionally fails.
    #[derive(Clone, Default)]
    pub struct FakeOutput {
        pub fail: bool,
        pub played: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
    }

    impl AudioOutput for FakeOutput {
        fn play_file(&self, path: &Path) -> Result<(), TtsError> {
            let contents = std::fs::read(path)?;
            self.played
                .lock()
                .unwrap()
                .push((path.to_path_buf(), contents));
            if self.fail {
                return Err(TtsError::PlaybackError("speaker on fire".into()));
            }
            Ok(())
        }

        fn name(&self) -> String {
            "fake".into()
        }
    }
}
