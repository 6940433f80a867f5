//! Audio playback via rodio.
//!
//! Decodes an MP3 file and plays it through the default output device,
//! blocking until playback finishes.

use std::path::Path;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use tracing::info;

use super::AudioOutput;
use crate::tts::mp3::decode_mp3;
use crate::tts::TtsError;

/// Sink on the default output device, alive for one playback.
struct AudioPlayer {
    _stream: OutputStream,
    sink: Sink,
}

impl AudioPlayer {
    /// Open the default audio output device.
    fn open() -> Result<Self, TtsError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| TtsError::PlaybackError(format!("Failed to open audio output: {}", e)))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| TtsError::PlaybackError(format!("Failed to create audio sink: {}", e)))?;

        Ok(Self {
            _stream: stream,
            sink,
        })
    }

    /// Play mono f32 PCM audio at the given sample rate (blocking until done).
    fn play(&self, samples: Vec<f32>, sample_rate: u32) {
        if samples.is_empty() {
            return;
        }
        let source = SamplesBuffer::new(1, sample_rate, samples);
        self.sink.append(source);
        self.sink.sleep_until_end();
    }

    /// Set playback volume (0.0 = silent, 1.0 = full volume).
    fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume.clamp(0.0, 1.0));
    }
}

/// Built-in player: decodes with Symphonia, plays with rodio.
///
/// The output stream is opened per call because rodio's stream handle is
/// not `Send` and playback runs on a blocking worker thread.
#[derive(Debug, Clone)]
pub struct DevicePlayer {
    volume: f32,
}

impl DevicePlayer {
    pub fn new(volume: f32) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
        }
    }
}

impl Default for DevicePlayer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl AudioOutput for DevicePlayer {
    fn play_file(&self, path: &Path) -> Result<(), TtsError> {
        let bytes = std::fs::read(path)?;
        let audio = decode_mp3(&bytes)?;
        info!(
            samples = audio.samples.len(),
            sample_rate = audio.sample_rate,
            "Playing through default output device"
        );

        let player = AudioPlayer::open()?;
        player.set_volume(self.volume);
        player.play(audio.samples, audio.sample_rate);
        Ok(())
    }

    fn name(&self) -> String {
        "default output device".to_string()
    }
}
