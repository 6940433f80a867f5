//! Command-line front ends for the two binaries.
//!
//! `speak` synthesizes and plays through the speakers; `speak-stdout`
//! synthesizes and writes the MP3 stream to stdout. Both parse arguments
//! before anything else, so a usage error never reaches a provider.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::{Args, Parser};
use tracing::{info, warn};

use crate::config::SpeakConfig;
use crate::language::{resolve_voice, DEFAULT_LOCALE};
use crate::output::{create_audio_output, play_through_temp_file, write_raw, AudioOutput};
use crate::tts::mp3::looks_like_mp3;
use crate::tts::{create_tts_engine, EngineSettings, SpeechRequest, TtsEngine, TtsError};

/// `speak "<text>" "<language_code>"`
#[derive(Parser, Debug)]
#[command(name = "speak", version, about = "Speak text aloud through the speakers")]
pub struct PlaybackArgs {
    /// Text to speak
    #[arg(allow_hyphen_values = true)]
    pub text: String,

    /// Language code, short ("hi") or long ("hi-IN")
    pub language: String,

    #[command(flatten)]
    pub synthesis: SynthesisFlags,

    /// External player program (mpv, ffplay, afplay, ...) instead of the audio device
    #[arg(long)]
    pub player: Option<String>,
}

/// `speak-stdout "<text>" [language_code] [voice_name]`
#[derive(Parser, Debug)]
#[command(
    name = "speak-stdout",
    version,
    about = "Write synthesized MP3 audio to stdout"
)]
pub struct StreamArgs {
    /// Text to speak
    #[arg(allow_hyphen_values = true)]
    pub text: String,

    /// Language code, short ("en") or long ("en-US")
    #[arg(default_value = DEFAULT_LOCALE)]
    pub language: String,

    /// Voice name (e.g. "en-US-Neural2-D"); the language's registry voice is used regardless
    pub voice: Option<String>,

    #[command(flatten)]
    pub synthesis: SynthesisFlags,
}

/// Flags shared by both binaries. Each one overrides the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SynthesisFlags {
    /// Synthesis provider: "translate" or "cloud"
    #[arg(long)]
    pub provider: Option<String>,

    /// Speak more slowly
    #[arg(long)]
    pub slow: bool,

    /// Google domain for the translate provider (com, co.uk, com.au, co.in, ...)
    #[arg(long)]
    pub tld: Option<String>,
}

impl SynthesisFlags {
    pub fn engine_settings(&self, config: &SpeakConfig) -> EngineSettings {
        let mut settings = EngineSettings::from_config(config);
        if let Some(provider) = &self.provider {
            settings.provider = provider.clone();
        }
        if let Some(tld) = &self.tld {
            settings.tld = tld.clone();
        }
        settings
    }

    pub fn is_slow(&self, config: &SpeakConfig) -> bool {
        self.slow || config.slow.unwrap_or(false)
    }
}

// ── Errors ──────────────────────────────────────────────────────────

/// Why an invocation ended without producing audio.
#[derive(Debug)]
pub enum CliError {
    /// Bad or missing arguments (rendered usage text).
    Usage(String),
    /// `--help` or `--version` was requested (rendered text, not a failure).
    Help(String),
    /// Provider or player could not be set up.
    Config(TtsError),
    /// The provider call failed.
    Synthesis(TtsError),
    /// Audio was synthesized but could not be played.
    Playback(TtsError),
    /// Audio could not be written to stdout.
    Output(TtsError),
}

impl CliError {
    /// Process exit status: 0 for help/version, 1 for every failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Help(_) => 0,
            _ => 1,
        }
    }

    /// Print the diagnostic to the right stream and produce the exit code.
    pub fn report(&self) -> ExitCode {
        match self {
            Self::Help(text) => print!("{}", text),
            Self::Usage(text) => eprint!("{}", text),
            other => eprintln!("error: {}", other),
        }
        ExitCode::from(self.exit_code())
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage(text) | Self::Help(text) => write!(f, "{}", text.trim_end()),
            Self::Config(e) => write!(f, "{}: {}", e.kind(), e),
            Self::Synthesis(e) => write!(f, "synthesis failed: {}: {}", e.kind(), e),
            Self::Playback(e) => write!(f, "playback failed: {}: {}", e.kind(), e),
            Self::Output(e) => write!(f, "writing audio failed: {}: {}", e.kind(), e),
        }
    }
}

impl std::error::Error for CliError {}

/// Parse `argv` (program name first) without exiting the process.
pub fn parse_args<P, I, T>(argv: I) -> Result<P, CliError>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    P::try_parse_from(argv).map_err(|e| {
        let text = e.render().to_string();
        if e.use_stderr() {
            CliError::Usage(text)
        } else {
            CliError::Help(text)
        }
    })
}

// ── Local playback ──────────────────────────────────────────────────

/// Synthesize `args.text` and play it through the configured player.
pub async fn speak_aloud(args: &PlaybackArgs, config: &SpeakConfig) -> Result<(), CliError> {
    let engine =
        create_tts_engine(&args.synthesis.engine_settings(config)).map_err(CliError::Config)?;
    let player = args.player.as_deref().or(config.player.as_deref());
    let volume = config.volume.unwrap_or(1.0) as f32;
    let output = create_audio_output(player, volume).map_err(CliError::Config)?;
    speak_with(args, config, engine.as_ref(), output).await
}

/// Playback flow with the engine and player supplied by the caller.
pub async fn speak_with(
    args: &PlaybackArgs,
    config: &SpeakConfig,
    engine: &dyn TtsEngine,
    output: Box<dyn AudioOutput>,
) -> Result<(), CliError> {
    let voice = resolve_voice(Some(&args.language), None);
    let request = SpeechRequest::new(args.text.as_str(), voice).slow(args.synthesis.is_slow(config));
    let audio = synthesize(engine, &request).await?;

    info!(player = %output.name(), bytes = audio.len(), "Playing synthesized speech");
    tokio::task::spawn_blocking(move || play_through_temp_file(&audio, output.as_ref()))
        .await
        .map_err(|e| CliError::Playback(TtsError::PlaybackError(format!("Playback task failed: {}", e))))?
        .map_err(CliError::Playback)
}

// ── Stdout streaming ────────────────────────────────────────────────

/// Synthesize `args.text` and write the MP3 bytes to stdout.
pub async fn stream_speech(args: &StreamArgs, config: &SpeakConfig) -> Result<(), CliError> {
    let engine =
        create_tts_engine(&args.synthesis.engine_settings(config)).map_err(CliError::Config)?;
    stream_with(args, config, engine.as_ref(), &mut std::io::stdout()).await
}

/// Streaming flow with the engine and writer supplied by the caller.
///
/// `out` receives either the complete audio stream or nothing at all.
pub async fn stream_with<W: Write>(
    args: &StreamArgs,
    config: &SpeakConfig,
    engine: &dyn TtsEngine,
    out: &mut W,
) -> Result<(), CliError> {
    let voice = resolve_voice(Some(&args.language), args.voice.as_deref());
    let request = SpeechRequest::new(args.text.as_str(), voice).slow(args.synthesis.is_slow(config));
    let audio = synthesize(engine, &request).await?;
    write_raw(&audio, out).map_err(CliError::Output)
}

async fn synthesize(engine: &dyn TtsEngine, request: &SpeechRequest) -> Result<Vec<u8>, CliError> {
    info!(
        engine = %engine.name(),
        locale = %request.voice.locale(),
        voice = %request.voice.voice,
        "Synthesizing"
    );
    let audio = engine.synthesize(request).await.map_err(CliError::Synthesis)?;
    if audio.is_empty() {
        return Err(CliError::Synthesis(TtsError::InvalidResponse(
            "provider returned no audio".into(),
        )));
    }
    if !looks_like_mp3(&audio) {
        warn!(bytes = audio.len(), "Synthesized audio does not start with an MP3 header");
    }
    Ok(audio)
}
