//! Text-to-Speech providers.
//!
//! Provides a common `TtsEngine` trait with implementations for:
//! - Google Translate TTS (free, no key, `translate`)
//! - Google Cloud Text-to-Speech (API key, `cloud`)
//!
//! Engines return encoded MP3 bytes; what happens to them is up to the
//! output sink.

pub mod cloud;
pub mod mp3;
pub mod tokenize;
pub mod translate;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub use cloud::CloudTts;
pub use translate::TranslateTts;

use crate::config::SpeakConfig;
use crate::language::ResolvedVoice;

/// Provider name for Google Translate TTS.
pub const PROVIDER_TRANSLATE: &str = "translate";
/// Provider name for Google Cloud Text-to-Speech.
pub const PROVIDER_CLOUD: &str = "cloud";

// ── TTS Engine Trait ────────────────────────────────────────────────

/// Common trait for all TTS engines (dyn-compatible).
pub trait TtsEngine: Send + Sync {
    /// Synthesize the request to MP3 bytes.
    ///
    /// Long text is split into provider-sized chunks and the audio of each
    /// chunk is concatenated in order. Resolves once all audio is in hand.
    fn synthesize(
        &self,
        request: &SpeechRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, TtsError>> + Send + '_>>;

    /// Display name for this engine (e.g. "Google Translate TTS (com)").
    fn name(&self) -> String;

    /// Longest chunk of text sent in a single provider request.
    fn max_chunk_chars(&self) -> usize;
}

/// What to say and how.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: ResolvedVoice,
    /// Slower speech, for providers that support it.
    pub slow: bool,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: ResolvedVoice) -> Self {
        Self {
            text: text.into(),
            voice,
            slow: false,
        }
    }

    pub fn slow(mut self, slow: bool) -> Self {
        self.slow = slow;
        self
    }
}

/// Split request text for a provider, rejecting text with nothing to say.
pub(crate) fn chunk_text(text: &str, max_chars: usize) -> Result<Vec<String>, TtsError> {
    let chunks = tokenize::split_for_synthesis(text, max_chars);
    if chunks.is_empty() {
        return Err(TtsError::EmptyText);
    }
    Ok(chunks)
}

// ── TTS Error ───────────────────────────────────────────────────────

/// Errors that can occur during TTS operations.
#[derive(Debug)]
pub enum TtsError {
    /// Nothing speakable in the input.
    EmptyText,
    /// Provider does not support the language or voice.
    UnsupportedLanguage(String),
    /// Could not reach the provider.
    NetworkError(String),
    /// Provider rejected the request for rate or quota reasons.
    QuotaExceeded(String),
    /// Provider answered with an error.
    ServiceError(String),
    /// Provider answered, but not with audio we understand.
    InvalidResponse(String),
    /// Audio could not be decoded for playback.
    Decode(String),
    /// Engine could not be built from the configuration.
    Config(String),
    /// Audio playback error.
    PlaybackError(String),
    /// Local I/O failure (temp file, stdout).
    Io(std::io::Error),
}

impl TtsError {
    /// Short stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyText => "empty-text",
            Self::UnsupportedLanguage(_) => "unsupported-language",
            Self::NetworkError(_) => "network",
            Self::QuotaExceeded(_) => "quota",
            Self::ServiceError(_) => "service",
            Self::InvalidResponse(_) => "invalid-response",
            Self::Decode(_) => "decode",
            Self::Config(_) => "config",
            Self::PlaybackError(_) => "playback",
            Self::Io(_) => "io",
        }
    }
}

impl std::fmt::Display for TtsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "No text to send to TTS API"),
            Self::UnsupportedLanguage(msg) => write!(f, "Unsupported language: {}", msg),
            Self::NetworkError(msg) => write!(f, "TTS network error: {}", msg),
            Self::QuotaExceeded(msg) => write!(f, "TTS quota exceeded: {}", msg),
            Self::ServiceError(msg) => write!(f, "TTS service error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid TTS response: {}", msg),
            Self::Decode(msg) => write!(f, "Audio decode error: {}", msg),
            Self::Config(msg) => write!(f, "TTS configuration error: {}", msg),
            Self::PlaybackError(msg) => write!(f, "Audio playback error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TtsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TtsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ── TTS Engine Factory ──────────────────────────────────────────────

/// Provider settings after config file, environment and CLI are merged.
#[derive(Clone)]
pub struct EngineSettings {
    /// "translate" or "cloud".
    pub provider: String,
    pub api_key: Option<String>,
    /// Base URL override (tests, proxies).
    pub endpoint: Option<String>,
    /// Google domain suffix for the translate provider.
    pub tld: String,
    pub speaking_rate: f64,
    pub timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider: PROVIDER_TRANSLATE.into(),
            api_key: None,
            endpoint: None,
            tld: "com".into(),
            speaking_rate: 1.0,
            timeout: Duration::from_secs(30),
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &SpeakConfig) -> Self {
        let defaults = Self::default();
        Self {
            provider: config.provider.clone().unwrap_or(defaults.provider),
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            tld: config.tld.clone().unwrap_or(defaults.tld),
            speaking_rate: config.speaking_rate.unwrap_or(defaults.speaking_rate),
            timeout: config
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

/// Create a TTS engine from settings.
///
/// `provider` is one of: "translate" (aliases "gtts", "google-translate")
/// or "cloud" (alias "google-cloud"). The cloud provider requires an API key.
pub fn create_tts_engine(settings: &EngineSettings) -> Result<Box<dyn TtsEngine>, TtsError> {
    let client = reqwest::Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(|e| TtsError::Config(format!("Failed to build HTTP client: {}", e)))?;

    match settings.provider.trim().to_ascii_lowercase().as_str() {
        PROVIDER_TRANSLATE | "gtts" | "google-translate" => {
            let mut engine = TranslateTts::with_client(client, &settings.tld);
            if let Some(endpoint) = &settings.endpoint {
                engine = engine.with_base_url(endpoint);
            }
            tracing::debug!(engine = %engine.name(), "Created TTS engine");
            Ok(Box::new(engine))
        }
        PROVIDER_CLOUD | "google-cloud" => {
            let key = settings
                .api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    TtsError::Config(format!(
                        "Cloud TTS requires an API key (set apiKey or {})",
                        crate::config::API_KEY_ENV
                    ))
                })?;
            let mut engine =
                CloudTts::with_client(client, key).with_speaking_rate(settings.speaking_rate);
            if let Some(endpoint) = &settings.endpoint {
                engine = engine.with_base_url(endpoint);
            }
            tracing::debug!(engine = %engine.name(), "Created TTS engine");
            Ok(Box::new(engine))
        }
        other => Err(TtsError::Config(format!("Unknown TTS provider: {}", other))),
    }
}

// ── Tests ───────────────────────────────────────────────────────────


/// Minimal loopback HTTP server for provider tests.
#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// HTTP client that never routes loopback traffic through a proxy.
    pub fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    /// Serve the canned `(status, body)` responses, one per connection, in
    /// order. Returns the base URL and a handle yielding the raw requests.
    pub async fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                let response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            requests
        });

        (base_url, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}
