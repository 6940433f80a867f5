//! Google Cloud Text-to-Speech: paid synthesis with named voices.
//!
//! POST `https://texttospeech.googleapis.com/v1/text:synthesize?key=<key>`
//! Body: `{"input": {"text"}, "voice": {"languageCode", "name"}, "audioConfig": {...}}`
//! Returns `{"audioContent": "<base64 mp3>"}`.

use std::future::Future;
use std::pin::Pin;

use base64::Engine as _;
use serde::Deserialize;
use tracing::info;

use super::{chunk_text, SpeechRequest, TtsEngine, TtsError};

const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";
/// Characters per request; keeps multi-byte scripts under the 5000 byte input cap.
pub const MAX_CHARS: usize = 1500;
/// Speaking rate used for `slow` requests.
const SLOW_RATE: f64 = 0.75;

/// Google Cloud Text-to-Speech engine.
pub struct CloudTts {
    api_key: String,
    base_url: String,
    speaking_rate: f64,
    client: reqwest::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl CloudTts {
    pub fn new(api_key: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api_key)
    }

    pub fn with_client(client: reqwest::Client, api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            speaking_rate: 1.0,
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Speaking rate for normal requests (Cloud accepts 0.25–4.0).
    pub fn with_speaking_rate(mut self, rate: f64) -> Self {
        self.speaking_rate = rate.clamp(0.25, 4.0);
        self
    }

    fn body(&self, text: &str, request: &SpeechRequest) -> serde_json::Value {
        let rate = if request.slow {
            SLOW_RATE
        } else {
            self.speaking_rate
        };
        serde_json::json!({
            "input": { "text": text },
            "voice": {
                "languageCode": request.voice.voice_language_code(),
                "name": request.voice.voice,
            },
            "audioConfig": {
                "audioEncoding": "MP3",
                "speakingRate": rate,
            }
        })
    }

    async fn synthesize_chunk(&self, text: &str, request: &SpeechRequest) -> Result<Vec<u8>, TtsError> {
        let resp = self
            .client
            .post(format!("{}/v1/text:synthesize", self.base_url))
            .query(&[("key", &self.api_key)])
            .json(&self.body(text, request))
            .send()
            .await
            .map_err(|e| TtsError::NetworkError(format!("Cloud TTS request failed: {}", e)))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TtsError::NetworkError(format!("Failed to read Cloud TTS response: {}", e)))?;

        if !status.is_success() {
            return Err(error_for_response(status.as_u16(), &body));
        }

        let parsed: SynthesizeResponse = serde_json::from_str(&body)
            .map_err(|e| TtsError::InvalidResponse(format!("Cloud TTS response: {}", e)))?;
        let encoded = parsed
            .audio_content
            .filter(|a| !a.is_empty())
            .ok_or_else(|| TtsError::InvalidResponse("Cloud TTS returned no audioContent".into()))?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| TtsError::InvalidResponse(format!("Bad base64 audio: {}", e)))
    }
}

impl TtsEngine for CloudTts {
    fn synthesize(
        &self,
        request: &SpeechRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, TtsError>> + Send + '_>> {
        let request = request.clone();
        Box::pin(async move {
            let chunks = chunk_text(&request.text, self.max_chunk_chars())?;

            info!(
                voice = %request.voice.voice,
                chunks = chunks.len(),
                text_len = request.text.len(),
                "Cloud TTS request"
            );

            let mut audio = Vec::new();
            for chunk in &chunks {
                audio.extend(self.synthesize_chunk(chunk, &request).await?);
            }

            info!(mp3_bytes = audio.len(), "Cloud TTS synthesis complete");
            Ok(audio)
        })
    }

    fn name(&self) -> String {
        "Google Cloud TTS".to_string()
    }

    fn max_chunk_chars(&self) -> usize {
        MAX_CHARS
    }
}

/// Map an error response to a `TtsError`, keeping the API's own message.
fn error_for_response(status: u16, body: &str) -> TtsError {
    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => (env.error.message, env.error.status),
        Err(_) => (body.trim().to_string(), String::new()),
    };
    let detail = format!("Cloud TTS API error {}: {}", status, message);

    if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
        return TtsError::QuotaExceeded(detail);
    }
    match status {
        400 if message.to_ascii_lowercase().contains("voice")
            || message.to_ascii_lowercase().contains("language") =>
        {
            TtsError::UnsupportedLanguage(detail)
        }
        _ => TtsError::ServiceError(detail),
    }
}
