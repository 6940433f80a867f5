//! Google Translate TTS: the free voice behind translate.google.com.
//!
//! POST `https://translate.google.{tld}/_/TranslateWebserverUi/data/batchexecute`
//! with a form field `f.req` carrying a batchexecute RPC envelope:
//!
//! ```text
//! [[["jQ1olc", "[\"<text>\",\"<lang>\",<true|null>,\"null\"]", null, "generic"]]]
//! ```
//!
//! The response is a sequence of length-prefixed JSON lines; the line for
//! our RPC holds `["wrb.fr","jQ1olc","[\"<base64 mp3>\"]",...]`. Requests
//! are limited to 100 characters, so longer text is sent in chunks.

use std::future::Future;
use std::pin::Pin;

use base64::Engine as _;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{chunk_text, SpeechRequest, TtsEngine, TtsError};

/// batchexecute RPC id of the TTS endpoint.
const RPC_ID: &str = "jQ1olc";
/// Longest text the endpoint accepts per request.
pub const MAX_CHARS: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/47.0.2526.106 Safari/537.36";

/// Google Translate TTS engine.
pub struct TranslateTts {
    /// Google domain suffix ("com", "co.uk", "com.au", ...), selects the accent.
    tld: String,
    /// Overrides `https://translate.google.{tld}` when set.
    base_url: Option<String>,
    /// HTTP client (reused across chunk requests).
    client: reqwest::Client,
}

impl TranslateTts {
    pub fn new(tld: &str) -> Self {
        Self::with_client(reqwest::Client::new(), tld)
    }

    pub fn with_client(client: reqwest::Client, tld: &str) -> Self {
        let tld = tld.trim().trim_start_matches('.');
        Self {
            tld: if tld.is_empty() { "com".into() } else { tld.to_string() },
            base_url: None,
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn url(&self) -> String {
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://translate.google.{}", self.tld));
        format!("{}/_/TranslateWebserverUi/data/batchexecute", base)
    }

    async fn synthesize_chunk(&self, text: &str, lang: &str, slow: bool) -> Result<Vec<u8>, TtsError> {
        let rpc = build_rpc(text, lang, slow);

        let response = self
            .client
            .post(self.url())
            .header("Referer", "http://translate.google.com/")
            .header("User-Agent", USER_AGENT)
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded;charset=utf-8",
            )
            .form(&[("f.req", rpc)])
            .send()
            .await
            .map_err(|e| TtsError::NetworkError(format!("Failed to connect: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.error_for_status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TtsError::NetworkError(format!("Failed to read response: {}", e)))?;

        match extract_audio(&body)? {
            Some(audio) => Ok(audio),
            None => Err(TtsError::UnsupportedLanguage(format!(
                "no audio stream in response for language '{}'",
                lang
            ))),
        }
    }

    fn error_for_status(&self, status: u16) -> TtsError {
        let premise = format!("{} from TTS API", status);
        match status {
            403 => TtsError::ServiceError(format!(
                "{}. Probable cause: bad token or upstream API changes",
                premise
            )),
            404 if self.tld != "com" => TtsError::ServiceError(format!(
                "{}. Probable cause: unsupported tld '{}'",
                premise, self.tld
            )),
            429 => TtsError::QuotaExceeded(format!("{}. Too many requests", premise)),
            500..=599 => TtsError::ServiceError(format!(
                "{}. Upstream API error, try again later",
                premise
            )),
            _ => TtsError::ServiceError(format!("{}. Probable cause: unknown", premise)),
        }
    }
}

impl TtsEngine for TranslateTts {
    fn synthesize(
        &self,
        request: &SpeechRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, TtsError>> + Send + '_>> {
        let request = request.clone();
        Box::pin(async move {
            let chunks = chunk_text(&request.text, self.max_chunk_chars())?;
            let lang = request.voice.engine_code();

            info!(
                lang = %lang,
                slow = request.slow,
                chunks = chunks.len(),
                text_len = request.text.len(),
                "Google Translate TTS request"
            );

            let mut audio = Vec::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let bytes = self.synthesize_chunk(chunk, lang, request.slow).await?;
                debug!(chunk = i, bytes = bytes.len(), "Chunk synthesized");
                audio.extend_from_slice(&bytes);
            }

            info!(mp3_bytes = audio.len(), "Google Translate TTS synthesis complete");
            Ok(audio)
        })
    }

    fn name(&self) -> String {
        format!("Google Translate TTS ({})", self.tld)
    }

    fn max_chunk_chars(&self) -> usize {
        MAX_CHARS
    }
}

/// Build the `f.req` form value for one chunk.
fn build_rpc(text: &str, lang: &str, slow: bool) -> String {
    let speed = if slow { Value::Bool(true) } else { Value::Null };
    let parameter = json!([text, lang, speed, "null"]).to_string();
    json!([[[RPC_ID, parameter, Value::Null, "generic"]]]).to_string()
}

/// Pull the MP3 payload out of a batchexecute response body.
///
/// Returns `Ok(None)` when the response carries no audio for our RPC,
/// which is how the endpoint answers unsupported languages.
fn extract_audio(body: &str) -> Result<Option<Vec<u8>>, TtsError> {
    let mut audio: Option<Vec<u8>> = None;

    for line in body.lines().filter(|l| l.contains(RPC_ID)) {
        let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        for entry in &entries {
            let Some(payload) = rpc_payload(entry) else {
                continue;
            };
            let inner: Value = serde_json::from_str(payload).map_err(|e| {
                TtsError::InvalidResponse(format!("Malformed RPC payload: {}", e))
            })?;
            let Some(encoded) = inner.get(0).and_then(Value::as_str) else {
                continue;
            };
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| TtsError::InvalidResponse(format!("Bad base64 audio: {}", e)))?;
            audio.get_or_insert_with(Vec::new).extend_from_slice(&bytes);
        }
    }

    Ok(audio.filter(|a| !a.is_empty()))
}

/// `["wrb.fr", RPC_ID, "<payload>", ...]` → `"<payload>"`.
fn rpc_payload(entry: &Value) -> Option<&str> {
    let fields = entry.as_array()?;
    if fields.first()?.as_str()? != "wrb.fr" || fields.get(1)?.as_str()? != RPC_ID {
        return None;
    }
    fields.get(2)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::resolve_voice;
    use crate::tts::test_server;

    const FAKE_MP3: &[u8] = &[0xFF, 0xF3, 0x44, 0xC4, 0x00, 0x01, 0x02];

    fn batch_response(audio: &[u8]) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(audio);
        let payload = json!([encoded]).to_string();
        let line = json!([["wrb.fr", RPC_ID, payload, null, null, null, "generic"],
            ["di", 42], ["af.httprm", 41, "-123", 7]])
        .to_string();
        format!(")]}}'\n\n{}\n{}\n25\n[[\"e\",4,null,null,140]]\n", line.len(), line)
    }

    #[test]
    fn test_build_rpc_normal_speed() {
        let rpc = build_rpc("Hello world", "en", false);
        assert_eq!(
            rpc,
            r#"[[["jQ1olc","[\"Hello world\",\"en\",null,\"null\"]",null,"generic"]]]"#
        );
    }

    #[test]
    fn test_build_rpc_slow_and_escaping() {
        let rpc = build_rpc("say \"hi\"", "fr", true);
        let outer: Value = serde_json::from_str(&rpc).unwrap();
        let inner: Value = serde_json::from_str(outer[0][0][1].as_str().unwrap()).unwrap();
        assert_eq!(inner[0], "say \"hi\"");
        assert_eq!(inner[1], "fr");
        assert_eq!(inner[2], true);
        assert_eq!(inner[3], "null");
    }

    #[test]
    fn test_extract_audio() {
        let audio = extract_audio(&batch_response(FAKE_MP3)).unwrap().unwrap();
        assert_eq!(audio, FAKE_MP3);
    }

    #[test]
    fn test_extract_audio_missing_payload() {
        let line = json!([["wrb.fr", RPC_ID, null, null, null, [3], "generic"]]).to_string();
        let body = format!(")]}}'\n\n{}\n{}\n", line.len(), line);
        assert!(extract_audio(&body).unwrap().is_none());
        assert!(extract_audio("<html>nope</html>").unwrap().is_none());
    }

    #[test]
    fn test_extract_audio_bad_base64() {
        let line = json!([["wrb.fr", RPC_ID, "[\"@@not base64@@\"]"]]).to_string();
        let err = extract_audio(&line).unwrap_err();
        assert_eq!(err.kind(), "invalid-response");
    }

    #[test]
    fn test_status_mapping() {
        let com = TranslateTts::new("com");
        assert_eq!(com.error_for_status(403).kind(), "service");
        assert_eq!(com.error_for_status(429).kind(), "quota");
        assert!(com.error_for_status(503).to_string().contains("try again later"));
        assert!(!com.error_for_status(404).to_string().contains("tld"));

        let uk = TranslateTts::new(".co.uk");
        assert_eq!(uk.name(), "Google Translate TTS (co.uk)");
        assert!(uk.error_for_status(404).to_string().contains("unsupported tld 'co.uk'"));
    }

    #[test]
    fn test_url() {
        assert_eq!(
            TranslateTts::new("com").url(),
            "https://translate.google.com/_/TranslateWebserverUi/data/batchexecute"
        );
        let local = TranslateTts::new("com").with_base_url("http://127.0.0.1:9/");
        assert_eq!(
            local.url(),
            "http://127.0.0.1:9/_/TranslateWebserverUi/data/batchexecute"
        );
    }

    #[tokio::test]
    async fn test_synthesize_against_loopback() {
        let (base_url, server) = test_server::serve(vec![(200, batch_response(FAKE_MP3))]).await;
        let engine = TranslateTts::with_client(test_server::client(), "com").with_base_url(&base_url);

        let request = SpeechRequest::new("Hello world", resolve_voice(Some("en"), None));
        let audio = engine.synthesize(&request).await.unwrap();
        assert_eq!(audio, FAKE_MP3);

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("POST /_/TranslateWebserverUi/data/batchexecute"));
        assert!(requests[0].contains("f.req="));
        assert!(requests[0].contains("jQ1olc"));
    }

    #[tokio::test]
    async fn test_long_text_is_chunked_and_concatenated() {
        let words = "word ".repeat(40);
        let responses = vec![
            (200, batch_response(&[0xFF, 0xF3, 1])),
            (200, batch_response(&[0xFF, 0xF3, 2])),
        ];
        let (base_url, server) = test_server::serve(responses).await;
        let engine = TranslateTts::with_client(test_server::client(), "com").with_base_url(&base_url);

        let request = SpeechRequest::new(words, resolve_voice(Some("en"), None));
        let audio = engine.synthesize(&request).await.unwrap();
        assert_eq!(audio, vec![0xFF, 0xF3, 1, 0xFF, 0xF3, 2]);
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let (base_url, _server) = test_server::serve(vec![(429, String::new())]).await;
        let engine = TranslateTts::with_client(test_server::client(), "com").with_base_url(&base_url);

        let request = SpeechRequest::new("Hello", resolve_voice(Some("hi"), None));
        let err = engine.synthesize(&request).await.unwrap_err();
        assert_eq!(err.kind(), "quota");
    }

    #[tokio::test]
    async fn test_unsupported_language_when_no_audio() {
        let (base_url, _server) = test_server::serve(vec![(200, ")]}'\n".to_string())]).await;
        let engine = TranslateTts::with_client(test_server::client(), "com").with_base_url(&base_url);

        let request = SpeechRequest::new("Hello", resolve_voice(Some("gu"), None));
        let err = engine.synthesize(&request).await.unwrap_err();
        assert_eq!(err.kind(), "unsupported-language");
        assert!(err.to_string().contains("'gu'"));
    }

    #[tokio::test]
    async fn test_empty_text_makes_no_request() {
        let engine = TranslateTts::new("com").with_base_url("http://127.0.0.1:9");
        let request = SpeechRequest::new(" ... ", resolve_voice(None, None));
        let err = engine.synthesize(&request).await.unwrap_err();
        assert!(matches!(err, TtsError::EmptyText));
    }
}
