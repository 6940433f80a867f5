//! Language and voice registry shared by both entry points.
//!
//! One table maps a short language code to the region-qualified locale, the
//! code the translate engine accepts, and a default cloud voice. Lookups
//! never fail: anything unrecognised degrades to English so synthesis is
//! not blocked by an odd language argument.

use tracing::{debug, warn};

/// A supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Short code, e.g. "hi".
    pub code: &'static str,
    /// English display name.
    pub name: &'static str,
    /// Region-qualified locale tag, e.g. "hi-IN".
    pub locale: &'static str,
    /// Language code accepted by the translate engine.
    pub engine_code: &'static str,
    /// Default cloud voice for this language.
    pub voice: &'static str,
}

/// Default locale when no language argument is given.
pub const DEFAULT_LOCALE: &str = "en-US";

pub static LANGUAGES: &[Language] = &[
    Language {
        code: "en",
        name: "English",
        locale: "en-US",
        engine_code: "en",
        voice: "en-US-Neural2-D",
    },
    Language {
        code: "hi",
        name: "Hindi",
        locale: "hi-IN",
        engine_code: "hi",
        voice: "hi-IN-Neural2-A",
    },
    Language {
        code: "es",
        name: "Spanish",
        locale: "es-ES",
        engine_code: "es",
        voice: "es-ES-Neural2-A",
    },
    Language {
        code: "fr",
        name: "French",
        locale: "fr-FR",
        engine_code: "fr",
        voice: "fr-FR-Neural2-A",
    },
    Language {
        code: "de",
        name: "German",
        locale: "de-DE",
        engine_code: "de",
        voice: "de-DE-Neural2-B",
    },
    Language {
        code: "it",
        name: "Italian",
        locale: "it-IT",
        engine_code: "it",
        voice: "it-IT-Neural2-A",
    },
    Language {
        code: "pt",
        name: "Portuguese",
        locale: "pt-BR",
        engine_code: "pt",
        voice: "pt-BR-Neural2-A",
    },
    Language {
        code: "ja",
        name: "Japanese",
        locale: "ja-JP",
        engine_code: "ja",
        voice: "ja-JP-Neural2-B",
    },
    Language {
        code: "ko",
        name: "Korean",
        locale: "ko-KR",
        engine_code: "ko",
        voice: "ko-KR-Neural2-A",
    },
    Language {
        code: "zh",
        name: "Chinese (Mandarin)",
        locale: "zh-CN",
        engine_code: "zh-CN",
        voice: "cmn-CN-Wavenet-A",
    },
    Language {
        code: "gu",
        name: "Gujarati",
        locale: "gu-IN",
        engine_code: "gu",
        voice: "gu-IN-Wavenet-A",
    },
];

/// The English entry every failed lookup falls back to.
pub fn default_language() -> &'static Language {
    &LANGUAGES[0]
}

/// Find a language by short code, locale tag, or the primary subtag of a
/// longer tag ("pt-PT" finds Portuguese). Case-insensitive.
pub fn lookup(raw: &str) -> Option<&'static Language> {
    let tag = raw.trim().replace('_', "-");
    if tag.is_empty() {
        return None;
    }

    LANGUAGES
        .iter()
        .find(|l| l.code.eq_ignore_ascii_case(&tag))
        .or_else(|| LANGUAGES.iter().find(|l| l.locale.eq_ignore_ascii_case(&tag)))
        .or_else(|| {
            let primary = tag.split('-').next()?;
            LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(primary))
        })
}

/// Resolve a language argument, falling back to English when unknown.
pub fn resolve(raw: &str) -> &'static Language {
    match lookup(raw) {
        Some(language) => language,
        None => {
            let fallback = default_language();
            warn!(
                language = %raw,
                fallback = %fallback.name,
                "Unknown language code, falling back"
            );
            fallback
        }
    }
}

/// A language plus the voice to synthesize it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVoice {
    pub language: &'static Language,
    /// Voice identifier sent to voice-aware providers.
    pub voice: String,
    /// True when the language argument was not recognised.
    pub fell_back: bool,
}

impl ResolvedVoice {
    pub fn locale(&self) -> &'static str {
        self.language.locale
    }

    pub fn engine_code(&self) -> &'static str {
        self.language.engine_code
    }

    /// Language code the cloud API expects for this voice.
    pub fn voice_language_code(&self) -> &str {
        voice_language_code(&self.voice).unwrap_or(self.language.locale)
    }
}

/// Resolve optional language and voice arguments.
///
/// A missing or blank language means `en-US`. The voice always comes from
/// the registry entry of the resolved language; an explicit voice argument
/// is accepted but replaced.
pub fn resolve_voice(language: Option<&str>, voice: Option<&str>) -> ResolvedVoice {
    let raw = language
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LOCALE);

    let (language, fell_back) = match lookup(raw) {
        Some(language) => (language, false),
        None => (resolve(raw), true),
    };

    if let Some(requested) = voice.map(str::trim).filter(|s| !s.is_empty()) {
        if requested != language.voice {
            debug!(
                requested = %requested,
                voice = %language.voice,
                "Voice argument replaced by registry voice"
            );
        }
    }
    let voice = language.voice.to_string();

    ResolvedVoice {
        language,
        voice,
        fell_back,
    }
}

/// Language code embedded in a cloud voice name: "cmn-CN-Wavenet-A" → "cmn-CN".
pub fn voice_language_code(voice: &str) -> Option<&str> {
    let mut dashes = voice.match_indices('-').map(|(i, _)| i);
    let _first = dashes.next()?;
    let second = dashes.next()?;
    Some(&voice[..second])
}
