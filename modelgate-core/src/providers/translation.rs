//! Speech translation backends
//!
//! The audio-translation path composes two opaque network services: a
//! transcription backend that turns audio into a transcript (optionally with
//! timed segments) and a text-translation backend that maps text into
//! English. Both sit behind traits so the gateway logic and the subtitle
//! post-processor can be exercised without the network.

use crate::http::{HttpClient, RequestOptions};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::subtitle::TranscriptSegment;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Audio containers the transcription backend accepts
pub const ACCEPTED_AUDIO_FORMATS: &[&str] = &[
    "flac", "m4a", "mp3", "mp4", "mpeg", "mpga", "oga", "ogg", "wav", "webm",
];

/// Transcription result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Detected source language code (e.g. `es-US`)
    pub language: String,

    /// Flat transcript text
    pub text: String,

    /// Source audio duration in seconds
    #[serde(default)]
    pub duration: f64,

    /// Timed segments, present when the backend produced subtitle structure
    #[serde(default)]
    pub segments: Option<Vec<TranscriptSegment>>,
}

/// Transcription backend seam
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio, detecting the source language. `with_segments`
    /// asks the backend for timed subtitle structure.
    async fn transcribe(
        &self,
        audio: &[u8],
        format: &str,
        with_segments: bool,
    ) -> ProviderResult<Transcript>;
}

/// Text translation backend seam
#[async_trait]
pub trait TextTranslator: Send + Sync {
    /// Translate `text` from `source_language` into English.
    async fn translate_to_english(&self, text: &str, source_language: &str)
        -> ProviderResult<String>;
}

/// Translate unless there is nothing to do: empty text and already-English
/// sources pass through unchanged. Region subtags are stripped before the
/// comparison (`en-US` counts as English).
pub async fn translate_if_needed(
    translator: &dyn TextTranslator,
    text: &str,
    source_language: &str,
) -> ProviderResult<String> {
    let language = source_language
        .split('-')
        .next()
        .unwrap_or(source_language);
    if text.trim().is_empty() || language.eq_ignore_ascii_case("en") {
        return Ok(text.to_string());
    }
    translator.translate_to_english(text, language).await
}

/// Validate an uploaded audio file before any backend call.
///
/// Returns the detected container format. Empty uploads and unknown
/// containers fail with a message naming the accepted formats.
pub fn validate_audio_upload(filename: &str, content: &[u8]) -> ProviderResult<String> {
    let formats = ACCEPTED_AUDIO_FORMATS.join(", ");
    if content.is_empty() {
        return Err(ProviderError::invalid(format!(
            "The uploaded audio file is empty. Supported formats: {formats}"
        )));
    }
    let extension = filename
        .rsplit('.')
        .next()
        .filter(|ext| *ext != filename)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ACCEPTED_AUDIO_FORMATS.contains(&extension.as_str()) {
        return Err(ProviderError::invalid(format!(
            "Invalid file format '{extension}'. Supported formats: {formats}"
        )));
    }
    Ok(extension)
}

/// Transcription backend over its JSON wire contract
pub struct HttpTranscriber {
    http: HttpClient,
    base_url: String,
    options: RequestOptions,
}

impl HttpTranscriber {
    pub fn new(http: HttpClient, base_url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            options,
        }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        format: &str,
        with_segments: bool,
    ) -> ProviderResult<Transcript> {
        let url = format!("{}/transcriptions", self.base_url);
        let body = json!({
            "audio": BASE64.encode(audio),
            "format": format,
            "segments": with_segments,
        });
        let response = self.http.post_json(&url, &body, &self.options).await?;
        serde_json::from_value(response)
            .map_err(|err| ProviderError::Parse(format!("Invalid transcription response: {err}")))
    }
}

/// Translation backend over its JSON wire contract
pub struct HttpTranslator {
    http: HttpClient,
    base_url: String,
    options: RequestOptions,
}

impl HttpTranslator {
    pub fn new(http: HttpClient, base_url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            options,
        }
    }
}

#[async_trait]
impl TextTranslator for HttpTranslator {
    async fn translate_to_english(
        &self,
        text: &str,
        source_language: &str,
    ) -> ProviderResult<String> {
        let url = format!("{}/translate", self.base_url);
        let body = json!({
            "text": text,
            "source_language": source_language,
            "target_language": "en",
        });
        let response = self.http.post_json(&url, &body, &self.options).await?;
        response
            .get("translated_text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::Parse("translation response missing 'translated_text'".to_string())
            })
    }
}
