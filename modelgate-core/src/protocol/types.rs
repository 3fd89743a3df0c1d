//! Request and response shapes for the supported OpenAI surfaces
//!
//! The design mirrors the officially documented field names exactly so that a
//! serialized response is indistinguishable from the upstream API. Optional
//! fields use `skip_serializing_if` to keep responses minimal, and requests
//! capture unrecognized fields in an open `extra` mapping that is forwarded
//! verbatim to the resolved provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Embedding input: a single string or a batch of strings.
///
/// Media inputs are carried as data URIs inside the same string slots, the
/// way multimodal embedding callers submit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    /// Single input item
    Single(String),
    /// Batch of input items
    Batch(Vec<String>),
}

impl EmbeddingInput {
    /// Flatten into an ordered list of items.
    pub fn into_items(self) -> Vec<String> {
        match self {
            Self::Single(value) => vec![value],
            Self::Batch(values) => values,
        }
    }

    /// Number of items carried.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(values) => values.len(),
        }
    }

    /// True when no items are carried.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(_) => false,
            Self::Batch(values) => values.is_empty(),
        }
    }
}

/// Wire encoding of returned embedding vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    /// Raw float list (default)
    #[default]
    Float,
    /// Standard base64 over little-endian f32 bytes
    Base64,
}

/// `/v1/embeddings` request
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingRequest {
    /// Model identifier, resolved through the capability registry
    pub model: String,

    /// Input item(s) to embed
    pub input: EmbeddingInput,

    /// Requested output dimensionality
    #[serde(default)]
    pub dimensions: Option<u32>,

    /// Vector encoding in the response
    #[serde(default)]
    pub encoding_format: Option<EncodingFormat>,

    /// End-user identifier, logged only
    #[serde(default)]
    pub user: Option<String>,

    /// Provider-specific fields forwarded verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One embedding vector in a response, float or base64 encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingValue {
    Float(Vec<f32>),
    Base64(String),
}

/// One row of `/v1/embeddings` response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRow {
    /// Always `"embedding"`
    pub object: String,

    /// Position in the response list
    pub index: usize,

    /// The embedding vector
    pub embedding: EmbeddingValue,
}

/// Token accounting for an embeddings call
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
}

/// `/v1/embeddings` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Always `"list"`
    pub object: String,

    /// Embedding rows ordered by ascending `index`
    pub data: Vec<EmbeddingRow>,

    /// Echo of the requested model
    pub model: String,

    /// Token accounting
    pub usage: EmbeddingUsage,
}

/// Response format for generated images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageResponseFormat {
    /// Reference into the object store
    #[default]
    Url,
    /// Inline base64 payload
    B64Json,
}

/// `/v1/images/generations` request
#[derive(Debug, Clone, Deserialize)]
pub struct ImageGenerationRequest {
    /// Model identifier, resolved through the capability registry
    pub model: String,

    /// Text prompt
    pub prompt: String,

    /// Number of images to generate
    #[serde(default = "default_image_count")]
    pub n: u32,

    /// Output size as `WIDTHxHEIGHT`
    #[serde(default)]
    pub size: Option<String>,

    /// Quality level (`low`, `medium`, `high`, `standard`, `hd`, `auto`)
    #[serde(default)]
    pub quality: Option<String>,

    /// Style preset, forwarded to providers that accept one
    #[serde(default)]
    pub style: Option<String>,

    /// URL or inline base64 response
    #[serde(default)]
    pub response_format: Option<ImageResponseFormat>,

    /// Requested output container (`png`, `jpeg`, `webp`)
    #[serde(default)]
    pub output_format: Option<String>,

    /// Output compression level, 0-100
    #[serde(default = "default_output_compression")]
    pub output_compression: u8,

    /// End-user identifier, logged only
    #[serde(default)]
    pub user: Option<String>,

    /// Provider-specific fields forwarded verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_image_count() -> u32 {
    1
}

fn default_output_compression() -> u8 {
    100
}

/// One generated image in a response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Token accounting for an images call
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImageUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// `/v1/images/generations` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesResponse {
    /// Unix timestamp of the generation
    pub created: u64,

    /// Generated images, one row per output
    pub data: Vec<ImageRow>,

    /// Final output container after conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,

    /// Final image size as `WIDTHxHEIGHT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Final quality level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,

    /// Token accounting
    pub usage: ImageUsage,
}

/// Output format for audio translations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioResponseFormat {
    #[default]
    Json,
    Text,
    Srt,
    VerboseJson,
    Vtt,
}

/// `/v1/audio/translations` request
///
/// The front door has already parsed the multipart form; the core receives
/// the raw file bytes together with the submitted file name.
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Uploaded audio content
    pub file: Vec<u8>,

    /// Submitted file name, used for container detection
    pub filename: String,

    /// Model identifier, resolved through the capability registry
    pub model: String,

    /// Optional style guidance, accepted but unused
    pub prompt: Option<String>,

    /// Requested output format
    pub response_format: AudioResponseFormat,

    /// Sampling temperature, accepted but unused
    pub temperature: f32,
}

/// Plain JSON translation body: `{"text": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationJson {
    pub text: String,
}

/// One segment of a verbose translation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationSegmentVerbose {
    pub id: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Verbose JSON translation body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationVerbose {
    /// Output language, always English for translations
    pub language: String,

    /// Source audio duration in seconds
    pub duration: f64,

    pub text: String,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub segments: Vec<TranslationSegmentVerbose>,
}

/// Translation result in the requested format
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationResponse {
    /// `text` format: bare string body
    Text(String),
    /// `json` format
    Json(TranslationJson),
    /// `verbose_json` format
    Verbose(TranslationVerbose),
    /// `srt` / `vtt` formats: serialized subtitle document
    Subtitle(String),
}

impl TranslationResponse {
    /// The translated English text regardless of format.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Subtitle(text) => text,
            Self::Json(body) => &body.text,
            Self::Verbose(body) => &body.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_input_flattens_to_items() {
        let single = EmbeddingInput::Single("hello".to_string());
        assert_eq!(single.len(), 1);
        assert_eq!(single.into_items(), vec!["hello".to_string()]);

        let batch = EmbeddingInput::Batch(vec!["a".to_string(), "b".to_string()]);
        assert!(!batch.is_empty());
        assert_eq!(batch.into_items().len(), 2);
    }

    #[test]
    fn embedding_request_captures_extra_fields() {
        let request: EmbeddingRequest = serde_json::from_value(serde_json::json!({
            "model": "amazon.titan-embed-text-v2:0",
            "input": "hello",
            "normalize": true,
            "force_s3_data": false,
        }))
        .unwrap();
        assert_eq!(request.extra.get("normalize"), Some(&Value::Bool(true)));
        assert!(request.dimensions.is_none());
    }

    #[test]
    fn embedding_response_serializes_openai_shape() {
        let response = EmbeddingResponse {
            object: "list".to_string(),
            data: vec![EmbeddingRow {
                object: "embedding".to_string(),
                index: 0,
                embedding: EmbeddingValue::Float(vec![0.5, -0.5]),
            }],
            model: "cohere.embed-v4:0".to_string(),
            usage: EmbeddingUsage {
                prompt_tokens: 3,
                total_tokens: 3,
            },
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["object"], "list");
        assert_eq!(value["data"][0]["object"], "embedding");
        assert_eq!(value["data"][0]["index"], 0);
        assert_eq!(value["usage"]["prompt_tokens"], 3);
    }

    #[test]
    fn image_request_defaults() {
        let request: ImageGenerationRequest = serde_json::from_value(serde_json::json!({
            "model": "amazon.nova-canvas-v1:0",
            "prompt": "a fox",
        }))
        .unwrap();
        assert_eq!(request.n, 1);
        assert_eq!(request.output_compression, 100);
        assert!(request.response_format.is_none());
    }

    #[test]
    fn audio_format_parses_snake_case() {
        let format: AudioResponseFormat = serde_json::from_str("\"verbose_json\"").unwrap();
        assert_eq!(format, AudioResponseFormat::VerboseJson);
    }
}
