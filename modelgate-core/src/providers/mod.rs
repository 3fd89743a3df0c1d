//! Provider adapters
//!
//! One adapter per backend family translates between the normalized request
//! and the provider's native JSON schema. Adapters are a closed set resolved
//! from the capability registry; there is no runtime reflection over field
//! names. Each adapter enforces provider policy while building calls and
//! fails fast, before any network traffic, when the policy is violated.

pub mod cohere;
pub mod error;
pub mod marengo;
pub mod nova;
pub mod nova_canvas;
pub mod stability;
pub mod titan;
pub mod titan_image;
pub mod translation;

pub use error::{ProviderError, ProviderResult};

use crate::imaging::ImageFormat;
use crate::media::ResolvedInput;
use crate::registry::{Capability, DimensionSupport, ProviderKind};
use serde_json::{Map, Value};

/// Which input items a provider call draws from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSource {
    /// A single input item
    Item(usize),
    /// An ordered batch; response rows align with this order
    Batch(Vec<usize>),
    /// A text+image pair combined into one joint embedding
    Pair { text: usize, image: usize },
    /// A generated output slot (image generation)
    Slot(usize),
}

/// One native provider invocation
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub model_id: String,
    pub body: Value,
    pub source: CallSource,
}

/// Payload of one normalized output row
#[derive(Debug, Clone, PartialEq)]
pub enum RowPayload {
    Vector(Vec<f32>),
    ImageB64(String),
    Text(String),
}

/// One provider-agnostic output row, ordered by `(source_index, sequence)`
///
/// `sequence` numbers intra-item segments (e.g. one row per detected video
/// segment) so the assembler never conflates them with sibling items.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub source_index: usize,
    pub sequence: usize,
    pub payload: RowPayload,
}

impl NormalizedRow {
    pub fn vector(source_index: usize, sequence: usize, vector: Vec<f32>) -> Self {
        Self {
            source_index,
            sequence,
            payload: RowPayload::Vector(vector),
        }
    }

    pub fn image(source_index: usize, b64: impl Into<String>) -> Self {
        Self {
            source_index,
            sequence: 0,
            payload: RowPayload::ImageB64(b64.into()),
        }
    }
}

/// Parsed embedding response rows plus provider-reported token counts
#[derive(Debug, Clone, Default)]
pub struct ParsedEmbeddings {
    pub rows: Vec<NormalizedRow>,
    pub input_tokens: u32,
}

/// Inputs to embedding call planning
#[derive(Debug)]
pub struct EmbedPlan<'a> {
    pub model_id: &'a str,
    pub capability: &'a Capability,
    pub inputs: &'a [ResolvedInput],
    pub dimensions: Option<u32>,
    /// Provider-specific parameters, forwarded verbatim
    pub extra: &'a Map<String, Value>,
}

/// Embedding adapter interface
pub trait EmbeddingAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Translate the normalized request into native calls, enforcing
    /// provider policy without touching the network.
    fn plan(&self, plan: &EmbedPlan<'_>) -> ProviderResult<Vec<ProviderCall>>;

    /// Translate one native response back into normalized rows.
    fn parse(&self, call: &ProviderCall, body: Value) -> ProviderResult<ParsedEmbeddings>;
}

/// Inputs to image-generation call planning
#[derive(Debug)]
pub struct ImagePlan<'a> {
    pub model_id: &'a str,
    pub capability: &'a Capability,
    pub prompt: &'a str,
    pub count: u32,
    pub width: u32,
    pub height: u32,
    /// Normalized quality level (`low`, `medium`, `high`) or raw passthrough
    pub quality: Option<&'a str>,
    pub style: Option<&'a str>,
    /// Requested output container, when the caller asked for one
    pub output_format: Option<ImageFormat>,
    pub extra: &'a Map<String, Value>,
}

/// Image-generation adapter interface
pub trait ImageAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn plan(&self, plan: &ImagePlan<'_>) -> ProviderResult<Vec<ProviderCall>>;

    fn parse(&self, call: &ProviderCall, body: Value) -> ProviderResult<Vec<NormalizedRow>>;

    /// Container the provider emits for this plan, before any conversion.
    fn native_format(&self, plan: &ImagePlan<'_>) -> ImageFormat;
}

/// Resolve the embedding adapter for a provider family.
pub fn embedding_adapter(kind: ProviderKind) -> Option<Box<dyn EmbeddingAdapter>> {
    match kind {
        ProviderKind::TitanEmbed => Some(Box::new(titan::TitanEmbedding)),
        ProviderKind::CohereEmbed => Some(Box::new(cohere::CohereEmbedding)),
        ProviderKind::MarengoEmbed => Some(Box::new(marengo::MarengoEmbedding)),
        ProviderKind::NovaEmbed => Some(Box::new(nova::NovaEmbedding)),
        _ => None,
    }
}

/// Resolve the image adapter for a provider family.
pub fn image_adapter(kind: ProviderKind) -> Option<Box<dyn ImageAdapter>> {
    match kind {
        ProviderKind::TitanImage => Some(Box::new(titan_image::TitanImageGenerator)),
        ProviderKind::NovaCanvas => Some(Box::new(nova_canvas::NovaCanvas)),
        ProviderKind::Stability => Some(Box::new(stability::StabilityImage)),
        _ => None,
    }
}

/// Enforce the model's dimension policy before dispatch.
pub fn validate_dimensions(capability: &Capability, dimensions: Option<u32>) -> ProviderResult<()> {
    let Some(requested) = dimensions else {
        return Ok(());
    };
    match capability.dimensions {
        DimensionSupport::None => Err(ProviderError::invalid_param(
            "dimensions",
            "The 'dimensions' option is not supported by this model.",
        )),
        DimensionSupport::FixedSet(values) if !values.contains(&requested) => {
            Err(ProviderError::invalid_param(
                "dimensions",
                format!(
                    "Invalid 'dimensions' value {requested}. Supported values: {}.",
                    values
                        .iter()
                        .map(u32::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ))
        }
        DimensionSupport::Arbitrary if requested == 0 => Err(ProviderError::invalid_param(
            "dimensions",
            "'dimensions' must be a positive integer.",
        )),
        _ => Ok(()),
    }
}

/// Reject inputs whose modality the model does not accept.
pub fn validate_modalities(
    capability: &Capability,
    inputs: &[ResolvedInput],
) -> ProviderResult<()> {
    for input in inputs {
        let modality = input.modality();
        if !capability.supports_input(modality) {
            return Err(ProviderError::invalid(format!(
                "{modality} inputs are not supported by this model. Supported modalities: {}.",
                capability
                    .modalities
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    }
    Ok(())
}

/// Reject truncate-style extras on models without truncate support.
pub fn validate_truncate(capability: &Capability, extra: &Map<String, Value>) -> ProviderResult<()> {
    for key in ["truncate", "textTruncate"] {
        if extra.contains_key(key) && !capability.supports_truncate {
            return Err(ProviderError::invalid_param(
                key,
                format!("The '{key}' option is not supported by this model."),
            ));
        }
    }
    Ok(())
}

/// Read a float vector out of a native response array.
pub fn vector_from_value(value: &Value) -> ProviderResult<Vec<f32>> {
    value
        .as_array()
        .ok_or_else(|| ProviderError::Parse("embedding is not an array".to_string()))?
        .iter()
        .map(|entry| {
            entry
                .as_f64()
                .map(|float| float as f32)
                .ok_or_else(|| ProviderError::Parse("embedding entry is not a number".to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CapabilityRegistry;

    #[test]
    fn dimension_policy_fails_fast() {
        let registry = CapabilityRegistry::builtin();
        let none = registry.lookup("amazon.titan-embed-text-v1").unwrap();
        let fixed = registry.lookup("amazon.titan-embed-text-v2:0").unwrap();
        let arbitrary = registry.lookup("cohere.embed-v4:0").unwrap();

        assert!(validate_dimensions(none, None).is_ok());
        assert!(validate_dimensions(none, Some(256)).is_err());
        assert!(validate_dimensions(fixed, Some(256)).is_ok());
        assert!(validate_dimensions(fixed, Some(300)).is_err());
        assert!(validate_dimensions(arbitrary, Some(7)).is_ok());
        assert!(validate_dimensions(arbitrary, Some(0)).is_err());
    }

    #[test]
    fn vector_parsing_rejects_non_numbers() {
        let good = serde_json::json!([0.25, -1.0, 2]);
        assert_eq!(vector_from_value(&good).unwrap(), vec![0.25, -1.0, 2.0]);
        let bad = serde_json::json!(["a"]);
        assert!(vector_from_value(&bad).is_err());
    }
}
