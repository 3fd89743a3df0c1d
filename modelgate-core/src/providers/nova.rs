//! Amazon Nova multimodal embedding adapter
//!
//! Serves `amazon.nova-2-multimodal-embeddings-v1:0`. Each input maps to one
//! `SINGLE_EMBEDDING` call whose parameters are routed by modality; media
//! travels inline as base64 bytes or by storage reference, and an offloaded
//! text payload uses the text `source.s3Location` form. Segmented responses
//! (long audio or video) carry several `embeddings` entries that become
//! sequenced normalized rows.

use crate::media::{MediaPayload, ResolvedItem, ResolvedMedia};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::{
    validate_dimensions, validate_modalities, vector_from_value, CallSource, EmbedPlan,
    EmbeddingAdapter, NormalizedRow, ParsedEmbeddings, ProviderCall,
};
use crate::registry::Modality;
use serde_json::{json, Map, Value};

pub struct NovaEmbedding;

const DEFAULT_EMBEDDING_PURPOSE: &str = "GENERIC_INDEX";
const DEFAULT_TEXT_TRUNCATION_MODE: &str = "END";
const DEFAULT_VIDEO_EMBEDDING_MODE: &str = "AUDIO_VIDEO_COMBINED";

/// Fields callers cannot overwrite through per-media extra parameters.
const RESERVED_MEDIA_PARAMS: &[&str] = &["source", "format", "value"];

fn media_source(media: &ResolvedMedia) -> Value {
    match &media.payload {
        MediaPayload::Inline(base64) => json!({ "bytes": base64 }),
        MediaPayload::Stored(reference) => json!({ "s3Location": { "uri": reference } }),
    }
}

/// Merge caller extras for one media type, keeping reserved fields intact.
fn merge_media_extras(params: &mut Map<String, Value>, extra: &Map<String, Value>, key: &str) {
    if let Some(Value::Object(overrides)) = extra.get(key) {
        for (name, value) in overrides {
            if !RESERVED_MEDIA_PARAMS.contains(&name.as_str()) {
                params.insert(name.clone(), value.clone());
            }
        }
    }
}

impl EmbeddingAdapter for NovaEmbedding {
    fn name(&self) -> &'static str {
        "nova-embed"
    }

    fn plan(&self, plan: &EmbedPlan<'_>) -> ProviderResult<Vec<ProviderCall>> {
        validate_dimensions(plan.capability, plan.dimensions)?;
        validate_modalities(plan.capability, plan.inputs)?;

        let purpose = plan
            .extra
            .get("embeddingPurpose")
            .cloned()
            .unwrap_or_else(|| json!(DEFAULT_EMBEDDING_PURPOSE));

        plan.inputs
            .iter()
            .map(|input| {
                let mut params = Map::new();
                params.insert("embeddingPurpose".to_string(), purpose.clone());
                if let Some(dimensions) = plan.dimensions {
                    params.insert("embeddingDimension".to_string(), json!(dimensions));
                }

                let modality = input.modality();
                let mut media_params = Map::new();
                match &input.item {
                    ResolvedItem::Text(text) => {
                        media_params
                            .insert("truncationMode".to_string(), json!(DEFAULT_TEXT_TRUNCATION_MODE));
                        media_params.insert("value".to_string(), json!(text));
                    }
                    ResolvedItem::Media(media) if modality == Modality::Text => {
                        // Offloaded text travels by reference.
                        media_params
                            .insert("truncationMode".to_string(), json!(DEFAULT_TEXT_TRUNCATION_MODE));
                        media_params.insert("source".to_string(), media_source(media));
                    }
                    ResolvedItem::Media(media) => {
                        media_params.insert("format".to_string(), json!(media.format));
                        media_params.insert("source".to_string(), media_source(media));
                        if modality == Modality::Video {
                            media_params.insert(
                                "embeddingMode".to_string(),
                                json!(DEFAULT_VIDEO_EMBEDDING_MODE),
                            );
                        }
                    }
                }
                merge_media_extras(&mut media_params, plan.extra, modality.as_str());
                params.insert(modality.as_str().to_string(), Value::Object(media_params));

                Ok(ProviderCall {
                    model_id: plan.model_id.to_string(),
                    body: json!({
                        "taskType": "SINGLE_EMBEDDING",
                        "singleEmbeddingParams": Value::Object(params),
                    }),
                    source: CallSource::Item(input.index),
                })
            })
            .collect()
    }

    fn parse(&self, call: &ProviderCall, body: Value) -> ProviderResult<ParsedEmbeddings> {
        let CallSource::Item(source_index) = call.source else {
            return Err(ProviderError::Parse(format!(
                "unexpected call source: {:?}",
                call.source
            )));
        };
        let embeddings = body
            .get("embeddings")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("missing 'embeddings' field".to_string()))?;
        if embeddings.is_empty() {
            return Err(ProviderError::Parse(
                "provider returned no embeddings".to_string(),
            ));
        }
        let rows = embeddings
            .iter()
            .enumerate()
            .map(|(sequence, entry)| {
                if let Some(message) = entry.get("message").and_then(Value::as_str) {
                    if entry.get("status").and_then(Value::as_str) == Some("FAILURE") {
                        return Err(ProviderError::Upstream {
                            status: None,
                            message: message.to_string(),
                        });
                    }
                }
                let vector = vector_from_value(entry.get("embedding").ok_or_else(|| {
                    ProviderError::Parse("missing 'embedding' field".to_string())
                })?)?;
                Ok(NormalizedRow::vector(source_index, sequence, vector))
            })
            .collect::<ProviderResult<Vec<_>>>()?;
        Ok(ParsedEmbeddings {
            rows,
            input_tokens: 0,
        })
    }
}
