//! TwelveLabs Marengo embedding adapter
//!
//! Serves the `twelvelabs.marengo-embed-*` family. Every input item maps to
//! one native call with an `inputType` of text, image, video or audio; media
//! travels inline as `mediaSource.base64String` or by reference as
//! `mediaSource.s3Location`. Video and audio responses may carry several
//! `data` entries, one per detected segment; each becomes its own sequenced
//! normalized row.

use crate::media::{MediaPayload, ResolvedItem};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::{
    validate_dimensions, validate_modalities, vector_from_value, CallSource, EmbedPlan,
    EmbeddingAdapter, NormalizedRow, ParsedEmbeddings, ProviderCall,
};
use serde_json::{json, Map, Value};

pub struct MarengoEmbedding;

impl EmbeddingAdapter for MarengoEmbedding {
    fn name(&self) -> &'static str {
        "marengo-embed"
    }

    fn plan(&self, plan: &EmbedPlan<'_>) -> ProviderResult<Vec<ProviderCall>> {
        validate_dimensions(plan.capability, plan.dimensions)?;
        validate_modalities(plan.capability, plan.inputs)?;

        plan.inputs
            .iter()
            .map(|input| {
                let mut body = Map::new();
                match &input.item {
                    ResolvedItem::Text(text) => {
                        body.insert("inputType".to_string(), json!("text"));
                        body.insert("inputText".to_string(), json!(text));
                    }
                    ResolvedItem::Media(media) => {
                        body.insert("inputType".to_string(), json!(media.modality.as_str()));
                        let source = match &media.payload {
                            MediaPayload::Inline(base64) => json!({ "base64String": base64 }),
                            MediaPayload::Stored(reference) => {
                                json!({ "s3Location": { "uri": reference } })
                            }
                        };
                        body.insert("mediaSource".to_string(), source);
                    }
                }
                for (key, value) in plan.extra {
                    body.insert(key.clone(), value.clone());
                }
                Ok(ProviderCall {
                    model_id: plan.model_id.to_string(),
                    body: Value::Object(body),
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
        let data = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("missing 'data' field".to_string()))?;
        if data.is_empty() {
            return Err(ProviderError::Parse(
                "provider returned no embeddings".to_string(),
            ));
        }
        let rows = data
            .iter()
            .enumerate()
            .map(|(sequence, entry)| {
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
