//! Amazon Titan embedding adapter
//!
//! Serves `amazon.titan-embed-text-v1`, `amazon.titan-embed-text-v2:0` and
//! `amazon.titan-embed-image-v1`. Each input item maps to one native call;
//! the multimodal image model additionally supports joint text+image
//! embeddings: a batch of exactly one text and one image collapses into a
//! single call carrying both fields and yields a single result row. That
//! behavior is driven by the capability flag, never inferred from batch
//! shape alone.

use crate::media::{MediaPayload, ResolvedItem};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::{
    validate_dimensions, validate_modalities, validate_truncate, vector_from_value, CallSource,
    EmbedPlan, EmbeddingAdapter, NormalizedRow, ParsedEmbeddings, ProviderCall,
};
use crate::registry::Modality;
use serde_json::{json, Map, Value};

pub struct TitanEmbedding;

const IMAGE_MODEL_PREFIX: &str = "amazon.titan-embed-image-";

impl TitanEmbedding {
    fn base_body(plan: &EmbedPlan<'_>) -> Value {
        let mut body = Map::new();
        for (key, value) in plan.extra {
            body.insert(key.clone(), value.clone());
        }
        if let Some(dimensions) = plan.dimensions {
            if plan.model_id.starts_with(IMAGE_MODEL_PREFIX) {
                body.insert(
                    "embeddingConfig".to_string(),
                    json!({ "outputEmbeddingLength": dimensions }),
                );
            } else {
                body.insert("dimensions".to_string(), json!(dimensions));
            }
        }
        Value::Object(body)
    }

    fn inline_image(item: &ResolvedItem) -> ProviderResult<String> {
        match item {
            ResolvedItem::Media(media) => match &media.payload {
                MediaPayload::Inline(base64) => Ok(base64.clone()),
                MediaPayload::Stored(reference) => Err(ProviderError::invalid(format!(
                    "Storage references are not supported by this model: {reference}"
                ))),
            },
            ResolvedItem::Text(_) => {
                Err(ProviderError::Parse("expected a media item".to_string()))
            }
        }
    }
}

impl EmbeddingAdapter for TitanEmbedding {
    fn name(&self) -> &'static str {
        "titan-embed"
    }

    fn plan(&self, plan: &EmbedPlan<'_>) -> ProviderResult<Vec<ProviderCall>> {
        validate_dimensions(plan.capability, plan.dimensions)?;
        validate_truncate(plan.capability, plan.extra)?;
        validate_modalities(plan.capability, plan.inputs)?;
        let base = Self::base_body(plan);

        // Joint text+image embedding for the multimodal family.
        if plan.capability.auto_combines_text_image && plan.inputs.len() == 2 {
            let text = plan
                .inputs
                .iter()
                .find(|input| input.modality() == Modality::Text);
            let image = plan
                .inputs
                .iter()
                .find(|input| input.modality() == Modality::Image);
            if let (Some(text_input), Some(image_input)) = (text, image) {
                let mut body = base.as_object().cloned().unwrap_or_default();
                if let ResolvedItem::Text(text) = &text_input.item {
                    body.insert("inputText".to_string(), json!(text));
                }
                body.insert(
                    "inputImage".to_string(),
                    json!(Self::inline_image(&image_input.item)?),
                );
                return Ok(vec![ProviderCall {
                    model_id: plan.model_id.to_string(),
                    body: Value::Object(body),
                    source: CallSource::Pair {
                        text: text_input.index,
                        image: image_input.index,
                    },
                }]);
            }
        }

        plan.inputs
            .iter()
            .map(|input| {
                let mut body = base.as_object().cloned().unwrap_or_default();
                match &input.item {
                    ResolvedItem::Text(text) => {
                        body.insert("inputText".to_string(), json!(text));
                    }
                    media => {
                        body.insert("inputImage".to_string(), json!(Self::inline_image(media)?));
                    }
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
        let vector = vector_from_value(
            body.get("embedding")
                .ok_or_else(|| ProviderError::Parse("missing 'embedding' field".to_string()))?,
        )?;
        let input_tokens = body
            .get("inputTextTokenCount")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;
        let source_index = match &call.source {
            CallSource::Item(index) => *index,
            // A combined pair yields exactly one row, anchored at the pair's
            // first position.
            CallSource::Pair { text, image } => (*text).min(*image),
            other => {
                return Err(ProviderError::Parse(format!(
                    "unexpected call source: {other:?}"
                )))
            }
        };
        Ok(ParsedEmbeddings {
            rows: vec![NormalizedRow::vector(source_index, 0, vector)],
            input_tokens,
        })
    }
}
