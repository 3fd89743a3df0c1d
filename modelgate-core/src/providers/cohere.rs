//! Cohere embedding adapter
//!
//! Serves `cohere.embed-english-v3`, `cohere.embed-multilingual-v3` and
//! `cohere.embed-v4:0`. A whole batch maps to one native call: text batches
//! use `texts`, image batches use `images` (with `input_type: "image"` on
//! v3), and mixed batches use the v4 structured `inputs` list. Only v4
//! supports an explicit `output_dimension`, which is validated against the
//! returned vector length.

use crate::media::{MediaPayload, ResolvedItem, ResolvedMedia};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::{
    validate_dimensions, validate_modalities, validate_truncate, vector_from_value, CallSource,
    EmbedPlan, EmbeddingAdapter, NormalizedRow, ParsedEmbeddings, ProviderCall,
};
use serde_json::{json, Map, Value};

pub struct CohereEmbedding;

fn data_uri(media: &ResolvedMedia) -> ProviderResult<String> {
    match &media.payload {
        MediaPayload::Inline(base64) => Ok(format!("data:{};base64,{base64}", media.mime)),
        MediaPayload::Stored(reference) => Err(ProviderError::invalid(format!(
            "Storage references are not supported by this model: {reference}"
        ))),
    }
}

impl EmbeddingAdapter for CohereEmbedding {
    fn name(&self) -> &'static str {
        "cohere-embed"
    }

    fn plan(&self, plan: &EmbedPlan<'_>) -> ProviderResult<Vec<ProviderCall>> {
        validate_dimensions(plan.capability, plan.dimensions)?;
        validate_truncate(plan.capability, plan.extra)?;
        validate_modalities(plan.capability, plan.inputs)?;

        let mut body = Map::new();
        body.insert("input_type".to_string(), json!("search_document"));
        for (key, value) in plan.extra {
            body.insert(key.clone(), value.clone());
        }
        if let Some(dimensions) = plan.dimensions {
            body.insert("output_dimension".to_string(), json!(dimensions));
        }

        let is_v3 = plan.model_id.ends_with("v3");
        let media_flags: Vec<bool> = plan
            .inputs
            .iter()
            .map(|input| matches!(input.item, ResolvedItem::Media(_)))
            .collect();

        if media_flags.iter().all(|flag| *flag) {
            let images = plan
                .inputs
                .iter()
                .map(|input| match &input.item {
                    ResolvedItem::Media(media) => data_uri(media),
                    ResolvedItem::Text(_) => {
                        Err(ProviderError::Parse("expected a media item".to_string()))
                    }
                })
                .collect::<ProviderResult<Vec<_>>>()?;
            body.insert("images".to_string(), json!(images));
            if is_v3 {
                body.insert("input_type".to_string(), json!("image"));
            }
        } else if media_flags.iter().any(|flag| *flag) {
            // Mixed text+image batch: v4 structured inputs, one content
            // entry per item.
            let inputs = plan
                .inputs
                .iter()
                .map(|input| {
                    Ok(match &input.item {
                        ResolvedItem::Media(media) => json!({
                            "content": [{
                                "type": "image_url",
                                "image_url": { "url": data_uri(media)? },
                            }]
                        }),
                        ResolvedItem::Text(text) => json!({
                            "content": [{ "type": "text", "text": text }]
                        }),
                    })
                })
                .collect::<ProviderResult<Vec<_>>>()?;
            body.insert("inputs".to_string(), json!(inputs));
        } else {
            let texts: Vec<&str> = plan
                .inputs
                .iter()
                .filter_map(|input| match &input.item {
                    ResolvedItem::Text(text) => Some(text.as_str()),
                    ResolvedItem::Media(_) => None,
                })
                .collect();
            body.insert("texts".to_string(), json!(texts));
        }

        Ok(vec![ProviderCall {
            model_id: plan.model_id.to_string(),
            body: Value::Object(body),
            source: CallSource::Batch(plan.inputs.iter().map(|input| input.index).collect()),
        }])
    }

    fn parse(&self, call: &ProviderCall, body: Value) -> ProviderResult<ParsedEmbeddings> {
        let embeddings = body
            .get("embeddings")
            .ok_or_else(|| ProviderError::Parse("missing 'embeddings' field".to_string()))?;
        // v4 keys embeddings by type when embedding_types is requested.
        let list = match embeddings {
            Value::Object(map) => map
                .get("float")
                .and_then(Value::as_array)
                .ok_or_else(|| ProviderError::Parse("missing float embeddings".to_string()))?,
            Value::Array(list) => list,
            _ => return Err(ProviderError::Parse("unexpected embeddings shape".to_string())),
        };

        let CallSource::Batch(indices) = &call.source else {
            return Err(ProviderError::Parse(format!(
                "unexpected call source: {:?}",
                call.source
            )));
        };
        if list.len() != indices.len() {
            return Err(ProviderError::Parse(format!(
                "expected {} embeddings, provider returned {}",
                indices.len(),
                list.len()
            )));
        }

        let requested_dimension = call
            .body
            .get("output_dimension")
            .and_then(Value::as_u64)
            .map(|value| value as usize);

        let mut rows = Vec::with_capacity(list.len());
        for (position, entry) in list.iter().enumerate() {
            let vector = vector_from_value(entry)?;
            if let Some(expected) = requested_dimension {
                if vector.len() != expected {
                    return Err(ProviderError::Parse(format!(
                        "provider returned a vector of length {}, expected {expected}",
                        vector.len()
                    )));
                }
            }
            rows.push(NormalizedRow::vector(indices[position], 0, vector));
        }
        Ok(ParsedEmbeddings {
            rows,
            input_tokens: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaResolver, ResolvedInput};
    use crate::registry::CapabilityRegistry;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==";

    async fn resolve(values: &[&str]) -> Vec<ResolvedInput> {
        let resolver = MediaResolver::default();
        let mut inputs = Vec::new();
        for (index, value) in values.iter().enumerate() {
            inputs.push(resolver.resolve(index, value, false, None, "req").await.unwrap());
        }
        inputs
    }

    fn plan_for<'a>(
        model_id: &'a str,
        capability: &'a crate::registry::Capability,
        inputs: &'a [ResolvedInput],
        dimensions: Option<u32>,
        extra: &'a Map<String, Value>,
    ) -> EmbedPlan<'a> {
        EmbedPlan {
            model_id,
            capability,
            inputs,
            dimensions,
            extra,
        }
    }

    #[tokio::test]
    async fn text_batch_is_one_call() {
        let registry = CapabilityRegistry::builtin();
        let capability = registry.lookup("cohere.embed-v4:0").unwrap();
        let inputs = resolve(&["first", "second", "third"]).await;
        let extra = Map::new();
        let calls = CohereEmbedding
            .plan(&plan_for("cohere.embed-v4:0", capability, &inputs, None, &extra))
            .unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].body["texts"], json!(["first", "second", "third"]));
        assert_eq!(calls[0].body["input_type"], "search_document");
    }

    #[tokio::test]
    async fn image_batch_on_v3_switches_input_type() {
        let registry = CapabilityRegistry::builtin();
        let capability = registry.lookup("cohere.embed-english-v3").unwrap();
        let inputs = resolve(&[PNG_URI, PNG_URI]).await;
        let extra = Map::new();
        let calls = CohereEmbedding
            .plan(&plan_for(
                "cohere.embed-english-v3",
                capability,
                &inputs,
                None,
                &extra,
            ))
            .unwrap();
        assert_eq!(calls[0].body["input_type"], "image");
        assert_eq!(calls[0].body["images"].as_array().unwrap().len(), 2);
        assert!(calls[0].body["images"][0]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn mixed_batch_uses_structured_inputs() {
        let registry = CapabilityRegistry::builtin();
        let capability = registry.lookup("cohere.embed-v4:0").unwrap();
        let inputs = resolve(&["a caption", PNG_URI]).await;
        let extra = Map::new();
        let calls = CohereEmbedding
            .plan(&plan_for("cohere.embed-v4:0", capability, &inputs, None, &extra))
            .unwrap();
        let structured = calls[0].body["inputs"].as_array().unwrap();
        assert_eq!(structured.len(), 2);
        assert_eq!(structured[0]["content"][0]["type"], "text");
        assert_eq!(structured[1]["content"][0]["type"], "image_url");
    }

    #[tokio::test]
    async fn truncate_passes_through_and_dimensions_forwarded() {
        let registry = CapabilityRegistry::builtin();
        let capability = registry.lookup("cohere.embed-v4:0").unwrap();
        let inputs = resolve(&["hello"]).await;
        let mut extra = Map::new();
        extra.insert("truncate".to_string(), json!("LEFT"));
        let calls = CohereEmbedding
            .plan(&plan_for(
                "cohere.embed-v4:0",
                capability,
                &inputs,
                Some(512),
                &extra,
            ))
            .unwrap();
        assert_eq!(calls[0].body["truncate"], "LEFT");
        assert_eq!(calls[0].body["output_dimension"], 512);
    }

    #[tokio::test]
    async fn dimensions_rejected_on_v3() {
        let registry = CapabilityRegistry::builtin();
        let capability = registry.lookup("cohere.embed-english-v3").unwrap();
        let inputs = resolve(&["hello"]).await;
        let extra = Map::new();
        let err = CohereEmbedding
            .plan(&plan_for(
                "cohere.embed-english-v3",
                capability,
                &inputs,
                Some(512),
                &extra,
            ))
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput { .. }));
    }

    #[test]
    fn parse_aligns_rows_with_batch_order() {
        let call = ProviderCall {
            model_id: "cohere.embed-v4:0".to_string(),
            body: json!({}),
            source: CallSource::Batch(vec![0, 1]),
        };
        let parsed = CohereEmbedding
            .parse(&call, json!({"embeddings": [[0.1], [0.2]]}))
            .unwrap();
        assert_eq!(parsed.rows[0].source_index, 0);
        assert_eq!(parsed.rows[1].source_index, 1);
    }

    #[test]
    fn parse_accepts_keyed_embeddings_and_validates_length() {
        let call = ProviderCall {
            model_id: "cohere.embed-v4:0".to_string(),
            body: json!({"output_dimension": 2}),
            source: CallSource::Batch(vec![0]),
        };
        let parsed = CohereEmbedding
            .parse(&call, json!({"embeddings": {"float": [[0.1, 0.2]]}}))
            .unwrap();
        assert_eq!(parsed.rows.len(), 1);

        let err = CohereEmbedding
            .parse(&call, json!({"embeddings": {"float": [[0.1, 0.2, 0.3]]}}))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }
}
