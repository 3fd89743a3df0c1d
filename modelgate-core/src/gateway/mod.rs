//! Gateway orchestration
//!
//! One `Gateway` instance owns the capability registry, the media resolver
//! and the backend seams, and exposes one entry point per supported surface.
//! Control flow is the same everywhere: registry lookup, media resolution,
//! adapter planning, concurrent dispatch, parse, assemble. Failures at any
//! stage funnel through the error translator so the caller always sees the
//! uniform error shape. Nothing here retries: one upstream failure fails
//! the whole batch rather than returning ambiguous partial results.

use crate::assemble::{embeddings_response, order_rows};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::client::{HttpClient, HttpInvokeClient};
use crate::http::{InvokeClient, RequestOptions};
use crate::imaging::{self, ImageFormat};
use crate::media::{MediaResolver, ResolvedInput, ResolvedItem};
use crate::protocol::types::{
    AudioResponseFormat, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage,
    ImageGenerationRequest, ImageResponseFormat, ImageRow, ImageUsage, ImagesResponse,
    TranslationJson, TranslationRequest, TranslationResponse, TranslationSegmentVerbose,
    TranslationVerbose,
};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::translation::{
    translate_if_needed, validate_audio_upload, HttpTranscriber, HttpTranslator, TextTranslator,
    Transcriber,
};
use crate::providers::{
    embedding_adapter, image_adapter, EmbedPlan, ImagePlan, NormalizedRow, ProviderCall,
    RowPayload,
};
use crate::providers::titan_image::{amz_quality, reported_quality};
use crate::registry::{CapabilityRegistry, ProviderKind};
use crate::storage::ObjectStore;
use crate::subtitle::SubtitleFormat;
use crate::tokens::estimate_tokens;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use uuid::Uuid;

/// Uniform OpenAI quality levels; `auto` defers to the model default.
fn normalize_quality(quality: Option<&str>) -> Option<String> {
    match quality {
        None => None,
        Some("auto") => None,
        Some("standard") => Some("medium".to_string()),
        Some("hd") => Some("high".to_string()),
        Some(other) => Some(other.to_string()),
    }
}

/// Loose truthiness for the `force_s3_data` extra parameter, which callers
/// send as a bool, number or string.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// The gateway core: provider adapter and normalization layer
pub struct Gateway {
    registry: CapabilityRegistry,
    config: GatewayConfig,
    resolver: MediaResolver,
    invoker: Arc<dyn InvokeClient>,
    store: Arc<dyn ObjectStore>,
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn TextTranslator>,
}

impl Gateway {
    pub fn new(
        config: GatewayConfig,
        invoker: Arc<dyn InvokeClient>,
        store: Arc<dyn ObjectStore>,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn TextTranslator>,
    ) -> Self {
        let resolver = MediaResolver::new(
            config.media.inline_limit_bytes,
            config.media.text_inline_limit_chars,
        );
        Self {
            registry: CapabilityRegistry::builtin(),
            config,
            resolver,
            invoker,
            store,
            transcriber,
            translator,
        }
    }

    /// Build a gateway speaking HTTP to the configured backends.
    pub fn from_config(
        config: GatewayConfig,
        store: Arc<dyn ObjectStore>,
    ) -> ProviderResult<Self> {
        let http = HttpClient::with_config(
            Duration::from_secs(config.timeouts.connect_secs),
            Duration::from_secs(config.timeouts.request_secs),
            10,
        )?;
        let options = RequestOptions::new(Duration::from_secs(config.timeouts.request_secs));
        let invoker = Arc::new(HttpInvokeClient::new(
            http.clone(),
            config.endpoints.model_api.base_url.clone(),
        ));
        let transcriber = Arc::new(HttpTranscriber::new(
            http.clone(),
            config.endpoints.transcribe.base_url.clone(),
            options.clone(),
        ));
        let translator = Arc::new(HttpTranslator::new(
            http,
            config.endpoints.translate.base_url.clone(),
            options,
        ));
        Ok(Self::new(config, invoker, store, transcriber, translator))
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    fn invoke_options(&self) -> RequestOptions {
        RequestOptions::new(Duration::from_secs(self.config.timeouts.invoke_secs))
    }

    async fn dispatch(
        &self,
        calls: &[ProviderCall],
        options: &RequestOptions,
    ) -> ProviderResult<Vec<Value>> {
        // Per-item calls run concurrently; the join preserves call order so
        // result alignment never depends on completion order.
        try_join_all(
            calls
                .iter()
                .map(|call| self.invoker.invoke(&call.model_id, &call.body, options)),
        )
        .await
    }

    /// Create embeddings for the provided inputs.
    pub async fn embeddings(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, GatewayError> {
        let request_id = Uuid::new_v4();
        info!(model = %request.model, %request_id, "embeddings request");
        if let Some(user) = &request.user {
            debug!(%request_id, user = %user, "request user");
        }

        let capability = self
            .registry
            .lookup(&request.model)
            .filter(|capability| {
                embedding_adapter(capability.provider).is_some()
            })
            .ok_or_else(|| ProviderError::ModelNotFound {
                model: request.model.clone(),
            })?;
        let adapter = embedding_adapter(capability.provider)
            .ok_or_else(|| ProviderError::ModelNotFound {
                model: request.model.clone(),
            })?;

        let items = request.input.into_items();
        if items.is_empty() {
            return Err(ProviderError::invalid_param("input", "'input' must not be empty.").into());
        }

        let mut extra = self
            .config
            .merged_extra_params(&request.model, &request.extra);
        let force_offload = extra
            .remove("force_s3_data")
            .map(|value| is_truthy(&value))
            .unwrap_or(false);
        let offload = matches!(
            capability.provider,
            ProviderKind::MarengoEmbed | ProviderKind::NovaEmbed
        )
        .then_some(self.store.as_ref());

        let key_prefix = request_id.to_string();
        let inputs: Vec<ResolvedInput> = try_join_all(items.iter().enumerate().map(
            |(index, value)| {
                self.resolver
                    .resolve(index, value, force_offload, offload, &key_prefix)
            },
        ))
        .await?;

        let plan = EmbedPlan {
            model_id: &request.model,
            capability,
            inputs: &inputs,
            dimensions: request.dimensions,
            extra: &extra,
        };
        let calls = adapter.plan(&plan)?;
        debug!(%request_id, calls = calls.len(), adapter = adapter.name(), "dispatching");

        let options = self.invoke_options();
        let responses = self.dispatch(&calls, &options).await?;

        let mut rows = Vec::new();
        let mut provider_tokens = 0u32;
        for (call, response) in calls.iter().zip(responses) {
            let parsed = adapter.parse(call, response)?;
            provider_tokens += parsed.input_tokens;
            rows.extend(parsed.rows);
        }

        let prompt_tokens = if provider_tokens > 0 {
            provider_tokens
        } else {
            estimate_tokens(inputs.iter().filter_map(|input| match &input.item {
                ResolvedItem::Text(text) => Some(text.as_str()),
                ResolvedItem::Media(_) => None,
            }))
        };
        let usage = EmbeddingUsage {
            prompt_tokens,
            total_tokens: prompt_tokens,
        };

        let response = embeddings_response(
            &request.model,
            rows,
            request.encoding_format.unwrap_or_default(),
            usage,
        )?;
        info!(%request_id, rows = response.data.len(), "embeddings complete");
        Ok(response)
    }

    /// Generate images from a text prompt.
    pub async fn images(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImagesResponse, GatewayError> {
        let request_id = Uuid::new_v4();
        info!(model = %request.model, %request_id, "image generation request");

        // This surface reports an unknown model as a plain client error
        // with the offending parameter, not as a 404.
        let capability = self
            .registry
            .lookup(&request.model)
            .filter(|capability| image_adapter(capability.provider).is_some())
            .ok_or_else(|| {
                ProviderError::invalid_param(
                    "model",
                    format!(
                        "The model `{}` does not exist or you do not have access to it.",
                        request.model
                    ),
                )
            })?;
        let adapter = image_adapter(capability.provider).ok_or_else(|| {
            ProviderError::invalid_param("model", "Not an image generation model.")
        })?;

        if request.prompt.trim().is_empty() {
            return Err(ProviderError::invalid_param("prompt", "'prompt' must not be empty.").into());
        }
        if request.n == 0 || request.n > 10 {
            return Err(ProviderError::invalid_param(
                "n",
                "'n' must be between 1 and 10.",
            )
            .into());
        }

        let size = request.size.as_deref().unwrap_or("1024x1024");
        let (width, height) = size
            .split_once('x')
            .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
            .ok_or_else(|| {
                ProviderError::invalid_param(
                    "size",
                    format!("Invalid 'size' value '{size}'. Expected WIDTHxHEIGHT."),
                )
            })?;

        let quality = normalize_quality(request.quality.as_deref());
        let requested_format = request
            .output_format
            .as_deref()
            .map(ImageFormat::parse)
            .transpose()?;
        let extra = self
            .config
            .merged_extra_params(&request.model, &request.extra);

        let plan = ImagePlan {
            model_id: &request.model,
            capability,
            prompt: &request.prompt,
            count: request.n,
            width,
            height,
            quality: quality.as_deref(),
            style: request.style.as_deref(),
            output_format: requested_format,
            extra: &extra,
        };
        let calls = adapter.plan(&plan)?;
        debug!(%request_id, calls = calls.len(), adapter = adapter.name(), "dispatching");

        let options = self.invoke_options();
        let responses = self.dispatch(&calls, &options).await?;

        let mut rows: Vec<NormalizedRow> = Vec::new();
        for (call, response) in calls.iter().zip(responses) {
            rows.extend(adapter.parse(call, response)?);
        }
        let rows = order_rows(rows);

        let native_format = adapter.native_format(&plan);
        let final_format = requested_format.unwrap_or(native_format);

        let mut images: Vec<String> = Vec::with_capacity(rows.len());
        let mut measured: Option<(u32, u32)> = None;
        for row in rows {
            let RowPayload::ImageB64(b64) = row.payload else {
                return Err(ProviderError::Parse(
                    "non-image row in image response".to_string(),
                )
                .into());
            };
            if final_format != native_format {
                let (converted, image_width, image_height) =
                    imaging::convert_base64(&b64, final_format, request.output_compression)?;
                measured.get_or_insert((image_width, image_height));
                images.push(converted);
            } else {
                if measured.is_none() {
                    measured = imaging::base64_image_size(&b64).ok();
                }
                images.push(b64);
            }
        }

        let response_format = request.response_format.unwrap_or_default();
        let data = match response_format {
            ImageResponseFormat::B64Json => images
                .into_iter()
                .map(|b64| ImageRow {
                    b64_json: Some(b64),
                    url: None,
                })
                .collect(),
            ImageResponseFormat::Url => {
                let uploads = images.into_iter().enumerate().map(|(index, b64)| {
                    let store = Arc::clone(&self.store);
                    let format = final_format;
                    async move {
                        let bytes = BASE64.decode(b64).map_err(|err| {
                            ProviderError::Parse(format!("Invalid base64 image payload: {err}"))
                        })?;
                        let key = format!(
                            "{request_id}/image-{request_id}-{:03}.{}",
                            index + 1,
                            format.extension()
                        );
                        let stored = store.put(bytes, format.mime(), &key).await?;
                        Ok::<ImageRow, ProviderError>(ImageRow {
                            b64_json: None,
                            url: Some(stored.url),
                        })
                    }
                });
                try_join_all(uploads).await?
            }
        };

        let (response_width, response_height) = measured.unwrap_or((width, height));
        let input_tokens = estimate_tokens([request.prompt.as_str()]);
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();

        info!(%request_id, images = data.len(), "image generation complete");
        Ok(ImagesResponse {
            created,
            data,
            output_format: Some(final_format.as_str().to_string()),
            size: Some(format!("{response_width}x{response_height}")),
            quality: Some(
                reported_quality(amz_quality(quality.as_deref()).as_deref()).to_string(),
            ),
            usage: ImageUsage {
                input_tokens,
                output_tokens: request.n,
                total_tokens: input_tokens + request.n,
            },
        })
    }

    /// Translate audio into English.
    pub async fn translations(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationResponse, GatewayError> {
        let request_id = Uuid::new_v4();
        info!(model = %request.model, %request_id, "translation request");

        let capability = self.registry.lookup(&request.model);
        if !capability.is_some_and(|capability| capability.provider == ProviderKind::Translation) {
            return Err(ProviderError::ModelNotFound {
                model: request.model.clone(),
            }
            .into());
        }

        let format = validate_audio_upload(&request.filename, &request.file)?;
        let want_subtitles = matches!(
            request.response_format,
            AudioResponseFormat::Srt | AudioResponseFormat::Vtt
        );

        let transcript = self
            .transcriber
            .transcribe(&request.file, &format, want_subtitles)
            .await?;
        debug!(
            %request_id,
            language = %transcript.language,
            segments = transcript.segments.as_ref().map(Vec::len).unwrap_or(0),
            "transcription complete"
        );

        if want_subtitles {
            let subtitle_format = match request.response_format {
                AudioResponseFormat::Vtt => SubtitleFormat::Vtt,
                _ => SubtitleFormat::Srt,
            };
            let document = crate::subtitle::translate_to_subtitles(
                self.translator.as_ref(),
                subtitle_format,
                transcript.segments.as_deref(),
                &transcript.text,
                &transcript.language,
            )
            .await?;
            return Ok(TranslationResponse::Subtitle(document));
        }

        let text = translate_if_needed(
            self.translator.as_ref(),
            &transcript.text,
            &transcript.language,
        )
        .await?;

        let response = match request.response_format {
            AudioResponseFormat::Text => TranslationResponse::Text(text),
            AudioResponseFormat::VerboseJson => TranslationResponse::Verbose(TranslationVerbose {
                // Translation output is always English.
                language: "english".to_string(),
                duration: transcript.duration,
                text,
                segments: transcript
                    .segments
                    .unwrap_or_default()
                    .into_iter()
                    .map(|segment| TranslationSegmentVerbose {
                        id: segment.index,
                        start: segment.start_time,
                        end: segment.end_time,
                        text: segment.text,
                    })
                    .collect(),
            }),
            _ => TranslationResponse::Json(TranslationJson { text }),
        };
        info!(%request_id, "translation complete");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_matches_forwarding_semantics() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
    }

    #[test]
    fn quality_levels_collapse_to_three() {
        assert_eq!(normalize_quality(Some("standard")).as_deref(), Some("medium"));
        assert_eq!(normalize_quality(Some("hd")).as_deref(), Some("high"));
        assert_eq!(normalize_quality(Some("low")).as_deref(), Some("low"));
        assert_eq!(normalize_quality(Some("auto")), None);
        assert_eq!(normalize_quality(None), None);
    }
}
