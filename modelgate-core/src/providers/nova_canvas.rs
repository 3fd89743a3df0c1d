//! Amazon Nova Canvas image generation adapter
//!
//! Serves `amazon.nova-canvas-v1:0`. Shares the Amazon `TEXT_IMAGE` body
//! shape with the Titan generator but additionally accepts a style preset
//! (upper-cased on the wire). A response carrying an `error` field is a
//! content-policy refusal and surfaces as a client error with the provider's
//! message.

use crate::imaging::ImageFormat;
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::titan_image::{parse_images_array, text_image_body};
use crate::providers::{CallSource, ImageAdapter, ImagePlan, NormalizedRow, ProviderCall};
use serde_json::{json, Value};

pub struct NovaCanvas;

impl ImageAdapter for NovaCanvas {
    fn name(&self) -> &'static str {
        "nova-canvas"
    }

    fn plan(&self, plan: &ImagePlan<'_>) -> ProviderResult<Vec<ProviderCall>> {
        let mut body = text_image_body(plan);
        if let Some(style) = plan.style {
            if let Some(Value::Object(text_params)) = body.get_mut("textToImageParams") {
                text_params.insert("style".to_string(), json!(style.to_ascii_uppercase()));
            }
        }
        Ok(vec![ProviderCall {
            model_id: plan.model_id.to_string(),
            body: Value::Object(body),
            source: CallSource::Batch((0..plan.count as usize).collect()),
        }])
    }

    fn parse(&self, call: &ProviderCall, body: Value) -> ProviderResult<Vec<NormalizedRow>> {
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(ProviderError::invalid(message.to_string()));
        }
        parse_images_array(call, &body)
    }

    fn native_format(&self, _plan: &ImagePlan<'_>) -> ImageFormat {
        ImageFormat::Png
    }
}
