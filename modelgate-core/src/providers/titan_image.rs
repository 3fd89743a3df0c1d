//! Amazon Titan Image Generator adapter
//!
//! Serves `amazon.titan-image-generator-v1` and `-v2:0`. One call generates
//! the whole batch (`numberOfImages`); the native output container is PNG.
//! The `style` parameter is not part of this family's API and is rejected
//! before dispatch.

use crate::imaging::ImageFormat;
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::{
    CallSource, ImageAdapter, ImagePlan, NormalizedRow, ProviderCall,
};
use rand::Rng;
use serde_json::{json, Map, Value};

pub struct TitanImageGenerator;

/// Native quality levels of the Amazon image generators
pub const AMZ_QUALITY_STANDARD: &str = "standard";
pub const AMZ_QUALITY_PREMIUM: &str = "premium";

/// Map an OpenAI quality level onto the Amazon two-level scale.
///
/// Unknown values pass through unaltered; the backend validates the final
/// value.
pub fn amz_quality(quality: Option<&str>) -> Option<String> {
    let quality = quality?.to_ascii_lowercase();
    Some(match quality.as_str() {
        "low" | "medium" => AMZ_QUALITY_STANDARD.to_string(),
        "high" => AMZ_QUALITY_PREMIUM.to_string(),
        other => other.to_string(),
    })
}

/// Quality level reported back to the caller for a native quality.
pub fn reported_quality(native: Option<&str>) -> &'static str {
    match native {
        Some(AMZ_QUALITY_PREMIUM) => "high",
        _ => "medium",
    }
}

/// Seed within the backend's accepted range.
pub fn random_seed() -> u32 {
    rand::thread_rng().gen_range(0..2_147_483_646)
}

/// Shared body builder for the Amazon `TEXT_IMAGE` task shape.
pub(crate) fn text_image_body(plan: &ImagePlan<'_>) -> Map<String, Value> {
    let mut config = Map::new();
    config.insert("width".to_string(), json!(plan.width));
    config.insert("height".to_string(), json!(plan.height));
    config.insert("numberOfImages".to_string(), json!(plan.count));
    config.insert("seed".to_string(), json!(random_seed()));
    if let Some(quality) = amz_quality(plan.quality) {
        config.insert("quality".to_string(), json!(quality));
    }

    let mut text_params = Map::new();
    text_params.insert("text".to_string(), json!(plan.prompt));

    // Caller-supplied sub-maps merge into the native structures verbatim.
    if let Some(Value::Object(overrides)) = plan.extra.get("textToImageParams") {
        for (key, value) in overrides {
            text_params.insert(key.clone(), value.clone());
        }
    }
    if let Some(Value::Object(overrides)) = plan.extra.get("imageGenerationConfig") {
        for (key, value) in overrides {
            config.insert(key.clone(), value.clone());
        }
    }

    let mut body = Map::new();
    body.insert("taskType".to_string(), json!("TEXT_IMAGE"));
    body.insert("textToImageParams".to_string(), Value::Object(text_params));
    body.insert("imageGenerationConfig".to_string(), Value::Object(config));
    body
}

/// Parse an Amazon `{"images": [...]}` response into slot-indexed rows.
pub(crate) fn parse_images_array(
    call: &ProviderCall,
    body: &Value,
) -> ProviderResult<Vec<NormalizedRow>> {
    let images = body
        .get("images")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse("missing 'images' field".to_string()))?;
    let CallSource::Batch(slots) = &call.source else {
        return Err(ProviderError::Parse(format!(
            "unexpected call source: {:?}",
            call.source
        )));
    };
    if images.len() != slots.len() {
        return Err(ProviderError::Parse(format!(
            "expected {} images, provider returned {}",
            slots.len(),
            images.len()
        )));
    }
    images
        .iter()
        .zip(slots)
        .map(|(image, slot)| {
            let b64 = image
                .as_str()
                .ok_or_else(|| ProviderError::Parse("image entry is not a string".to_string()))?;
            Ok(NormalizedRow::image(*slot, b64))
        })
        .collect()
}

impl ImageAdapter for TitanImageGenerator {
    fn name(&self) -> &'static str {
        "titan-image"
    }

    fn plan(&self, plan: &ImagePlan<'_>) -> ProviderResult<Vec<ProviderCall>> {
        if plan.style.is_some() && !plan.capability.supports_style {
            return Err(ProviderError::invalid_param(
                "style",
                "\"style\" parameter is not supported by this model.",
            ));
        }
        let body = text_image_body(plan);
        Ok(vec![ProviderCall {
            model_id: plan.model_id.to_string(),
            body: Value::Object(body),
            source: CallSource::Batch((0..plan.count as usize).collect()),
        }])
    }

    fn parse(&self, call: &ProviderCall, body: Value) -> ProviderResult<Vec<NormalizedRow>> {
        parse_images_array(call, &body)
    }

    fn native_format(&self, _plan: &ImagePlan<'_>) -> ImageFormat {
        ImageFormat::Png
    }
}
