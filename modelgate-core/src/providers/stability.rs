//! Stability AI image generation adapter
//!
//! Serves the `stability.*` family (`stable-image-core`, `sd3-5-large`,
//! `stable-image-ultra`). The native API returns one image per call, so a
//! batch of `n` maps to `n` independent calls. Sizing is expressed as the
//! closest supported aspect ratio rather than exact pixels. The `quality`
//! parameter is not part of this family's API and is rejected before
//! dispatch; non-null `finish_reasons` mean the request was filtered.

use crate::imaging::ImageFormat;
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::{CallSource, ImageAdapter, ImagePlan, NormalizedRow, ProviderCall};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

pub struct StabilityImage;

const ASPECT_RATIOS: &[(f64, &str)] = &[
    (16.0 / 9.0, "16:9"),
    (1.0, "1:1"),
    (21.0 / 9.0, "21:9"),
    (2.0 / 3.0, "2:3"),
    (3.0 / 2.0, "3:2"),
    (4.0 / 5.0, "4:5"),
    (5.0 / 4.0, "5:4"),
    (9.0 / 16.0, "9:16"),
    (9.0 / 21.0, "9:21"),
];

/// Closest supported aspect ratio for a pixel size.
fn aspect_ratio(width: u32, height: u32) -> &'static str {
    let ratio = width as f64 / height as f64;
    ASPECT_RATIOS
        .iter()
        .min_by(|(a, _), (b, _)| {
            (a - ratio)
                .abs()
                .partial_cmp(&(b - ratio).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(_, name)| *name)
        .unwrap_or("1:1")
}

impl ImageAdapter for StabilityImage {
    fn name(&self) -> &'static str {
        "stability-image"
    }

    fn plan(&self, plan: &ImagePlan<'_>) -> ProviderResult<Vec<ProviderCall>> {
        if plan.quality.is_some() && !plan.capability.supports_quality {
            return Err(ProviderError::invalid_param(
                "quality",
                "\"quality\" parameter is not supported by this model.",
            ));
        }

        let mut body = Map::new();
        body.insert("prompt".to_string(), json!(plan.prompt));
        body.insert("mode".to_string(), json!("text-to-image"));
        body.insert(
            "aspect_ratio".to_string(),
            json!(aspect_ratio(plan.width, plan.height)),
        );
        for (key, value) in plan.extra {
            body.insert(key.clone(), value.clone());
        }
        if let Some(style) = plan.style {
            body.insert("style_preset".to_string(), json!(style));
        }
        let native = self.native_format(plan);
        if plan.output_format.is_some() {
            body.insert("output_format".to_string(), json!(native.as_str()));
        }

        Ok((0..plan.count as usize)
            .map(|slot| ProviderCall {
                model_id: plan.model_id.to_string(),
                body: Value::Object(body.clone()),
                source: CallSource::Slot(slot),
            })
            .collect())
    }

    fn parse(&self, call: &ProviderCall, body: Value) -> ProviderResult<Vec<NormalizedRow>> {
        let CallSource::Slot(slot) = call.source else {
            return Err(ProviderError::Parse(format!(
                "unexpected call source: {:?}",
                call.source
            )));
        };
        if let Some(reasons) = body.get("finish_reasons").and_then(Value::as_array) {
            let filtered: BTreeSet<&str> = reasons
                .iter()
                .filter_map(Value::as_str)
                .filter(|reason| !reason.is_empty())
                .collect();
            if !filtered.is_empty() {
                return Err(ProviderError::invalid(format!(
                    "Request was filtered: {}",
                    filtered.into_iter().collect::<Vec<_>>().join(", ")
                )));
            }
        }
        let image = body
            .get("images")
            .and_then(Value::as_array)
            .and_then(|images| images.first())
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Parse("missing 'images' field".to_string()))?;
        Ok(vec![NormalizedRow::image(slot, image)])
    }

    /// Native container: the requested format when the API supports it
    /// directly, otherwise PNG for conversion downstream; JPEG when the
    /// caller did not ask for anything.
    fn native_format(&self, plan: &ImagePlan<'_>) -> ImageFormat {
        match plan.output_format {
            Some(ImageFormat::Png) => ImageFormat::Png,
            Some(ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Some(_) => ImageFormat::Png,
            None => ImageFormat::Jpeg,
        }
    }
}
