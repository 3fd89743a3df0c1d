//! Media resolver
//!
//! Classifies each raw input item (text literal, data URI, storage URI),
//! decodes and validates base64 payloads, and decides between inline
//! transmission and object-storage offload. The offload decision is
//! size-driven against provider limits, but an explicit `force_s3_data`
//! request is honored regardless of size so the offload path stays
//! deterministically testable with small payloads.

use crate::providers::error::{ProviderError, ProviderResult};
use crate::registry::Modality;
use crate::storage::ObjectStore;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;

/// Provider body limit for inline media, with a little margin.
pub const DEFAULT_MEDIA_INLINE_LIMIT: usize = 24_990_000;

/// Character limit above which text is offloaded for providers that accept
/// text by reference.
pub const DEFAULT_TEXT_INLINE_LIMIT: usize = 8_192;

// data:[<mediatype>][;parameters][;base64],<data>
fn data_uri_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^data:([a-zA-Z0-9][a-zA-Z0-9\-\+\.]*/[a-zA-Z0-9][a-zA-Z0-9\-\+\.]*)?(?:;[a-zA-Z0-9\-]+=[^;,]+)*(?:;base64)?,",
        )
        .expect("data URI pattern is valid")
    })
}

/// True when the string is a data URI.
pub fn is_data_uri(value: &str) -> bool {
    data_uri_pattern().is_match(value)
}

/// Media type of a data URI, or `text/plain` for anything else.
pub fn data_uri_mime(value: &str) -> String {
    data_uri_pattern()
        .captures(value)
        .and_then(|captures| captures.get(1))
        .map(|mime| mime.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| "text/plain".to_string())
}

/// Decoded size of base64 data computed from length and padding, without
/// decoding.
pub fn base64_decoded_size(value: &str) -> usize {
    let prefix = if value.starts_with("data:") {
        value.find(',').map(|at| at + 1).unwrap_or(0)
    } else {
        0
    };
    let data = &value[prefix..];
    let padding = data.chars().rev().take_while(|c| *c == '=').count();
    (data.len() * 3) / 4 - padding
}

/// Native file format for a MIME type, applying the provider aliases for
/// containers whose subtype differs from the format name.
pub fn format_from_mime(mime: &str) -> String {
    let subtype = mime.split('/').nth(1).unwrap_or("bin");
    match subtype {
        "x-matroska" => "mkv",
        "quicktime" => "mov",
        "x-flv" => "flv",
        "x-ms-wmv" => "wmv",
        "3gpp" => "three_gp",
        "mpeg" if mime.starts_with("audio/") => "mp3",
        "jpg" => "jpeg",
        other => other,
    }
    .to_string()
}

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mov", "mkv", "flv", "wmv", "webm", "m4v", "mpg", "mpeg", "3gp", "ogv", "mts",
    "m2ts", "ts", "vob",
];
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus", "aiff", "amr", "au",
];
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic", "heif",
];

/// Guess the media modality of a storage URI from its file extension.
///
/// Used when only the path is known and the object cannot be inspected.
pub fn guess_media_type(path: &str) -> ProviderResult<(Modality, String)> {
    let extension = path
        .rsplit('.')
        .next()
        .filter(|ext| !ext.contains('/') && *ext != path)
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            ProviderError::invalid(format!("A file extension is required for file: {path}"))
        })?;
    let modality = if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Modality::Video
    } else if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
        Modality::Audio
    } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Modality::Image
    } else {
        return Err(ProviderError::invalid(format!(
            "Unsupported media type for file: {path}"
        )));
    };
    Ok((modality, extension))
}

/// Payload representation after the inline/offload decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPayload {
    /// Raw base64 content, data-URI prefix stripped
    Inline(String),
    /// Reference into the object store
    Stored(String),
}

/// A resolved media input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub modality: Modality,
    /// Native file format (`png`, `mp4`, ...)
    pub format: String,
    pub mime: String,
    /// Decoded size in bytes; zero when only a reference is known
    pub size: usize,
    pub payload: MediaPayload,
}

/// A resolved input item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedItem {
    Text(String),
    Media(ResolvedMedia),
}

/// A resolved input together with its original position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    /// Position in the caller-supplied batch
    pub index: usize,
    pub item: ResolvedItem,
}

impl ResolvedInput {
    pub fn modality(&self) -> Modality {
        match &self.item {
            ResolvedItem::Text(_) => Modality::Text,
            ResolvedItem::Media(media) => media.modality,
        }
    }
}

/// Inline/offload decision thresholds
#[derive(Debug, Clone, Copy)]
pub struct MediaResolver {
    media_inline_limit: usize,
    text_inline_limit: usize,
}

impl Default for MediaResolver {
    fn default() -> Self {
        Self {
            media_inline_limit: DEFAULT_MEDIA_INLINE_LIMIT,
            text_inline_limit: DEFAULT_TEXT_INLINE_LIMIT,
        }
    }
}

impl MediaResolver {
    pub fn new(media_inline_limit: usize, text_inline_limit: usize) -> Self {
        Self {
            media_inline_limit,
            text_inline_limit,
        }
    }

    /// Resolve one raw input item.
    ///
    /// `offload` is the object store to upload into, present only when the
    /// resolved provider can consume storage references. `force_offload`
    /// pushes any payload through the store regardless of size. Failures to
    /// decode a payload are validation errors, never provider errors.
    pub async fn resolve(
        &self,
        index: usize,
        value: &str,
        force_offload: bool,
        offload: Option<&dyn ObjectStore>,
        key_prefix: &str,
    ) -> ProviderResult<ResolvedInput> {
        if let Some(stored) = value.strip_prefix("s3://") {
            let (modality, format) = guess_media_type(stored)?;
            return Ok(ResolvedInput {
                index,
                item: ResolvedItem::Media(ResolvedMedia {
                    modality,
                    mime: format!("{}/{format}", modality.as_str()),
                    format,
                    size: 0,
                    payload: MediaPayload::Stored(value.to_string()),
                }),
            });
        }

        if is_data_uri(value) {
            let mime = data_uri_mime(value);
            let modality = Modality::from_mime(&mime);
            if modality == Modality::Text {
                return Err(ProviderError::invalid(format!(
                    "Unsupported data URI media type: {mime}"
                )));
            }
            let raw = value.split_once(',').map(|(_, data)| data).unwrap_or("");
            let bytes = BASE64.decode(raw).map_err(|err| {
                ProviderError::invalid(format!("Invalid base64 media payload: {err}"))
            })?;
            if bytes.is_empty() {
                return Err(ProviderError::invalid(
                    "Media payload must not be empty.".to_string(),
                ));
            }
            let format = format_from_mime(&mime);
            let size = bytes.len();
            let payload = match offload {
                Some(store) if force_offload || size > self.media_inline_limit => {
                    let key = format!("{key_prefix}/input-{index}.{format}");
                    let stored = store.put(bytes, &mime, &key).await?;
                    MediaPayload::Stored(stored.reference)
                }
                _ => MediaPayload::Inline(raw.to_string()),
            };
            return Ok(ResolvedInput {
                index,
                item: ResolvedItem::Media(ResolvedMedia {
                    modality,
                    format,
                    mime,
                    size,
                    payload,
                }),
            });
        }

        // Plain text; offloaded only when the provider takes text by
        // reference and the payload warrants it.
        if let Some(store) = offload {
            if force_offload || value.len() > self.text_inline_limit {
                let key = format!("{key_prefix}/input-{index}.txt");
                let stored = store
                    .put(value.as_bytes().to_vec(), "text/plain", &key)
                    .await?;
                return Ok(ResolvedInput {
                    index,
                    item: ResolvedItem::Media(ResolvedMedia {
                        modality: Modality::Text,
                        format: "txt".to_string(),
                        mime: "text/plain".to_string(),
                        size: value.len(),
                        payload: MediaPayload::Stored(stored.reference),
                    }),
                });
            }
        }
        Ok(ResolvedInput {
            index,
            item: ResolvedItem::Text(value.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==";

    #[test]
    fn data_uri_detection_and_mime() {
        assert!(is_data_uri(PNG_URI));
        assert!(is_data_uri("data:;base64,aGk="));
        assert!(!is_data_uri("plain text"));
        assert!(!is_data_uri("s3://bucket/key.mp4"));
        assert_eq!(data_uri_mime(PNG_URI), "image/png");
        assert_eq!(data_uri_mime("not a uri"), "text/plain");
    }

    #[test]
    fn decoded_size_accounts_for_padding_and_prefix() {
        let payload = BASE64.encode(b"hello!");
        assert_eq!(base64_decoded_size(&payload), 6);
        let uri = format!("data:image/png;base64,{}", BASE64.encode(b"hello"));
        assert_eq!(base64_decoded_size(&uri), 5);
    }

    #[test]
    fn video_format_aliases() {
        assert_eq!(format_from_mime("video/quicktime"), "mov");
        assert_eq!(format_from_mime("video/x-matroska"), "mkv");
        assert_eq!(format_from_mime("video/3gpp"), "three_gp");
        assert_eq!(format_from_mime("video/mp4"), "mp4");
        assert_eq!(format_from_mime("audio/mpeg"), "mp3");
        assert_eq!(format_from_mime("image/jpg"), "jpeg");
    }

    #[test]
    fn storage_uri_modality_from_extension() {
        let (modality, ext) = guess_media_type("videos/clip.MP4").unwrap();
        assert_eq!(modality, Modality::Video);
        assert_eq!(ext, "mp4");
        assert!(guess_media_type("no-extension").is_err());
        assert!(guess_media_type("file.xyz").is_err());
    }

    #[tokio::test]
    async fn small_media_stays_inline() {
        let resolver = MediaResolver::default();
        let store = MemoryStore::new("media");
        let resolved = resolver
            .resolve(0, PNG_URI, false, Some(&store as &dyn ObjectStore), "req")
            .await
            .unwrap();
        match resolved.item {
            ResolvedItem::Media(media) => {
                assert_eq!(media.modality, Modality::Image);
                assert!(matches!(media.payload, MediaPayload::Inline(_)));
            }
            other => panic!("unexpected item: {other:?}"),
        }
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn force_offload_is_size_independent() {
        let resolver = MediaResolver::default();
        let store = MemoryStore::new("media");
        let resolved = resolver
            .resolve(0, PNG_URI, true, Some(&store as &dyn ObjectStore), "req")
            .await
            .unwrap();
        match resolved.item {
            ResolvedItem::Media(media) => {
                assert!(matches!(media.payload, MediaPayload::Stored(_)));
            }
            other => panic!("unexpected item: {other:?}"),
        }
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn oversized_media_offloads() {
        let resolver = MediaResolver::new(4, DEFAULT_TEXT_INLINE_LIMIT);
        let store = MemoryStore::new("media");
        let uri = format!("data:image/png;base64,{}", BASE64.encode([0u8; 32]));
        let resolved = resolver
            .resolve(2, &uri, false, Some(&store as &dyn ObjectStore), "req")
            .await
            .unwrap();
        match resolved.item {
            ResolvedItem::Media(media) => {
                assert_eq!(media.payload, MediaPayload::Stored("s3://media/req/input-2.png".to_string()));
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn corrupt_base64_is_a_validation_error() {
        let resolver = MediaResolver::default();
        let err = resolver
            .resolve(0, "data:image/png;base64,@@not-base64@@", false, None, "req")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn text_without_offload_store_stays_text() {
        let resolver = MediaResolver::default();
        let resolved = resolver
            .resolve(1, "just words", true, None, "req")
            .await
            .unwrap();
        assert_eq!(resolved.item, ResolvedItem::Text("just words".to_string()));
        assert_eq!(resolved.modality(), Modality::Text);
    }
}
