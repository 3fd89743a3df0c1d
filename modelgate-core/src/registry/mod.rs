//! Capability registry for the supported model families
//!
//! The registry is the single source of truth for what each model can do:
//! which provider family serves it, which input modalities it accepts,
//! whether an explicit output dimensionality is supported, and which of the
//! provider-specific switches (truncate, quality, style, text+image
//! auto-combination) apply. It is built once at process start and never
//! mutated on the request path; request handling receives it by reference.
//!
//! Family membership (`*-v1` vs `*-v2:0`) is decided here by longest-prefix
//! matching, not inside adapters.

pub mod modality;

pub use modality::Modality;

use serde::Serialize;

/// Provider family an adapter variant exists for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    TitanEmbed,
    CohereEmbed,
    MarengoEmbed,
    NovaEmbed,
    TitanImage,
    NovaCanvas,
    Stability,
    Translation,
}

/// Explicit output-dimensionality support of a model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionSupport {
    /// `dimensions` is rejected outright
    None,
    /// `dimensions` must be one of the listed values
    FixedSet(&'static [u32]),
    /// Any positive value is forwarded; the response length is validated
    Arbitrary,
}

impl DimensionSupport {
    /// True when `requested` is acceptable for this support level.
    pub fn accepts(&self, requested: u32) -> bool {
        match self {
            Self::None => false,
            Self::FixedSet(values) => values.contains(&requested),
            Self::Arbitrary => requested > 0,
        }
    }
}

/// Immutable per-family capability record
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Capability {
    /// Provider family serving this model
    pub provider: ProviderKind,

    /// Input modalities the model accepts
    pub modalities: &'static [Modality],

    /// Output-dimensionality support
    pub dimensions: DimensionSupport,

    /// Whether a truncate-style extra parameter is accepted
    pub supports_truncate: bool,

    /// Whether the `quality` generation parameter is accepted
    pub supports_quality: bool,

    /// Whether the `style` generation parameter is accepted
    pub supports_style: bool,

    /// Whether a text+image pair collapses into one joint embedding
    pub auto_combines_text_image: bool,
}

impl Capability {
    /// True when the model accepts inputs of the given modality.
    pub fn supports_input(&self, modality: Modality) -> bool {
        self.modalities.contains(&modality)
    }
}

const TEXT: &[Modality] = &[Modality::Text];
const TEXT_IMAGE: &[Modality] = &[Modality::Text, Modality::Image];
const ALL_MODALITIES: &[Modality] = &[
    Modality::Text,
    Modality::Image,
    Modality::Video,
    Modality::Audio,
];
const AUDIO: &[Modality] = &[Modality::Audio];

const fn embedding(
    provider: ProviderKind,
    modalities: &'static [Modality],
    dimensions: DimensionSupport,
    supports_truncate: bool,
    auto_combines_text_image: bool,
) -> Capability {
    Capability {
        provider,
        modalities,
        dimensions,
        supports_truncate,
        supports_quality: false,
        supports_style: false,
        auto_combines_text_image,
    }
}

const fn generation(
    provider: ProviderKind,
    supports_quality: bool,
    supports_style: bool,
) -> Capability {
    Capability {
        provider,
        modalities: TEXT,
        dimensions: DimensionSupport::None,
        supports_truncate: false,
        supports_quality,
        supports_style,
        auto_combines_text_image: false,
    }
}

/// Builtin model table. Longer matchers must not be shadowed by shorter
/// prefixes of the same family; lookup picks the longest match.
const MODEL_TABLE: &[(&str, Capability)] = &[
    (
        "amazon.titan-embed-text-v1",
        embedding(
            ProviderKind::TitanEmbed,
            TEXT,
            DimensionSupport::None,
            false,
            false,
        ),
    ),
    (
        "amazon.titan-embed-text-v2",
        embedding(
            ProviderKind::TitanEmbed,
            TEXT,
            DimensionSupport::FixedSet(&[256, 512, 1024]),
            false,
            false,
        ),
    ),
    (
        "amazon.titan-embed-image-v1",
        embedding(
            ProviderKind::TitanEmbed,
            TEXT_IMAGE,
            DimensionSupport::FixedSet(&[256, 384, 1024]),
            false,
            true,
        ),
    ),
    (
        "cohere.embed-english-v3",
        embedding(
            ProviderKind::CohereEmbed,
            TEXT_IMAGE,
            DimensionSupport::None,
            true,
            false,
        ),
    ),
    (
        "cohere.embed-multilingual-v3",
        embedding(
            ProviderKind::CohereEmbed,
            TEXT_IMAGE,
            DimensionSupport::None,
            true,
            false,
        ),
    ),
    (
        "cohere.embed-v4",
        embedding(
            ProviderKind::CohereEmbed,
            TEXT_IMAGE,
            DimensionSupport::Arbitrary,
            true,
            false,
        ),
    ),
    (
        "twelvelabs.marengo-embed-",
        embedding(
            ProviderKind::MarengoEmbed,
            ALL_MODALITIES,
            DimensionSupport::None,
            true,
            false,
        ),
    ),
    (
        "amazon.nova-2-multimodal-embeddings",
        embedding(
            ProviderKind::NovaEmbed,
            ALL_MODALITIES,
            DimensionSupport::FixedSet(&[256, 384, 1024, 3072]),
            false,
            false,
        ),
    ),
    (
        "amazon.titan-image-generator",
        generation(ProviderKind::TitanImage, true, false),
    ),
    (
        "amazon.nova-canvas",
        generation(ProviderKind::NovaCanvas, true, true),
    ),
    ("stability.", generation(ProviderKind::Stability, false, true)),
    (
        "amazon.transcribe",
        Capability {
            provider: ProviderKind::Translation,
            modalities: AUDIO,
            dimensions: DimensionSupport::None,
            supports_truncate: false,
            supports_quality: false,
            supports_style: false,
            auto_combines_text_image: false,
        },
    ),
];

/// Process-wide, read-only model capability table
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    entries: Vec<(&'static str, Capability)>,
}

impl CapabilityRegistry {
    /// Build the registry from the builtin model table.
    pub fn builtin() -> Self {
        Self {
            entries: MODEL_TABLE.to_vec(),
        }
    }

    /// Resolve a model identifier to its capability record.
    ///
    /// Longest-prefix match, so `amazon.titan-embed-text-v2:0` resolves to
    /// the v2 entry and not the v1 one. Returns `None` for unknown models;
    /// callers fail closed with a model-not-found error before any provider
    /// call.
    pub fn lookup(&self, model_id: &str) -> Option<&Capability> {
        self.entries
            .iter()
            .filter(|(matcher, _)| model_id.starts_with(matcher))
            .max_by_key(|(matcher, _)| matcher.len())
            .map(|(_, capability)| capability)
    }

    /// All registered matchers, for diagnostics and error messages.
    pub fn matchers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(matcher, _)| *matcher)
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
