//! Caller-facing protocol types
//!
//! This module contains the OpenAI-shaped request and response structures the
//! front door exchanges with the gateway core: embeddings, image generation,
//! audio translation, and the uniform error envelope.

pub mod types;

pub use types::{
    AudioResponseFormat, EmbeddingInput, EmbeddingRequest, EmbeddingResponse, EmbeddingRow,
    EmbeddingUsage, EmbeddingValue, EncodingFormat, ImageGenerationRequest, ImageResponseFormat,
    ImageRow, ImageUsage, ImagesResponse, TranslationJson, TranslationRequest,
    TranslationResponse, TranslationSegmentVerbose, TranslationVerbose,
};
