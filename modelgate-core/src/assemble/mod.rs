//! Response assembly
//!
//! The assembler is the single place where normalized rows from one adapter
//! invocation become the OpenAI list-shaped response. Rows are ordered by
//! `(source_index, sequence)` and then assigned contiguous `index` values:
//! auto-combination yields fewer rows than inputs, segmentation yields more,
//! and only the assembler reconciles either with the caller-facing indices.
//! Content never drives ordering.

use crate::protocol::types::{
    EmbeddingResponse, EmbeddingRow, EmbeddingUsage, EmbeddingValue, EncodingFormat,
};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::{NormalizedRow, RowPayload};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Order rows by source position, then intra-item sequence.
pub fn order_rows(mut rows: Vec<NormalizedRow>) -> Vec<NormalizedRow> {
    rows.sort_by_key(|row| (row.source_index, row.sequence));
    rows
}

/// Little-endian f32 bytes, standard base64 alphabet.
fn encode_vector_base64(vector: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    BASE64.encode(bytes)
}

/// Assemble the `/v1/embeddings` response from normalized rows.
pub fn embeddings_response(
    model: &str,
    rows: Vec<NormalizedRow>,
    encoding: EncodingFormat,
    usage: EmbeddingUsage,
) -> ProviderResult<EmbeddingResponse> {
    let data = order_rows(rows)
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let RowPayload::Vector(vector) = row.payload else {
                return Err(ProviderError::Parse(
                    "non-vector row in embedding response".to_string(),
                ));
            };
            let embedding = match encoding {
                EncodingFormat::Float => EmbeddingValue::Float(vector),
                EncodingFormat::Base64 => EmbeddingValue::Base64(encode_vector_base64(&vector)),
            };
            Ok(EmbeddingRow {
                object: "embedding".to_string(),
                index,
                embedding,
            })
        })
        .collect::<ProviderResult<Vec<_>>>()?;

    Ok(EmbeddingResponse {
        object: "list".to_string(),
        data,
        model: model.to_string(),
        usage,
    })
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// For any set of rows, assembled indices are unique and exactly
        /// {0, ..., n-1}, and ordering follows (source_index, sequence).
        #[test]
        fn assembled_indices_are_contiguous(
            keys in proptest::collection::vec((0usize..16, 0usize..4), 0..32)
        ) {
            let rows: Vec<NormalizedRow> = keys
                .iter()
                .map(|(source, sequence)| NormalizedRow::vector(*source, *sequence, vec![0.0]))
                .collect();
            let count = rows.len();
            let response = embeddings_response(
                "model",
                rows,
                EncodingFormat::Float,
                EmbeddingUsage::default(),
            )
            .unwrap();
            let indices: Vec<usize> = response.data.iter().map(|r| r.index).collect();
            prop_assert_eq!(indices, (0..count).collect::<Vec<_>>());
        }

        #[test]
        fn ordering_is_stable_under_shuffle(
            mut keys in proptest::collection::vec((0usize..8, 0usize..4), 1..16)
        ) {
            keys.sort();
            keys.dedup();
            let rows: Vec<NormalizedRow> = keys
                .iter()
                .map(|(source, sequence)| {
                    NormalizedRow::vector(*source, *sequence, vec![*source as f32, *sequence as f32])
                })
                .collect();
            let mut shuffled = rows.clone();
            shuffled.reverse();
            let a = embeddings_response("m", rows, EncodingFormat::Float, EmbeddingUsage::default()).unwrap();
            let b = embeddings_response("m", shuffled, EncodingFormat::Float, EmbeddingUsage::default()).unwrap();
            for (left, right) in a.data.iter().zip(b.data.iter()) {
                prop_assert_eq!(&left.embedding, &right.embedding);
            }
        }
    }
}
