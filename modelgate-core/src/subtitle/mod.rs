//! Subtitle-aware translation post-processing
//!
//! When a transcript carries timed segments, translation must not disturb
//! the timing: each segment's text is translated independently and the
//! document is re-serialized in the requested container with the original
//! timestamps and ordering. A flat transcript falls back to a single
//! translated block. Empty transcripts produce an empty but well-formed
//! document, never an error.

use crate::providers::error::ProviderResult;
use crate::providers::translation::{translate_if_needed, TextTranslator};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One timed transcript segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment ordinal, zero-based
    pub index: usize,

    /// Start time in seconds
    pub start_time: f64,

    /// End time in seconds
    pub end_time: f64,

    pub text: String,
}

/// Subtitle container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

/// `HH:MM:SS,mmm` (SRT) or `HH:MM:SS.mmm` (VTT)
fn format_timestamp(seconds: f64, separator: char) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02}{separator}{millis:03}")
}

/// Serialize timed segments into the requested container.
///
/// SRT entries are numbered sequentially from 1; VTT opens with the fixed
/// `WEBVTT` header token. An empty segment list yields an empty document
/// (just the header for VTT).
pub fn render(format: SubtitleFormat, segments: &[TranscriptSegment]) -> String {
    let mut output = String::new();
    let separator = match format {
        SubtitleFormat::Srt => ',',
        SubtitleFormat::Vtt => '.',
    };
    if format == SubtitleFormat::Vtt {
        output.push_str("WEBVTT\n\n");
    }
    for (position, segment) in segments.iter().enumerate() {
        if format == SubtitleFormat::Srt {
            let _ = writeln!(output, "{}", position + 1);
        }
        let _ = writeln!(
            output,
            "{} --> {}",
            format_timestamp(segment.start_time, separator),
            format_timestamp(segment.end_time, separator),
        );
        output.push_str(&segment.text);
        output.push('\n');
        if position + 1 < segments.len() {
            output.push('\n');
        }
    }
    output
}

/// Translate every segment's text, preserving timing and ordering.
pub async fn translate_segments(
    translator: &dyn TextTranslator,
    segments: &[TranscriptSegment],
    source_language: &str,
) -> ProviderResult<Vec<TranscriptSegment>> {
    let mut translated = Vec::with_capacity(segments.len());
    for segment in segments {
        let text = translate_if_needed(translator, &segment.text, source_language).await?;
        translated.push(TranscriptSegment {
            index: segment.index,
            start_time: segment.start_time,
            end_time: segment.end_time,
            text,
        });
    }
    Ok(translated)
}

/// Translate a transcript into a subtitle document.
///
/// With timing structure the segments are translated independently and
/// re-serialized; a flat transcript translates as one block and is returned
/// unstructured rather than failing.
pub async fn translate_to_subtitles(
    translator: &dyn TextTranslator,
    format: SubtitleFormat,
    segments: Option<&[TranscriptSegment]>,
    flat_text: &str,
    source_language: &str,
) -> ProviderResult<String> {
    match segments {
        Some(segments) => {
            let translated = translate_segments(translator, segments, source_language).await?;
            Ok(render(format, &translated))
        }
        None => translate_if_needed(translator, flat_text, source_language).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment {
                index: 0,
                start_time: 0.0,
                end_time: 2.5,
                text: "Hola mundo".to_string(),
            },
            TranscriptSegment {
                index: 1,
                start_time: 2.5,
                end_time: 61.04,
                text: "Adiós".to_string(),
            },
        ]
    }

    struct MarkingTranslator;

    #[async_trait]
    impl TextTranslator for MarkingTranslator {
        async fn translate_to_english(
            &self,
            text: &str,
            _source_language: &str,
        ) -> crate::providers::error::ProviderResult<String> {
            Ok(format!("EN[{text}]"))
        }
    }

    #[test]
    fn srt_rendering_numbers_and_timestamps() {
        let srt = render(SubtitleFormat::Srt, &segments());
        let expected = "1\n00:00:00,000 --> 00:00:02,500\nHola mundo\n\n2\n00:00:02,500 --> 00:01:01,040\nAdiós\n";
        assert_eq!(srt, expected);
    }

    #[test]
    fn vtt_rendering_has_header_and_dot_millis() {
        let vtt = render(SubtitleFormat::Vtt, &segments());
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:02.500"));
        assert!(!vtt.contains(','));
    }

    #[test]
    fn empty_segments_render_well_formed() {
        assert_eq!(render(SubtitleFormat::Srt, &[]), "");
        assert_eq!(render(SubtitleFormat::Vtt, &[]), "WEBVTT\n\n");
    }

    #[tokio::test]
    async fn translation_preserves_timing_and_count() {
        let source = segments();
        let translated = translate_segments(&MarkingTranslator, &source, "es")
            .await
            .unwrap();
        assert_eq!(translated.len(), source.len());
        for (before, after) in source.iter().zip(&translated) {
            assert_eq!(before.start_time, after.start_time);
            assert_eq!(before.end_time, after.end_time);
            assert_eq!(after.text, format!("EN[{}]", before.text));
        }
    }

    #[tokio::test]
    async fn timed_transcript_round_trips_through_container() {
        let source = segments();
        let document = translate_to_subtitles(
            &MarkingTranslator,
            SubtitleFormat::Srt,
            Some(&source),
            "Hola mundo Adiós",
            "es",
        )
        .await
        .unwrap();
        // Exactly N numbered entries with the original timestamps and
        // translated, non-empty text.
        assert!(document.contains("1\n00:00:00,000 --> 00:00:02,500\nEN[Hola mundo]"));
        assert!(document.contains("2\n00:00:02,500 --> 00:01:01,040\nEN[Adiós]"));
    }

    #[tokio::test]
    async fn flat_transcript_falls_back_to_single_block() {
        let document = translate_to_subtitles(
            &MarkingTranslator,
            SubtitleFormat::Vtt,
            None,
            "Hola mundo",
            "es",
        )
        .await
        .unwrap();
        assert_eq!(document, "EN[Hola mundo]");
    }

    #[tokio::test]
    async fn empty_transcript_translates_to_empty_result() {
        let document = translate_to_subtitles(
            &MarkingTranslator,
            SubtitleFormat::Srt,
            Some(&[]),
            "",
            "es",
        )
        .await
        .unwrap();
        assert_eq!(document, "");
    }

    #[test]
    fn timestamp_formatting_rolls_over_units() {
        assert_eq!(format_timestamp(3661.5, ','), "01:01:01,500");
        assert_eq!(format_timestamp(0.0, '.'), "00:00:00.000");
        assert_eq!(format_timestamp(-1.0, ','), "00:00:00,000");
    }
}
