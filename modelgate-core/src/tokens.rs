//! Input token estimation
//!
//! Several backends do not report token counts; the OpenAI response shape
//! still carries a `usage` block. This estimator fills the gap with the
//! usual four-characters-per-token approximation. Provider-reported counts
//! always win over the estimate.

/// Estimate the token count of the given texts.
pub fn estimate_tokens<'a>(texts: impl IntoIterator<Item = &'a str>) -> u32 {
    texts
        .into_iter()
        .map(|text| {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                0
            } else {
                (trimmed.chars().count() as u32).div_ceil(4).max(1)
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_counts_zero() {
        assert_eq!(estimate_tokens([]), 0);
        assert_eq!(estimate_tokens(["", "   "]), 0);
    }

    #[test]
    fn short_text_counts_at_least_one() {
        assert_eq!(estimate_tokens(["a"]), 1);
    }

    #[test]
    fn batches_sum() {
        let estimate = estimate_tokens(["hello world", "goodbye"]);
        assert_eq!(estimate, 3 + 2);
    }
}
