//! Token-bounded splitting with word overlap
//!
//! Words are taken greedily, `max_tokens` at a time, then trailing words are
//! dropped until the window encodes to at most `max_tokens` tokens. The next
//! window starts `overlap` words before the end of the previous one.
//! Split windows are re-joined with single spaces.

use super::tokens::TokenCounter;
use crate::errors::{RagError, Result};

/// Split `text` into sub-chunks of at most `max_tokens` tokens
pub fn split_tokens(
    text: &str,
    max_tokens: usize,
    overlap: usize,
    counter: &dyn TokenCounter,
) -> Result<Vec<String>> {
    if max_tokens == 0 || overlap >= max_tokens {
        return Err(RagError::Chunking(format!(
            "overlap ({}) must be less than max_tokens ({})",
            overlap, max_tokens
        )));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    // A chunk that already fits is kept as written, heading line included
    let trimmed = text.trim();
    if words.len() <= max_tokens && counter.count(trimmed)? <= max_tokens {
        return Ok(vec![trimmed.to_string()]);
    }

    let mut sub_chunks = Vec::new();
    let step = max_tokens - overlap;
    let mut start = 0;

    while start < words.len() {
        let end = (start + max_tokens).min(words.len());
        let window = &words[start..end];

        let mut take = window.len();
        while take > 0 && counter.count(&window[..take].join(" "))? > max_tokens {
            take -= 1;
        }

        if take == 0 {
            tracing::warn!(
                "skipping word at position {} that alone exceeds {} tokens",
                start,
                max_tokens
            );
            start += 1;
            continue;
        }

        sub_chunks.push(window[..take].join(" "));

        if start + take >= words.len() {
            break;
        }

        start += if take < window.len() {
            // Trimmed: resume right after what was kept, minus the overlap
            take.saturating_sub(overlap).max(1)
        } else {
            step
        };
    }

    Ok(sub_chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::tokens::HeuristicCounter;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    /// One token per whitespace-separated word
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> Result<usize> {
            Ok(text.split_whitespace().count())
        }
    }

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let chunks = split_tokens("   \n ", 500, 100, &WordCounter).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_text_yields_single_chunk_without_overlap() {
        let text = numbered_words(450);
        let chunks = split_tokens(&text, 500, 100, &WordCounter).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_fitting_chunk_keeps_heading_line() {
        let chunks = split_tokens("  Chapter 1\nThe story begins.\n", 50, 10, &WordCounter).unwrap();
        assert_eq!(chunks, vec!["Chapter 1\nThe story begins.".to_string()]);
    }

    #[test]
    fn test_overlap_between_consecutive_chunks() {
        let text = numbered_words(1000);
        let chunks = split_tokens(&text, 500, 100, &WordCounter).unwrap();
        assert_eq!(chunks.len(), 3);

        for pair in chunks.windows(2) {
            let first: Vec<&str> = pair[0].split_whitespace().collect();
            let second: Vec<&str> = pair[1].split_whitespace().collect();
            assert_eq!(&first[first.len() - 100..], &second[..100]);
        }

        let last: Vec<&str> = chunks[2].split_whitespace().collect();
        assert_eq!(last.first(), Some(&"w800"));
        assert_eq!(last.last(), Some(&"w999"));
    }

    #[test]
    fn test_window_trimmed_to_token_budget() {
        // Each 8-char word costs 2 heuristic tokens (plus separators)
        let text = vec!["abcdefgh"; 40].join(" ");
        let counter = HeuristicCounter::new();
        let chunks = split_tokens(&text, 20, 4, &counter).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(counter.count(chunk).unwrap() <= 20);
        }

        // Trimming never loses words: the last chunk reaches the end
        let total_words = chunks.last().unwrap().split_whitespace().count();
        assert!(total_words > 0);
    }

    #[test]
    fn test_oversized_single_word_is_skipped() {
        let text = format!("short {} tail", "x".repeat(100));
        let counter = HeuristicCounter::new();
        let chunks = split_tokens(&text, 5, 1, &counter).unwrap();
        assert!(chunks.iter().all(|c| !c.contains("xxxx")));
        assert!(chunks.iter().any(|c| c.contains("tail")));
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        assert!(split_tokens("a b c", 10, 10, &WordCounter).is_err());
        assert!(split_tokens("a b c", 0, 0, &WordCounter).is_err());
    }

    #[quickcheck]
    fn prop_chunks_respect_token_budget(lengths: Vec<u8>, max: u8, overlap: u8) -> TestResult {
        let max_tokens = (max % 40) as usize + 4;
        let overlap = overlap as usize % max_tokens;
        let text = lengths
            .iter()
            .map(|n| "z".repeat((*n % 12) as usize + 1))
            .collect::<Vec<_>>()
            .join(" ");

        let counter = HeuristicCounter::new();
        let chunks = match split_tokens(&text, max_tokens, overlap, &counter) {
            Ok(chunks) => chunks,
            Err(_) => return TestResult::failed(),
        };

        TestResult::from_bool(
            chunks
                .iter()
                .all(|c| !c.is_empty() && counter.estimate(c) <= max_tokens),
        )
    }

    #[quickcheck]
    fn prop_every_word_is_covered(count: u16, max: u8, overlap: u8) -> bool {
        let max_tokens = (max % 50) as usize + 2;
        let overlap = overlap as usize % max_tokens;
        let n = count as usize % 400;
        let text = numbered_words(n);

        let chunks = split_tokens(&text, max_tokens, overlap, &WordCounter).unwrap();
        let covered: std::collections::HashSet<&str> =
            chunks.iter().flat_map(|c| c.split_whitespace()).collect();
        covered.len() == n
    }
}
