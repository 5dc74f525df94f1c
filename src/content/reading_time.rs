//! Reading-time estimate

use lazy_static::lazy_static;
use regex::Regex;

use super::post::ContentBlock;

/// Default reading speed
pub const WORDS_PER_MINUTE: usize = 200;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\S+").unwrap();
}

/// Number of whitespace-delimited tokens in a text
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Tokens across every heading and every body fragment, in document order
pub fn total_words(content: &[ContentBlock]) -> usize {
    content
        .iter()
        .map(|block| {
            count_words(&block.heading)
                + block
                    .body
                    .iter()
                    .map(|fragment| count_words(fragment.text()))
                    .sum::<usize>()
        })
        .sum()
}

/// Minutes needed to read `content`, rounded up
///
/// Empty content reads in 0 minutes. A zero rate falls back to
/// [`WORDS_PER_MINUTE`].
pub fn reading_time(content: &[ContentBlock], words_per_minute: usize) -> usize {
    let rate = if words_per_minute == 0 {
        WORDS_PER_MINUTE
    } else {
        words_per_minute
    };
    total_words(content).div_ceil(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::richtext::{RichTextBlock, TextBlock};

    fn paragraph(text: &str) -> RichTextBlock {
        RichTextBlock::Paragraph(TextBlock {
            text: text.to_string(),
            spans: Vec::new(),
        })
    }

    fn words(n: usize) -> String {
        vec!["lorem"; n].join(" ")
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words("one"), 1);
        assert_eq!(count_words("  one\ttwo\n three  "), 3);
        assert_eq!(count_words("não é\u{a0}difícil"), 3);
    }

    #[test]
    fn test_exactly_200_words_is_one_minute() {
        let content = vec![ContentBlock {
            heading: words(10),
            body: vec![paragraph(&words(150)), paragraph(&words(40))],
        }];
        assert_eq!(total_words(&content), 200);
        assert_eq!(reading_time(&content, 200), 1);
    }

    #[test]
    fn test_201_words_rounds_up() {
        let content = vec![
            ContentBlock {
                heading: words(1),
                body: vec![paragraph(&words(100))],
            },
            ContentBlock {
                heading: String::new(),
                body: vec![paragraph(&words(100))],
            },
        ];
        assert_eq!(total_words(&content), 201);
        assert_eq!(reading_time(&content, 200), 2);
    }

    #[test]
    fn test_empty_content_is_zero() {
        assert_eq!(reading_time(&[], 200), 0);
        let content = vec![ContentBlock::default()];
        assert_eq!(reading_time(&content, 200), 0);
    }

    #[test]
    fn test_non_text_blocks_do_not_count() {
        let content = vec![ContentBlock {
            heading: "Title".to_string(),
            body: vec![RichTextBlock::Unknown, paragraph("two words")],
        }];
        assert_eq!(total_words(&content), 3);
    }

    #[test]
    fn test_is_deterministic() {
        let content = vec![ContentBlock {
            heading: words(3),
            body: vec![paragraph(&words(450))],
        }];
        let first = reading_time(&content, 200);
        let second = reading_time(&content, 200);
        assert_eq!(first, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_rate_uses_default() {
        let content = vec![ContentBlock {
            heading: words(201),
            body: Vec::new(),
        }];
        assert_eq!(reading_time(&content, 0), 2);
    }
}
