use unicode_segmentation::UnicodeSegmentation;

use crate::model::{DocumentType, EXCERPT_UNAVAILABLE};

pub const DEFAULT_EXCERPT_TOKENS: usize = 20;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExcerptMode {
    /// First `n` word tokens after the anchor, joined by single spaces.
    Tokens(usize),
    /// Everything from the anchor up to and including the first `.`.
    UntilPeriod,
}

impl ExcerptMode {
    pub fn for_type(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::Ordinance => Self::UntilPeriod,
            DocumentType::Decree | DocumentType::ComplementaryLaw | DocumentType::Generic => {
                Self::Tokens(DEFAULT_EXCERPT_TOKENS)
            }
        }
    }
}

/// UAX#29 word segmentation with whitespace segments dropped. Punctuation stays as its
/// own token; accented words and `d'água` style contractions are not split.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_word_bounds()
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}

pub fn extract_excerpt(text: &str, anchor: usize, mode: ExcerptMode) -> String {
    let rest = text.get(anchor..).unwrap_or_default().trim();

    let excerpt = match mode {
        ExcerptMode::Tokens(limit) => first_tokens(rest, limit),
        ExcerptMode::UntilPeriod => match rest.find('.') {
            Some(index) => rest[..=index].trim().to_string(),
            // Without a period the window would be the whole document.
            None => first_tokens(rest, DEFAULT_EXCERPT_TOKENS),
        },
    };

    if excerpt.is_empty() {
        EXCERPT_UNAVAILABLE.to_string()
    } else {
        excerpt
    }
}

fn first_tokens(text: &str, limit: usize) -> String {
    tokenize(text)
        .into_iter()
        .take(limit)
        .collect::<Vec<&str>>()
        .join(" ")
}
