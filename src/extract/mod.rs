//! Per-document metadata extraction: header recognition, date normalization and
//! excerpt windowing, plus batch-wide duplicate number resolution.

mod date;
mod duplicates;
mod excerpt;
mod header;

use anyhow::Result;
use tracing::debug;

use crate::model::{DocumentRecord, DocumentType, OcrText};

use excerpt::{ExcerptMode, extract_excerpt};
use header::HeaderMatcher;

pub use date::DateNormalizer;
pub use duplicates::{DuplicateResolver, sort_by_effective_number};
pub use header::DEFAULT_CITY;

#[derive(Debug)]
pub struct Extractor {
    matcher: HeaderMatcher,
    normalizer: DateNormalizer,
}

impl Extractor {
    pub fn new(city: &str) -> Result<Self> {
        Ok(Self {
            matcher: HeaderMatcher::new(city)?,
            normalizer: DateNormalizer::new()?,
        })
    }

    /// Builds a record from OCR text. Misses leave `number` empty and `date` unknown.
    pub fn extract(&self, source: &OcrText, document_type: DocumentType) -> DocumentRecord {
        let header = self.matcher.find(&source.text, document_type);
        let date = self.normalizer.normalize(header.date_phrase.as_deref());
        let excerpt = extract_excerpt(
            &source.text,
            header.match_end,
            ExcerptMode::for_type(document_type),
        );

        debug!(
            path = %source.path.display(),
            pattern = header.pattern.unwrap_or("none"),
            number = header.number.as_deref().unwrap_or("N/A"),
            date = %date,
            "extracted header"
        );

        DocumentRecord {
            number: header.number,
            date,
            excerpt,
            ..DocumentRecord::new(source.path.clone(), document_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::model::{DocumentDate, EXCERPT_UNAVAILABLE};

    fn ocr(text: &str) -> OcrText {
        OcrText {
            path: PathBuf::from("/docs/scan.pdf"),
            text: text.to_string(),
        }
    }

    #[test]
    fn decree_record_is_fully_populated() {
        let extractor = Extractor::new(DEFAULT_CITY).unwrap();
        let text = "--- Página 1 ---\nPREFEITURA MUNICIPAL DE ARACAJU\n\
                    DECRETO N.º 6.655 DE 04 DE JANEIRO DE 2022\n\
                    Dispõe sobre a organização administrativa do Município e dá outras providências.";
        let record = extractor.extract(&ocr(text), DocumentType::Decree);

        assert_eq!(record.number.as_deref(), Some("6.655"));
        assert_eq!(
            record.date,
            DocumentDate::Ymd {
                year: 2022,
                month: 1,
                day: 4
            }
        );
        assert_eq!(
            record.excerpt,
            "Dispõe sobre a organização administrativa do Município e dá outras providências ."
        );
        assert_eq!(record.source_path, PathBuf::from("/docs/scan.pdf"));
        assert_eq!(record.disambiguation_suffix, None);
    }

    #[test]
    fn unmatched_text_keeps_excerpt_from_start() {
        let extractor = Extractor::new(DEFAULT_CITY).unwrap();
        let record = extractor.extract(&ocr("Ofício circular sem número"), DocumentType::Decree);

        assert_eq!(record.number, None);
        assert!(record.date.is_unknown());
        assert_eq!(record.excerpt, "Ofício circular sem número");
    }

    #[test]
    fn empty_text_yields_marker_excerpt() {
        let extractor = Extractor::new(DEFAULT_CITY).unwrap();
        let record = extractor.extract(&ocr(""), DocumentType::Ordinance);

        assert_eq!(record.number, None);
        assert_eq!(record.excerpt, EXCERPT_UNAVAILABLE);
    }

    #[test]
    fn ordinance_record_uses_sentence_window() {
        let extractor = Extractor::new(DEFAULT_CITY).unwrap();
        let text = "PORTARIA Nº 45/2024\nDe 26 de janeiro de 2024\nO SECRETÁRIO resolve nomear Fulano. Art. 2º";
        let record = extractor.extract(&ocr(text), DocumentType::Ordinance);

        assert_eq!(record.number.as_deref(), Some("45/2024"));
        assert_eq!(record.date.to_string(), "2024-01-26");
        assert_eq!(record.excerpt, "O SECRETÁRIO resolve nomear Fulano.");
    }
}
