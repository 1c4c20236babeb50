use anyhow::{Context, Result};
use regex::Regex;

use crate::model::DocumentType;

/// Ordinal marker after the document kind: `N`, `N.`, `Nº`, `N.º`, `N°`, `No.`
const ORDINAL: &str = r"N\.?\s*[º°o]?\.?\s*";
const FULL_DATE: &str = r"\d{1,2}\s+DE\s+\w+\s+DE\s+\d{4}";
const OPTIONAL_YEAR_DATE: &str = r"\d{1,2}\s+DE\s+\w+(?:\s+DE\s+\d{4})?";

pub const DEFAULT_CITY: &str = "Aracaju";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderMatch {
    pub number: Option<String>,
    pub date_phrase: Option<String>,
    /// Byte offset right after the recognized header; `0` when nothing matched.
    pub match_end: usize,
    pub pattern: Option<&'static str>,
}

#[derive(Debug)]
struct HeaderPattern {
    name: &'static str,
    regex: Regex,
    /// Rest-of-line captures keep inner punctuation untouched.
    trim_number: bool,
}

impl HeaderPattern {
    fn new(name: &'static str, pattern: &str, trim_number: bool) -> Result<Self> {
        Ok(Self {
            name,
            regex: Regex::new(&format!("(?i){pattern}"))
                .with_context(|| format!("failed to compile header regex '{name}'"))?,
            trim_number,
        })
    }
}

#[derive(Debug)]
pub struct HeaderMatcher {
    decree: Vec<HeaderPattern>,
    complementary_law: Vec<HeaderPattern>,
    ordinance: Vec<HeaderPattern>,
    generic: Vec<HeaderPattern>,
    standalone_date: Regex,
    year_clause: Regex,
    city_date: Regex,
}

impl HeaderMatcher {
    pub fn new(city: &str) -> Result<Self> {
        let decree = vec![
            HeaderPattern::new(
                "decree_full_date",
                &format!(r"DECRETO\s+{ORDINAL}(\d[\d.,]*)\s*,?\s*DE\s+({FULL_DATE})"),
                true,
            )?,
            HeaderPattern::new(
                "decree",
                &format!(r"DECRETO\s+{ORDINAL}(\d[\d.,]*)(?:\s*,?\s*DE\s+({OPTIONAL_YEAR_DATE}))?"),
                true,
            )?,
        ];

        let complementary_law = vec![
            HeaderPattern::new(
                "complementary_law_full_date",
                &format!(
                    r"LEI\s+COMPLEMENTAR\s+{ORDINAL}(\d[\d.,]*)\s*,?\s*DE\s+({FULL_DATE})"
                ),
                true,
            )?,
            HeaderPattern::new(
                "complementary_law",
                &format!(
                    r"LEI\s+COMPLEMENTAR\s+{ORDINAL}(\d[\d.,]*)(?:\s*,?\s*DE\s+({OPTIONAL_YEAR_DATE}))?"
                ),
                true,
            )?,
        ];

        let ordinance = vec![
            HeaderPattern::new(
                "ordinance_number",
                &format!(r"PORTARIA\s+{ORDINAL}(\d[\d.,/]*)"),
                true,
            )?,
            HeaderPattern::new(
                "ordinance_line",
                r"PORTARIA\s+N\.?\s*[º°]\.?\s*([^\r\n]+)",
                false,
            )?,
        ];

        let generic = vec![HeaderPattern::new(
            "generic",
            &format!(
                r"(?:DECRETO|LEI\s+COMPLEMENTAR|LEI|PORTARIA|RESOLU[ÇC][ÃA]O)\s+{ORDINAL}(\d[\d.,/]*)(?:\s*,?\s*DE\s+({OPTIONAL_YEAR_DATE}))?"
            ),
            true,
        )?];

        Ok(Self {
            decree,
            complementary_law,
            ordinance,
            generic,
            standalone_date: Regex::new(r"(?i)(?:De\s+)?(\d{1,2}\s+de\s+\w+\s+de\s+\d{4})")
                .context("failed to compile standalone date regex")?,
            year_clause: Regex::new(r"(?i)de\s+\d{4}").context("failed to compile year regex")?,
            city_date: Regex::new(&format!(
                r"(?i){},\s*(\d{{1,2}}\s+de\s+\w+\s+de\s+\d{{4}})",
                regex::escape(city)
            ))
            .context("failed to compile city date regex")?,
        })
    }

    fn patterns(&self, document_type: DocumentType) -> &[HeaderPattern] {
        match document_type {
            DocumentType::Decree => &self.decree,
            DocumentType::ComplementaryLaw => &self.complementary_law,
            DocumentType::Ordinance => &self.ordinance,
            DocumentType::Generic => &self.generic,
        }
    }

    /// Locates the number and date phrase for `document_type`. A miss is a normal
    /// outcome and yields an empty [`HeaderMatch`].
    ///
    /// The header is the earliest match of any of the type's patterns, so acts cited in
    /// the body never shadow the document's own header. When several patterns match at
    /// that position the most specific one wins.
    pub fn find(&self, text: &str, document_type: DocumentType) -> HeaderMatch {
        let Some((pattern, captures, whole)) = self
            .patterns(document_type)
            .iter()
            .filter_map(|pattern| {
                let captures = pattern.regex.captures(text)?;
                let whole = captures.get(0)?;
                Some((pattern, captures, whole))
            })
            .min_by_key(|(_, _, whole)| whole.start())
        else {
            return HeaderMatch::default();
        };

        let number = captures
            .get(1)
            .map(|value| clean_number(value.as_str(), pattern.trim_number))
            .filter(|value| !value.is_empty());

        if document_type == DocumentType::Ordinance {
            // The ordinance date is a separate clause; the excerpt starts after it.
            let tail = &text[whole.start()..];
            return match self.standalone_date.captures(tail) {
                Some(date_caps) => HeaderMatch {
                    number,
                    date_phrase: date_caps.get(1).map(|value| value.as_str().trim().to_string()),
                    match_end: whole.start()
                        + date_caps.get(0).map(|value| value.end()).unwrap_or_default(),
                    pattern: Some(pattern.name),
                },
                None => HeaderMatch {
                    number,
                    date_phrase: None,
                    match_end: whole.end(),
                    pattern: Some(pattern.name),
                },
            };
        }

        let date_phrase = captures
            .get(2)
            .map(|value| value.as_str().trim().to_string())
            .filter(|value| !value.is_empty())
            .and_then(|phrase| self.complete_year(text, phrase));

        HeaderMatch {
            number,
            date_phrase,
            match_end: whole.end(),
            pattern: Some(pattern.name),
        }
    }

    /// A header date without a year is replaced by the city-dated signature line, if any.
    fn complete_year(&self, text: &str, phrase: String) -> Option<String> {
        if self.year_clause.is_match(&phrase) {
            return Some(phrase);
        }

        self.city_date
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().trim().to_string())
    }
}

fn clean_number(raw: &str, trim_punctuation: bool) -> String {
    let trimmed = raw.trim();
    if trim_punctuation {
        trimmed.trim_end_matches(['.', ',', '/']).to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> HeaderMatcher {
        HeaderMatcher::new(DEFAULT_CITY).unwrap()
    }

    #[test]
    fn decree_header_with_full_date() {
        let text = "PREFEITURA\nDECRETO N.º 6.655 DE 04 DE JANEIRO DE 2022\nDispõe sobre algo.";
        let found = matcher().find(text, DocumentType::Decree);

        assert_eq!(found.number.as_deref(), Some("6.655"));
        assert_eq!(found.date_phrase.as_deref(), Some("04 DE JANEIRO DE 2022"));
        assert_eq!(&text[found.match_end..], "\nDispõe sobre algo.");
        assert_eq!(found.pattern, Some("decree_full_date"));
    }

    #[test]
    fn ordinal_marker_variants_are_tolerated() {
        let m = matcher();
        for header in [
            "DECRETO Nº 123 DE 1 DE MARÇO DE 2023",
            "DECRETO N° 123 DE 1 DE MARÇO DE 2023",
            "DECRETO N. 123 DE 1 DE MARÇO DE 2023",
            "Decreto nº 123, de 1 de março de 2023",
            "DECRETO N 123 DE 1 DE MARÇO DE 2023",
        ] {
            let found = m.find(header, DocumentType::Decree);
            assert_eq!(found.number.as_deref(), Some("123"), "{header}");
            assert!(found.date_phrase.is_some(), "{header}");
        }
    }

    #[test]
    fn yearless_header_date_uses_city_signature() {
        let text = "DECRETO N.º 6.655 DE 04 DE JANEIRO\nArt. 1º ...\nAracaju, 04 de janeiro de 2022.";
        let found = matcher().find(text, DocumentType::Decree);

        assert_eq!(found.number.as_deref(), Some("6.655"));
        assert_eq!(found.date_phrase.as_deref(), Some("04 de janeiro de 2022"));
        assert_eq!(found.pattern, Some("decree"));
    }

    #[test]
    fn yearless_header_date_without_signature_is_absent() {
        let text = "DECRETO N.º 6.655 DE 04 DE JANEIRO\nArt. 1º sem assinatura.";
        let found = matcher().find(text, DocumentType::Decree);

        assert_eq!(found.number.as_deref(), Some("6.655"));
        assert_eq!(found.date_phrase, None);
    }

    #[test]
    fn decree_without_date_clause_keeps_number() {
        let found = matcher().find("DECRETO Nº 7.001\nTexto", DocumentType::Decree);
        assert_eq!(found.number.as_deref(), Some("7.001"));
        assert_eq!(found.date_phrase, None);
    }

    #[test]
    fn complementary_law_header() {
        let text = "LEI COMPLEMENTAR N.º 193 DE 21 DE JUNHO DE 2023\nAltera dispositivos.";
        let found = matcher().find(text, DocumentType::ComplementaryLaw);

        assert_eq!(found.number.as_deref(), Some("193"));
        assert_eq!(found.date_phrase.as_deref(), Some("21 DE JUNHO DE 2023"));
        assert_eq!(found.pattern, Some("complementary_law_full_date"));
    }

    #[test]
    fn ordinance_anchor_is_end_of_date() {
        let text = "PORTARIA Nº 1.002/2024\nDe 20 de maio de 2024\nNomeia servidor. Outro texto.";
        let found = matcher().find(text, DocumentType::Ordinance);

        assert_eq!(found.number.as_deref(), Some("1.002/2024"));
        assert_eq!(found.date_phrase.as_deref(), Some("20 de maio de 2024"));
        assert_eq!(&text[found.match_end..], "\nNomeia servidor. Outro texto.");
    }

    #[test]
    fn ordinance_line_fallback_captures_rest_of_line() {
        let text = "PORTARIA Nº SEMAD-12\nsem data";
        let found = matcher().find(text, DocumentType::Ordinance);

        assert_eq!(found.number.as_deref(), Some("SEMAD-12"));
        assert_eq!(found.date_phrase, None);
        assert_eq!(found.pattern, Some("ordinance_line"));
        assert_eq!(&text[found.match_end..], "\nsem data");
    }

    #[test]
    fn generic_accepts_any_known_kind() {
        let found = matcher().find(
            "RESOLUÇÃO Nº 45 DE 2 DE ABRIL DE 2024 texto",
            DocumentType::Generic,
        );
        assert_eq!(found.number.as_deref(), Some("45"));
        assert_eq!(found.date_phrase.as_deref(), Some("2 DE ABRIL DE 2024"));
    }

    #[test]
    fn cited_decree_does_not_shadow_yearless_header() {
        let text = "DECRETO N.º 6.655 DE 04 DE JANEIRO\n\
                    Altera o Decreto nº 6.100, de 10 de março de 2021.\n\
                    Aracaju, 04 de janeiro de 2022.";
        let found = matcher().find(text, DocumentType::Decree);

        assert_eq!(found.number.as_deref(), Some("6.655"));
        assert_eq!(found.date_phrase.as_deref(), Some("04 de janeiro de 2022"));
        assert_eq!(found.pattern, Some("decree"));
        assert!(text[found.match_end..].starts_with("\nAltera o Decreto"));
    }

    #[test]
    fn full_date_pattern_still_wins_at_the_header() {
        let text = "DECRETO Nº 7 DE 1 DE MARÇO DE 2023\nRevoga o Decreto nº 2, de 3 de abril de 2020.";
        let found = matcher().find(text, DocumentType::Decree);

        assert_eq!(found.number.as_deref(), Some("7"));
        assert_eq!(found.date_phrase.as_deref(), Some("1 DE MARÇO DE 2023"));
        assert_eq!(found.pattern, Some("decree_full_date"));
    }

    #[test]
    fn cited_ordinance_does_not_shadow_non_numeric_header() {
        let text = "PORTARIA Nº SEMAD-12\nDe 20 de maio de 2024\nRevoga a Portaria nº 45/2020.";
        let found = matcher().find(text, DocumentType::Ordinance);

        assert_eq!(found.number.as_deref(), Some("SEMAD-12"));
        assert_eq!(found.date_phrase.as_deref(), Some("20 de maio de 2024"));
        assert_eq!(found.pattern, Some("ordinance_line"));
        assert_eq!(&text[found.match_end..], "\nRevoga a Portaria nº 45/2020.");
    }

    #[test]
    fn no_header_is_a_plain_miss() {
        let found = matcher().find("texto qualquer sem cabeçalho", DocumentType::Decree);
        assert_eq!(found, HeaderMatch::default());
        assert_eq!(found.match_end, 0);
    }

    #[test]
    fn trailing_punctuation_is_trimmed_from_number() {
        let found = matcher().find("DECRETO Nº 6.655, de 4 de janeiro de 2022", DocumentType::Decree);
        assert_eq!(found.number.as_deref(), Some("6.655"));
    }

    #[test]
    fn city_is_configurable() {
        let matcher = HeaderMatcher::new("São Cristóvão").unwrap();
        let text = "DECRETO Nº 10 DE 5 DE MAIO\nSão Cristóvão, 5 de maio de 2023";
        let found = matcher.find(text, DocumentType::Decree);
        assert_eq!(found.date_phrase.as_deref(), Some("5 de maio de 2023"));
    }
}
