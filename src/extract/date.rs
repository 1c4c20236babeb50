use anyhow::{Context, Result};
use regex::Regex;

use crate::model::DocumentDate;

const MONTHS: [(&str, u8); 12] = [
    ("janeiro", 1),
    ("fevereiro", 2),
    ("março", 3),
    ("abril", 4),
    ("maio", 5),
    ("junho", 6),
    ("julho", 7),
    ("agosto", 8),
    ("setembro", 9),
    ("outubro", 10),
    ("novembro", 11),
    ("dezembro", 12),
];

/// Month code for a Portuguese month name, `0` when the name is not recognized.
pub fn month_code(name: &str) -> u8 {
    let lowered = name.to_lowercase();
    MONTHS
        .iter()
        .find(|(month, _)| *month == lowered)
        .map(|(_, code)| *code)
        .unwrap_or(0)
}

/// Syntactic conversion of "`<day> de <month> de <year>`" phrases. Range checks on the
/// year belong to the batch acceptance step, not here.
#[derive(Debug)]
pub struct DateNormalizer {
    phrase: Regex,
}

impl DateNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            phrase: Regex::new(r"(?i)(\d{1,2})\s+de\s+(\w+)\s+de\s+(\d{4})")
                .context("failed to compile date phrase regex")?,
        })
    }

    pub fn normalize(&self, phrase: Option<&str>) -> DocumentDate {
        let Some(phrase) = phrase.filter(|value| !value.trim().is_empty()) else {
            return DocumentDate::Unknown;
        };

        let Some(captures) = self.phrase.captures(phrase) else {
            return DocumentDate::Unknown;
        };

        let day = captures.get(1).and_then(|value| value.as_str().parse::<u8>().ok());
        let year = captures.get(3).and_then(|value| value.as_str().parse::<u16>().ok());
        let month = captures
            .get(2)
            .map(|value| month_code(value.as_str()))
            .unwrap_or(0);

        match (year, day) {
            (Some(year), Some(day)) => DocumentDate::Ymd { year, month, day },
            _ => DocumentDate::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(phrase: Option<&str>) -> String {
        DateNormalizer::new().unwrap().normalize(phrase).to_string()
    }

    #[test]
    fn pads_day_and_maps_month() {
        assert_eq!(normalize(Some("4 de janeiro de 2022")), "2022-01-04");
        assert_eq!(normalize(Some("21 DE JUNHO DE 2023")), "2023-06-21");
        assert_eq!(normalize(Some("1 de Março de 2024")), "2024-03-01");
        assert_eq!(normalize(Some("31 de dezembro de 2025")), "2025-12-31");
    }

    #[test]
    fn every_month_name_has_its_code() {
        for (index, (name, _)) in MONTHS.iter().enumerate() {
            let expected = format!("2023-{:02}-15", index + 1);
            assert_eq!(normalize(Some(&format!("15 de {name} de 2023"))), expected);
        }
    }

    #[test]
    fn unrecognized_month_degrades_to_zero() {
        assert_eq!(normalize(Some("10 de brumario de 2023")), "2023-00-10");
    }

    #[test]
    fn missing_or_unparsable_input_is_sentinel() {
        assert_eq!(normalize(None), "0000-00-00");
        assert_eq!(normalize(Some("")), "0000-00-00");
        assert_eq!(normalize(Some("04 de janeiro")), "0000-00-00");
        assert_eq!(normalize(Some("sem data")), "0000-00-00");
    }

    #[test]
    fn phrase_may_be_embedded_in_longer_text() {
        assert_eq!(
            normalize(Some("Aracaju, 20 de maio de 2024, 203º da Independência")),
            "2024-05-20"
        );
    }
}
