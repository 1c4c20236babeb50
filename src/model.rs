use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_DATE: &str = "0000-00-00";
pub const EXCERPT_UNAVAILABLE: &str = "Resumo não disponível";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Decree,
    ComplementaryLaw,
    Ordinance,
    Generic,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decree => "decree",
            Self::ComplementaryLaw => "complementary_law",
            Self::Ordinance => "ordinance",
            Self::Generic => "generic",
        }
    }

    /// Human-facing entity name used in audit lines and publish titles.
    pub fn entity_label(self) -> &'static str {
        match self {
            Self::Decree => "Decreto",
            Self::ComplementaryLaw => "Lei Complementar",
            Self::Ordinance => "Portaria",
            Self::Generic => "Documento",
        }
    }
}

/// Normalized issuance date. `Unknown` is the only "no date" value and renders as
/// `0000-00-00`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum DocumentDate {
    #[default]
    Unknown,
    Ymd {
        year: u16,
        month: u8,
        day: u8,
    },
}

impl DocumentDate {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn year(&self) -> Option<u16> {
        match self {
            Self::Unknown => None,
            Self::Ymd { year, .. } => Some(*year),
        }
    }

    /// `None` for the sentinel and for triples that are not real calendar dates
    /// (month `00` from an unrecognized month name, day 31 in April, ...).
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        match *self {
            Self::Unknown => None,
            Self::Ymd { year, month, day } => {
                NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            }
        }
    }
}

impl fmt::Display for DocumentDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str(UNKNOWN_DATE),
            Self::Ymd { year, month, day } => write!(f, "{year:04}-{month:02}-{day:02}"),
        }
    }
}

impl FromStr for DocumentDate {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if value == UNKNOWN_DATE {
            return Ok(Self::Unknown);
        }

        let mut parts = value.split('-');
        let (Some(year), Some(month), Some(day), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            bail!("date is not in YYYY-MM-DD form: {value}");
        };
        if year.len() != 4 || month.len() != 2 || day.len() != 2 {
            bail!("date is not in YYYY-MM-DD form: {value}");
        }

        Ok(Self::Ymd {
            year: year
                .parse()
                .with_context(|| format!("invalid year in date: {value}"))?,
            month: month
                .parse()
                .with_context(|| format!("invalid month in date: {value}"))?,
            day: day
                .parse()
                .with_context(|| format!("invalid day in date: {value}"))?,
        })
    }
}

/// OCR output handed over by the text collaborator for one source file.
#[derive(Debug, Clone)]
pub struct OcrText {
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub source_path: PathBuf,
    pub document_type: DocumentType,
    pub number: Option<String>,
    pub date: DocumentDate,
    pub excerpt: String,
    pub disambiguation_suffix: Option<u32>,
}

impl DocumentRecord {
    pub fn new(source_path: PathBuf, document_type: DocumentType) -> Self {
        Self {
            source_path,
            document_type,
            number: None,
            date: DocumentDate::Unknown,
            excerpt: EXCERPT_UNAVAILABLE.to_string(),
            disambiguation_suffix: None,
        }
    }

    /// `number` plus the `-N` ordinal when the batch assigned one.
    pub fn effective_number(&self) -> Option<String> {
        let number = self.number.as_ref()?;
        Some(match self.disambiguation_suffix {
            Some(suffix) => format!("{number}-{suffix}"),
            None => number.clone(),
        })
    }

    pub fn sort_key(&self) -> String {
        self.effective_number().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfEntry {
    pub path: String,
    pub size_bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub pdf_count: usize,
    pub pdfs: Vec<PdfEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractPaths {
    pub source_dir: String,
    pub dest_dir: String,
    pub output_dir: String,
    pub text_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractCounts {
    pub discovered_count: usize,
    pub chunk_count: usize,
    pub valid_count: usize,
    pub needs_review_count: usize,
    pub text_failed_count: usize,
    pub duplicate_count: usize,
    pub renamed_count: usize,
    pub rename_failed_count: usize,
    pub moved_count: usize,
    pub move_failed_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkOutput {
    pub first: usize,
    pub last: usize,
    pub valid_path: String,
    pub needs_review_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub document_type: DocumentType,
    pub year_range: (u16, u16),
    pub duplicate_scope: String,
    pub paths: ExtractPaths,
    pub counts: ExtractCounts,
    pub chunks: Vec<ChunkOutput>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_date_renders_padded_and_sentinel() {
        let date = DocumentDate::Ymd {
            year: 2022,
            month: 1,
            day: 4,
        };
        assert_eq!(date.to_string(), "2022-01-04");
        assert_eq!(DocumentDate::Unknown.to_string(), UNKNOWN_DATE);
    }

    #[test]
    fn document_date_parses_iso_and_sentinel() {
        assert_eq!(
            "2024-05-20".parse::<DocumentDate>().unwrap(),
            DocumentDate::Ymd {
                year: 2024,
                month: 5,
                day: 20
            }
        );
        assert!("0000-00-00".parse::<DocumentDate>().unwrap().is_unknown());
        assert!("20 de maio de 2024".parse::<DocumentDate>().is_err());
        assert!("2024-5-20".parse::<DocumentDate>().is_err());
    }

    #[test]
    fn calendar_check_rejects_degraded_month() {
        let degraded = DocumentDate::Ymd {
            year: 2023,
            month: 0,
            day: 10,
        };
        assert!(degraded.to_naive_date().is_none());
        assert!(DocumentDate::Unknown.to_naive_date().is_none());
    }

    #[test]
    fn effective_number_appends_suffix() {
        let mut record = DocumentRecord::new(PathBuf::from("a.pdf"), DocumentType::Ordinance);
        assert_eq!(record.effective_number(), None);
        assert_eq!(record.sort_key(), "");

        record.number = Some("10".to_string());
        assert_eq!(record.effective_number().as_deref(), Some("10"));

        record.disambiguation_suffix = Some(2);
        assert_eq!(record.effective_number().as_deref(), Some("10-2"));
    }
}
