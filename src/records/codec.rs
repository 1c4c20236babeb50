use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::schema::{FieldKind, LabelSchema, TextJoin};
use crate::extract::DateNormalizer;
use crate::model::{DocumentDate, DocumentRecord, EXCERPT_UNAVAILABLE};
use crate::util::ensure_directory;

pub const DELIMITER_WIDTH: usize = 50;
pub const NOT_AVAILABLE: &str = "N/A";
/// Older stores wrote a missing number as `None`.
const LEGACY_MISSING: &str = "None";
const MIN_BLOCK_LINES: usize = 3;

/// Reads and writes the `=`-delimited record store using one [`LabelSchema`].
#[derive(Debug)]
pub struct RecordCodec {
    schema: LabelSchema,
    delimiter: Regex,
    normalizer: DateNormalizer,
}

impl RecordCodec {
    pub fn new(schema: LabelSchema) -> Result<Self> {
        Ok(Self {
            schema,
            delimiter: Regex::new(r"(?m)^[ \t]*={3,}[ \t\r]*$")
                .context("failed to compile record delimiter regex")?,
            normalizer: DateNormalizer::new()?,
        })
    }

    pub fn serialize(&self, records: &[DocumentRecord]) -> String {
        let delimiter = "=".repeat(DELIMITER_WIDTH);
        let mut out = String::new();

        for record in records {
            out.push_str(&delimiter);
            out.push('\n');

            for field in &self.schema.fields {
                let value = match field.kind {
                    FieldKind::SourcePath => record.source_path.display().to_string(),
                    FieldKind::Number => record
                        .effective_number()
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    FieldKind::Date => record.date.to_string(),
                    FieldKind::Excerpt => record.excerpt.trim().to_string(),
                };
                out.push_str(&format!("{}: {}\n", field.label, value));
            }

            if self.schema.excerpt_is_body() {
                out.push('\n');
                out.push_str(record.excerpt.trim());
                out.push('\n');
            }
            out.push('\n');
        }

        out
    }

    /// Parses every block; blocks shorter than the three header lines are dropped.
    pub fn parse(&self, content: &str) -> Vec<DocumentRecord> {
        self.delimiter
            .split(content)
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .filter_map(|block| self.parse_block(block))
            .collect()
    }

    fn parse_block(&self, block: &str) -> Option<DocumentRecord> {
        let lines = block.lines().collect::<Vec<&str>>();
        if lines.len() < MIN_BLOCK_LINES {
            debug!(lines = lines.len(), "skipping short record block");
            return None;
        }

        let mut path = None;
        let mut number = None;
        let mut date = None;
        let mut labeled_excerpt = None;
        let mut free_lines = Vec::new();

        for line in lines {
            let labeled = line.split_once(':').and_then(|(label, value)| {
                self.schema
                    .classify(label)
                    .map(|kind| (kind, value.trim().to_string()))
            });

            let slot = match labeled {
                Some((FieldKind::SourcePath, value)) if path.is_none() => (&mut path, value),
                Some((FieldKind::Number, value)) if number.is_none() => (&mut number, value),
                Some((FieldKind::Date, value)) if date.is_none() => (&mut date, value),
                Some((FieldKind::Excerpt, value)) if labeled_excerpt.is_none() => {
                    (&mut labeled_excerpt, value)
                }
                _ => {
                    free_lines.push(line);
                    continue;
                }
            };
            *slot.0 = Some(slot.1);
        }

        let free_text = self.join_free_text(&free_lines);
        let excerpt = match labeled_excerpt {
            Some(value) if free_text.is_empty() => value,
            Some(value) => self.join_free_text(&[value.as_str(), free_text.as_str()]),
            None => free_text,
        };

        Some(DocumentRecord {
            number: number.filter(|value| {
                !value.is_empty() && value != NOT_AVAILABLE && value != LEGACY_MISSING
            }),
            date: date
                .map(|value| self.parse_date(&value))
                .unwrap_or(DocumentDate::Unknown),
            excerpt: if excerpt.is_empty() {
                EXCERPT_UNAVAILABLE.to_string()
            } else {
                excerpt
            },
            ..DocumentRecord::new(
                PathBuf::from(path.unwrap_or_default()),
                self.schema.document_type,
            )
        })
    }

    fn join_free_text(&self, lines: &[&str]) -> String {
        match self.schema.text_join {
            TextJoin::Newline => lines
                .iter()
                .map(|line| line.trim_end())
                .collect::<Vec<&str>>()
                .join("\n")
                .trim()
                .to_string(),
            TextJoin::Space => lines
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<&str>>()
                .join(" "),
        }
    }

    /// Stored dates are ISO; stages that kept the original phrase are normalized here.
    fn parse_date(&self, value: &str) -> DocumentDate {
        value
            .parse::<DocumentDate>()
            .unwrap_or_else(|_| self.normalizer.normalize(Some(value)))
    }

    pub fn write_file(&self, path: &Path, records: &[DocumentRecord]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            ensure_directory(parent)?;
        }

        fs::write(path, self.serialize(records))
            .with_context(|| format!("failed to write record file: {}", path.display()))?;
        debug!(path = %path.display(), records = records.len(), schema = %self.schema.name, "wrote records");
        Ok(())
    }

    pub fn read_file(&self, path: &Path) -> Result<Vec<DocumentRecord>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read record file: {}", path.display()))?;
        Ok(self.parse(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentType;

    fn codec(document_type: DocumentType) -> RecordCodec {
        RecordCodec::new(LabelSchema::for_type(document_type)).unwrap()
    }

    fn record(
        document_type: DocumentType,
        path: &str,
        number: Option<&str>,
        date: &str,
        excerpt: &str,
    ) -> DocumentRecord {
        DocumentRecord {
            number: number.map(ToOwned::to_owned),
            date: date.parse().unwrap(),
            excerpt: excerpt.to_string(),
            ..DocumentRecord::new(PathBuf::from(path), document_type)
        }
    }

    fn sample(document_type: DocumentType) -> Vec<DocumentRecord> {
        let mut suffixed = record(
            document_type,
            "/arquivos/b.pdf",
            Some("10"),
            "2023-05-20",
            "Nomeia servidor para o cargo .",
        );
        suffixed.disambiguation_suffix = Some(2);

        vec![
            record(
                document_type,
                "/arquivos/6655-2022-01-04.pdf",
                Some("6.655"),
                "2022-01-04",
                "Dispõe sobre a organização administrativa",
            ),
            suffixed,
            record(
                document_type,
                "/arquivos/sem numero.pdf",
                None,
                "0000-00-00",
                EXCERPT_UNAVAILABLE,
            ),
        ]
    }

    /// Compares identifiers through `effective_number()`: the store keeps the suffix inside
    /// the number, so `disambiguation_suffix` itself is not restored on read.
    fn assert_same_effective_fields(parsed: &[DocumentRecord], original: &[DocumentRecord]) {
        assert_eq!(parsed.len(), original.len());
        for (parsed, original) in parsed.iter().zip(original) {
            assert_eq!(parsed.source_path, original.source_path);
            assert_eq!(parsed.document_type, original.document_type);
            assert_eq!(parsed.effective_number(), original.effective_number());
            assert_eq!(parsed.date, original.date);
            assert_eq!(parsed.excerpt, original.excerpt.trim());
        }
    }

    #[test]
    fn round_trip_preserves_effective_identifier_and_fields_for_every_schema() {
        for document_type in [
            DocumentType::Decree,
            DocumentType::ComplementaryLaw,
            DocumentType::Ordinance,
            DocumentType::Generic,
        ] {
            let codec = codec(document_type);
            let records = sample(document_type);
            let parsed = codec.parse(&codec.serialize(&records));
            assert_same_effective_fields(&parsed, &records);
        }
    }

    #[test]
    fn round_trip_survives_repeated_passes() {
        let codec = codec(DocumentType::Ordinance);
        let records = sample(DocumentType::Ordinance);

        let first = codec.serialize(&records);
        let second = codec.serialize(&codec.parse(&first));
        let third = codec.serialize(&codec.parse(&second));

        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn multi_line_excerpt_keeps_embedded_newlines() {
        for document_type in [DocumentType::Ordinance, DocumentType::Decree] {
            let codec = codec(document_type);
            let records = vec![record(
                document_type,
                "/a.pdf",
                Some("1"),
                "2024-02-01",
                "Primeira linha\nsegunda linha\n\nterceira linha.",
            )];
            let parsed = codec.parse(&codec.serialize(&records));
            assert_eq!(parsed[0].excerpt, records[0].excerpt);
        }
    }

    #[test]
    fn decree_layout_matches_store_format() {
        let codec = codec(DocumentType::Decree);
        let text = codec.serialize(&sample(DocumentType::Decree)[..1]);

        let expected = format!(
            "{}\nArquivo: /arquivos/6655-2022-01-04.pdf\nNúmero do Decreto: 6.655\nData: 2022-01-04\nTrecho capturado: Dispõe sobre a organização administrativa\n\n",
            "=".repeat(50)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn ordinance_layout_writes_body_after_blank_line() {
        let codec = codec(DocumentType::Ordinance);
        let text = codec.serialize(&sample(DocumentType::Ordinance)[1..2]);

        assert!(text.contains("Número da Portaria: 10-2\nData da Portaria: 2023-05-20\n\nNomeia servidor"));
    }

    #[test]
    fn short_blocks_are_dropped_silently() {
        let content = format!(
            "{0}\nArquivo: /a.pdf\nNúmero da Portaria: 1\n{0}\nArquivo: /b.pdf\nNúmero da Portaria: 2\nData da Portaria: 2024-01-02\n\ntexto.\n{0}\n",
            "=".repeat(50)
        );
        let parsed = codec(DocumentType::Ordinance).parse(&content);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].number.as_deref(), Some("2"));
        assert_eq!(parsed[0].excerpt, "texto.");
    }

    #[test]
    fn short_delimiters_and_legacy_phrase_dates_are_accepted() {
        let content = "===\nArquivo: /a.pdf\nNúmero da Portaria: 12/2024\nData da Portaria: 26 de janeiro de 2024\n\nResolve.\n=====\n";
        let parsed = codec(DocumentType::Ordinance).parse(content);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].date.to_string(), "2024-01-26");
        assert_eq!(parsed[0].number.as_deref(), Some("12/2024"));
    }

    #[test]
    fn not_available_number_parses_as_missing() {
        let codec = codec(DocumentType::Decree);
        let content = format!(
            "{}\nArquivo: /x.pdf\nNúmero do Decreto: N/A\nData: 0000-00-00\nTrecho capturado: algo\n",
            "=".repeat(50)
        );
        let parsed = codec.parse(&content);

        assert_eq!(parsed[0].number, None);
        assert!(parsed[0].date.is_unknown());
    }

    #[test]
    fn suffix_is_folded_into_number_on_read() {
        let codec = codec(DocumentType::Ordinance);
        let parsed = codec.parse(&codec.serialize(&sample(DocumentType::Ordinance)[1..2]));

        assert_eq!(parsed[0].number.as_deref(), Some("10-2"));
        assert_eq!(parsed[0].disambiguation_suffix, None);
    }

    #[test]
    fn legacy_none_number_parses_as_missing() {
        let content = format!(
            "{}\nArquivo: /x.pdf\nNúmero da Portaria: None\nData da Portaria: None\n\nSem cabeçalho.\n",
            "=".repeat(50)
        );
        let parsed = codec(DocumentType::Ordinance).parse(&content);

        assert_eq!(parsed[0].number, None);
        assert!(parsed[0].date.is_unknown());
    }

    #[test]
    fn files_written_with_one_schema_are_readable_with_another() {
        let writer = codec(DocumentType::Generic);
        let records = sample(DocumentType::Generic);
        let text = writer.serialize(&records);

        let reader = codec(DocumentType::Decree);
        let parsed = reader.parse(&text);
        assert_eq!(parsed.len(), records.len());
        assert_eq!(parsed[0].number.as_deref(), Some("6.655"));
        assert_eq!(parsed[1].number.as_deref(), Some("10-2"));
        assert_eq!(parsed[0].excerpt, records[0].excerpt);
    }

    #[test]
    fn space_join_flattens_body_lines() {
        let schema = LabelSchema::for_type(DocumentType::Ordinance).with_text_join(TextJoin::Space);
        let codec = RecordCodec::new(schema).unwrap();
        let content = "=====\nArquivo: /a.pdf\nNúmero da Portaria: 3\nData da Portaria: 2024-03-03\n\n  linha um\nlinha dois  \n";

        let parsed = codec.parse(content);
        assert_eq!(parsed[0].excerpt, "linha um linha dois");
    }

    #[test]
    fn file_helpers_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("resultado_ocr.txt");
        let codec = codec(DocumentType::Decree);
        let records = sample(DocumentType::Decree);

        codec.write_file(&path, &records).unwrap();
        let parsed = codec.read_file(&path).unwrap();
        assert_same_effective_fields(&parsed, &records);
    }

    #[test]
    fn reading_missing_file_reports_path() {
        let error = codec(DocumentType::Decree)
            .read_file(Path::new("/nonexistent/resultado.txt"))
            .unwrap_err();
        assert!(error.to_string().contains("/nonexistent/resultado.txt"));
    }
}
