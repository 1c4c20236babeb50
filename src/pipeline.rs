//! Chunked batch orchestration: extract, disambiguate, accept, rename, move and persist.

use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::extract::{DuplicateResolver, Extractor, sort_by_effective_number};
use crate::files::{MoveOutcome, NamingStyle, RenameOutcome, move_to_directory, rename_to_canonical};
use crate::model::{ChunkOutput, DocumentRecord, DocumentType, ExtractCounts, OcrText};
use crate::records::{LabelSchema, RecordCodec};
use crate::text_source::TextSource;
use crate::util::ensure_directory;

pub const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DuplicateScope {
    /// Every file discovered in the run is one batch.
    Run,
    /// Each chunk is its own batch.
    Chunk,
}

impl DuplicateScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Chunk => "chunk",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct YearRange {
    pub min: u16,
    pub max: u16,
}

impl YearRange {
    pub fn new(min: u16, max: u16) -> Result<Self> {
        if min > max {
            bail!("invalid year range: {min} > {max}");
        }
        Ok(Self { min, max })
    }

    pub fn contains(self, year: u16) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub document_type: DocumentType,
    pub chunk_size: usize,
    pub year_range: YearRange,
    pub duplicate_scope: DuplicateScope,
    pub naming: NamingStyle,
    pub output_dir: PathBuf,
    pub dest_dir: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub counts: ExtractCounts,
    pub chunks: Vec<ChunkOutput>,
    pub warnings: Vec<String>,
    pub valid: Vec<DocumentRecord>,
    pub needs_review: Vec<DocumentRecord>,
}

/// Reason a record goes to the needs-review partition, or `Ok` when it is publishable.
pub fn acceptance(record: &DocumentRecord, years: YearRange) -> std::result::Result<(), &'static str> {
    if record.number.is_none() {
        return Err("number missing");
    }
    let Some(year) = record.date.year() else {
        return Err("date unknown");
    };
    if record.date.to_naive_date().is_none() {
        return Err("date is not a calendar date");
    }
    if !years.contains(year) {
        return Err("year out of range");
    }
    Ok(())
}

/// Half-open index ranges of at most `chunk_size` items.
pub fn chunk_ranges(total: usize, chunk_size: usize) -> Vec<Range<usize>> {
    let chunk_size = chunk_size.max(1);
    (0..total)
        .step_by(chunk_size)
        .map(|start| start..(start + chunk_size).min(total))
        .collect()
}

pub fn chunk_output_paths(output_dir: &Path, range: &Range<usize>) -> (PathBuf, PathBuf) {
    let first = range.start + 1;
    let last = range.end;
    (
        output_dir.join(format!("resultado_ocr_{first}-{last}.txt")),
        output_dir.join(format!("resultado_ocr_missing_{first}-{last}.txt")),
    )
}

pub struct BatchOrchestrator {
    config: BatchConfig,
    extractor: Extractor,
    codec: RecordCodec,
}

impl BatchOrchestrator {
    pub fn new(config: BatchConfig, extractor: Extractor) -> Result<Self> {
        if config.chunk_size == 0 {
            bail!("chunk size must be greater than 0");
        }
        let codec = RecordCodec::new(LabelSchema::for_type(config.document_type))?;
        Ok(Self {
            config,
            extractor,
            codec,
        })
    }

    /// Processes `files` in scan order, one chunk at a time: each chunk is extracted,
    /// disambiguated, filed and written before the next one starts, so a crash only loses
    /// the chunk in flight. Only unwritable output or destination directories abort the
    /// run; every per-file problem is counted and logged.
    ///
    /// With [`DuplicateScope::Run`] one resolver spans every chunk. When a repeat turns a
    /// record of an already written chunk into `-1`, that record is renamed again and its
    /// chunk output is rewritten.
    pub fn run(&self, files: &[PathBuf], source: &dyn TextSource) -> Result<BatchReport> {
        ensure_directory(&self.config.output_dir)?;
        if let Some(dest_dir) = &self.config.dest_dir {
            ensure_directory(dest_dir)?;
        }

        let ranges = chunk_ranges(files.len(), self.config.chunk_size);
        let mut report = BatchReport::default();
        report.counts.discovered_count = files.len();
        report.counts.chunk_count = ranges.len();

        let mut records = Vec::with_capacity(files.len());
        let mut run_resolver = DuplicateResolver::new();

        for range in &ranges {
            info!(
                first = range.start + 1,
                last = range.end,
                total = files.len(),
                "extracting chunk"
            );
            for path in &files[range.clone()] {
                records.push(self.extract_one(path, source, &mut report));
            }

            match self.config.duplicate_scope {
                DuplicateScope::Chunk => {
                    report.counts.duplicate_count +=
                        DuplicateResolver::new().resolve_all(&mut records[range.clone()]);
                }
                DuplicateScope::Run => {
                    for index in range.clone() {
                        let Some(repeat) = run_resolver.assign(&mut records, index) else {
                            continue;
                        };
                        report.counts.duplicate_count += 1;

                        // A first occurrence inside the current chunk is not written yet.
                        let Some(first) = repeat
                            .rewritten_first
                            .filter(|first| *first < range.start)
                        else {
                            continue;
                        };
                        let written = ranges.iter().find(|written| written.contains(&first));
                        if let Some(written) = written {
                            self.refile_written(&mut records, first, written, &mut report)?;
                        }
                    }
                }
            }

            self.finish_chunk(&mut records[range.clone()], range, &mut report)?;
        }

        for record in records {
            if acceptance(&record, self.config.year_range).is_ok() {
                report.valid.push(record);
            } else {
                report.needs_review.push(record);
            }
        }

        info!(
            valid = report.counts.valid_count,
            needs_review = report.counts.needs_review_count,
            duplicates = report.counts.duplicate_count,
            renamed = report.counts.renamed_count,
            moved = report.counts.moved_count,
            "batch completed"
        );
        Ok(report)
    }

    fn extract_one(
        &self,
        path: &Path,
        source: &dyn TextSource,
        report: &mut BatchReport,
    ) -> DocumentRecord {
        let text = match source.load(path) {
            Ok(text) => text,
            Err(error) => {
                warn!(path = %path.display(), error = %format!("{error:#}"), "text unavailable");
                report.counts.text_failed_count += 1;
                report
                    .warnings
                    .push(format!("text unavailable for {}: {error:#}", path.display()));
                OcrText {
                    path: path.to_path_buf(),
                    text: String::new(),
                }
            }
        };

        self.extractor.extract(&text, self.config.document_type)
    }

    fn finish_chunk(
        &self,
        chunk: &mut [DocumentRecord],
        range: &Range<usize>,
        report: &mut BatchReport,
    ) -> Result<()> {
        for record in chunk.iter_mut() {
            if let Err(reason) = acceptance(record, self.config.year_range) {
                debug!(path = %record.source_path.display(), reason, "needs review");
                report.counts.needs_review_count += 1;
                continue;
            }
            report.counts.valid_count += 1;

            self.rename_record(record, report);

            if let Some(dest_dir) = &self.config.dest_dir {
                match move_to_directory(record, dest_dir) {
                    MoveOutcome::Moved { .. } => report.counts.moved_count += 1,
                    MoveOutcome::Failed(reason) => {
                        report.counts.move_failed_count += 1;
                        report.warnings.push(format!(
                            "move failed for {}: {reason}",
                            record.source_path.display()
                        ));
                    }
                }
            }
        }

        let output = self.write_chunk(chunk, range)?;
        report.chunks.push(output);
        Ok(())
    }

    /// Renames the file of a record from a written chunk that just became `-1`, then
    /// rewrites that chunk's output so it carries the new identifier and path.
    fn refile_written(
        &self,
        records: &mut [DocumentRecord],
        index: usize,
        range: &Range<usize>,
        report: &mut BatchReport,
    ) -> Result<()> {
        if let Some(record) = records.get_mut(index) {
            if acceptance(record, self.config.year_range).is_ok() {
                self.rename_record(record, report);
            }
        }

        self.write_chunk(&records[range.clone()], range)?;
        info!(
            first = range.start + 1,
            last = range.end,
            "rewrote chunk after retroactive suffix"
        );
        Ok(())
    }

    fn rename_record(&self, record: &mut DocumentRecord, report: &mut BatchReport) {
        match rename_to_canonical(record, self.config.naming) {
            RenameOutcome::Renamed { .. } => report.counts.renamed_count += 1,
            RenameOutcome::AlreadyCanonical | RenameOutcome::Skipped(_) => {}
            RenameOutcome::Failed(reason) => {
                report.counts.rename_failed_count += 1;
                report.warnings.push(format!(
                    "rename failed for {}: {reason}",
                    record.source_path.display()
                ));
            }
        }
    }

    /// Writes both partitions of a chunk, each sorted by effective identifier.
    fn write_chunk(&self, chunk: &[DocumentRecord], range: &Range<usize>) -> Result<ChunkOutput> {
        let (mut valid, mut needs_review): (Vec<DocumentRecord>, Vec<DocumentRecord>) = chunk
            .iter()
            .cloned()
            .partition(|record| acceptance(record, self.config.year_range).is_ok());
        sort_by_effective_number(&mut valid);
        sort_by_effective_number(&mut needs_review);

        let (valid_path, needs_review_path) = chunk_output_paths(&self.config.output_dir, range);
        self.codec.write_file(&valid_path, &valid)?;
        self.codec.write_file(&needs_review_path, &needs_review)?;

        info!(
            first = range.start + 1,
            last = range.end,
            valid = valid.len(),
            needs_review = needs_review.len(),
            path = %valid_path.display(),
            "chunk persisted"
        );

        Ok(ChunkOutput {
            first: range.start + 1,
            last: range.end,
            valid_path: valid_path.display().to_string(),
            needs_review_path: needs_review_path.display().to_string(),
        })
    }
}
