use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::RenameArgs;
use crate::files::{NamingStyle, RenameOutcome, rename_to_canonical};
use crate::model::DocumentRecord;
use crate::records::{LabelSchema, RecordCodec};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenameSummary {
    pub renamed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn run(args: RenameArgs) -> Result<()> {
    let codec = RecordCodec::new(LabelSchema::for_type(args.doc_type))?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.records));

    let mut records = codec.read_file(&args.records)?;
    info!(path = %args.records.display(), records = records.len(), "loaded records");

    let summary = rename_records(&mut records, args.naming);
    codec.write_file(&output, &records)?;

    info!(
        path = %output.display(),
        renamed = summary.renamed,
        unchanged = summary.unchanged,
        skipped = summary.skipped,
        failed = summary.failed,
        "wrote updated records"
    );
    Ok(())
}

/// Renames every record's file; records keep their original path on any failure.
pub fn rename_records(records: &mut [DocumentRecord], naming: NamingStyle) -> RenameSummary {
    let mut summary = RenameSummary::default();
    for record in records.iter_mut() {
        match rename_to_canonical(record, naming) {
            RenameOutcome::Renamed { .. } => summary.renamed += 1,
            RenameOutcome::AlreadyCanonical => summary.unchanged += 1,
            RenameOutcome::Skipped(reason) => {
                warn!(path = %record.source_path.display(), reason, "rename skipped");
                summary.skipped += 1;
            }
            RenameOutcome::Failed(_) => summary.failed += 1,
        }
    }
    summary
}

fn default_output_path(records: &Path) -> PathBuf {
    let stem = records
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("resultado_ocr");
    records.with_file_name(format!("{stem}_atualizado.txt"))
}
