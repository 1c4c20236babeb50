use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::extract::manifest_dir;
use crate::model::ExtractRunManifest;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifests = manifest_dir(&args.output_dir);
    info!(output_dir = %args.output_dir.display(), "status requested");

    let Some(latest) = latest_run_manifest(&manifests)? else {
        warn!(path = %manifests.display(), "no extract run manifest found");
        return Ok(());
    };

    let manifest: ExtractRunManifest = read_json(&latest)?;
    info!(
        run_id = %manifest.run_id,
        status = %manifest.status,
        started_at = %manifest.started_at,
        updated_at = %manifest.updated_at,
        document_type = manifest.document_type.as_str(),
        duplicate_scope = %manifest.duplicate_scope,
        min_year = manifest.year_range.0,
        max_year = manifest.year_range.1,
        source_dir = %manifest.paths.source_dir,
        dest_dir = %manifest.paths.dest_dir,
        "loaded extract run manifest"
    );
    info!(
        discovered = manifest.counts.discovered_count,
        chunks = manifest.counts.chunk_count,
        valid = manifest.counts.valid_count,
        needs_review = manifest.counts.needs_review_count,
        text_failed = manifest.counts.text_failed_count,
        duplicates = manifest.counts.duplicate_count,
        renamed = manifest.counts.renamed_count,
        rename_failed = manifest.counts.rename_failed_count,
        moved = manifest.counts.moved_count,
        move_failed = manifest.counts.move_failed_count,
        warnings = manifest.warnings.len(),
        "run counts"
    );
    for chunk in &manifest.chunks {
        info!(
            first = chunk.first,
            last = chunk.last,
            valid = %chunk.valid_path,
            needs_review = %chunk.needs_review_path,
            "chunk output"
        );
    }

    Ok(())
}

/// Run manifests carry a compact UTC timestamp in their name, so the lexically
/// greatest name is the newest run.
fn latest_run_manifest(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut latest = None::<PathBuf>;
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", dir.display()))?
            .path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("extract_run_") && name.ends_with(".json"))
            .unwrap_or(false);

        if is_run_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
