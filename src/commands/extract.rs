use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::ValueEnum;
use tracing::info;

use crate::cli::ExtractArgs;
use crate::commands::inventory::discover_pdfs;
use crate::extract::Extractor;
use crate::files::NamingStyle;
use crate::model::{ExtractPaths, ExtractRunManifest};
use crate::pipeline::{BatchConfig, BatchOrchestrator, YearRange};
use crate::text_source::SidecarTextSource;
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_path = manifest_dir(&args.output_dir).join(format!(
        "extract_run_{}.json",
        utc_compact_string(started_ts)
    ));

    info!(
        source_dir = %args.source_dir.display(),
        doc_type = args.doc_type.as_str(),
        duplicate_scope = args.duplicate_scope.as_str(),
        run_id = %run_id,
        "starting extraction"
    );

    let files = discover_pdfs(&args.source_dir)?;
    let year_range = YearRange::new(args.min_year, args.max_year)?;
    let config = BatchConfig {
        document_type: args.doc_type,
        chunk_size: args.chunk_size,
        year_range,
        duplicate_scope: args.duplicate_scope,
        naming: NamingStyle::NumberAndDate,
        output_dir: args.output_dir.clone(),
        dest_dir: Some(args.dest_dir.clone()),
    };
    let orchestrator = BatchOrchestrator::new(config, Extractor::new(&args.city)?)?;
    let source = SidecarTextSource::new(&args.source_dir, args.text_dir.as_deref());

    let report = orchestrator.run(&files, &source)?;

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_extract_command(&args),
        document_type: args.doc_type,
        year_range: (year_range.min, year_range.max),
        duplicate_scope: args.duplicate_scope.as_str().to_string(),
        paths: ExtractPaths {
            source_dir: args.source_dir.display().to_string(),
            dest_dir: args.dest_dir.display().to_string(),
            output_dir: args.output_dir.display().to_string(),
            text_dir: args.text_dir.as_ref().map(|dir| dir.display().to_string()),
        },
        counts: report.counts,
        chunks: report.chunks,
        warnings: report.warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote extract run manifest");

    Ok(())
}

pub fn manifest_dir(output_dir: &Path) -> PathBuf {
    output_dir.join("manifests")
}

fn render_extract_command(args: &ExtractArgs) -> String {
    let mut parts = vec![
        "atos extract".to_string(),
        format!("--source-dir {}", args.source_dir.display()),
        format!("--dest-dir {}", args.dest_dir.display()),
        format!("--output-dir {}", args.output_dir.display()),
        format!("--doc-type {}", value_name(&args.doc_type)),
        format!("--min-year {}", args.min_year),
        format!("--max-year {}", args.max_year),
        format!("--chunk-size {}", args.chunk_size),
        format!("--duplicate-scope {}", value_name(&args.duplicate_scope)),
        format!("--city '{}'", args.city),
    ];
    if let Some(text_dir) = &args.text_dir {
        parts.push(format!("--text-dir {}", text_dir.display()));
    }
    parts.join(" ")
}

fn value_name<T: ValueEnum>(value: &T) -> String {
    value
        .to_possible_value()
        .map(|possible| possible.get_name().to_string())
        .unwrap_or_default()
}
