use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::extract::DEFAULT_CITY;
use crate::files::NamingStyle;
use crate::model::DocumentType;
use crate::pipeline::{DEFAULT_CHUNK_SIZE, DuplicateScope};
use crate::publish::DEFAULT_MAX_ATTEMPTS;

#[derive(Parser, Debug)]
#[command(
    name = "atos",
    version,
    about = "Metadata extraction and filing for OCR'd municipal acts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Extract(ExtractArgs),
    Rename(RenameArgs),
    Publish(PublishArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long)]
    pub source_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub source_dir: PathBuf,

    #[arg(long)]
    pub dest_dir: PathBuf,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Directory holding `<stem>.txt` OCR output; defaults to beside each PDF.
    #[arg(long)]
    pub text_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = DocumentType::Decree)]
    pub doc_type: DocumentType,

    #[arg(long, default_value_t = 2022)]
    pub min_year: u16,

    #[arg(long, default_value_t = 2025)]
    pub max_year: u16,

    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    #[arg(long, value_enum, default_value_t = DuplicateScope::Run)]
    pub duplicate_scope: DuplicateScope,

    #[arg(long, default_value = DEFAULT_CITY)]
    pub city: String,
}

#[derive(Args, Debug, Clone)]
pub struct RenameArgs {
    #[arg(long)]
    pub records: PathBuf,

    /// Defaults to `<records stem>_atualizado.txt` next to the input.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = DocumentType::Ordinance)]
    pub doc_type: DocumentType,

    #[arg(long, value_enum, default_value_t = NamingStyle::NumberOnly)]
    pub naming: NamingStyle,
}

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    #[arg(long)]
    pub records: PathBuf,

    #[arg(long, value_enum, default_value_t = DocumentType::Ordinance)]
    pub doc_type: DocumentType,

    /// JSON-lines file receiving one payload per record; stdout when omitted.
    #[arg(long)]
    pub sink: Option<PathBuf>,

    #[arg(long)]
    pub log_path: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}
