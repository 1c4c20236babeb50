//! Seam to the OCR collaborator. The core only consumes `{ path, text }` pairs; how the
//! text was produced is outside this crate.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::OcrText;

pub trait TextSource {
    fn load(&self, pdf_path: &Path) -> Result<OcrText>;
}

/// Reads OCR output stored as `<stem>.txt`, either beside the PDF or inside a mirror
/// directory that repeats the source tree layout.
#[derive(Debug, Clone)]
pub struct SidecarTextSource {
    source_root: PathBuf,
    text_root: Option<PathBuf>,
}

impl SidecarTextSource {
    pub fn new(source_root: &Path, text_root: Option<&Path>) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            text_root: text_root.map(Path::to_path_buf),
        }
    }

    pub fn text_path(&self, pdf_path: &Path) -> PathBuf {
        let sidecar = pdf_path.with_extension("txt");
        match &self.text_root {
            Some(text_root) => match sidecar.strip_prefix(&self.source_root) {
                Ok(relative) => text_root.join(relative),
                Err(_) => text_root.join(sidecar.file_name().unwrap_or_default()),
            },
            None => sidecar,
        }
    }
}

impl TextSource for SidecarTextSource {
    fn load(&self, pdf_path: &Path) -> Result<OcrText> {
        let text_path = self.text_path(pdf_path);
        let raw = fs::read(&text_path)
            .with_context(|| format!("failed to read OCR text: {}", text_path.display()))?;

        Ok(OcrText {
            path: pdf_path.to_path_buf(),
            text: String::from_utf8_lossy(&raw).replace('\u{0000}', ""),
        })
    }
}
