//! Hand-off of valid records to a publishing collaborator. The transport lives behind
//! [`PublishSink`]; this module owns the retry policy and the audit trail.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::model::DocumentRecord;
use crate::util::append_log_line;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub url: String,
    pub source_path: String,
}

impl PublishPayload {
    /// `None` when the record lacks a number or a known date.
    pub fn from_record(record: &DocumentRecord) -> Option<Self> {
        let number = record.effective_number()?;
        if record.date.is_unknown() {
            return None;
        }

        let kind = record.document_type.entity_label().to_uppercase();
        Some(Self {
            title: format!("{kind} Nº {number}"),
            kind,
            number,
            description: record.excerpt.clone(),
            date: record.date.to_string(),
            url: String::new(),
            source_path: record.source_path.display().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Ok,
    Failed(String),
}

pub trait PublishSink {
    fn publish(&mut self, payload: &PublishPayload) -> PublishOutcome;
}

/// Writes one JSON payload per line; the consumer on the other side does the posting.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PublishSink for JsonLinesSink<W> {
    fn publish(&mut self, payload: &PublishPayload) -> PublishOutcome {
        let line = match serde_json::to_string(payload) {
            Ok(line) => line,
            Err(error) => return PublishOutcome::Failed(error.to_string()),
        };

        match writeln!(self.writer, "{line}").and_then(|()| self.writer.flush()) {
            Ok(()) => PublishOutcome::Ok,
            Err(error) => PublishOutcome::Failed(error.to_string()),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishSummary {
    pub published: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct Publisher {
    max_attempts: u32,
    log_path: Option<PathBuf>,
    published: HashSet<String>,
}

impl Publisher {
    pub fn new(max_attempts: u32, log_path: Option<PathBuf>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            log_path,
            published: HashSet::new(),
        }
    }

    /// Publishes each record once. A failure stays with its record; the rest continue.
    pub fn publish_all(
        &mut self,
        sink: &mut dyn PublishSink,
        records: &[DocumentRecord],
    ) -> Result<PublishSummary> {
        let mut summary = PublishSummary::default();

        for record in records {
            let entity = record.document_type.entity_label();
            let Some(payload) = PublishPayload::from_record(record) else {
                let identifier = record
                    .effective_number()
                    .unwrap_or_else(|| record.source_path.display().to_string());
                warn!(identifier = %identifier, "record lacks number or date; not published");
                self.audit(&format!("{entity} {identifier} skipped: missing number or date."))?;
                summary.skipped += 1;
                continue;
            };

            if self.published.contains(&payload.number) {
                summary.skipped += 1;
                continue;
            }

            match self.publish_with_retry(sink, &payload) {
                PublishOutcome::Ok => {
                    info!(number = %payload.number, "published");
                    self.audit(&format!("{entity} {} published.", payload.number))?;
                    self.published.insert(payload.number);
                    summary.published += 1;
                }
                PublishOutcome::Failed(reason) => {
                    self.audit(&format!("{entity} {} failed: {reason}.", payload.number))?;
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    fn publish_with_retry(
        &self,
        sink: &mut dyn PublishSink,
        payload: &PublishPayload,
    ) -> PublishOutcome {
        let mut last_reason = String::new();
        for attempt in 1..=self.max_attempts {
            match sink.publish(payload) {
                PublishOutcome::Ok => return PublishOutcome::Ok,
                PublishOutcome::Failed(reason) => {
                    warn!(
                        number = %payload.number,
                        attempt,
                        max_attempts = self.max_attempts,
                        reason = %reason,
                        "publish attempt failed"
                    );
                    last_reason = reason;
                }
            }
        }
        PublishOutcome::Failed(last_reason)
    }

    fn audit(&self, line: &str) -> Result<()> {
        match &self.log_path {
            Some(path) => append_log_line(path, line),
            None => Ok(()),
        }
    }
}
