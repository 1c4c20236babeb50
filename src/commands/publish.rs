use std::fs::File;
use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::PublishArgs;
use crate::publish::{JsonLinesSink, PublishSink, Publisher};
use crate::records::{LabelSchema, RecordCodec, TextJoin};

pub fn run(args: PublishArgs) -> Result<()> {
    // Descriptions go out as a single line.
    let schema = LabelSchema::for_type(args.doc_type).with_text_join(TextJoin::Space);
    let codec = RecordCodec::new(schema)?;
    let records = codec.read_file(&args.records)?;
    info!(path = %args.records.display(), records = records.len(), "loaded records");

    let mut sink: Box<dyn PublishSink> = match &args.sink {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create sink file: {}", path.display()))?;
            Box::new(JsonLinesSink::new(BufWriter::new(file)))
        }
        None => Box::new(JsonLinesSink::new(io::stdout().lock())),
    };

    let mut publisher = Publisher::new(args.max_attempts, args.log_path.clone());
    let summary = publisher.publish_all(sink.as_mut(), &records)?;

    info!(
        published = summary.published,
        failed = summary.failed,
        skipped = summary.skipped,
        "publish completed"
    );
    Ok(())
}
