use crate::app::ports::EnrichOutputPort;
use crate::infra::output_file::create_truncated;
use crate::pipeline::processing::enrich::EnrichedEvent;
use std::io::{BufWriter, Write};
use std::sync::Mutex;

/// Writes enriched events as NDJSON, one object per line
pub struct NdjsonOutputAdapter {
    file_writer: Mutex<BufWriter<std::fs::File>>,
}

impl NdjsonOutputAdapter {
    pub fn new(file_path: &str) -> anyhow::Result<Self> {
        Ok(Self {
            file_writer: Mutex::new(create_truncated(file_path)?),
        })
    }
}

#[async_trait::async_trait]
impl EnrichOutputPort for NdjsonOutputAdapter {
    async fn write_enriched_event(&self, event: &EnrichedEvent) -> anyhow::Result<()> {
        let json_line = serde_json::to_string(event)?;

        let mut writer = self
            .file_writer
            .lock()
            .map_err(|_| anyhow::anyhow!("ndjson writer lock poisoned"))?;
        writeln!(writer, "{}", json_line)?;
        writer.flush()?;

        Ok(())
    }
}
