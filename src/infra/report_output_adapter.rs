use crate::app::ports::EnrichOutputPort;
use crate::infra::output_file::create_truncated;
use crate::pipeline::processing::enrich::EnrichedEvent;
use std::io::{BufWriter, Write};
use std::sync::Mutex;

/// Render one event as a plain-text block terminated by `---`. Remote events
/// stop after `Valid Location`.
pub fn format_report_block(event: &EnrichedEvent) -> String {
    let end = event.end.map(|e| e.to_string()).unwrap_or_default();
    let mut block = format!(
        "UID: {}\n\
         Title: {}\n\
         Start: {}\n\
         End: {}\n\
         Description: {}\n\
         URL: {}\n\
         Original Location: {}\n\
         Cleaned Location: {}\n\
         Valid Location: {}\n",
        event.uid,
        event.title,
        event.start,
        end,
        event.description,
        event.url.as_deref().unwrap_or(""),
        event.original_location,
        event.cleaned_location,
        event.validation.validity_label,
    );

    if !event.is_remote() {
        block.push_str(&format!(
            "Geocoded Address: {}\n\
             Google Maps URL: {}\n\
             Tags: {}\n",
            event.validation.formatted_address,
            event.google_maps_url,
            event.tags.join(", "),
        ));
    }

    block.push_str("---\n");
    block
}

/// Writes the human-readable results report. The file is truncated when the
/// adapter is created and one block is appended per event.
pub struct TextReportOutputAdapter {
    file_writer: Mutex<BufWriter<std::fs::File>>,
}

impl TextReportOutputAdapter {
    pub fn new(file_path: &str) -> anyhow::Result<Self> {
        Ok(Self {
            file_writer: Mutex::new(create_truncated(file_path)?),
        })
    }
}

#[async_trait::async_trait]
impl EnrichOutputPort for TextReportOutputAdapter {
    async fn write_enriched_event(&self, event: &EnrichedEvent) -> anyhow::Result<()> {
        let block = format_report_block(event);

        let mut writer = self
            .file_writer
            .lock()
            .map_err(|_| anyhow::anyhow!("report writer lock poisoned"))?;
        writer.write_all(block.as_bytes())?;
        writer.flush()?;

        Ok(())
    }
}
