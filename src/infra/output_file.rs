use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Open `file_path` for a fresh run: parent directories are created and any
/// previous contents are truncated.
pub fn create_truncated(file_path: &str) -> anyhow::Result<BufWriter<File>> {
    let path = Path::new(file_path);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    info!("Creating output file: {}", file_path);

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(BufWriter::new(file))
}
