//! Report storage
//!
//! Append-only plain-text file. Every entry gets a header with the query and
//! a local timestamp, so several runs can share one file.

use crate::types::AppResult;
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const DEFAULT_OUTPUT_FILE: &str = "research_output.txt";

pub struct ReportPersister {
    path: PathBuf,
}

impl ReportPersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, creating the file and its parent directories if needed
    pub async fn persist(&self, content: &str, name_hint: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let entry = format_entry(content, name_hint, &Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), bytes = entry.len(), "Appended report entry");
        Ok(())
    }
}

impl Default for ReportPersister {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_FILE)
    }
}

fn format_entry(content: &str, name_hint: &str, timestamp: &str) -> String {
    format!(
        "--- Research Output: {} ---\nTimestamp: {}\n\n{}\n\n",
        name_hint, timestamp, content
    )
}
