mod logging;

pub use logging::init_logging;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use cdesynth_generate::GenerationReport;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot write run artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot serialize run artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot install log subscriber: {0}")]
    Logging(String),
}

pub type RunResult<T> = std::result::Result<T, RunError>;

/// What a `generate` invocation consumed and produced.
#[derive(Debug, Serialize)]
pub struct RunManifest {
    pub tool_version: &'static str,
    pub started_at: String,
    pub finished_at: String,
    pub template: PathBuf,
    pub relationship_files: Vec<PathBuf>,
    pub dataset: PathBuf,
    pub dataset_bytes: u64,
    pub report: GenerationReport,
}

impl RunManifest {
    pub fn new(
        started_at: DateTime<Utc>,
        template: &Path,
        relationships: &[PathBuf],
        output: &Path,
        bytes_written: u64,
        report: GenerationReport,
    ) -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION"),
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            template: template.to_path_buf(),
            relationship_files: relationships.to_vec(),
            dataset: output.to_path_buf(),
            dataset_bytes: bytes_written,
            report,
        }
    }
}

pub fn ensure_parent(path: &Path) -> RunResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}

/// Pretty-print `value` as JSON to `path`, replacing any existing file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> RunResult<()> {
    ensure_parent(path)?;
    let out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(out, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_json_creates_missing_directories() {
        let root = std::env::temp_dir().join(format!("cdesynth-run-{}", uuid::Uuid::new_v4()));
        let path = root.join("nested").join("manifest.json");

        write_json(&path, &serde_json::json!({ "rows": 3 })).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["rows"], 3);

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn bare_file_name_needs_no_parent() {
        assert!(ensure_parent(Path::new("dataset.csv")).is_ok());
    }
}
