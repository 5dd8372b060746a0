//! Persisted "last successful indexing run" timestamp.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

/// Current wall-clock time as seconds since the Unix epoch.
pub fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A single float timestamp stored as plain text.
#[derive(Debug, Clone)]
pub struct Watermark {
    path: PathBuf,
}

impl Watermark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored timestamp, or `0.0` when the file is missing or unreadable.
    pub fn read(&self) -> f64 {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "no watermark, treating as 0");
                return 0.0;
            }
        };
        match raw.trim().parse::<f64>() {
            Ok(ts) if ts.is_finite() => ts,
            _ => {
                tracing::warn!(path = %self.path.display(), "unparseable watermark, treating as 0");
                0.0
            }
        }
    }

    /// Persist `timestamp` (tmp file + rename).
    pub fn write(&self, timestamp: f64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, format!("{timestamp}"))
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        tracing::debug!(timestamp, "watermark advanced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_zero() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mark = Watermark::new(tmp.path().join("last_indexed_time.txt"));
        assert_eq!(mark.read(), 0.0);
    }

    #[test]
    fn garbage_reads_zero() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("last_indexed_time.txt");
        std::fs::write(&path, "yesterday").unwrap();
        assert_eq!(Watermark::new(&path).read(), 0.0);
        std::fs::write(&path, "NaN").unwrap();
        assert_eq!(Watermark::new(&path).read(), 0.0);
    }

    #[test]
    fn write_then_read() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mark = Watermark::new(tmp.path().join("state").join("last_indexed_time.txt"));
        mark.write(1714561234.25).unwrap();
        assert_eq!(mark.read(), 1714561234.25);
        assert!(!mark.path().with_extension("tmp").exists());
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_seconds() > 1_577_836_800.0);
    }
}
