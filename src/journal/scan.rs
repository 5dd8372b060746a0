//! Journal discovery: recursive walk of the journal root.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::Result;
use walkdir::{DirEntry, WalkDir};

/// A candidate journal file found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalFile {
    pub path: PathBuf,
    /// Path relative to the journal root, `/`-separated.
    pub source: String,
    /// Modification time, seconds since the Unix epoch.
    pub modified: f64,
}

/// Walk `root` and return every file whose extension is in `extensions`
/// (case-insensitive) and whose name does not start with one of
/// `skip_prefixes`. Hidden files and directories are skipped. Symlinks are
/// followed. The result is sorted by `source`.
pub fn scan_journal(
    root: &Path,
    extensions: &[String],
    skip_prefixes: &[String],
) -> Result<Vec<JournalFile>> {
    anyhow::ensure!(
        root.is_dir(),
        "journal root {} does not exist or is not a directory",
        root.display()
    );

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable journal path");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if skip_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str())) {
            tracing::debug!(file = %name, "skipping file by prefix");
            continue;
        }

        let modified = match modified_secs(&entry) {
            Ok(secs) => secs,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "cannot read modification time, skipping");
                continue;
            }
        };

        files.push(JournalFile {
            source: relative_source(root, entry.path()),
            path: entry.into_path(),
            modified,
        });
    }

    files.sort_by(|a, b| a.source.cmp(&b.source));
    tracing::debug!(root = %root.display(), files = files.len(), "journal scanned");
    Ok(files)
}

fn modified_secs(entry: &DirEntry) -> Result<f64> {
    let modified = entry.metadata()?.modified()?;
    Ok(modified.duration_since(UNIX_EPOCH)?.as_secs_f64())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(&ext)))
}

fn relative_source(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts() -> Vec<String> {
        vec!["md".to_string()]
    }

    #[test]
    fn finds_nested_markdown_sorted() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("2024/03")).unwrap();
        fs::write(tmp.path().join("2024/03/02.md"), "b").unwrap();
        fs::write(tmp.path().join("2024/03/01.MD"), "a").unwrap();
        fs::write(tmp.path().join("inbox.md"), "c").unwrap();
        fs::write(tmp.path().join("photo.jpg"), "x").unwrap();

        let files = scan_journal(tmp.path(), &exts(), &[]).unwrap();
        let sources: Vec<&str> = files.iter().map(|f| f.source.as_str()).collect();
        assert_eq!(sources, vec!["2024/03/01.MD", "2024/03/02.md", "inbox.md"]);
        assert!(files.iter().all(|f| f.modified > 0.0));
    }

    #[test]
    fn skips_hidden_and_prefixed_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".obsidian")).unwrap();
        fs::write(tmp.path().join(".obsidian/workspace.md"), "x").unwrap();
        fs::write(tmp.path().join("template-daily.md"), "x").unwrap();
        fs::write(tmp.path().join("2024-01-01.md"), "x").unwrap();

        let files = scan_journal(tmp.path(), &exts(), &["template".to_string()]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].source, "2024-01-01.md");
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = scan_journal(&tmp.path().join("nope"), &exts(), &[]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
