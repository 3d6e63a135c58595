use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

/// Self-documenting header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- tally recovery log: append-only
     Entries record registry rows and files that could not be kept in
     step with each other. Each entry names the paths involved so the
     tree can be repaired by hand. Safe to delete once reviewed. -->

---
";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A create could not be rolled back completely
    Create,
    /// A table could not be restored to its previous contents
    Write,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Create => write!(f, "create"),
            RecoveryCategory::Write => write!(f, "write"),
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

pub const RECOVERY_LOG_FILE: &str = ".recovery.log";

/// Return the path to the recovery log file.
pub fn recovery_log_path(base: &Path) -> PathBuf {
    base.join(RECOVERY_LOG_FILE)
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Format this entry as a markdown block for the recovery log.
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} - {}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );

        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }

        if !self.body.is_empty() {
            out.push('\n');
            out.push_str("```text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }

        out.push('\n');
        out.push_str("---\n");
        out
    }
}

/// Append a recovery entry to the log. Failures are reported through
/// `tracing` and otherwise swallowed: the caller is already on an error path.
pub fn log_recovery(base: &Path, entry: RecoveryEntry) {
    tracing::warn!(
        category = %entry.category,
        description = %entry.description,
        "writing recovery log entry"
    );
    if let Err(e) = log_recovery_inner(base, &entry) {
        tracing::error!(error = %e, "could not write to recovery log");
    }
}

fn log_recovery_inner(base: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(base);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())?;
    Ok(())
}

/// Number of entries currently in the recovery log (0 if absent).
pub fn recovery_entry_count(base: &Path) -> usize {
    std::fs::read_to_string(recovery_log_path(base))
        .map(|content| content.lines().filter(|l| l.starts_with("## ")).count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("years.csv");
        std::fs::write(&path, "old").unwrap();
        atomic_write(&path, b"years\n2026\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "years\n2026\n");
    }

    #[test]
    fn test_log_recovery_appends_entries() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(recovery_entry_count(tmp.path()), 0);

        log_recovery(
            tmp.path(),
            RecoveryEntry::new(RecoveryCategory::Create, "year 2026 directory kept")
                .field("Path", "/data/2026"),
        );
        log_recovery(
            tmp.path(),
            RecoveryEntry::new(RecoveryCategory::Write, "row not removed").body("10,2:30"),
        );

        let content = std::fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- tally recovery log"));
        assert!(content.contains("create: year 2026 directory kept"));
        assert!(content.contains("Path: /data/2026"));
        assert!(content.contains("```text\n10,2:30\n```"));
        assert_eq!(recovery_entry_count(tmp.path()), 2);
    }
}
