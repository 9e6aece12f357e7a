//! Append-only audit log.
//!
//! One JSON object per line. Each append is a single `write_all` on a file
//! opened with `O_APPEND`, so appenders in separate processes cannot
//! interleave inside a record. A record always starts on a fresh line, so a
//! torn tail left by a crashed writer costs only that fragment. Entries are
//! never edited, rotated or removed.

use certdesk_core::{sort_newest_first, AuditEntry, CertdeskError, Result};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Handle to the audit log file
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Audit log at `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns `CertdeskError::Io` if the log (or its directory) cannot be
    /// created or written.
    pub async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .map_err(|e| CertdeskError::Internal(format!("audit writer panicked: {e}")))??;

        debug!(
            action = %entry.action,
            certificate = %entry.certificate_name,
            username = %entry.username,
            "audit entry written"
        );
        Ok(())
    }

    /// Read every entry, newest first.
    ///
    /// Lines that do not parse are skipped. A log that does not exist yet
    /// reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `CertdeskError::Io` if the log exists but cannot be read.
    pub async fn read_all(&self) -> Result<Vec<AuditEntry>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CertdeskError::io(self.path.display().to_string(), e)),
        };

        let mut entries = parse_lines(&String::from_utf8_lossy(&bytes));
        sort_newest_first(&mut entries);
        Ok(entries)
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let path_str = || path.display().to_string();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CertdeskError::io(parent.display().to_string(), e))?;
    }

    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CertdeskError::io(path_str(), e))?;

    let mut record = String::with_capacity(line.len() + 1);
    if ends_mid_line(&mut file).map_err(|e| CertdeskError::io(path_str(), e))? {
        warn!(path = %path.display(), "audit log ends in a partial line, starting a new one");
        record.push('\n');
    }
    record.push_str(line);

    file.write_all(record.as_bytes())
        .map_err(|e| CertdeskError::io(path_str(), e))
}

/// Returns true if the file is non-empty and its last byte is not a newline
fn ends_mid_line(file: &mut std::fs::File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Parse JSON lines in file order, skipping anything that is not an entry.
#[must_use]
pub fn parse_lines(text: &str) -> Vec<AuditEntry> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str::<AuditEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(line = n + 1, error = %e, "skipping unreadable audit line");
                None
            }
        })
        .collect()
}
