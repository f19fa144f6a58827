//! Append-only record of feed item links that have already been reported
//!
//! The file holds one identifier per line with no header. It is read once at
//! the start of a run and appended once after a report has been delivered.
//! Existing lines are never rewritten, so duplicates across runs are allowed.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::Result;

#[derive(Debug, Clone)]
pub struct ProcessedStore {
    path: PathBuf,
}

impl ProcessedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every recorded identifier; a missing file is an empty set
    pub fn load(&self) -> Result<HashSet<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No processed store at {}, starting empty", self.path.display());
                return Ok(HashSet::new());
            }
            Err(e) => return Err(e.into()),
        };

        let ids: HashSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        tracing::debug!("Loaded {} processed identifiers from {}", ids.len(), self.path.display());
        Ok(ids)
    }

    /// Append identifiers, one per line
    pub fn append<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);

        for id in ids {
            writeln!(writer, "{}", id.as_ref())?;
        }
        writer.flush()?;

        tracing::info!("Recorded {} processed identifiers in {}", ids.len(), self.path.display());
        Ok(())
    }
}
