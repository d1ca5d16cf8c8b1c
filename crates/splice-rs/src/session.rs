//! Audit trail for agent exchanges.
//!
//! One prompt file and one response file per task, named by timestamp,
//! written to a history directory. Write-only: the engine never reads
//! these back.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use crate::error::EngineError;

/// Persists prompt/response transcripts under a history directory.
pub struct SessionLog {
    dir: PathBuf,
}

impl SessionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record one exchange. Returns the timestamp stem the pair was
    /// filed under.
    pub fn record(&self, prompt: &str, response: &str) -> Result<String, EngineError> {
        let stamp = Local::now().format("%Y%m%d-%H%M%S%.3f").to_string();
        self.write_atomic(&format!("{stamp}-prompt.txt"), prompt)?;
        self.write_atomic(&format!("{stamp}-response.txt"), response)?;
        debug!("session recorded under {stamp} in {}", self.dir.display());
        Ok(stamp)
    }

    // Temp-then-rename so a crash mid-write never leaves a truncated
    // transcript behind.
    fn write_atomic(&self, name: &str, content: &str) -> Result<(), EngineError> {
        let tmp = self.dir.join(format!(".{name}.tmp"));
        let target = self.dir.join(name);
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}
