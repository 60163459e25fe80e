use log::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

use control::{QuietWindow, TriggerState};

// "2024-03-01 14:05 +0000", minute resolution. Saved instants are rounded up
// so the stored trigger is never earlier than the real one.
const LAST_TRIGGER_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute] [offset_hour sign:mandatory][offset_minute]"
);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("trigger state {path} is unavailable: {reason}")]
    ConfigUnavailable { path: PathBuf, reason: String },

    #[error("unable to write trigger state {path}: {cause}")]
    Write {
        path: PathBuf,
        cause: std::io::Error,
    },
}

// On-disk layout of the state file
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    #[serde(rename = "QUIET_AFTER")]
    quiet_after: u8,
    #[serde(rename = "QUIET_BEFORE")]
    quiet_before: u8,
    #[serde(rename = "LAST_TRIGGER")]
    last_trigger: Option<String>,
    // Anything else a user put in the file survives a rewrite
    #[serde(flatten)]
    other: Map<String, Value>,
}

/// Quiet hours and trigger state as read from the state file.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct StoredState {
    pub quiet: QuietWindow,
    pub trigger: TriggerState,
}

pub struct TriggerStore {
    path: PathBuf,
}

impl TriggerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TriggerStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<StoredState, StoreError> {
        let file = self.read_file()?;

        let quiet = QuietWindow::new(file.quiet_after, file.quiet_before)
            .map_err(|e| self.unavailable(e))?;

        let last_trigger = match file.last_trigger.as_deref() {
            Some(value) => Some(
                OffsetDateTime::parse(value, LAST_TRIGGER_FORMAT)
                    .map_err(|e| self.unavailable(format!("LAST_TRIGGER {:?}: {}", value, e)))?,
            ),
            None => None,
        };

        Ok(StoredState {
            quiet,
            trigger: TriggerState { last_trigger },
        })
    }

    /// Record a new trigger state, durably, keeping the rest of the file.
    ///
    /// The file is replaced atomically and synced to disk before returning.
    pub fn save(&self, state: &TriggerState) -> Result<(), StoreError> {
        let mut file = self.read_file()?;

        file.last_trigger = match state.last_trigger {
            Some(instant) => Some(
                ceil_to_minute(instant)
                    .format(LAST_TRIGGER_FORMAT)
                    .map_err(|e| self.unavailable(e))?,
            ),
            None => None,
        };

        let data = serde_json::to_vec(&file).map_err(|e| self.unavailable(e))?;
        self.atomic_write(&data).map_err(|cause| StoreError::Write {
            path: self.path.clone(),
            cause,
        })?;

        info!(
            "Stored last trigger {:?} in {}",
            file.last_trigger,
            self.path.display()
        );
        Ok(())
    }

    fn read_file(&self) -> Result<StateFile, StoreError> {
        let json = fs::read_to_string(&self.path).map_err(|e| self.unavailable(e))?;
        serde_json::from_str(&json).map_err(|e| self.unavailable(e))
    }

    fn atomic_write(&self, data: &[u8]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        // Make the rename itself durable
        #[cfg(unix)]
        File::open(dir)?.sync_all()?;

        Ok(())
    }

    fn unavailable(&self, reason: impl ToString) -> StoreError {
        StoreError::ConfigUnavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

fn ceil_to_minute(instant: OffsetDateTime) -> OffsetDateTime {
    let past_minute = Duration::seconds(instant.second().into())
        + Duration::nanoseconds(instant.nanosecond().into());
    if past_minute.is_zero() {
        instant
    } else {
        instant - past_minute + Duration::MINUTE
    }
}
