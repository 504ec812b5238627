//! Caller-owned download state.
//!
//! The tracker is owned by whoever triggers downloads (the CLI, a view
//! model) and refuses a second download while one is in flight.

use std::fmt;

use thiserror::Error;

/// Where the caller's download currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadState {
    Idle,
    Downloading { area_id: String, progress: f64 },
    Failed { area_id: String, reason: String },
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadState::Idle => write!(f, "idle"),
            DownloadState::Downloading { area_id, progress } => {
                write!(f, "downloading {} ({:.0}%)", area_id, progress * 100.0)
            }
            DownloadState::Failed { area_id, reason } => {
                write!(f, "download of {} failed: {}", area_id, reason)
            }
        }
    }
}

/// Tracker state transition errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    #[error("download of '{0}' is already in progress")]
    Busy(String),
}

/// Serializes downloads for one caller.
#[derive(Debug)]
pub struct DownloadTracker {
    state: DownloadState,
}

impl Default for DownloadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadTracker {
    pub fn new() -> Self {
        Self {
            state: DownloadState::Idle,
        }
    }

    pub fn state(&self) -> &DownloadState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, DownloadState::Downloading { .. })
    }

    /// Moves to `Downloading` at progress 0.
    ///
    /// A previous failure is cleared; an active download is not.
    pub fn begin(&mut self, area_id: &str) -> Result<(), TrackerError> {
        if let DownloadState::Downloading { area_id: active, .. } = &self.state {
            return Err(TrackerError::Busy(active.clone()));
        }
        self.state = DownloadState::Downloading {
            area_id: area_id.to_string(),
            progress: 0.0,
        };
        Ok(())
    }

    /// Records progress. Ignored unless downloading; never moves backwards.
    pub fn report(&mut self, fraction: f64) {
        if let DownloadState::Downloading { progress, .. } = &mut self.state {
            *progress = progress.max(fraction.clamp(0.0, 1.0));
        }
    }

    /// Ends the active download: success returns to `Idle`, failure keeps
    /// the reason until the next `begin` or `reset`.
    pub fn finish<T, E: fmt::Display>(&mut self, result: &Result<T, E>) {
        let area_id = match &self.state {
            DownloadState::Downloading { area_id, .. } => area_id.clone(),
            _ => return,
        };
        self.state = match result {
            Ok(_) => DownloadState::Idle,
            Err(e) => DownloadState::Failed {
                area_id,
                reason: e.to_string(),
            },
        };
    }

    pub fn reset(&mut self) {
        self.state = DownloadState::Idle;
    }
}
