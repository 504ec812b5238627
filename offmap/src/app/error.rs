//! Application error types.

use std::fmt;

use crate::assistant::AssistantError;
use crate::compositor::CompositeError;
use crate::coord::CoordError;
use crate::download::{FetchError, TrackerError};
use crate::provider::ProviderError;
use crate::store::{BackendError, PersistError};

/// Errors surfaced by [`OfflineMaps`](super::OfflineMaps).
#[derive(Debug)]
pub enum AppError {
    /// Downloads need a signed-in user.
    SignedOut,

    /// No catalog area has this id.
    UnknownArea(String),

    /// No stored map has this id.
    MapNotFound(String),

    /// Another download is still running.
    Busy(TrackerError),

    /// The area's bounds could not be mapped to tiles.
    Coord(CoordError),

    /// A tile failed; nothing was stored.
    Fetch(FetchError),

    /// The map could not be written to the store.
    Persist(PersistError),

    /// The store write task did not complete.
    StoreTask(tokio::task::JoinError),

    /// The map could not be rendered.
    Composite(CompositeError),

    /// The assistant could not answer.
    Assistant(AssistantError),

    /// Failed to assemble the application.
    Setup(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::SignedOut => write!(f, "Sign in to download maps"),
            AppError::UnknownArea(id) => write!(f, "Unknown map area '{}'", id),
            AppError::MapNotFound(id) => write!(f, "Map '{}' is not downloaded", id),
            AppError::Busy(e) => write!(f, "{}", e),
            AppError::Coord(e) => write!(f, "Invalid area bounds: {}", e),
            AppError::Fetch(e) => write!(f, "Failed to download map tiles: {}", e),
            AppError::Persist(e) if e.is_quota_exceeded() => write!(
                f,
                "Storage limit reached. Please delete some maps before downloading more."
            ),
            AppError::Persist(e) => write!(f, "Failed to save map to storage: {}", e),
            AppError::StoreTask(e) => write!(f, "Failed to save map to storage: {}", e),
            AppError::Composite(e) => write!(f, "Failed to render map: {}", e),
            AppError::Assistant(e) => write!(f, "Assistant unavailable: {}", e),
            AppError::Setup(msg) => write!(f, "Setup error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Busy(e) => Some(e),
            AppError::Coord(e) => Some(e),
            AppError::Fetch(e) => Some(e),
            AppError::Persist(e) => Some(e),
            AppError::StoreTask(e) => Some(e),
            AppError::Composite(e) => Some(e),
            AppError::Assistant(e) => Some(e),
            AppError::SignedOut
            | AppError::UnknownArea(_)
            | AppError::MapNotFound(_)
            | AppError::Setup(_) => None,
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(e: TrackerError) -> Self {
        AppError::Busy(e)
    }
}

impl From<CoordError> for AppError {
    fn from(e: CoordError) -> Self {
        AppError::Coord(e)
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Fetch(e)
    }
}

impl From<PersistError> for AppError {
    fn from(e: PersistError) -> Self {
        AppError::Persist(e)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::StoreTask(e)
    }
}

impl From<CompositeError> for AppError {
    fn from(e: CompositeError) -> Self {
        AppError::Composite(e)
    }
}

impl From<AssistantError> for AppError {
    fn from(e: AssistantError) -> Self {
        AppError::Assistant(e)
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::Setup(e.to_string())
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        AppError::Setup(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_error_has_friendly_message() {
        let err: AppError = PersistError::Backend(BackendError::QuotaExceeded {
            needed: 10,
            capacity: 5,
        })
        .into();
        assert_eq!(
            err.to_string(),
            "Storage limit reached. Please delete some maps before downloading more."
        );
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err: AppError = CoordError::InvalidZoom(30).into();
        assert!(err.source().is_some());
        assert!(AppError::SignedOut.source().is_none());
    }

    #[tokio::test]
    async fn test_store_task_failure_is_a_storage_error() {
        use std::error::Error;

        let join_error = tokio::task::spawn_blocking(|| {
            panic!("disk went away");
        })
        .await
        .unwrap_err();

        let err: AppError = join_error.into();
        assert!(matches!(err, AppError::StoreTask(_)));
        assert!(err.to_string().starts_with("Failed to save map to storage"));
        assert!(err.source().is_some());
    }
}
