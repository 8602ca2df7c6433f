//! Error types shared by the core
//!
//! Input/tracking failures are absorbed where they happen; configuration,
//! playback and storage failures are handed back to the caller.

/// Result alias carrying [`GameError`]
pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Level configuration that cannot produce a valid chart
    #[error("invalid level configuration: {reason}")]
    InvalidLevel { reason: String },

    /// Unknown level id
    #[error("no level with id {0}")]
    UnknownLevel(u32),

    /// Session cannot start before tracking is up
    #[error("tracking is not ready yet")]
    TrackingNotReady,

    /// Audio refused to start (autoplay restriction etc); retry after user interaction
    #[error("playback could not start: {0}")]
    PlaybackBlocked(String),

    /// A single tracking inference failed
    #[error("tracking frame failed: {0}")]
    Tracking(String),

    /// Progression/settings storage failure
    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GameError {
    pub fn invalid_level<T: Into<String>>(reason: T) -> Self {
        Self::InvalidLevel {
            reason: reason.into(),
        }
    }
}
