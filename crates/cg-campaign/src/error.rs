//! Error types for campaign sessions.

use cg_engine::GuideError;
use cg_script::SchemaError;
use thiserror::Error;

/// Result type for campaign operations.
pub type CampaignResult<T> = Result<T, CampaignError>;

/// Errors that can occur while playing a campaign.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// A scenario run failed or rejected a choice.
    #[error(transparent)]
    Guide(#[from] GuideError),

    /// A guide failed to load.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The campaign has no scenario with this id.
    #[error("campaign \"{campaign}\" has no scenario \"{scenario}\"")]
    UnknownScenario {
        /// Campaign id.
        campaign: String,
        /// The missing scenario.
        scenario: String,
    },

    /// The campaign lists no scenarios at all.
    #[error("campaign \"{0}\" has no scenarios")]
    NoScenarios(String),

    /// A saved session belongs to another campaign.
    #[error("saved session is for campaign \"{found}\", not \"{expected}\"")]
    CampaignMismatch {
        /// The loaded campaign.
        expected: String,
        /// The campaign named by the save.
        found: String,
    },

    /// Replaying a saved session did not retrace the saved scenarios.
    #[error("saved session diverged at scenario \"{scenario}\": {reason}")]
    Diverged {
        /// The scenario being replayed.
        scenario: String,
        /// What went differently.
        reason: String,
    },

    /// The campaign is over; nothing is waiting for a choice.
    #[error("campaign \"{0}\" is finished")]
    Finished(String),

    /// No checkpoint is stored under this key.
    #[error("no checkpoint for campaign \"{0}\"")]
    MissingCheckpoint(String),

    /// Checkpoint I/O failed.
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A checkpoint could not be encoded or decoded.
    #[error("checkpoint format error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CampaignError {
    /// Whether the session is still usable after this error: the choice was
    /// rejected but the pending prompt is unchanged.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Guide(e) if e.is_recoverable())
    }
}
