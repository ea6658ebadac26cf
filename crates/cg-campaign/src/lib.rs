//! Campaign orchestration for the campaign guide engine.
//!
//! Carries a campaign state across scenario runs, chooses which scenario
//! comes next, and checkpoints sessions so they can be resumed.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod session;

pub use checkpoint::{Checkpoint, CheckpointStore, JsonDirStore, MemoryStore, SessionId};
pub use config::SessionConfig;
pub use error::{CampaignError, CampaignResult};
pub use session::{CampaignSession, SavedSession, ScenarioLog};
