//! Core types for the campaign guide engine: the persistent campaign state.
//!
//! This crate defines the data model that guide effects mutate and guide
//! conditions read. It knows nothing about the script format; you can build a
//! [`CampaignState`] programmatically or deserialize one from JSON.

/// Chaos tokens and the chaos bag multiset.
pub mod chaos;
/// Campaign-wide and scenario-scoped settings.
pub mod data;
/// Error types used throughout the crate.
pub mod error;
/// Investigators: trauma, experience, story cards and supplies.
pub mod investigator;
/// Campaign log sections and their entries.
pub mod log;
/// The aggregate campaign state.
pub mod state;

/// Re-export chaos bag types.
pub use chaos::{ChaosBag, ChaosToken};
/// Re-export campaign and scenario data types.
pub use data::{
    CampaignData, CampaignResult, CompletedScenario, Difficulty, InvestigatorStatus, ScenarioData,
    ScenarioStatus,
};
/// Re-export error types.
pub use error::{StateError, StateResult};
/// Re-export investigator types.
pub use investigator::{Investigator, SpecialXp, Trauma, TraumaKind};
/// Re-export campaign log types.
pub use log::{CountUpdate, LogSection, LogSectionEntry, SectionKind};
/// Re-export the campaign state.
pub use state::CampaignState;
