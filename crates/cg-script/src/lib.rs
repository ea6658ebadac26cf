//! Campaign guide scripts: the schema of guide documents, loading and
//! reference validation, and the store serving scenario graphs to runs.

pub mod campaign;
pub mod choice;
pub mod condition;
pub mod diagnostics;
pub mod effect;
pub mod error;
pub mod graph;
pub mod input;
pub mod step;
pub mod validate;

use std::path::Path;

pub use campaign::{CampaignDef, GuideDocument, LogSectionDecl, Resolution, Scenario, ScenarioType};
pub use choice::{Choice, ChoiceKind, LogEntry};
pub use condition::{Condition, ConditionKind, GuideOption};
pub use diagnostics::render_schema_error;
pub use effect::{Effect, InvestigatorSelector};
pub use error::{SchemaError, SchemaIssue, SchemaResult};
pub use graph::{Campaign, GraphId, ScenarioGraph, ScriptStore, StepArena, UnknownStepError};
pub use input::{ChoiceOption, Input};
pub use step::{EffectsWithInput, Step, StepKind};

/// Identifier of a step, unique within its graph.
pub type StepId = String;

/// Parse and validate a guide document.
pub fn load_campaign(raw: &str) -> SchemaResult<Campaign> {
    let doc: GuideDocument =
        serde_json::from_str(raw).map_err(|e| SchemaError::from_json(raw, &e))?;
    let campaign = validate::build(doc)?;
    tracing::info!(
        campaign = %campaign.id,
        scenarios = campaign.scenarios.len(),
        steps = campaign.step_count(),
        "loaded campaign guide"
    );
    Ok(campaign)
}

/// Read, parse and validate a guide file.
pub fn load_campaign_file(path: &Path) -> SchemaResult<Campaign> {
    let raw = std::fs::read_to_string(path).map_err(|error| SchemaError::Io {
        path: path.display().to_string(),
        error,
    })?;
    load_campaign(&raw)
}
