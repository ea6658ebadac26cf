//! Steps: the nodes of a scenario graph.

use cg_core::SpecialXp;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::StepId;
use crate::condition::Condition;
use crate::effect::Effect;
use crate::input::Input;

/// A group of effects applied only when the most recent input matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectsWithInput {
    /// Whether the effects' text is set apart.
    #[serde(default)]
    pub border: bool,
    /// The effects.
    pub effects: Vec<Effect>,
    /// Text input values this group was recorded for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<String>>,
    /// Numeric input values this group was recorded for.
    #[serde(rename = "numberInput", default, skip_serializing_if = "Option::is_none")]
    pub number_input: Option<Vec<i64>>,
}

/// Log count displayed by a `campaign_log_count` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogCountRef {
    /// Section id.
    pub section: String,
    /// Entry id; the section total when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// What a step does beyond its common fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Evaluate a condition and follow the matching option.
    Branch {
        /// The condition.
        condition: Condition,
    },
    /// Apply the effect group matching the most recent input.
    Effects {
        /// Effect groups.
        #[serde(rename = "effectsWithInput")]
        effects_with_input: Vec<EffectsWithInput>,
    },
    /// Wait for a human decision.
    Input {
        /// The decision.
        input: Input,
    },
    /// Show encounter sets to gather.
    EncounterSets {
        /// Encounter set codes.
        #[serde(default)]
        encounter_sets: Vec<String>,
    },
    /// Plain text, possibly with effects and sub-steps.
    Generic,
    /// Reach a scenario resolution.
    Resolution {
        /// Resolution id.
        resolution: String,
    },
    /// A rules reminder.
    RuleReminder,
    /// Story text.
    Story,
    /// Location layout.
    LocationSetup {
        /// Location grid.
        #[serde(default)]
        locations: Vec<Vec<String>>,
    },
    /// Location connector symbols.
    LocationConnectors {
        /// Connector names.
        #[serde(default)]
        location_connectors: Vec<String>,
    },
    /// A table.
    Table,
    /// Show a log count.
    CampaignLogCount {
        /// The count shown.
        campaign_log_count: LogCountRef,
    },
    /// Show a special experience balance.
    XpCount {
        /// The pool shown.
        special_xp: SpecialXp,
    },
    /// Bookkeeping step never shown to players.
    Internal,
}

/// One node of a scenario graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Step id, unique within its graph.
    pub id: StepId,
    /// Heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Whether the step is hidden from players.
    pub hidden: bool,
    /// Sub-steps, run depth-first after this step.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepId>,
    /// Effects applied when the step runs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
    /// What the step does.
    #[serde(flatten)]
    pub kind: StepKind,
}

#[derive(Deserialize)]
struct StepRepr {
    id: StepId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    steps: Vec<StepId>,
    #[serde(default)]
    effects: Vec<Effect>,
    #[serde(flatten)]
    kind: StepKind,
}

// Plain steps leave `type` out (or null) in guide data.
impl<'de> Deserialize<'de> for Step {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = serde_json::Value::deserialize(deserializer)?;
        if let Some(object) = value
            .as_object_mut()
            .filter(|o| o.get("type").is_none_or(serde_json::Value::is_null))
        {
            object.insert("type".into(), "generic".into());
        }
        let repr = StepRepr::deserialize(value).map_err(D::Error::custom)?;
        Ok(Self {
            id: repr.id,
            title: repr.title,
            text: repr.text,
            hidden: repr.hidden,
            steps: repr.steps,
            effects: repr.effects,
            kind: repr.kind,
        })
    }
}

impl Step {
    /// Short name of the step type, as written in guide data.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            StepKind::Branch { .. } => "branch",
            StepKind::Effects { .. } => "effects",
            StepKind::Input { .. } => "input",
            StepKind::EncounterSets { .. } => "encounter_sets",
            StepKind::Generic => "generic",
            StepKind::Resolution { .. } => "resolution",
            StepKind::RuleReminder => "rule_reminder",
            StepKind::Story => "story",
            StepKind::LocationSetup { .. } => "location_setup",
            StepKind::LocationConnectors { .. } => "location_connectors",
            StepKind::Table => "table",
            StepKind::CampaignLogCount { .. } => "campaign_log_count",
            StepKind::XpCount { .. } => "xp_count",
            StepKind::Internal => "internal",
        }
    }

    /// The input this step waits for, if it is an input step.
    pub fn input(&self) -> Option<&Input> {
        match &self.kind {
            StepKind::Input { input } => Some(input),
            _ => None,
        }
    }

    /// Text shown for the step: its title, else its text, else its id.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_type_is_generic() {
        let step: Step =
            serde_json::from_str(r#"{"id":"intro","text":"Read aloud.","steps":["a","b"]}"#)
                .unwrap();
        assert_eq!(step.kind, StepKind::Generic);
        assert_eq!(step.steps, vec!["a", "b"]);
        assert_eq!(step.type_name(), "generic");
    }

    #[test]
    fn null_type_is_generic() {
        let step: Step = serde_json::from_str(r#"{"id":"intro","type":null}"#).unwrap();
        assert_eq!(step.kind, StepKind::Generic);
    }

    #[test]
    fn generic_round_trips_with_explicit_tag() {
        let step: Step = serde_json::from_str(r#"{"id":"intro"}"#).unwrap();
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, r#"{"id":"intro","hidden":false,"type":"generic"}"#);
        let back: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn parse_input_step() {
        let step: Step = serde_json::from_str(
            r#"{
                "id": "vp",
                "type": "input",
                "input": {"type": "counter", "text": "VP", "max": 5, "effects": []}
            }"#,
        )
        .unwrap();
        assert_eq!(step.input().map(Input::name), Some("counter"));
    }

    #[test]
    fn parse_effects_step() {
        let step: Step = serde_json::from_str(
            r#"{
                "id": "fx",
                "type": "effects",
                "effectsWithInput": [
                    {"input": ["burn"], "effects": [{"type": "upgrade_decks"}]},
                    {"effects": [{"type": "save_decks"}]}
                ]
            }"#,
        )
        .unwrap();
        match step.kind {
            StepKind::Effects { effects_with_input } => {
                assert_eq!(effects_with_input.len(), 2);
                assert_eq!(effects_with_input[0].input, Some(vec!["burn".to_string()]));
            }
            other => panic!("expected effects step, got {other:?}"),
        }
    }

    #[test]
    fn unknown_step_type_is_rejected() {
        let err = serde_json::from_str::<Step>(r#"{"id":"x","type":"cutscene"}"#).unwrap_err();
        assert!(err.to_string().contains("cutscene"));
    }

    #[test]
    fn label_prefers_title() {
        let step: Step =
            serde_json::from_str(r#"{"id":"x","title":"Setup","text":"Gather sets."}"#).unwrap();
        assert_eq!(step.label(), "Setup");
    }
}
