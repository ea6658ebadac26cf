//! Guide documents as written on disk.

use std::collections::BTreeMap;

use cg_core::{ChaosBag, Difficulty, InvestigatorStatus, SectionKind};
use serde::{Deserialize, Serialize};

use crate::StepId;
use crate::step::Step;

/// Declaration of a campaign log section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSectionDecl {
    /// Section id.
    pub id: String,
    /// Heading shown in the campaign log.
    #[serde(default)]
    pub title: String,
    /// Section type.
    #[serde(rename = "type", default)]
    pub kind: SectionKind,
}

/// Kind of scenario, when it is not a regular one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    /// Story between two scenarios.
    Interlude,
    /// Story after the last scenario.
    Epilogue,
    /// Stand-in for a scenario that is not written yet.
    Placeholder,
}

/// One way a scenario can end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Resolution id (`1`, `2`, `no_resolution`, ...).
    pub id: String,
    /// Heading.
    #[serde(default)]
    pub title: String,
    /// Short description shown when choosing the resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resolution text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Statuses that lead to this resolution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub investigator_status: Vec<InvestigatorStatus>,
    /// Steps run after the resolution is reached.
    #[serde(default)]
    pub steps: Vec<StepId>,
}

/// A scenario as written in a guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario id.
    pub id: String,
    /// Short name.
    pub scenario_name: String,
    /// Full name, including its position in the campaign.
    #[serde(default)]
    pub full_name: String,
    /// Header shown above the scenario.
    #[serde(default)]
    pub header: String,
    /// Steps run when the scenario starts.
    #[serde(default)]
    pub setup: Vec<StepId>,
    /// Ways the scenario can end.
    #[serde(default)]
    pub resolutions: Vec<Resolution>,
    /// Every step of the scenario.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Kind of scenario.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub scenario_type: Option<ScenarioType>,
}

/// The `campaign` object of a guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDef {
    /// Campaign id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Guide version.
    #[serde(default)]
    pub version: u32,
    /// Declared log sections, in display order.
    #[serde(default)]
    pub campaign_log: Vec<LogSectionDecl>,
    /// Scenario ids in play order.
    pub scenarios: Vec<String>,
    /// Steps run before the first scenario.
    #[serde(default)]
    pub setup: Vec<StepId>,
    /// Steps shared by every scenario.
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Starting chaos bag per difficulty.
    #[serde(default)]
    pub chaos_bags: BTreeMap<Difficulty, ChaosBag>,
}

/// A whole guide: one campaign and its scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideDocument {
    /// The campaign.
    pub campaign: CampaignDef,
    /// Its scenarios.
    pub scenarios: Vec<Scenario>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_core::ChaosToken;

    #[test]
    fn parse_minimal_document() {
        let doc: GuideDocument = serde_json::from_str(
            r#"{
                "campaign": {
                    "id": "night",
                    "name": "Night of the Zealot",
                    "scenarios": ["the_gathering"],
                    "campaign_log": [
                        {"id": "campaign_notes", "title": "Campaign Notes"},
                        {"id": "cultists", "title": "Cultists", "type": "count"}
                    ],
                    "chaos_bags": {"easy": {"+1": 2, "skull": 1}}
                },
                "scenarios": [{
                    "id": "the_gathering",
                    "scenario_name": "The Gathering",
                    "setup": ["intro"],
                    "steps": [{"id": "intro"}]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.campaign.campaign_log[1].kind, SectionKind::Count);
        assert_eq!(doc.campaign.campaign_log[0].kind, SectionKind::Default);
        assert_eq!(
            doc.campaign.chaos_bags[&Difficulty::Easy].count(ChaosToken::PlusOne),
            2
        );
        assert_eq!(doc.scenarios[0].steps[0].id, "intro");
        assert!(doc.scenarios[0].scenario_type.is_none());
    }

    #[test]
    fn parse_resolution() {
        let res: Resolution =
            serde_json::from_str(r#"{"id":"1","title":"Resolution 1","steps":["r1_text"]}"#)
                .unwrap();
        assert_eq!(res.steps, vec!["r1_text"]);
        assert!(res.investigator_status.is_empty());
    }
}
