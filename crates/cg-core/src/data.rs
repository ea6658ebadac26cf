//! Campaign-wide settings and the data of the scenario being played.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Campaign difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Easy.
    Easy,
    /// Standard.
    Standard,
    /// Hard.
    Hard,
    /// Expert.
    Expert,
}

impl Difficulty {
    /// The difficulty's name as written in guide data.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Standard => "standard",
            Self::Hard => "hard",
            Self::Expert => "expert",
        }
    }

    /// Parse a difficulty name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "standard" => Some(Self::Standard),
            "hard" => Some(Self::Hard),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignResult {
    /// The investigators won.
    Win,
    /// The investigators lost.
    Lose,
    /// The investigators survived.
    Survived,
}

impl fmt::Display for CampaignResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Win => "win",
            Self::Lose => "lose",
            Self::Survived => "survived",
        })
    }
}

/// Lifecycle of the scenario being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Not started yet.
    #[default]
    NotStarted,
    /// Skipped by a campaign decision.
    Skipped,
    /// In progress.
    Started,
    /// A resolution has been reached but its steps are still running.
    Resolution,
    /// Finished.
    Completed,
    /// Made available by a campaign decision.
    Unlocked,
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "not_started",
            Self::Skipped => "skipped",
            Self::Started => "started",
            Self::Resolution => "resolution",
            Self::Completed => "completed",
            Self::Unlocked => "unlocked",
        })
    }
}

/// How an investigator left (or stayed in) the current scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigatorStatus {
    /// Still in play at the end of the scenario.
    #[default]
    Alive,
    /// Resigned.
    Resigned,
    /// Defeated by damage.
    Physical,
    /// Defeated by horror.
    Mental,
    /// Killed or driven insane; out of the campaign.
    Eliminated,
}

impl InvestigatorStatus {
    /// Whether this status counts as defeated.
    pub fn is_defeated(self) -> bool {
        matches!(self, Self::Physical | Self::Mental | Self::Eliminated)
    }
}

impl fmt::Display for InvestigatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Alive => "alive",
            Self::Resigned => "resigned",
            Self::Physical => "physical",
            Self::Mental => "mental",
            Self::Eliminated => "eliminated",
        })
    }
}

/// A scenario the campaign has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedScenario {
    /// Scenario id.
    pub scenario: String,
    /// The resolution that ended it, if any.
    pub resolution: Option<String>,
}

/// Named campaign-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignData {
    /// Chosen difficulty.
    pub difficulty: Option<Difficulty>,
    /// Campaign outcome; once set, the campaign is over.
    pub result: Option<CampaignResult>,
    /// Scenario explicitly chosen to be played next.
    pub next_scenario: Option<String>,
    /// Scenarios that will not be played.
    pub skipped_scenarios: BTreeSet<String>,
    /// Scenarios that have been queued for a replay.
    pub replayed_scenarios: BTreeSet<String>,
    /// Scenarios finished so far, in play order.
    pub completed_scenarios: Vec<CompletedScenario>,
    /// Whether the chaos bag must be rebuilt from the campaign's swap rules.
    pub swap_chaos_bag: bool,
    /// Investigator-count section that receives experience instead of the
    /// investigators themselves.
    pub redirect_experience: Option<String>,
    /// Version of the guide the campaign was started with.
    pub version: u32,
    /// Whether this campaign is linked to a sibling campaign.
    pub linked_campaign: bool,
}

impl CampaignData {
    /// Whether `scenario` has been completed at least once.
    pub fn is_completed(&self, scenario: &str) -> bool {
        self.completed_scenarios
            .iter()
            .any(|c| c.scenario == scenario)
    }

    /// Whether `scenario` has been queued for a replay.
    pub fn is_replayed(&self, scenario: &str) -> bool {
        self.replayed_scenarios.contains(scenario)
    }
}

/// Data of the scenario currently being played.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioData {
    /// Scenario id.
    pub scenario: Option<String>,
    /// Scenario lifecycle.
    pub status: ScenarioStatus,
    /// The resolution reached, if any.
    pub resolution: Option<String>,
    /// The lead investigator code.
    pub lead_investigator: Option<String>,
    /// Investigators taking part in this scenario.
    pub playing: Vec<String>,
    /// Per-investigator end-of-scenario status.
    pub investigator_status: BTreeMap<String, InvestigatorStatus>,
    /// Number of players in this scenario.
    pub player_count: u32,
}

impl ScenarioData {
    /// Fresh data for a scenario that is just starting.
    pub fn started(scenario: impl Into<String>, player_count: u32) -> Self {
        Self {
            scenario: Some(scenario.into()),
            status: ScenarioStatus::Started,
            player_count,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parse_is_case_insensitive() {
        assert_eq!(Difficulty::parse("Hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("nightmare"), None);
    }

    #[test]
    fn defeated_statuses() {
        assert!(InvestigatorStatus::Physical.is_defeated());
        assert!(InvestigatorStatus::Eliminated.is_defeated());
        assert!(!InvestigatorStatus::Resigned.is_defeated());
        assert!(!InvestigatorStatus::Alive.is_defeated());
    }

    #[test]
    fn completed_scenarios_lookup() {
        let mut data = CampaignData::default();
        data.completed_scenarios.push(CompletedScenario {
            scenario: "the_gathering".into(),
            resolution: Some("1".into()),
        });
        assert!(data.is_completed("the_gathering"));
        assert!(!data.is_completed("midnight_masks"));
    }

    #[test]
    fn started_scenario_data() {
        let data = ScenarioData::started("the_gathering", 2);
        assert_eq!(data.status, ScenarioStatus::Started);
        assert_eq!(data.player_count, 2);
        assert!(data.lead_investigator.is_none());
    }
}
