use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chaos::ChaosBag;
use crate::data::{CampaignData, InvestigatorStatus, ScenarioData};
use crate::error::{StateError, StateResult};
use crate::investigator::Investigator;
use crate::log::{LogSection, SectionKind};

/// The full mutable state of an in-progress campaign.
///
/// Every collection is ordered so that two equal states always serialize to
/// the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    /// Written campaign log sections, keyed by section id.
    pub log: BTreeMap<String, LogSection>,
    /// Declared type of every known section, written or not.
    #[serde(default)]
    pub section_kinds: BTreeMap<String, SectionKind>,
    /// Campaign-wide settings.
    pub campaign_data: CampaignData,
    /// Data of the scenario being played.
    pub scenario_data: ScenarioData,
    /// The chaos bag.
    pub chaos_bag: ChaosBag,
    /// Investigators, keyed by code.
    pub investigators: BTreeMap<String, Investigator>,
}

impl CampaignState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a log section type.
    pub fn with_section(mut self, id: impl Into<String>, kind: SectionKind) -> Self {
        self.section_kinds.insert(id.into(), kind);
        self
    }

    /// Add an investigator.
    pub fn with_investigator(mut self, investigator: Investigator) -> Self {
        self.add_investigator(investigator);
        self
    }

    /// Set the chaos bag.
    pub fn with_chaos_bag(mut self, bag: ChaosBag) -> Self {
        self.chaos_bag = bag;
        self
    }

    /// Add or replace an investigator.
    pub fn add_investigator(&mut self, investigator: Investigator) {
        self.investigators
            .insert(investigator.code.clone(), investigator);
    }

    /// Look up an investigator.
    pub fn investigator(&self, code: &str) -> Option<&Investigator> {
        self.investigators.get(code)
    }

    /// Look up an investigator for mutation.
    pub fn investigator_mut(&mut self, code: &str) -> StateResult<&mut Investigator> {
        self.investigators
            .get_mut(code)
            .ok_or_else(|| StateError::UnknownInvestigator(code.to_string()))
    }

    /// Codes of investigators still in the campaign, in code order.
    pub fn active_investigators(&self) -> Vec<String> {
        self.investigators
            .values()
            .filter(|i| !i.is_eliminated())
            .map(|i| i.code.clone())
            .collect()
    }

    /// Codes of investigators playing the current scenario. Falls back to
    /// every active investigator when none were chosen explicitly.
    pub fn playing_investigators(&self) -> Vec<String> {
        if self.scenario_data.playing.is_empty() {
            self.active_investigators()
        } else {
            self.scenario_data.playing.clone()
        }
    }

    /// Scenario status of an investigator.
    pub fn investigator_status(&self, code: &str) -> InvestigatorStatus {
        if self.investigator(code).is_some_and(Investigator::is_eliminated) {
            return InvestigatorStatus::Eliminated;
        }
        self.scenario_data
            .investigator_status
            .get(code)
            .copied()
            .unwrap_or_default()
    }

    /// Playing investigators matching a status predicate.
    pub fn investigators_where(&self, pred: impl Fn(InvestigatorStatus) -> bool) -> Vec<String> {
        self.playing_investigators()
            .into_iter()
            .filter(|code| pred(self.investigator_status(code)))
            .collect()
    }

    /// Number of players in the current scenario.
    pub fn player_count(&self) -> u32 {
        if self.scenario_data.player_count > 0 {
            self.scenario_data.player_count
        } else {
            u32::try_from(self.playing_investigators().len()).unwrap_or(u32::MAX)
        }
    }

    /// Declared type of a section (`default` when undeclared).
    pub fn section_kind(&self, id: &str) -> SectionKind {
        self.section_kinds.get(id).copied().unwrap_or_default()
    }

    /// A written section.
    pub fn section(&self, id: &str) -> Option<&LogSection> {
        self.log.get(id)
    }

    /// A section for writing, created with its declared type on first use.
    pub fn section_mut(&mut self, id: &str) -> &mut LogSection {
        let kind = self.section_kind(id);
        self.log
            .entry(id.to_string())
            .or_insert_with(|| LogSection::new(id, kind))
    }

    /// Stable JSON rendering of the state, used to compare runs.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
