//! Id-addressed step arenas, scenario graphs and the store holding them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use cg_core::{ChaosBag, Difficulty, SectionKind};
use serde::{Deserialize, Serialize};

use crate::StepId;
use crate::campaign::{LogSectionDecl, Resolution, ScenarioType};
use crate::error::SchemaResult;
use crate::step::{Step, StepKind};

/// Identifies a scenario graph within the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphId {
    /// Campaign id.
    pub campaign: String,
    /// Scenario id.
    pub scenario: String,
}

impl GraphId {
    /// Create a graph id.
    pub fn new(campaign: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            scenario: scenario.into(),
        }
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.campaign, self.scenario)
    }
}

/// A step id that resolves nowhere in its graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown step \"{step}\" in {graph}")]
pub struct UnknownStepError {
    /// The graph searched.
    pub graph: GraphId,
    /// The missing id.
    pub step: StepId,
}

/// Steps stored by id.
#[derive(Debug, Clone, Default)]
pub struct StepArena {
    steps: Vec<Step>,
    index: HashMap<StepId, usize>,
}

impl StepArena {
    /// Build an arena. Later steps with a repeated id are dropped; their ids
    /// are returned alongside.
    pub fn new(steps: Vec<Step>) -> (Self, Vec<StepId>) {
        let mut arena = Self::default();
        let mut duplicates = Vec::new();
        for step in steps {
            if arena.index.contains_key(&step.id) {
                duplicates.push(step.id);
                continue;
            }
            arena.index.insert(step.id.clone(), arena.steps.len());
            arena.steps.push(step);
        }
        (arena, duplicates)
    }

    /// Look up a step.
    pub fn get(&self, id: &str) -> Option<&Step> {
        self.index.get(id).map(|&i| &self.steps[i])
    }

    /// Whether the arena holds `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Steps in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// The steps of one scenario plus the campaign's shared steps.
#[derive(Debug, Clone)]
pub struct ScenarioGraph {
    id: GraphId,
    /// Short name.
    pub name: String,
    /// Full name.
    pub full_name: String,
    /// Kind of scenario.
    pub scenario_type: Option<ScenarioType>,
    /// Steps run when the scenario starts.
    pub setup: Vec<StepId>,
    /// Ways the scenario can end.
    pub resolutions: Vec<Resolution>,
    steps: StepArena,
    shared: Arc<StepArena>,
}

impl ScenarioGraph {
    pub(crate) fn new(
        id: GraphId,
        scenario: crate::campaign::Scenario,
        steps: StepArena,
        shared: Arc<StepArena>,
    ) -> Self {
        Self {
            id,
            name: scenario.scenario_name,
            full_name: scenario.full_name,
            scenario_type: scenario.scenario_type,
            setup: scenario.setup,
            resolutions: scenario.resolutions,
            steps,
            shared,
        }
    }

    /// The graph id.
    pub fn id(&self) -> &GraphId {
        &self.id
    }

    /// Resolve a step: scenario steps first, then campaign steps.
    pub fn get(&self, step: &str) -> Result<&Step, UnknownStepError> {
        self.steps
            .get(step)
            .or_else(|| self.shared.get(step))
            .ok_or_else(|| UnknownStepError {
                graph: self.id.clone(),
                step: step.to_string(),
            })
    }

    /// Whether `step` resolves in this graph.
    pub fn contains(&self, step: &str) -> bool {
        self.steps.contains(step) || self.shared.contains(step)
    }

    /// The scenario's own steps.
    pub fn steps(&self) -> &StepArena {
        &self.steps
    }

    /// A declared resolution.
    pub fn resolution(&self, id: &str) -> Option<&Resolution> {
        self.resolutions.iter().find(|r| r.id == id)
    }

    /// The resolution step reaching resolution `id`.
    pub fn resolution_step(&self, id: &str) -> Option<&Step> {
        self.steps
            .iter()
            .find(|s| matches!(&s.kind, StepKind::Resolution { resolution } if resolution == id))
    }
}

/// A validated campaign and its scenario graphs.
#[derive(Debug, Clone)]
pub struct Campaign {
    /// Campaign id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Guide version.
    pub version: u32,
    /// Declared log sections, in display order.
    pub campaign_log: Vec<LogSectionDecl>,
    /// Scenario ids in play order.
    pub scenarios: Vec<String>,
    /// Steps run before the first scenario.
    pub setup: Vec<StepId>,
    /// Starting chaos bag per difficulty.
    pub chaos_bags: BTreeMap<Difficulty, ChaosBag>,
    pub(crate) steps: Arc<StepArena>,
    pub(crate) graphs: BTreeMap<String, Arc<ScenarioGraph>>,
}

impl Campaign {
    /// The graph of a scenario.
    pub fn graph(&self, scenario: &str) -> Option<&Arc<ScenarioGraph>> {
        self.graphs.get(scenario)
    }

    /// Every scenario graph, keyed by scenario id.
    pub fn graphs(&self) -> impl Iterator<Item = (&String, &Arc<ScenarioGraph>)> {
        self.graphs.iter()
    }

    /// Steps shared by every scenario.
    pub fn shared_steps(&self) -> &StepArena {
        &self.steps
    }

    /// Declared type of a log section.
    pub fn section_kind(&self, section: &str) -> Option<SectionKind> {
        self.campaign_log
            .iter()
            .find(|s| s.id == section)
            .map(|s| s.kind)
    }

    /// The first scenario in play order.
    pub fn first_scenario(&self) -> Option<&str> {
        self.scenarios.first().map(String::as_str)
    }

    /// The scenario after `scenario` in play order.
    pub fn scenario_after(&self, scenario: &str) -> Option<&str> {
        let index = self.scenarios.iter().position(|s| s == scenario)?;
        self.scenarios.get(index + 1).map(String::as_str)
    }

    /// Total number of steps, shared steps included.
    pub fn step_count(&self) -> usize {
        self.steps.len() + self.graphs.values().map(|g| g.steps.len()).sum::<usize>()
    }
}

/// Loaded campaigns, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ScriptStore {
    campaigns: BTreeMap<String, Arc<Campaign>>,
}

impl ScriptStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loaded campaign, replacing any with the same id.
    pub fn insert(&mut self, campaign: Campaign) -> Arc<Campaign> {
        let campaign = Arc::new(campaign);
        self.campaigns
            .insert(campaign.id.clone(), Arc::clone(&campaign));
        campaign
    }

    /// Load a guide and add it. A guide that fails to load leaves the store
    /// unchanged.
    pub fn load(&mut self, raw: &str) -> SchemaResult<Arc<Campaign>> {
        let campaign = crate::load_campaign(raw)?;
        Ok(self.insert(campaign))
    }

    /// A loaded campaign.
    pub fn campaign(&self, id: &str) -> Option<&Arc<Campaign>> {
        self.campaigns.get(id)
    }

    /// A scenario graph.
    pub fn graph(&self, id: &GraphId) -> Option<Arc<ScenarioGraph>> {
        self.campaign(&id.campaign)
            .and_then(|c| c.graph(&id.scenario))
            .cloned()
    }

    /// Ids of every loaded campaign.
    pub fn campaign_ids(&self) -> impl Iterator<Item = &str> {
        self.campaigns.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(json: &str) -> Step {
        serde_json::from_str(json).unwrap()
    }

    fn graph() -> ScenarioGraph {
        let (own, _) = StepArena::new(vec![
            step(r#"{"id":"intro"}"#),
            step(r#"{"id":"r1","type":"resolution","resolution":"1"}"#),
        ]);
        let (shared, _) = StepArena::new(vec![
            step(r#"{"id":"intro","text":"campaign copy"}"#),
            step(r#"{"id":"upgrade"}"#),
        ]);
        let scenario: crate::campaign::Scenario = serde_json::from_str(
            r#"{"id":"s","scenario_name":"S","setup":["intro"],"resolutions":[{"id":"1","steps":[]}]}"#,
        )
        .unwrap();
        ScenarioGraph::new(GraphId::new("c", "s"), scenario, own, Arc::new(shared))
    }

    #[test]
    fn scenario_steps_shadow_campaign_steps() {
        let g = graph();
        assert!(g.get("intro").unwrap().text.is_none());
        assert_eq!(g.get("upgrade").unwrap().id, "upgrade");
    }

    #[test]
    fn unknown_step_is_an_error() {
        let err = graph().get("nowhere").unwrap_err();
        assert_eq!(err.to_string(), "unknown step \"nowhere\" in c/s");
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let (arena, dups) = StepArena::new(vec![step(r#"{"id":"a"}"#), step(r#"{"id":"a"}"#)]);
        assert_eq!(arena.len(), 1);
        assert_eq!(dups, vec!["a"]);
    }

    #[test]
    fn resolution_lookup() {
        let g = graph();
        assert_eq!(g.resolution_step("1").unwrap().id, "r1");
        assert!(g.resolution("1").is_some());
        assert!(g.resolution_step("2").is_none());
    }
}
