//! Turning a parsed guide into a [`Campaign`], checking that every
//! reference resolves.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use strsim::jaro_winkler;

use crate::StepId;
use crate::campaign::GuideDocument;
use crate::condition::{Condition, ConditionKind, GuideOption};
use crate::effect::Effect;
use crate::error::{SchemaError, SchemaIssue, SchemaResult};
use crate::graph::{Campaign, GraphId, ScenarioGraph, StepArena};
use crate::input::ChoiceOption;
use crate::step::{Step, StepKind};

/// Minimum similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// The closest candidate to `target`, if any is close enough.
pub fn suggest<'a>(target: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .map(|c| (c, jaro_winkler(target, c)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(c, _)| format!("did you mean \"{c}\"?"))
}

/// Build and validate a campaign from a parsed guide.
pub fn build(doc: GuideDocument) -> SchemaResult<Campaign> {
    let GuideDocument { campaign, scenarios } = doc;
    let mut issues = Vec::new();

    let (shared, duplicates) = StepArena::new(campaign.steps);
    issues.extend(duplicates.into_iter().map(|id| SchemaIssue::DuplicateStep {
        scope: format!("campaign {}", campaign.id),
        id,
    }));
    let shared = Arc::new(shared);

    let scenario_ids: BTreeSet<String> = scenarios.iter().map(|s| s.id.clone()).collect();
    let sections: BTreeSet<String> = campaign
        .campaign_log
        .iter()
        .map(|s| s.id.clone())
        .collect();

    let mut checker = Checker {
        scenarios: &scenario_ids,
        sections: &sections,
        issues: Vec::new(),
    };

    for scenario in &campaign.scenarios {
        checker.scenario_ref("campaign scenario list", scenario);
    }

    let campaign_scope = Scope {
        name: format!("campaign {}", campaign.id),
        own: &shared,
        shared: &shared,
        resolutions: Vec::new(),
    };
    checker.step_list(&campaign_scope, "campaign setup", &campaign.setup);
    for step in shared.iter() {
        checker.step(&campaign_scope, step);
    }

    let mut graphs = BTreeMap::new();
    for mut scenario in scenarios {
        let graph_id = GraphId::new(&campaign.id, &scenario.id);
        if graphs.contains_key(&scenario.id) {
            checker
                .issues
                .push(SchemaIssue::DuplicateScenario(scenario.id.clone()));
            continue;
        }
        let (own, duplicates) = StepArena::new(std::mem::take(&mut scenario.steps));
        issues.extend(duplicates.into_iter().map(|id| SchemaIssue::DuplicateStep {
            scope: format!("scenario {graph_id}"),
            id,
        }));

        let scope = Scope {
            name: format!("scenario {graph_id}"),
            own: &own,
            shared: &shared,
            resolutions: scenario.resolutions.iter().map(|r| r.id.as_str()).collect(),
        };
        checker.step_list(&scope, "scenario setup", &scenario.setup);
        for resolution in &scenario.resolutions {
            checker.step_list(
                &scope,
                &format!("resolution \"{}\"", resolution.id),
                &resolution.steps,
            );
        }
        for step in own.iter() {
            checker.step(&scope, step);
        }

        let key = scenario.id.clone();
        let graph = ScenarioGraph::new(graph_id, scenario, own, Arc::clone(&shared));
        graphs.insert(key, Arc::new(graph));
    }

    issues.extend(checker.issues);
    if !issues.is_empty() {
        tracing::warn!(campaign = %campaign.id, issues = issues.len(), "guide failed validation");
        return Err(SchemaError::Invalid {
            campaign: campaign.id,
            issues,
        });
    }

    Ok(Campaign {
        id: campaign.id,
        name: campaign.name,
        version: campaign.version,
        campaign_log: campaign.campaign_log,
        scenarios: campaign.scenarios,
        setup: campaign.setup,
        chaos_bags: campaign.chaos_bags,
        steps: shared,
        graphs,
    })
}

struct Scope<'a> {
    name: String,
    own: &'a StepArena,
    shared: &'a StepArena,
    /// Declared resolution ids; empty when resolutions are not declared.
    resolutions: Vec<&'a str>,
}

impl Scope<'_> {
    fn contains(&self, id: &str) -> bool {
        self.own.contains(id) || self.shared.contains(id)
    }

    fn ids(&self) -> impl Iterator<Item = &str> {
        self.own
            .iter()
            .chain(self.shared.iter())
            .map(|s| s.id.as_str())
    }
}

struct Checker<'a> {
    scenarios: &'a BTreeSet<String>,
    sections: &'a BTreeSet<String>,
    issues: Vec<SchemaIssue>,
}

impl Checker<'_> {
    fn step_list(&mut self, scope: &Scope<'_>, from: &str, steps: &[StepId]) {
        for target in steps {
            if !scope.contains(target) {
                self.issues.push(SchemaIssue::DanglingStep {
                    scope: scope.name.clone(),
                    from: from.to_string(),
                    target: target.clone(),
                    help: suggest(target, scope.ids()),
                });
            }
        }
    }

    fn scenario_ref(&mut self, from: &str, target: &str) {
        if !self.scenarios.contains(target) {
            self.issues.push(SchemaIssue::UnknownScenario {
                from: from.to_string(),
                target: target.to_string(),
                help: suggest(target, self.scenarios.iter().map(String::as_str)),
            });
        }
    }

    fn section_ref(&mut self, scope: &Scope<'_>, from: &str, section: &str) {
        if !self.sections.contains(section) {
            self.issues.push(SchemaIssue::UndeclaredSection {
                scope: scope.name.clone(),
                from: from.to_string(),
                section: section.to_string(),
                help: suggest(section, self.sections.iter().map(String::as_str)),
            });
        }
    }

    fn resolution_ref(&mut self, scope: &Scope<'_>, from: &str, resolution: &str) {
        if scope.resolutions.is_empty() || scope.resolutions.iter().any(|r| *r == resolution) {
            return;
        }
        self.issues.push(SchemaIssue::UnknownResolution {
            scope: scope.name.clone(),
            from: from.to_string(),
            resolution: resolution.to_string(),
            help: suggest(resolution, scope.resolutions.iter().copied()),
        });
    }

    /// A boolean branch covers both values or declares a default. Count and
    /// string branches cannot be checked here and fail at evaluation instead.
    fn exhaustive(&mut self, scope: &Scope<'_>, step: &str, condition: &Condition) {
        if !condition.is_boolean() || condition.default_option.is_some() {
            return;
        }
        for value in [true, false] {
            if !condition.options.iter().any(|o| o.bool_condition == Some(value)) {
                self.issues.push(SchemaIssue::NonExhaustiveCondition {
                    scope: scope.name.clone(),
                    step: step.to_string(),
                    condition: condition.name(),
                    missing: value,
                });
            }
        }
    }

    fn step(&mut self, scope: &Scope<'_>, step: &Step) {
        let from = format!("step \"{}\"", step.id);
        self.step_list(scope, &from, &step.steps);
        self.effects(scope, &from, &step.effects);

        match &step.kind {
            StepKind::Branch { condition } => {
                self.condition(scope, &from, condition);
                self.exhaustive(scope, &step.id, condition);
            }
            StepKind::Effects { effects_with_input } => {
                for group in effects_with_input {
                    self.effects(scope, &from, &group.effects);
                }
            }
            StepKind::Input { input } => {
                if let Some(section) = input.section() {
                    self.section_ref(scope, &from, section);
                }
                for choice in input.choices() {
                    self.choice(scope, &from, choice);
                }
                for effect in input.effects() {
                    self.effect(scope, &from, effect);
                }
                let steps: Vec<StepId> = input.steps().into_iter().cloned().collect();
                self.step_list(scope, &from, &steps);
            }
            StepKind::CampaignLogCount { campaign_log_count } => {
                self.section_ref(scope, &from, &campaign_log_count.section);
            }
            StepKind::Resolution { resolution } => self.resolution_ref(scope, &from, resolution),
            StepKind::EncounterSets { .. }
            | StepKind::Generic
            | StepKind::RuleReminder
            | StepKind::Story
            | StepKind::LocationSetup { .. }
            | StepKind::LocationConnectors { .. }
            | StepKind::Table
            | StepKind::XpCount { .. }
            | StepKind::Internal => {}
        }
    }

    fn choice(&mut self, scope: &Scope<'_>, from: &str, choice: &ChoiceOption) {
        let from = format!("{from} choice \"{}\"", choice.id);
        if let Some(condition) = &choice.condition {
            self.condition(scope, &from, condition);
        }
        for effect in choice.all_effects() {
            self.effect(scope, &from, effect);
        }
        self.step_list(scope, &from, &choice.steps);
    }

    fn condition(&mut self, scope: &Scope<'_>, from: &str, condition: &Condition) {
        for section in condition.sections() {
            self.section_ref(scope, from, section);
        }
        if let ConditionKind::Multi { conditions, .. } = &condition.kind {
            for sub in conditions {
                for option in sub.all_options() {
                    self.option(scope, from, option);
                }
            }
        }
        for option in condition.all_options() {
            self.option(scope, from, option);
        }
    }

    fn option(&mut self, scope: &Scope<'_>, from: &str, option: &GuideOption) {
        for effect in option.all_effects() {
            self.effect(scope, from, effect);
        }
        self.step_list(scope, from, &option.steps);
    }

    fn effects(&mut self, scope: &Scope<'_>, from: &str, effects: &[Effect]) {
        for effect in effects {
            self.effect(scope, from, effect);
        }
    }

    fn effect(&mut self, scope: &Scope<'_>, from: &str, effect: &Effect) {
        if let Effect::StoryStep { steps } = effect {
            self.step_list(scope, &format!("{from} story_step"), steps);
        }
        if let Some(section) = effect.section() {
            self.section_ref(scope, from, section);
        }
        if let Some(scenario) = effect.scenario() {
            self.scenario_ref(from, scenario);
        }
    }
}
