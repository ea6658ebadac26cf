//! The execution controller: drives one scenario graph from its setup to a
//! resolution, suspending at every input step.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use cg_core::{CampaignState, ScenarioStatus};
use cg_script::{
    Choice, ChoiceKind, ChoiceOption, GraphId, Input, LogEntry, ScenarioGraph, ScriptStore, Step,
    StepId, StepKind,
};
use serde::{Deserialize, Serialize};

use crate::apply::{DeckSignal, Outcome, apply_all};
use crate::context::BindingContext;
use crate::error::{GuideError, GuideResult};
use crate::evaluate::evaluate;
use crate::recorder::GuideLog;
use crate::resolve::{is_available, resolve};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Steps are being dispatched.
    Running,
    /// Waiting for a choice on the pending input step.
    AwaitingInput,
    /// The scenario reached its end.
    Completed,
    /// A fatal error stopped the run.
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::AwaitingInput => "awaiting input",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// What a suspended run asks of the players.
#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    /// The pending input step id.
    pub step_id: &'a str,
    /// The pending step.
    pub step: &'a Step,
    /// The input to resolve.
    pub input: &'a Input,
    /// State at the time of the prompt.
    pub state: &'a CampaignState,
    /// Bindings in effect.
    pub ctx: &'a BindingContext,
}

impl<'a> Prompt<'a> {
    /// Choice shapes the input accepts.
    pub fn expects(&self) -> &'static [ChoiceKind] {
        self.input.choice_kinds()
    }

    /// Choices currently offered.
    pub fn available_choices(&self) -> GuideResult<Vec<&'a ChoiceOption>> {
        self.filter_available(self.ctx)
    }

    /// Choices offered to one investigator, for `investigator_choice`
    /// inputs whose choices test the investigator.
    pub fn available_choices_for(&self, investigator: &str) -> GuideResult<Vec<&'a ChoiceOption>> {
        self.filter_available(&self.ctx.for_each(investigator))
    }

    fn filter_available(&self, ctx: &BindingContext) -> GuideResult<Vec<&'a ChoiceOption>> {
        let mut offered = Vec::new();
        for option in self.input.choices() {
            if is_available(option, self.state, ctx)? {
                offered.push(option);
            }
        }
        Ok(offered)
    }
}

/// A run in serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRun {
    /// The graph being run.
    pub graph: GraphId,
    /// Step list the run was seeded with.
    pub entry: Vec<StepId>,
    /// State when the run started.
    pub initial: CampaignState,
    /// Resolved inputs, in order.
    pub log: GuideLog,
    /// Current state.
    pub state: CampaignState,
    /// Remaining step lists, outermost first.
    pub cursor: Vec<Vec<StepId>>,
    /// Lifecycle.
    pub status: RunStatus,
    /// The input step awaiting a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<StepId>,
    /// Bindings in effect.
    #[serde(default)]
    pub ctx: BindingContext,
    /// Whether the scenario has reached its end.
    pub terminal: bool,
    /// Why the run failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Deck signals not yet taken.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<DeckSignal>,
}

/// One execution of a scenario graph.
#[derive(Debug, Clone)]
pub struct GuideRun {
    graph: Arc<ScenarioGraph>,
    entry: Vec<StepId>,
    initial: CampaignState,
    state: CampaignState,
    cursor: Vec<VecDeque<StepId>>,
    status: RunStatus,
    pending: Option<StepId>,
    ctx: BindingContext,
    log: GuideLog,
    terminal: bool,
    failure: Option<String>,
    signals: Vec<DeckSignal>,
}

impl GuideRun {
    /// Start a run at the graph's setup steps.
    pub fn start(graph: Arc<ScenarioGraph>, state: CampaignState) -> GuideResult<Self> {
        let entry = graph.setup.clone();
        Self::start_at(graph, state, entry)
    }

    /// Start a run at an explicit step list.
    pub fn start_at(
        graph: Arc<ScenarioGraph>,
        state: CampaignState,
        entry: Vec<StepId>,
    ) -> GuideResult<Self> {
        let mut run = Self {
            graph,
            cursor: vec![entry.iter().cloned().collect()],
            entry,
            initial: state.clone(),
            state,
            status: RunStatus::Running,
            pending: None,
            ctx: BindingContext::new(),
            log: GuideLog::new(),
            terminal: false,
            failure: None,
            signals: Vec::new(),
        };
        tracing::info!(graph = %run.graph.id(), "starting scenario run");
        run.drain()?;
        Ok(run)
    }

    /// Rebuild a saved run against the graphs of `store`.
    pub fn restore(saved: SavedRun, store: &ScriptStore) -> GuideResult<Self> {
        let graph = store
            .graph(&saved.graph)
            .ok_or_else(|| GuideError::UnknownGraph(saved.graph.clone()))?;
        Ok(Self {
            graph,
            entry: saved.entry,
            initial: saved.initial,
            state: saved.state,
            cursor: saved.cursor.into_iter().map(VecDeque::from).collect(),
            status: saved.status,
            pending: saved.pending,
            ctx: saved.ctx,
            log: saved.log,
            terminal: saved.terminal,
            failure: saved.failure,
            signals: saved.signals,
        })
    }

    /// Serializable snapshot of the run.
    pub fn save(&self) -> SavedRun {
        SavedRun {
            graph: self.graph.id().clone(),
            entry: self.entry.clone(),
            initial: self.initial.clone(),
            log: self.log.clone(),
            state: self.state.clone(),
            cursor: self
                .cursor
                .iter()
                .map(|list| list.iter().cloned().collect())
                .collect(),
            status: self.status,
            pending: self.pending.clone(),
            ctx: self.ctx.clone(),
            terminal: self.terminal,
            failure: self.failure.clone(),
            signals: self.signals.clone(),
        }
    }

    /// The graph being run.
    pub fn graph(&self) -> &Arc<ScenarioGraph> {
        &self.graph
    }

    /// Step list the run was seeded with.
    pub fn entry(&self) -> &[StepId] {
        &self.entry
    }

    /// Current lifecycle status.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Current state.
    pub fn state(&self) -> &CampaignState {
        &self.state
    }

    /// State when the run started.
    pub fn initial_state(&self) -> &CampaignState {
        &self.initial
    }

    /// Resolved inputs so far.
    pub fn log(&self) -> &GuideLog {
        &self.log
    }

    /// Bindings in effect.
    pub fn context(&self) -> &BindingContext {
        &self.ctx
    }

    /// Why the run failed, if it did.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Take the deck signals raised since the last call.
    pub fn take_signals(&mut self) -> Vec<DeckSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Whether the run has completed or failed.
    pub fn is_finished(&self) -> bool {
        matches!(self.status, RunStatus::Completed | RunStatus::Failed)
    }

    /// Consume the run, returning its state.
    pub fn into_state(self) -> CampaignState {
        self.state
    }

    /// The pending input, when the run is waiting for a choice.
    pub fn prompt(&self) -> Option<Prompt<'_>> {
        let step_id = self.pending.as_deref()?;
        let step = self.graph.get(step_id).ok()?;
        Some(Prompt {
            step_id,
            step,
            input: step.input()?,
            state: &self.state,
            ctx: &self.ctx,
        })
    }

    /// Resolve the pending input with `choice` and continue.
    ///
    /// Stale and invalid choices leave the run untouched and waiting.
    pub fn resume_with_choice(&mut self, step_id: &str, choice: Choice) -> GuideResult<()> {
        if self.is_finished() {
            return Err(GuideError::NotRunning {
                status: self.status,
            });
        }
        if self.pending.as_deref() != Some(step_id) {
            return Err(GuideError::StaleResume {
                expected: self.pending.clone(),
                received: step_id.to_string(),
            });
        }

        let graph = Arc::clone(&self.graph);
        let step = match graph.get(step_id) {
            Ok(step) => step,
            Err(e) => return self.fail(e.into()),
        };
        let Some(input) = step.input() else {
            return self.fail(GuideError::invalid_choice(step_id, "step is not an input"));
        };
        if !input.choice_kinds().contains(&choice.kind()) {
            let expected: Vec<String> = input.choice_kinds().iter().map(ToString::to_string).collect();
            return Err(GuideError::invalid_choice(
                step_id,
                format!("{} expects {}, got {}", input.name(), expected.join(" or "), choice.kind()),
            ));
        }

        let mut staged = self.state.clone();
        let resolved = apply_all(&step.effects, &mut staged, &self.ctx).and_then(|mut outcome| {
            let resolved = resolve(step_id, input, &choice, &graph, &mut staged, &self.ctx)?;
            outcome.merge(resolved.outcome);
            Ok((resolved.ctx, outcome))
        });
        let (ctx, outcome) = match resolved {
            Ok(resolved) => resolved,
            Err(e) if e.is_recoverable() => return Err(e),
            Err(e) => return self.fail(e),
        };

        tracing::info!(step = step_id, choice = %choice, "input resolved");
        self.log.push(LogEntry::new(step_id, choice));
        self.pending = None;
        self.status = RunStatus::Running;
        self.ctx = ctx;
        self.commit(staged, outcome, &step.steps, false);
        self.drain()
    }

    fn drain(&mut self) -> GuideResult<()> {
        loop {
            let Some(id) = self.next_step_id() else {
                if self.terminal {
                    self.status = RunStatus::Completed;
                    tracing::info!(graph = %self.graph.id(), "scenario run completed");
                    return Ok(());
                }
                return self.fail(GuideError::ImplicitCompletion {
                    graph: self.graph.id().clone(),
                });
            };

            let graph = Arc::clone(&self.graph);
            let step = match graph.get(&id) {
                Ok(step) => step,
                Err(e) => return self.fail(e.into()),
            };
            tracing::debug!(step = %id, kind = step.type_name(), "dispatching step");

            if step.input().is_some() {
                tracing::info!(step = %id, "awaiting input");
                self.status = RunStatus::AwaitingInput;
                self.pending = Some(id);
                return Ok(());
            }
            if let Err(e) = self.dispatch(&graph, step) {
                return self.fail(e);
            }
        }
    }

    /// Run one non-input step against a staged copy of the state.
    fn dispatch(&mut self, graph: &ScenarioGraph, step: &Step) -> GuideResult<()> {
        let mut staged = self.state.clone();
        let mut outcome = apply_all(&step.effects, &mut staged, &self.ctx)?;
        let mut discard = false;

        match &step.kind {
            StepKind::Branch { condition } => {
                let selection = evaluate(condition, &staged, &self.ctx)?;
                tracing::debug!(step = %step.id, value = %selection.value, "branch evaluated");
                let option = selection.option;
                outcome.merge(apply_all(option.all_effects(), &mut staged, &self.ctx)?);
                if !option.steps.is_empty() {
                    outcome.steps.push(option.steps.clone());
                }
            }
            StepKind::Effects { effects_with_input } => {
                for group in effects_with_input.iter().filter(|g| self.ctx.matches(g)) {
                    outcome.merge(apply_all(&group.effects, &mut staged, &self.ctx)?);
                }
            }
            StepKind::Resolution { resolution } => {
                staged.scenario_data.resolution = Some(resolution.clone());
                staged.scenario_data.status = ScenarioStatus::Completed;
                outcome.terminal = true;
                discard = true;
                if let Some(declared) = graph.resolution(resolution) {
                    outcome.steps.push(declared.steps.clone());
                }
                tracing::info!(step = %step.id, resolution = %resolution, "resolution reached");
            }
            StepKind::Input { .. }
            | StepKind::EncounterSets { .. }
            | StepKind::Generic
            | StepKind::RuleReminder
            | StepKind::Story
            | StepKind::LocationSetup { .. }
            | StepKind::LocationConnectors { .. }
            | StepKind::Table
            | StepKind::CampaignLogCount { .. }
            | StepKind::XpCount { .. }
            | StepKind::Internal => {}
        }

        self.commit(staged, outcome, &step.steps, discard);
        Ok(())
    }

    /// Replace the state and queue the requested steps ahead of the rest of
    /// the cursor: requested lists in order, then the step's children.
    fn commit(&mut self, staged: CampaignState, outcome: Outcome, children: &[StepId], discard: bool) {
        self.state = staged;
        self.terminal |= outcome.terminal;
        self.signals.extend(outcome.signals);
        if discard {
            self.cursor.clear();
        }

        let mut lists = outcome.steps;
        lists.push(children.to_vec());
        for list in lists.into_iter().rev().filter(|l| !l.is_empty()) {
            self.cursor.push(list.into());
        }
    }

    fn next_step_id(&mut self) -> Option<StepId> {
        while let Some(list) = self.cursor.last_mut() {
            match list.pop_front() {
                Some(id) => {
                    if list.is_empty() {
                        self.cursor.pop();
                    }
                    return Some(id);
                }
                None => {
                    self.cursor.pop();
                }
            }
        }
        None
    }

    fn fail(&mut self, error: GuideError) -> GuideResult<()> {
        tracing::warn!(graph = %self.graph.id(), error = %error, "scenario run failed");
        self.status = RunStatus::Failed;
        self.pending = None;
        self.failure = Some(error.to_string());
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_core::{ChaosBag, ChaosToken, Investigator, SectionKind};
    use serde_json::json;

    fn load(guide: serde_json::Value) -> (ScriptStore, Arc<ScenarioGraph>) {
        let mut store = ScriptStore::new();
        store.load(&guide.to_string()).unwrap();
        let graph = store.graph(&GraphId::new("c", "s")).unwrap();
        (store, graph)
    }

    fn guide(setup: serde_json::Value, steps: serde_json::Value) -> serde_json::Value {
        json!({
            "campaign": {"id": "c", "name": "C", "scenarios": ["s"], "campaign_log": [
                {"id": "notes", "title": "Notes"},
                {"id": "cultists", "title": "Cultists", "type": "count"}
            ]},
            "scenarios": [{
                "id": "s", "scenario_name": "S", "setup": setup,
                "resolutions": [{"id": "1", "steps": ["epilogue"]}],
                "steps": steps
            }]
        })
    }

    fn state() -> CampaignState {
        CampaignState::new()
            .with_section("notes", SectionKind::Default)
            .with_section("cultists", SectionKind::Count)
            .with_investigator(Investigator::new("01001", "Roland Banks"))
            .with_investigator(Investigator::new("01002", "Daisy Walker"))
            .with_chaos_bag(ChaosBag::from_counts([(ChaosToken::Skull, 1)]))
    }

    fn story() -> serde_json::Value {
        guide(
            json!(["intro", "ask", "end"]),
            json!([
                {"id": "intro", "steps": ["intro_detail"],
                 "effects": [{"type": "campaign_log", "section": "notes", "id": "started"}]},
                {"id": "intro_detail", "type": "story"},
                {"id": "ask", "type": "input", "input": {"type": "choose_one", "choices": [
                    {"id": "burn", "steps": ["burned"]},
                    {"id": "keep"}
                ]}},
                {"id": "burned", "effects": [
                    {"type": "campaign_log", "section": "notes", "id": "house_burned"}
                ]},
                {"id": "end", "type": "resolution", "resolution": "1"},
                {"id": "epilogue", "type": "story"}
            ]),
        )
    }

    #[test]
    fn runs_until_first_input() {
        let (_, graph) = load(story());
        let run = GuideRun::start(graph, state()).unwrap();
        assert_eq!(run.status(), RunStatus::AwaitingInput);
        let prompt = run.prompt().unwrap();
        assert_eq!(prompt.step_id, "ask");
        assert_eq!(prompt.available_choices().unwrap().len(), 2);
        assert!(run.state().section("notes").unwrap().has_entry("started"));
    }

    #[test]
    fn resume_runs_to_resolution() {
        let (_, graph) = load(story());
        let mut run = GuideRun::start(graph, state()).unwrap();
        run.resume_with_choice("ask", Choice::one("burn")).unwrap();

        assert_eq!(run.status(), RunStatus::Completed);
        assert!(run.prompt().is_none());
        let s = run.state();
        assert!(s.section("notes").unwrap().has_entry("house_burned"));
        assert_eq!(s.scenario_data.resolution.as_deref(), Some("1"));
        assert_eq!(s.scenario_data.status, ScenarioStatus::Completed);
        assert_eq!(run.log().len(), 1);
    }

    #[test]
    fn stale_resume_leaves_run_waiting() {
        let (_, graph) = load(story());
        let mut run = GuideRun::start(graph, state()).unwrap();
        let before = run.state().fingerprint();

        let err = run.resume_with_choice("other", Choice::one("burn")).unwrap_err();
        assert_eq!(
            err,
            GuideError::StaleResume {
                expected: Some("ask".into()),
                received: "other".into(),
            }
        );
        assert_eq!(run.status(), RunStatus::AwaitingInput);
        assert_eq!(run.state().fingerprint(), before);
        assert!(run.log().is_empty());
    }

    #[test]
    fn invalid_choice_keeps_waiting() {
        let (_, graph) = load(story());
        let mut run = GuideRun::start(graph, state()).unwrap();

        let err = run.resume_with_choice("ask", Choice::Count { count: 1 }).unwrap_err();
        assert!(matches!(err, GuideError::InvalidChoice { .. }));
        let err = run.resume_with_choice("ask", Choice::one("nope")).unwrap_err();
        assert!(matches!(err, GuideError::InvalidChoice { .. }));

        assert_eq!(run.status(), RunStatus::AwaitingInput);
        run.resume_with_choice("ask", Choice::one("keep")).unwrap();
        assert_eq!(run.status(), RunStatus::Completed);
    }

    #[test]
    fn finished_runs_cannot_resume() {
        let (_, graph) = load(story());
        let mut run = GuideRun::start(graph, state()).unwrap();
        run.resume_with_choice("ask", Choice::one("keep")).unwrap();
        assert_eq!(
            run.resume_with_choice("ask", Choice::one("keep")).unwrap_err(),
            GuideError::NotRunning {
                status: RunStatus::Completed
            }
        );
    }

    #[test]
    fn exhaustion_without_resolution_fails() {
        let (_, graph) = load(guide(
            json!(["only"]),
            json!([{"id": "only", "type": "story"}, {"id": "epilogue", "type": "story"}]),
        ));
        let err = GuideRun::start(graph, state()).unwrap_err();
        assert_eq!(
            err,
            GuideError::ImplicitCompletion {
                graph: GraphId::new("c", "s")
            }
        );
    }

    #[test]
    fn scenario_status_effect_marks_terminal() {
        let (_, graph) = load(guide(
            json!(["finish", "after"]),
            json!([
                {"id": "finish", "effects": [
                    {"type": "scenario_data", "setting": "scenario_status", "status": "completed"}
                ]},
                {"id": "after", "type": "story"},
                {"id": "epilogue", "type": "story"}
            ]),
        ));
        let run = GuideRun::start(graph, state()).unwrap();
        assert_eq!(run.status(), RunStatus::Completed);
    }

    #[test]
    fn failing_effect_fails_run_without_staging() {
        let (_, graph) = load(guide(
            json!(["ask", "end"]),
            json!([
                {"id": "ask", "type": "input", "input": {"type": "choose_one", "choices": [
                    {"id": "go", "effects": [
                        {"type": "campaign_log", "section": "notes", "id": "tried"},
                        {"type": "remove_chaos_token", "tokens": ["skull", "skull"]}
                    ]}
                ]}},
                {"id": "end", "type": "resolution", "resolution": "1"},
                {"id": "epilogue", "type": "story"}
            ]),
        ));
        let mut run = GuideRun::start(graph, state()).unwrap();
        let before = run.state().clone();

        let err = run.resume_with_choice("ask", Choice::one("go")).unwrap_err();
        assert!(matches!(
            err,
            GuideError::State(cg_core::StateError::InvalidChaosBagOperation { .. })
        ));
        assert_eq!(run.state(), &before);
        assert_eq!(run.status(), RunStatus::Failed);
        assert!(run.log().is_empty());
        assert!(run.prompt().is_none());
        assert!(run.failure().unwrap().contains("chaos bag"));
        assert!(matches!(
            run.resume_with_choice("ask", Choice::one("go")),
            Err(GuideError::NotRunning { status: RunStatus::Failed })
        ));
    }

    #[test]
    fn branch_and_effect_groups() {
        let (_, graph) = load(guide(
            json!(["count", "check", "end"]),
            json!([
                {"id": "count", "type": "input", "input": {"type": "counter", "effects": [
                    {"type": "campaign_log_count", "section": "cultists", "operation": "set_input"}
                ]}},
                {"id": "check", "type": "branch", "condition": {
                    "type": "campaign_log_count", "section": "cultists",
                    "options": [{"numCondition": 0, "steps": ["none_escaped"]}],
                    "defaultOption": {"steps": ["some_escaped"]}
                }},
                {"id": "none_escaped", "type": "story"},
                {"id": "some_escaped", "type": "effects", "effectsWithInput": [
                    {"numberInput": [1], "effects": [
                        {"type": "campaign_log", "section": "notes", "id": "one_escaped"}
                    ]},
                    {"numberInput": [2], "effects": [
                        {"type": "campaign_log", "section": "notes", "id": "two_escaped"}
                    ]}
                ]},
                {"id": "end", "type": "resolution", "resolution": "1"},
                {"id": "epilogue", "type": "story"}
            ]),
        ));
        let mut run = GuideRun::start(graph, state()).unwrap();
        run.resume_with_choice("count", Choice::Count { count: 2 }).unwrap();
        let notes = run.state().section("notes").unwrap();
        assert!(notes.has_entry("two_escaped"));
        assert!(!notes.has_entry("one_escaped"));
    }

    #[test]
    fn save_and_restore_mid_run() {
        let (store, graph) = load(story());
        let run = GuideRun::start(graph, state()).unwrap();
        let json = serde_json::to_string(&run.save()).unwrap();

        let saved: SavedRun = serde_json::from_str(&json).unwrap();
        let mut restored = GuideRun::restore(saved, &store).unwrap();
        assert_eq!(restored.prompt().unwrap().step_id, "ask");
        restored.resume_with_choice("ask", Choice::one("burn")).unwrap();
        assert_eq!(restored.status(), RunStatus::Completed);
    }

    #[test]
    fn restore_needs_a_loaded_graph() {
        let (_, graph) = load(story());
        let saved = GuideRun::start(graph, state()).unwrap().save();
        let err = GuideRun::restore(saved, &ScriptStore::new()).unwrap_err();
        assert_eq!(err, GuideError::UnknownGraph(GraphId::new("c", "s")));
    }

    #[test]
    fn story_steps_run_before_children() {
        let (_, graph) = load(guide(
            json!(["a", "end"]),
            json!([
                {"id": "a", "steps": ["a1"], "effects": [{"type": "story_step", "steps": ["s1"]}]},
                {"id": "a1", "effects": [{"type": "campaign_log", "section": "notes", "id": "a1"}]},
                {"id": "s1", "type": "branch", "condition": {
                    "type": "campaign_log", "section": "notes", "id": "a1",
                    "options": [{"boolCondition": false, "steps": ["first"]}, {"boolCondition": true}]
                }},
                {"id": "first", "effects": [{"type": "campaign_log", "section": "notes", "id": "story_first"}]},
                {"id": "end", "type": "resolution", "resolution": "1"},
                {"id": "epilogue", "type": "story"}
            ]),
        ));
        let run = GuideRun::start(graph, state()).unwrap();
        assert!(run.state().section("notes").unwrap().has_entry("story_first"));
    }
}
