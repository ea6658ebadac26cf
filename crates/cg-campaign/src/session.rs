//! Campaign session management.
//!
//! `CampaignSession` carries one [`CampaignState`] through the scenarios of a
//! campaign. Each scenario is a [`GuideRun`]; when a run completes, the
//! session records it, picks the next scenario and starts it. The whole
//! session saves as its starting state plus each scenario's log, and is
//! rebuilt by replaying those logs.

use std::sync::Arc;

use cg_core::{CampaignState, CompletedScenario, ScenarioData};
use cg_engine::{GuideLog, GuideRun, Prompt, RunStatus, replay_from};
use cg_script::{Campaign, Choice, LogEntry, ScenarioGraph, StepId};
use serde::{Deserialize, Serialize};

use crate::checkpoint::{Checkpoint, CheckpointStore, JsonDirStore, SessionId};
use crate::config::SessionConfig;
use crate::error::{CampaignError, CampaignResult};

/// The inputs resolved while playing one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioLog {
    /// Scenario id.
    pub scenario: String,
    /// Resolved inputs, in order.
    pub log: GuideLog,
}

/// A campaign session in serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    /// The campaign being played.
    pub campaign_id: String,
    /// State when the campaign started.
    pub initial: CampaignState,
    /// Every scenario played or being played, in order.
    pub scenarios: Vec<ScenarioLog>,
}

#[derive(Debug, Clone)]
enum Progress {
    Playing(Box<GuideRun>),
    Finished(CampaignState),
}

/// Finished scenarios plus whatever is happening now.
#[derive(Debug, Clone)]
struct Timeline {
    history: Vec<ScenarioLog>,
    progress: Progress,
}

impl Timeline {
    fn begin(campaign: &Campaign, initial: CampaignState) -> CampaignResult<Self> {
        let first = campaign
            .first_scenario()
            .ok_or_else(|| CampaignError::NoScenarios(campaign.id.clone()))?;
        let run = start_scenario(campaign, initial, first, true)?;
        let mut timeline = Self {
            history: Vec::new(),
            progress: Progress::Playing(Box::new(run)),
        };
        timeline.advance(campaign)?;
        Ok(timeline)
    }

    /// Rebuild a timeline by replaying every saved scenario log in turn.
    fn replay(campaign: &Campaign, saved: &SavedSession) -> CampaignResult<Self> {
        if saved.campaign_id != campaign.id {
            return Err(CampaignError::CampaignMismatch {
                expected: campaign.id.clone(),
                found: saved.campaign_id.clone(),
            });
        }
        let Some((current, done)) = saved.scenarios.split_last() else {
            return Self::begin(campaign, saved.initial.clone());
        };

        let mut state = saved.initial.clone();
        let mut history = Vec::new();
        let mut expected = campaign.first_scenario().map(str::to_string);
        for record in done {
            check_expected(expected.as_deref(), &record.scenario)?;
            let run = replay_scenario(campaign, state, record, history.is_empty())?;
            if run.status() != RunStatus::Completed {
                return Err(CampaignError::Diverged {
                    scenario: record.scenario.clone(),
                    reason: format!("run is {} after its logged choices", run.status()),
                });
            }
            history.push(record.clone());
            state = run.into_state();
            expected = finish_scenario(campaign, &mut state, &record.scenario);
        }

        check_expected(expected.as_deref(), &current.scenario)?;
        let run = replay_scenario(campaign, state, current, history.is_empty())?;
        let mut timeline = Self {
            history,
            progress: Progress::Playing(Box::new(run)),
        };
        timeline.advance(campaign)?;
        Ok(timeline)
    }

    /// Move past completed runs until one is waiting or the campaign ends.
    fn advance(&mut self, campaign: &Campaign) -> CampaignResult<()> {
        while let Progress::Playing(run) = &self.progress {
            if run.status() != RunStatus::Completed {
                break;
            }
            let scenario = run.graph().id().scenario.clone();
            let mut state = run.state().clone();
            self.history.push(ScenarioLog {
                scenario: scenario.clone(),
                log: run.log().clone(),
            });
            tracing::info!(
                scenario = %scenario,
                resolution = state.scenario_data.resolution.as_deref().unwrap_or("none"),
                "scenario completed"
            );

            self.progress = match finish_scenario(campaign, &mut state, &scenario) {
                Some(next) => {
                    tracing::info!(scenario = %next, "starting scenario");
                    Progress::Playing(Box::new(start_scenario(campaign, state, &next, false)?))
                }
                None => {
                    tracing::info!(campaign = %campaign.id, "campaign finished");
                    Progress::Finished(state)
                }
            };
        }
        Ok(())
    }

    fn run(&self) -> Option<&GuideRun> {
        match &self.progress {
            Progress::Playing(run) => Some(run),
            Progress::Finished(_) => None,
        }
    }

    fn logs(&self) -> Vec<ScenarioLog> {
        let mut logs = self.history.clone();
        if let Some(run) = self.run() {
            logs.push(ScenarioLog {
                scenario: run.graph().id().scenario.clone(),
                log: run.log().clone(),
            });
        }
        logs
    }
}

/// An interactive campaign session.
#[derive(Debug)]
pub struct CampaignSession {
    id: SessionId,
    campaign: Arc<Campaign>,
    initial: CampaignState,
    timeline: Timeline,
    store: Option<Box<dyn CheckpointStore>>,
}

impl CampaignSession {
    /// Start a campaign from its first scenario.
    ///
    /// With autosave on and a checkpoint directory configured, the session
    /// checkpoints to that directory.
    pub fn start(campaign: Arc<Campaign>, config: &SessionConfig) -> CampaignResult<Self> {
        let initial = config.initial_state(&campaign);
        let timeline = Timeline::begin(&campaign, initial.clone())?;
        let store = config
            .checkpoint_dir
            .clone()
            .filter(|_| config.autosave)
            .map(|dir| Box::new(JsonDirStore::new(dir)) as Box<dyn CheckpointStore>);

        let mut session = Self {
            id: SessionId::new(),
            campaign,
            initial,
            timeline,
            store,
        };
        tracing::info!(
            campaign = %session.campaign.id,
            session = %session.id,
            "campaign session started"
        );
        session.checkpoint()?;
        Ok(session)
    }

    /// Rebuild a session from its saved form.
    pub fn restore(campaign: Arc<Campaign>, saved: &SavedSession) -> CampaignResult<Self> {
        let timeline = Timeline::replay(&campaign, saved)?;
        Ok(Self {
            id: SessionId::new(),
            campaign,
            initial: saved.initial.clone(),
            timeline,
            store: None,
        })
    }

    /// Rebuild the session checkpointed in `store` for this campaign and
    /// keep checkpointing there.
    pub fn load(campaign: Arc<Campaign>, store: Box<dyn CheckpointStore>) -> CampaignResult<Self> {
        let checkpoint = store
            .load(&campaign.id)?
            .ok_or_else(|| CampaignError::MissingCheckpoint(campaign.id.clone()))?;
        let mut session = Self::restore(campaign, &checkpoint.session)?;
        session.id = checkpoint.session_id;
        session.store = Some(store);
        tracing::info!(
            campaign = %session.campaign.id,
            session = %session.id,
            saved_at = %checkpoint.saved_at,
            "campaign session loaded"
        );
        Ok(session)
    }

    /// Checkpoint to `store` from now on.
    pub fn with_store(mut self, store: Box<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The campaign being played.
    pub fn campaign(&self) -> &Arc<Campaign> {
        &self.campaign
    }

    /// The checkpoint store, if any.
    pub fn store(&self) -> Option<&dyn CheckpointStore> {
        self.store.as_deref()
    }

    /// The current campaign state.
    pub fn state(&self) -> &CampaignState {
        match &self.timeline.progress {
            Progress::Playing(run) => run.state(),
            Progress::Finished(state) => state,
        }
    }

    /// The scenario run in progress.
    pub fn run(&self) -> Option<&GuideRun> {
        self.timeline.run()
    }

    /// Id of the scenario being played.
    pub fn current_scenario(&self) -> Option<&str> {
        self.run().map(|run| run.graph().id().scenario.as_str())
    }

    /// Scenarios finished so far, with their logs.
    pub fn history(&self) -> &[ScenarioLog] {
        &self.timeline.history
    }

    /// Whether the campaign is over.
    pub fn is_finished(&self) -> bool {
        matches!(self.timeline.progress, Progress::Finished(_))
    }

    /// The pending input, when the session is waiting for a choice.
    pub fn prompt(&self) -> Option<Prompt<'_>> {
        self.run().and_then(GuideRun::prompt)
    }

    /// Resolve the pending input and continue, moving on to later scenarios
    /// as runs complete.
    ///
    /// The resume is staged and checkpointed before it replaces the current
    /// session. A rejected choice leaves the session unchanged; a fatal run
    /// error leaves the failed run in place.
    pub fn resume_with_choice(&mut self, step_id: &str, choice: Choice) -> CampaignResult<()> {
        let mut staged = self.timeline.clone();
        let Progress::Playing(run) = &mut staged.progress else {
            return Err(CampaignError::Finished(self.campaign.id.clone()));
        };
        if let Err(e) = run.resume_with_choice(step_id, choice) {
            if !e.is_recoverable() {
                self.timeline = staged;
            }
            return Err(e.into());
        }
        staged.advance(&self.campaign)?;
        self.commit(staged)
    }

    /// Take back the most recent choice of the current scenario. Returns
    /// whether there was one.
    pub fn undo(&mut self) -> CampaignResult<bool> {
        let Some(run) = self.run() else {
            return Ok(false);
        };
        if run.log().is_empty() {
            return Ok(false);
        }
        let mut saved = self.save();
        if let Some(current) = saved.scenarios.last_mut() {
            let mut entries: Vec<LogEntry> = current.log.entries().to_vec();
            entries.pop();
            current.log = GuideLog::from(entries);
        }
        let staged = Timeline::replay(&self.campaign, &saved)?;
        self.commit(staged)?;
        Ok(true)
    }

    /// Serializable snapshot of the session.
    pub fn save(&self) -> SavedSession {
        self.saved(&self.timeline)
    }

    /// Write the session to its checkpoint store, if it has one.
    pub fn checkpoint(&mut self) -> CampaignResult<()> {
        let saved = self.save();
        self.persist(saved)
    }

    fn commit(&mut self, staged: Timeline) -> CampaignResult<()> {
        let saved = self.saved(&staged);
        self.persist(saved)?;
        self.timeline = staged;
        Ok(())
    }

    fn persist(&mut self, saved: SavedSession) -> CampaignResult<()> {
        let Some(store) = self.store.as_mut() else {
            return Ok(());
        };
        store.save(&Checkpoint::new(self.id, saved))?;
        tracing::info!(campaign = %self.campaign.id, session = %self.id, "checkpoint written");
        Ok(())
    }

    fn saved(&self, timeline: &Timeline) -> SavedSession {
        SavedSession {
            campaign_id: self.campaign.id.clone(),
            initial: self.initial.clone(),
            scenarios: timeline.logs(),
        }
    }
}

fn scenario_graph(campaign: &Campaign, scenario: &str) -> CampaignResult<Arc<ScenarioGraph>> {
    campaign
        .graph(scenario)
        .cloned()
        .ok_or_else(|| CampaignError::UnknownScenario {
            campaign: campaign.id.clone(),
            scenario: scenario.to_string(),
        })
}

/// Steps a scenario run starts with. The campaign's own setup runs ahead of
/// the first scenario.
fn entry_steps(campaign: &Campaign, graph: &ScenarioGraph, first: bool) -> Vec<StepId> {
    let mut steps = if first { campaign.setup.clone() } else { Vec::new() };
    steps.extend(graph.setup.iter().cloned());
    steps
}

/// Fresh scenario data for `scenario`. Killed and insane investigators stay
/// out through their trauma.
fn enter_scenario(mut state: CampaignState, scenario: &str) -> CampaignState {
    let players = u32::try_from(state.active_investigators().len()).unwrap_or(u32::MAX);
    state.scenario_data = ScenarioData::started(scenario, players);
    state
}

fn start_scenario(
    campaign: &Campaign,
    state: CampaignState,
    scenario: &str,
    first: bool,
) -> CampaignResult<GuideRun> {
    let graph = scenario_graph(campaign, scenario)?;
    let entry = entry_steps(campaign, &graph, first);
    Ok(GuideRun::start_at(graph, enter_scenario(state, scenario), entry)?)
}

fn replay_scenario(
    campaign: &Campaign,
    state: CampaignState,
    record: &ScenarioLog,
    first: bool,
) -> CampaignResult<GuideRun> {
    let graph = scenario_graph(campaign, &record.scenario)?;
    let entry = entry_steps(campaign, &graph, first);
    let state = enter_scenario(state, &record.scenario);
    Ok(replay_from(graph, state, entry, record.log.entries())?)
}

/// Record a completed scenario and pick the one to play next. `None` means
/// the campaign is over.
fn finish_scenario(campaign: &Campaign, state: &mut CampaignState, scenario: &str) -> Option<String> {
    let resolution = state.scenario_data.resolution.clone();
    let data = &mut state.campaign_data;
    data.completed_scenarios.push(CompletedScenario {
        scenario: scenario.to_string(),
        resolution,
    });
    if data.result.is_some() {
        return None;
    }
    if let Some(next) = data.next_scenario.take() {
        return Some(next);
    }

    let mut current = scenario;
    while let Some(next) = campaign.scenario_after(current) {
        if !data.skipped_scenarios.contains(next) {
            return Some(next.to_string());
        }
        current = next;
    }
    None
}

fn check_expected(expected: Option<&str>, found: &str) -> CampaignResult<()> {
    if expected == Some(found) {
        return Ok(());
    }
    Err(CampaignError::Diverged {
        scenario: found.to_string(),
        reason: match expected {
            Some(scenario) => format!("expected scenario \"{scenario}\" next"),
            None => "the campaign had already ended".to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryStore;
    use cg_core::CampaignResult as Outcome;
    use serde_json::json;

    fn campaign() -> Arc<Campaign> {
        let guide = json!({
            "campaign": {
                "id": "night", "name": "Night", "scenarios": ["s1", "s2", "s3"],
                "campaign_log": [{"id": "notes", "title": "Notes"}],
                "setup": ["intro"],
                "steps": [{"id": "intro", "effects": [
                    {"type": "campaign_log", "section": "notes", "id": "campaign_started"}
                ]}]
            },
            "scenarios": [
                {
                    "id": "s1", "scenario_name": "Gathering", "setup": ["path", "s1_end"],
                    "steps": [
                        {"id": "path", "type": "input", "input": {"type": "choose_one", "choices": [
                            {"id": "long"},
                            {"id": "direct", "effects": [
                                {"type": "campaign_data", "setting": "next_scenario", "scenario": "s3"}
                            ]},
                            {"id": "skip", "effects": [
                                {"type": "campaign_data", "setting": "skip_scenario", "scenario": "s2"}
                            ]}
                        ]}},
                        {"id": "s1_end", "type": "resolution", "resolution": "1"}
                    ]
                },
                {
                    "id": "s2", "scenario_name": "Midnight Masks", "setup": ["s2_end"],
                    "steps": [{"id": "s2_end", "type": "resolution", "resolution": "2"}]
                },
                {
                    "id": "s3", "scenario_name": "Devourer", "setup": ["omens", "finale", "s3_end"],
                    "steps": [
                        {"id": "omens", "type": "input", "input": {"type": "counter", "effects": []}},
                        {"id": "finale", "type": "input", "input": {"type": "choose_one", "choices": [
                            {"id": "win", "effects": [
                                {"type": "campaign_data", "setting": "result", "value": "win"}
                            ]},
                            {"id": "lose", "effects": [
                                {"type": "campaign_data", "setting": "result", "value": "lose"}
                            ]}
                        ]}},
                        {"id": "s3_end", "type": "resolution", "resolution": "1"}
                    ]
                }
            ]
        });
        Arc::new(cg_script::load_campaign(&guide.to_string()).unwrap())
    }

    fn config() -> SessionConfig {
        SessionConfig::default().with_investigator(cg_core::Investigator::new("01001", "Roland Banks"))
    }

    fn reach_finale(session: &mut CampaignSession) {
        session.resume_with_choice("omens", Choice::Count { count: 2 }).unwrap();
    }

    fn played(session: &CampaignSession) -> Vec<&str> {
        session
            .state()
            .campaign_data
            .completed_scenarios
            .iter()
            .map(|c| c.scenario.as_str())
            .collect()
    }

    #[test]
    fn campaign_setup_runs_before_first_scenario() {
        let session = CampaignSession::start(campaign(), &config()).unwrap();
        assert_eq!(session.current_scenario(), Some("s1"));
        assert_eq!(session.prompt().unwrap().step_id, "path");
        assert!(session.state().section("notes").unwrap().has_entry("campaign_started"));
    }

    #[test]
    fn scenarios_follow_campaign_order() {
        let mut session = CampaignSession::start(campaign(), &config()).unwrap();
        session.resume_with_choice("path", Choice::one("long")).unwrap();

        assert_eq!(session.current_scenario(), Some("s3"));
        assert_eq!(played(&session), ["s1", "s2"]);
        assert_eq!(session.history().len(), 2);
        assert!(session.history()[1].log.is_empty());

        reach_finale(&mut session);
        session.resume_with_choice("finale", Choice::one("win")).unwrap();
        assert!(session.is_finished());
        assert!(session.prompt().is_none());
        assert_eq!(played(&session), ["s1", "s2", "s3"]);
        assert_eq!(session.state().campaign_data.result, Some(Outcome::Win));
        assert_eq!(
            session.state().campaign_data.completed_scenarios[1].resolution.as_deref(),
            Some("2")
        );
    }

    #[test]
    fn next_scenario_is_consumed() {
        let mut session = CampaignSession::start(campaign(), &config()).unwrap();
        session.resume_with_choice("path", Choice::one("direct")).unwrap();
        assert_eq!(session.current_scenario(), Some("s3"));
        assert_eq!(played(&session), ["s1"]);
        assert_eq!(session.state().campaign_data.next_scenario, None);
    }

    #[test]
    fn skipped_scenarios_are_passed_over() {
        let mut session = CampaignSession::start(campaign(), &config()).unwrap();
        session.resume_with_choice("path", Choice::one("skip")).unwrap();
        assert_eq!(session.current_scenario(), Some("s3"));
        assert_eq!(played(&session), ["s1"]);
    }

    #[test]
    fn scenario_data_resets_between_scenarios() {
        let mut session = CampaignSession::start(campaign(), &config()).unwrap();
        session.resume_with_choice("path", Choice::one("direct")).unwrap();
        let data = &session.state().scenario_data;
        assert_eq!(data.scenario.as_deref(), Some("s3"));
        assert_eq!(data.resolution, None);
        assert_eq!(data.player_count, 1);
    }

    #[test]
    fn rejected_choice_leaves_session_unchanged() {
        let mut session = CampaignSession::start(campaign(), &config()).unwrap();
        let before = session.save();
        let err = session
            .resume_with_choice("finale", Choice::one("win"))
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(session.save(), before);
        assert_eq!(session.prompt().unwrap().step_id, "path");
    }

    #[test]
    fn finished_campaign_rejects_choices() {
        let mut session = CampaignSession::start(campaign(), &config()).unwrap();
        session.resume_with_choice("path", Choice::one("direct")).unwrap();
        reach_finale(&mut session);
        session.resume_with_choice("finale", Choice::one("lose")).unwrap();
        assert!(matches!(
            session.resume_with_choice("finale", Choice::one("lose")),
            Err(CampaignError::Finished(id)) if id == "night"
        ));
    }

    #[test]
    fn restore_replays_every_scenario() {
        let mut session = CampaignSession::start(campaign(), &config()).unwrap();
        session.resume_with_choice("path", Choice::one("long")).unwrap();

        let json = serde_json::to_string(&session.save()).unwrap();
        let saved: SavedSession = serde_json::from_str(&json).unwrap();
        let mut restored = CampaignSession::restore(campaign(), &saved).unwrap();

        assert_eq!(restored.state().fingerprint(), session.state().fingerprint());
        assert_eq!(restored.save(), session.save());
        reach_finale(&mut restored);
        restored.resume_with_choice("finale", Choice::one("win")).unwrap();
        assert!(restored.is_finished());
    }

    #[test]
    fn restore_of_finished_campaign_stays_finished() {
        let mut session = CampaignSession::start(campaign(), &config()).unwrap();
        session.resume_with_choice("path", Choice::one("direct")).unwrap();
        reach_finale(&mut session);
        session.resume_with_choice("finale", Choice::one("win")).unwrap();

        let restored = CampaignSession::restore(campaign(), &session.save()).unwrap();
        assert!(restored.is_finished());
        assert_eq!(restored.state(), session.state());
    }

    #[test]
    fn restore_detects_divergence() {
        let session = CampaignSession::start(campaign(), &config()).unwrap();
        let mut saved = session.save();
        saved.scenarios[0].scenario = "s2".into();
        assert!(matches!(
            CampaignSession::restore(campaign(), &saved),
            Err(CampaignError::Diverged { scenario, .. }) if scenario == "s2"
        ));

        let mut saved = session.save();
        saved.campaign_id = "dunwich".into();
        assert!(matches!(
            CampaignSession::restore(campaign(), &saved),
            Err(CampaignError::CampaignMismatch { .. })
        ));
    }

    #[test]
    fn undo_takes_back_last_choice() {
        let mut session = CampaignSession::start(campaign(), &config()).unwrap();
        assert!(!session.undo().unwrap());

        session.resume_with_choice("path", Choice::one("direct")).unwrap();
        assert!(!session.undo().unwrap());
        reach_finale(&mut session);
        assert_eq!(session.prompt().unwrap().step_id, "finale");

        assert!(session.undo().unwrap());
        assert_eq!(session.current_scenario(), Some("s3"));
        assert_eq!(session.prompt().unwrap().step_id, "omens");
        assert_eq!(played(&session), ["s1"]);
    }

    #[test]
    fn checkpoints_after_every_resume() {
        let mut session = CampaignSession::start(campaign(), &config())
            .unwrap()
            .with_store(Box::new(MemoryStore::new()));
        session.resume_with_choice("path", Choice::one("long")).unwrap();

        let checkpoint = session.store().unwrap().load("night").unwrap().unwrap();
        assert_eq!(checkpoint.session_id, session.id());
        assert_eq!(checkpoint.session, session.save());
    }

    #[test]
    fn checkpoint_dir_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config().with_checkpoint_dir(dir.path());
        let mut session = CampaignSession::start(campaign(), &cfg).unwrap();
        assert!(dir.path().join("night.json").exists());
        session.resume_with_choice("path", Choice::one("long")).unwrap();

        let loaded = CampaignSession::load(campaign(), Box::new(JsonDirStore::new(dir.path()))).unwrap();
        assert_eq!(loaded.id(), session.id());
        assert_eq!(loaded.current_scenario(), Some("s3"));
        assert_eq!(loaded.save(), session.save());
    }

    #[test]
    fn autosave_off_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config().with_checkpoint_dir(dir.path()).with_autosave(false);
        let session = CampaignSession::start(campaign(), &cfg).unwrap();
        assert!(session.store().is_none());
        assert!(!dir.path().join("night.json").exists());
    }

    #[test]
    fn missing_checkpoint_is_reported() {
        let err = CampaignSession::load(campaign(), Box::new(MemoryStore::new())).unwrap_err();
        assert!(matches!(err, CampaignError::MissingCheckpoint(id) if id == "night"));
    }

    #[derive(Debug)]
    struct BrokenStore;

    impl CheckpointStore for BrokenStore {
        fn save(&mut self, _: &Checkpoint) -> CampaignResult<()> {
            Err(std::io::Error::other("disk full").into())
        }

        fn load(&self, _: &str) -> CampaignResult<Option<Checkpoint>> {
            Ok(None)
        }

        fn remove(&mut self, _: &str) -> CampaignResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn failed_checkpoint_does_not_commit() {
        let mut session = CampaignSession::start(campaign(), &config())
            .unwrap()
            .with_store(Box::new(BrokenStore));
        let before = session.save();

        let err = session.resume_with_choice("path", Choice::one("long")).unwrap_err();
        assert!(matches!(err, CampaignError::Io(_)));
        assert_eq!(session.save(), before);
        assert_eq!(session.current_scenario(), Some("s1"));
    }
}
