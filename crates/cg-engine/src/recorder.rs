//! The guide log and replay.
//!
//! A run is fully determined by its graph, its starting state and the
//! ordered list of choices made. [`replay`] rebuilds a run from those, which
//! is how sessions are persisted and how [`GuideRun::undo`] works.

use std::sync::Arc;

use cg_core::CampaignState;
use cg_script::{LogEntry, ScenarioGraph, StepId};
use serde::{Deserialize, Serialize};

use crate::error::GuideResult;
use crate::run::GuideRun;

/// Ordered record of resolved inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuideLog {
    entries: Vec<LogEntry>,
}

impl GuideLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the log as markdown.
    pub fn export_markdown(&self) -> String {
        let mut out = String::from("# Campaign Guide Log\n\n");
        for (index, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!(
                "{}. **{}**: {}\n",
                index + 1,
                entry.step_id,
                entry.choice
            ));
        }
        out
    }

    /// Export the log as plain text.
    pub fn export_text(&self) -> String {
        let mut out = String::from("Campaign Guide Log\n==================\n\n");
        for (index, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!("{:>3}. {} -> {}\n", index + 1, entry.step_id, entry.choice));
        }
        out
    }
}

impl From<Vec<LogEntry>> for GuideLog {
    fn from(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }
}

/// Rebuild a run by starting it fresh and answering each prompt with the
/// next logged choice.
pub fn replay(
    graph: Arc<ScenarioGraph>,
    initial: CampaignState,
    entries: &[LogEntry],
) -> GuideResult<GuideRun> {
    let entry = graph.setup.clone();
    replay_from(graph, initial, entry, entries)
}

/// [`replay`] for a run seeded with an explicit step list.
pub fn replay_from(
    graph: Arc<ScenarioGraph>,
    initial: CampaignState,
    entry: Vec<StepId>,
    entries: &[LogEntry],
) -> GuideResult<GuideRun> {
    let mut run = GuideRun::start_at(graph, initial, entry)?;
    for logged in entries {
        run.resume_with_choice(&logged.step_id, logged.choice.clone())?;
    }
    tracing::debug!(entries = entries.len(), status = %run.status(), "replayed run");
    Ok(run)
}

impl GuideRun {
    /// A copy of this run with the most recent choice taken back.
    pub fn undo(&self) -> GuideResult<GuideRun> {
        let entries = self.log().entries();
        let kept = &entries[..entries.len().saturating_sub(1)];
        replay_from(
            Arc::clone(self.graph()),
            self.initial_state().clone(),
            self.entry().to_vec(),
            kept,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuideError;
    use crate::run::RunStatus;
    use cg_core::{ChaosBag, ChaosToken, Investigator, SectionKind};
    use cg_script::{Choice, GraphId, ScriptStore};
    use proptest::prelude::*;
    use serde_json::json;

    fn graph() -> Arc<ScenarioGraph> {
        let guide = json!({
            "campaign": {"id": "c", "name": "C", "scenarios": ["s"], "campaign_log": [
                {"id": "notes", "title": "Notes"},
                {"id": "doom", "title": "Doom", "type": "count"}
            ]},
            "scenarios": [{
                "id": "s", "scenario_name": "S",
                "setup": ["doom_count", "tasks", "fate"],
                "resolutions": [
                    {"id": "1", "steps": []},
                    {"id": "2", "steps": []}
                ],
                "steps": [
                    {"id": "doom_count", "type": "input", "input": {"type": "counter", "max": 5,
                        "effects": [{"type": "campaign_log_count", "section": "doom", "operation": "add_input"}]}},
                    {"id": "tasks", "type": "input", "input": {"type": "checklist", "choices": [
                        {"id": "a", "effects": [{"type": "add_chaos_token", "tokens": ["cultist"]}]},
                        {"id": "b", "effects": [{"type": "earn_xp", "investigator": "all", "bonus": 1}]},
                        {"id": "c", "effects": [{"type": "campaign_log", "section": "notes", "id": "c"}]}
                    ]}},
                    {"id": "fate", "type": "input", "input": {"type": "choose_one", "choices": [
                        {"id": "win", "steps": ["r1"]},
                        {"id": "lose", "steps": ["r2"]}
                    ]}},
                    {"id": "r1", "type": "resolution", "resolution": "1"},
                    {"id": "r2", "type": "resolution", "resolution": "2",
                     "effects": [{"type": "trauma", "investigator": "lead_investigator", "mental": 1}]}
                ]
            }]
        });
        let mut store = ScriptStore::new();
        store.load(&guide.to_string()).unwrap();
        store.graph(&GraphId::new("c", "s")).unwrap()
    }

    fn state() -> CampaignState {
        CampaignState::new()
            .with_section("notes", SectionKind::Default)
            .with_section("doom", SectionKind::Count)
            .with_investigator(Investigator::new("01001", "Roland Banks"))
            .with_chaos_bag(ChaosBag::from_counts([(ChaosToken::Skull, 1)]))
    }

    fn play(count: i64, tasks: Vec<String>, win: bool) -> GuideRun {
        let mut run = GuideRun::start(graph(), state()).unwrap();
        run.resume_with_choice("doom_count", Choice::Count { count }).unwrap();
        run.resume_with_choice("tasks", Choice::Choices { choices: tasks }).unwrap();
        run.resume_with_choice("fate", Choice::one(if win { "win" } else { "lose" }))
            .unwrap();
        run
    }

    #[test]
    fn replay_matches_live_run() {
        let run = play(3, vec!["b".into(), "a".into()], false);
        assert_eq!(run.status(), RunStatus::Completed);

        let replayed = replay(graph(), state(), run.log().entries()).unwrap();
        assert_eq!(replayed.state().fingerprint(), run.state().fingerprint());
        assert_eq!(replayed.save(), run.save());
    }

    #[test]
    fn replay_rejects_mismatching_entries() {
        let entries = vec![LogEntry::new("fate", Choice::one("win"))];
        let err = replay(graph(), state(), &entries).unwrap_err();
        assert_eq!(
            err,
            GuideError::StaleResume {
                expected: Some("doom_count".into()),
                received: "fate".into(),
            }
        );
    }

    #[test]
    fn undo_takes_back_last_choice() {
        let mut run = GuideRun::start(graph(), state()).unwrap();
        run.resume_with_choice("doom_count", Choice::Count { count: 2 }).unwrap();
        run.resume_with_choice("tasks", Choice::Choices { choices: vec!["c".into()] })
            .unwrap();

        let undone = run.undo().unwrap();
        assert_eq!(undone.prompt().unwrap().step_id, "tasks");
        assert_eq!(undone.log().len(), 1);
        assert!(undone.state().section("notes").is_none());
        assert_eq!(undone.state().section("doom").unwrap().count(None), 2);
    }

    #[test]
    fn undo_of_fresh_run_is_fresh_run() {
        let run = GuideRun::start(graph(), state()).unwrap();
        let undone = run.undo().unwrap();
        assert_eq!(undone.save(), run.save());
    }

    #[test]
    fn transcript_exports() {
        let mut run = GuideRun::start(graph(), state()).unwrap();
        run.resume_with_choice("doom_count", Choice::Count { count: 1 }).unwrap();
        run.resume_with_choice("tasks", Choice::Choices { choices: vec!["a".into(), "c".into()] })
            .unwrap();
        run.resume_with_choice("fate", Choice::one("win")).unwrap();

        insta::assert_snapshot!(run.log().export_markdown(), @r"
        # Campaign Guide Log

        1. **doom_count**: 1
        2. **tasks**: a, c
        3. **fate**: win
        ");
        insta::assert_snapshot!(run.log().export_text(), @r"
        Campaign Guide Log
        ==================

          1. doom_count -> 1
          2. tasks -> a, c
          3. fate -> win
        ");
    }

    #[test]
    fn log_serializes_as_entry_list() {
        let log = GuideLog::from(vec![LogEntry::new("fate", Choice::one("win"))]);
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, r#"[{"step_id":"fate","choice":{"choices":["win"]}}]"#);
        let back: GuideLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }

    fn task_subset() -> impl Strategy<Value = Vec<String>> {
        proptest::sample::subsequence(vec!["a", "b", "c"], 0..=3)
            .prop_map(|picked| picked.into_iter().map(String::from).collect())
    }

    proptest! {
        #[test]
        fn replay_is_deterministic(count in 0i64..=5, tasks in task_subset(), win in any::<bool>()) {
            let run = play(count, tasks, win);
            let first = replay(graph(), state(), run.log().entries()).unwrap();
            let second = replay(graph(), state(), run.log().entries()).unwrap();
            prop_assert_eq!(first.state().fingerprint(), run.state().fingerprint());
            prop_assert_eq!(first.save(), second.save());
        }
    }
}
