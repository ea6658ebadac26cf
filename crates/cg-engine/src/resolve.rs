//! Resolving an input with a human choice.
//!
//! Every input kind has its own rules for which choices are acceptable and
//! which effects they trigger. Resolution runs against a staged state; the
//! controller commits it only when this module returns `Ok`.

use std::collections::{BTreeMap, BTreeSet};

use cg_core::{CampaignState, InvestigatorStatus, StateError};
use cg_script::effect::{InputValue, Supply};
use cg_script::input::{InvestigatorChoiceMode, SupplyUsers};
use cg_script::{Choice, ChoiceOption, Effect, Input, ScenarioGraph, StepId};

use crate::apply::{DeckSignal, Outcome, apply_all};
use crate::context::{BindingContext, BoundInput, SupplyPool};
use crate::error::{GuideError, GuideResult};
use crate::evaluate::evaluate;

/// What resolving an input produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Resolved {
    /// Bindings for the steps that follow.
    pub ctx: BindingContext,
    /// Steps to push and signals raised.
    pub outcome: Outcome,
}

/// Whether a choice is offered given the state and bindings.
pub fn is_available(
    option: &ChoiceOption,
    state: &CampaignState,
    ctx: &BindingContext,
) -> GuideResult<bool> {
    match &option.condition {
        Some(condition) => match evaluate(condition, state, ctx) {
            Ok(_) => Ok(true),
            Err(GuideError::UnmatchedCondition { .. }) => Ok(false),
            Err(e) => Err(e),
        },
        None => Ok(true),
    }
}

/// Resolve `input` (from step `step`) with `choice`.
///
/// The shape of `choice` has already been checked against the input.
pub(crate) fn resolve(
    step: &str,
    input: &Input,
    choice: &Choice,
    graph: &ScenarioGraph,
    state: &mut CampaignState,
    ctx: &BindingContext,
) -> GuideResult<Resolved> {
    let mut resolver = Resolver {
        step,
        state,
        outcome: Outcome::default(),
    };
    let ctx = match (input, choice) {
        (
            Input::ChooseOne { choices } | Input::ReceiveCampaignLink { choices, .. },
            Choice::Choices { choices: ids },
        ) => resolver.choose_one(choices, ids, ctx)?,
        (Input::Checklist { choices, .. }, Choice::Choices { choices: ids }) => {
            resolver.checklist(choices, ids, ctx)?
        }
        (Input::CardChoice { choices, min, max }, Choice::Cards { cards }) => {
            resolver.card_choice(choices, *min, *max, cards, ctx)?
        }
        (
            Input::InvestigatorChoice {
                investigator,
                optional,
                choices,
            },
            Choice::Selections { selections },
        ) => resolver.investigator_choice(*investigator, *optional, choices, selections, ctx)?,
        (Input::Counter { min, max, effects, .. }, Choice::Count { count }) => {
            resolver.counter(min.unwrap_or(0), *max, effects, *count)?
        }
        (
            Input::InvestigatorCounter {
                max,
                negative,
                effects,
                ..
            },
            choice,
        ) => {
            let counts = match choice {
                Choice::Count { count } => resolver
                    .state
                    .playing_investigators()
                    .into_iter()
                    .map(|code| (code, *count))
                    .collect(),
                Choice::Counts { counts } => counts.clone(),
                _ => return Err(GuideError::invalid_choice(step, "expected counts")),
            };
            resolver.investigator_counter(*max, *negative, effects, counts)?
        }
        (
            Input::Supplies {
                points,
                supplies,
                section,
                special_xp,
            },
            Choice::Supplies { supplies: chosen },
        ) => {
            let pool = match special_xp {
                Some(pool) => SupplyPool::Special(*pool),
                None => {
                    let players = usize::try_from(resolver.state.player_count()).unwrap_or(1);
                    let points = points
                        .get(players.saturating_sub(1))
                        .or(points.last())
                        .copied()
                        .unwrap_or(0);
                    SupplyPool::Points(points)
                }
            };
            resolver.supplies(section, supplies, chosen, pool)?
        }
        (
            Input::UseSupplies {
                section,
                id,
                investigator,
                min,
                max,
                choices,
                ..
            },
            Choice::Investigators { investigators },
        ) => {
            resolver.spend_supplies(section, id, *investigator, (*min, *max), investigators)?;
            let used = !investigators.is_empty();
            let ctx = BindingContext::with_input(BoundInput::Investigators(investigators.clone()));
            if let Some(option) = choices.iter().find(|o| o.bool_condition == Some(used)) {
                let outcome = apply_all(option.all_effects(), resolver.state, &ctx)?;
                resolver.outcome.merge(outcome);
                resolver.push(&option.steps);
            }
            ctx
        }
        (
            Input::InvestigatorChoiceSupplies {
                section,
                id,
                positive_choice,
                negative_choice,
                ..
            },
            Choice::Investigators { investigators },
        ) => {
            if investigators.len() > 1 {
                return Err(GuideError::invalid_choice(step, "at most one investigator may spend"));
            }
            resolver.spend_supplies(section, id, SupplyUsers::Choice, (None, Some(1)), investigators)?;
            let ctx = BindingContext::with_input(BoundInput::Investigators(investigators.clone()));
            let option = if investigators.is_empty() {
                negative_choice
            } else {
                positive_choice
            };
            resolver.take(option, &ctx)?;
            ctx
        }
        (
            Input::ScenarioInvestigators {
                choose_none_steps,
                lead_investigator_effects,
            },
            Choice::Investigators { investigators },
        ) => resolver.scenario_investigators(choose_none_steps, lead_investigator_effects, investigators)?,
        (
            Input::PlayScenario {
                branches,
                no_resolutions,
            },
            Choice::Choices { choices: ids },
        ) => resolver.play_scenario(graph, branches, *no_resolutions, ids, ctx)?,
        (Input::TextBox { effects }, Choice::Text { text }) => {
            let ctx = BindingContext::with_input(BoundInput::Values(vec![text.clone()]));
            let outcome = apply_all(effects, resolver.state, &ctx)?;
            resolver.outcome.merge(outcome);
            ctx
        }
        (Input::RandomLocation { cards, multiple }, Choice::Cards { cards: drawn }) => {
            if drawn.len() > 1 && !multiple {
                return Err(GuideError::invalid_choice(step, "only one location is drawn"));
            }
            if let Some(card) = drawn.iter().find(|c| !cards.contains(c)) {
                return Err(GuideError::invalid_choice(
                    step,
                    format!("\"{card}\" is not one of the candidate locations"),
                ));
            }
            BindingContext::with_input(BoundInput::Values(drawn.clone()))
        }
        (Input::UpgradeDecks, _) => {
            resolver.outcome.signals.push(DeckSignal::UpgradeDecks);
            ctx.clone()
        }
        (Input::SaveDecks, _) => {
            resolver.outcome.signals.push(DeckSignal::SaveDecks);
            ctx.clone()
        }
        (Input::SendCampaignLink { .. } | Input::RandomLocation { .. }, Choice::Acknowledge {}) => {
            ctx.clone()
        }
        (input, choice) => {
            return Err(GuideError::invalid_choice(
                step,
                format!("{} does not accept {}", input.name(), choice.kind()),
            ));
        }
    };

    Ok(Resolved {
        ctx,
        outcome: resolver.outcome,
    })
}

struct Resolver<'r> {
    step: &'r str,
    state: &'r mut CampaignState,
    outcome: Outcome,
}

impl Resolver<'_> {
    fn invalid(&self, reason: impl Into<String>) -> GuideError {
        GuideError::invalid_choice(self.step, reason)
    }

    /// Supply shortfalls reject the choice instead of failing the run.
    fn reject_shortfall(&self, error: GuideError) -> GuideError {
        match error {
            GuideError::State(
                e @ (StateError::MissingSupply { .. } | StateError::InsufficientSupplyPoints { .. }),
            ) => self.invalid(e.to_string()),
            other => other,
        }
    }

    fn push(&mut self, steps: &[StepId]) {
        if !steps.is_empty() {
            self.outcome.steps.push(steps.to_vec());
        }
    }

    /// Apply a picked choice and queue its steps.
    fn take(&mut self, option: &ChoiceOption, ctx: &BindingContext) -> GuideResult<()> {
        let outcome = apply_all(option.all_effects(), self.state, ctx)?;
        self.outcome.merge(outcome);
        self.push(&option.steps);
        Ok(())
    }

    fn find<'c>(
        &self,
        choices: &'c [ChoiceOption],
        id: &str,
        ctx: &BindingContext,
    ) -> GuideResult<&'c ChoiceOption> {
        let option = choices
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| self.invalid(format!("unknown choice \"{id}\"")))?;
        if !is_available(option, self.state, ctx)? {
            return Err(self.invalid(format!("choice \"{id}\" is not available")));
        }
        Ok(option)
    }

    fn check_playing(&self, investigators: impl IntoIterator<Item = impl AsRef<str>>) -> GuideResult<()> {
        let playing = self.state.playing_investigators();
        for code in investigators {
            let code = code.as_ref();
            if !playing.iter().any(|p| p == code) {
                return Err(self.invalid(format!("{code} is not playing this scenario")));
            }
        }
        Ok(())
    }

    fn choose_one(
        &mut self,
        choices: &[ChoiceOption],
        ids: &[String],
        ctx: &BindingContext,
    ) -> GuideResult<BindingContext> {
        let [id] = ids else {
            return Err(self.invalid("pick exactly one choice"));
        };
        let option = self.find(choices, id, ctx)?;
        let ctx = BindingContext::with_input(BoundInput::Values(vec![id.clone()]));
        self.take(option, &ctx)?;
        Ok(ctx)
    }

    fn checklist(
        &mut self,
        choices: &[ChoiceOption],
        ids: &[String],
        ctx: &BindingContext,
    ) -> GuideResult<BindingContext> {
        let picked: BTreeSet<&String> = ids.iter().collect();
        if picked.len() != ids.len() {
            return Err(self.invalid("a choice was ticked twice"));
        }
        for id in ids {
            self.find(choices, id, ctx)?;
        }
        let ctx = BindingContext::with_input(BoundInput::Values(ids.to_vec()));
        for option in choices.iter().filter(|c| picked.contains(&c.id)) {
            self.take(option, &ctx)?;
        }
        Ok(ctx)
    }

    fn card_choice(
        &mut self,
        choices: &[ChoiceOption],
        min: Option<u32>,
        max: Option<u32>,
        cards: &[String],
        ctx: &BindingContext,
    ) -> GuideResult<BindingContext> {
        let picked = u32::try_from(cards.len()).unwrap_or(u32::MAX);
        if picked < min.unwrap_or(0) || max.is_some_and(|max| picked > max) {
            return Err(self.invalid(format!("{picked} card(s) picked, outside the allowed range")));
        }
        for card in cards {
            if choices.iter().any(|c| &c.id == card) {
                self.find(choices, card, ctx)?;
            }
        }
        let ctx = BindingContext::with_input(BoundInput::Values(cards.to_vec()));
        for option in choices.iter().filter(|c| cards.contains(&c.id)) {
            self.take(option, &ctx)?;
        }
        Ok(ctx)
    }

    fn investigator_choice(
        &mut self,
        mode: InvestigatorChoiceMode,
        optional: bool,
        choices: &[ChoiceOption],
        selections: &BTreeMap<String, String>,
        ctx: &BindingContext,
    ) -> GuideResult<BindingContext> {
        self.check_playing(selections.keys())?;

        let asked = match mode {
            InvestigatorChoiceMode::Resigned => self
                .state
                .investigators_where(|s| s == InvestigatorStatus::Resigned),
            _ => self.state.playing_investigators(),
        };
        if let Some(code) = selections.keys().find(|code| !asked.contains(code)) {
            return Err(self.invalid(format!("{code} is not asked this question")));
        }
        match mode {
            InvestigatorChoiceMode::All | InvestigatorChoiceMode::Resigned if !optional => {
                if let Some(code) = asked.iter().find(|code| !selections.contains_key(*code)) {
                    return Err(self.invalid(format!("{code} has not picked a choice")));
                }
            }
            InvestigatorChoiceMode::Any if selections.len() > 1 => {
                return Err(self.invalid("only one investigator may pick"));
            }
            InvestigatorChoiceMode::Any if selections.is_empty() && !optional => {
                return Err(self.invalid("one investigator must pick"));
            }
            _ => {}
        }
        for (code, id) in selections {
            self.find(choices, id, &ctx.for_each(code))?;
        }

        for option in choices {
            let pickers: Vec<String> = selections
                .iter()
                .filter(|(_, id)| **id == option.id)
                .map(|(code, _)| code.clone())
                .collect();
            if !pickers.is_empty() {
                let ctx = BindingContext::with_input(BoundInput::Investigators(pickers));
                self.take(option, &ctx)?;
            }
        }
        Ok(BindingContext::with_input(BoundInput::Investigators(
            selections.keys().cloned().collect(),
        )))
    }

    fn counter(
        &mut self,
        min: i64,
        max: Option<i64>,
        effects: &[Effect],
        count: i64,
    ) -> GuideResult<BindingContext> {
        if count < min || max.is_some_and(|max| count > max) {
            let upper = max.map_or_else(|| "..".to_string(), |max| format!("..={max}"));
            return Err(self.invalid(format!("{count} is outside {min}{upper}")));
        }
        let ctx = BindingContext::with_input(BoundInput::Number(count));
        let outcome = apply_all(effects, self.state, &ctx)?;
        self.outcome.merge(outcome);
        Ok(ctx)
    }

    fn investigator_counter(
        &mut self,
        max: Option<i64>,
        negative: bool,
        effects: &[Effect],
        counts: BTreeMap<String, i64>,
    ) -> GuideResult<BindingContext> {
        self.check_playing(counts.keys())?;
        for (code, count) in &counts {
            if *count < 0 && !negative {
                return Err(self.invalid(format!("{code}: negative numbers are not allowed")));
            }
            if max.is_some_and(|max| *count > max) {
                return Err(self.invalid(format!("{code}: {count} is above the maximum")));
            }
        }
        let ctx = BindingContext::with_input(BoundInput::Counts(counts));
        let outcome = apply_all(effects, self.state, &ctx)?;
        self.outcome.merge(outcome);
        Ok(ctx)
    }

    fn supplies(
        &mut self,
        section: &str,
        supplies: &[Supply],
        chosen: &BTreeMap<String, Vec<String>>,
        pool: SupplyPool,
    ) -> GuideResult<BindingContext> {
        self.check_playing(chosen.keys())?;
        for (code, ids) in chosen {
            for (index, id) in ids.iter().enumerate() {
                let supply = supplies
                    .iter()
                    .find(|s| &s.id == id)
                    .ok_or_else(|| self.invalid(format!("unknown supply \"{id}\"")))?;
                if !supply.multiple && ids[..index].contains(id) {
                    return Err(self.invalid(format!("{code} may buy only one {}", supply.name)));
                }
            }
        }
        let ctx = BindingContext {
            input: Some(BoundInput::Supplies(chosen.clone())),
            each: None,
            supply_pool: Some(pool),
        };
        let gain = Effect::GainSupplies {
            section: section.to_string(),
            supplies: supplies.to_vec(),
            investigator: InputValue::InputValue,
        };
        let outcome = apply_all([&gain], self.state, &ctx).map_err(|e| self.reject_shortfall(e))?;
        self.outcome.merge(outcome);
        Ok(ctx)
    }

    /// Each listed investigator spends one copy of a supply.
    fn spend_supplies(
        &mut self,
        section: &str,
        id: &str,
        users: SupplyUsers,
        (min, max): (Option<u32>, Option<u32>),
        investigators: &[String],
    ) -> GuideResult<()> {
        self.check_playing(investigators)?;
        let holders: Vec<String> = self
            .state
            .playing_investigators()
            .into_iter()
            .filter(|code| {
                self.state
                    .investigator(code)
                    .is_some_and(|i| i.supply_count(section, id) > 0)
            })
            .collect();

        match users {
            SupplyUsers::All => {
                let picked: BTreeSet<&String> = investigators.iter().collect();
                if picked != holders.iter().collect::<BTreeSet<_>>() {
                    return Err(self.invalid(format!("every holder of \"{id}\" must spend it")));
                }
            }
            SupplyUsers::Choice => {
                if let Some(code) = investigators.iter().find(|c| !holders.contains(c)) {
                    return Err(self.invalid(format!("{code} has no \"{id}\" to spend")));
                }
                let picked = u32::try_from(investigators.len()).unwrap_or(u32::MAX);
                if picked < min.unwrap_or(0) || max.is_some_and(|max| picked > max) {
                    return Err(self.invalid(format!("{picked} investigator(s) is outside the allowed range")));
                }
            }
        }
        for code in investigators {
            let spent = self.state.investigator_mut(code)?.use_supply(section, id);
            spent.map_err(|e| self.reject_shortfall(e.into()))?;
        }
        Ok(())
    }

    fn scenario_investigators(
        &mut self,
        choose_none_steps: &[StepId],
        lead_effects: &[Effect],
        investigators: &[String],
    ) -> GuideResult<BindingContext> {
        let active = self.state.active_investigators();
        if let Some(code) = investigators.iter().find(|c| !active.contains(c)) {
            return Err(self.invalid(format!("{code} is not in the campaign")));
        }
        if investigators.iter().collect::<BTreeSet<_>>().len() != investigators.len() {
            return Err(self.invalid("an investigator was picked twice"));
        }

        let ctx = BindingContext::with_input(BoundInput::Investigators(investigators.to_vec()));
        let Some(lead) = investigators.first() else {
            self.push(choose_none_steps);
            return Ok(ctx);
        };

        let data = &mut self.state.scenario_data;
        data.playing = investigators.to_vec();
        data.lead_investigator = Some(lead.clone());
        data.player_count = u32::try_from(investigators.len()).unwrap_or(u32::MAX);

        let lead_ctx = BindingContext::with_input(BoundInput::Investigators(vec![lead.clone()]));
        let outcome = apply_all(lead_effects, self.state, &lead_ctx)?;
        self.outcome.merge(outcome);
        Ok(ctx)
    }

    fn play_scenario(
        &mut self,
        graph: &ScenarioGraph,
        branches: &[ChoiceOption],
        no_resolutions: bool,
        ids: &[String],
        ctx: &BindingContext,
    ) -> GuideResult<BindingContext> {
        let [id] = ids else {
            return Err(self.invalid("pick exactly one branch or resolution"));
        };
        let bound = BindingContext::with_input(BoundInput::Values(vec![id.clone()]));
        if branches.iter().any(|b| &b.id == id) {
            let option = self.find(branches, id, ctx)?;
            self.take(option, &bound)?;
            return Ok(bound);
        }
        match graph.resolution_step(id) {
            Some(step) if !no_resolutions => {
                self.push(std::slice::from_ref(&step.id));
                Ok(bound)
            }
            _ => Err(self.invalid(format!("\"{id}\" is neither a branch nor a resolution"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_core::{Investigator, SectionKind};
    use cg_script::{GraphId, ScriptStore};
    use serde_json::json;

    fn guide() -> serde_json::Value {
        json!({
            "campaign": {"id": "c", "name": "C", "scenarios": ["s"], "campaign_log": [
                {"id": "notes", "title": "Notes"},
                {"id": "supplies", "title": "Supplies", "type": "supplies"}
            ]},
            "scenarios": [{
                "id": "s", "scenario_name": "S", "setup": ["r1"],
                "resolutions": [{"id": "1", "steps": []}],
                "steps": [{"id": "r1", "type": "resolution", "resolution": "1"}]
            }]
        })
    }

    fn graph() -> std::sync::Arc<ScenarioGraph> {
        let mut store = ScriptStore::new();
        store.load(&guide().to_string()).unwrap();
        store.graph(&GraphId::new("c", "s")).unwrap()
    }

    fn state() -> CampaignState {
        CampaignState::new()
            .with_section("notes", SectionKind::Default)
            .with_section("supplies", SectionKind::Supplies)
            .with_investigator(Investigator::new("01001", "Roland Banks"))
            .with_investigator(Investigator::new("01002", "Daisy Walker"))
    }

    fn input(value: serde_json::Value) -> Input {
        serde_json::from_value(value).unwrap()
    }

    fn run(input: &Input, choice: Choice, state: &mut CampaignState) -> GuideResult<Resolved> {
        resolve("ask", input, &choice, &graph(), state, &BindingContext::new())
    }

    #[test]
    fn choose_one_applies_choice() {
        let i = input(json!({"type": "choose_one", "choices": [
            {"id": "burn", "text": "Burn it", "steps": ["burned"],
             "effects": [{"type": "campaign_log", "section": "notes", "id": "burned"}]},
            {"id": "keep", "text": "Keep it"}
        ]}));
        let mut s = state();
        let resolved = run(&i, Choice::one("burn"), &mut s).unwrap();
        assert!(s.section("notes").unwrap().has_entry("burned"));
        assert_eq!(resolved.outcome.steps, vec![vec!["burned".to_string()]]);
        assert_eq!(resolved.ctx.input, Some(BoundInput::Values(vec!["burn".into()])));

        let err = run(&i, Choice::Choices { choices: vec!["burn".into(), "keep".into()] }, &mut state());
        assert!(matches!(err, Err(GuideError::InvalidChoice { .. })));
    }

    #[test]
    fn unavailable_choices_are_rejected() {
        let i = input(json!({"type": "choose_one", "choices": [
            {"id": "secret", "condition": {
                "type": "campaign_log", "section": "notes", "id": "found_key",
                "options": [{"boolCondition": true}]
            }}
        ]}));
        let err = run(&i, Choice::one("secret"), &mut state()).unwrap_err();
        assert_eq!(
            err,
            GuideError::invalid_choice("ask", "choice \"secret\" is not available")
        );
    }

    #[test]
    fn checklist_applies_in_declared_order() {
        let i = input(json!({"type": "checklist", "choices": [
            {"id": "a", "steps": ["step_a"]},
            {"id": "b", "steps": ["step_b"]}
        ]}));
        let resolved = run(
            &i,
            Choice::Choices { choices: vec!["b".into(), "a".into()] },
            &mut state(),
        )
        .unwrap();
        assert_eq!(
            resolved.outcome.steps,
            vec![vec!["step_a".to_string()], vec!["step_b".to_string()]]
        );
    }

    #[test]
    fn counter_checks_range() {
        let i = input(json!({"type": "counter", "max": 3, "effects": [
            {"type": "earn_xp", "investigator": "all", "input_scale": 1}
        ]}));
        let mut s = state();
        run(&i, Choice::Count { count: 2 }, &mut s).unwrap();
        assert_eq!(s.investigator("01001").unwrap().xp, 2);
        assert!(matches!(
            run(&i, Choice::Count { count: 4 }, &mut s),
            Err(GuideError::InvalidChoice { .. })
        ));
        assert!(matches!(
            run(&i, Choice::Count { count: -1 }, &mut s),
            Err(GuideError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn investigator_counter_expands_single_count() {
        let i = input(json!({"type": "investigator_counter", "effects": [
            {"type": "earn_xp", "investigator": "$input_value", "bonus": 2}
        ]}));
        let mut s = state();
        run(&i, Choice::Count { count: 3 }, &mut s).unwrap();
        assert_eq!(s.investigator("01001").unwrap().xp, 6);
        assert_eq!(s.investigator("01002").unwrap().xp, 6);
    }

    #[test]
    fn investigator_choice_binds_pickers() {
        let i = input(json!({"type": "investigator_choice", "investigator": "all", "choices": [
            {"id": "fight", "effects": [{"type": "trauma", "investigator": "$input_value", "physical": 1}]},
            {"id": "flee", "effects": [{"type": "trauma", "investigator": "$input_value", "mental": 1}]}
        ]}));
        let mut s = state();
        let selections = BTreeMap::from([
            ("01001".to_string(), "fight".to_string()),
            ("01002".to_string(), "flee".to_string()),
        ]);
        run(&i, Choice::Selections { selections }, &mut s).unwrap();
        assert_eq!(s.investigator("01001").unwrap().trauma.physical, 1);
        assert_eq!(s.investigator("01002").unwrap().trauma.mental, 1);

        let partial = BTreeMap::from([("01001".to_string(), "fight".to_string())]);
        assert!(matches!(
            run(&i, Choice::Selections { selections: partial }, &mut state()),
            Err(GuideError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn supplies_use_points_for_player_count() {
        let i = input(json!({"type": "supplies", "section": "supplies", "points": [10, 8],
            "supplies": [{"id": "rope", "name": "Rope", "cost": 5}, {"id": "map", "name": "Map", "cost": 4}]
        }));
        let mut s = state();
        let chosen = BTreeMap::from([(
            "01001".to_string(),
            vec!["rope".to_string(), "map".to_string()],
        )]);
        let err = run(&i, Choice::Supplies { supplies: chosen.clone() }, &mut s).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "invalid choice for step \"ask\": 01001 cannot spend 9 supply points: only 8 available"
        );

        let rope = BTreeMap::from([("01001".to_string(), vec!["rope".to_string()])]);
        run(&i, Choice::Supplies { supplies: rope }, &mut s).unwrap();
        assert_eq!(s.investigator("01001").unwrap().supply_count("supplies", "rope"), 1);
    }

    #[test]
    fn use_supplies_selects_by_usage() {
        let i = input(json!({"type": "use_supplies", "section": "supplies", "id": "rope",
            "investigator": "choice", "choices": [
                {"boolCondition": true, "steps": ["climbed"]},
                {"boolCondition": false, "steps": ["fell"]}
            ]
        }));
        let mut s = state();
        s.investigator_mut("01002").unwrap().gain_supply("supplies", "rope");

        let resolved = run(&i, Choice::Investigators { investigators: vec!["01002".into()] }, &mut s).unwrap();
        assert_eq!(resolved.outcome.steps, vec![vec!["climbed".to_string()]]);
        assert_eq!(s.investigator("01002").unwrap().supply_count("supplies", "rope"), 0);

        let err = run(&i, Choice::Investigators { investigators: vec!["01002".into()] }, &mut s);
        assert!(matches!(err, Err(GuideError::InvalidChoice { .. })));

        let resolved = run(&i, Choice::Investigators { investigators: vec![] }, &mut s).unwrap();
        assert_eq!(resolved.outcome.steps, vec![vec!["fell".to_string()]]);
    }

    #[test]
    fn scenario_investigators_sets_lead() {
        let i = input(json!({"type": "scenario_investigators", "choose_none_steps": ["nobody"]}));
        let mut s = state();
        run(&i, Choice::Investigators { investigators: vec!["01002".into()] }, &mut s).unwrap();
        assert_eq!(s.scenario_data.lead_investigator.as_deref(), Some("01002"));
        assert_eq!(s.scenario_data.playing, vec!["01002"]);
        assert_eq!(s.player_count(), 1);

        let resolved = run(&i, Choice::Investigators { investigators: vec![] }, &mut state()).unwrap();
        assert_eq!(resolved.outcome.steps, vec![vec!["nobody".to_string()]]);
    }

    #[test]
    fn play_scenario_reaches_resolution_step() {
        let i = input(json!({"type": "play_scenario"}));
        let resolved = run(&i, Choice::one("1"), &mut state()).unwrap();
        assert_eq!(resolved.outcome.steps, vec![vec!["r1".to_string()]]);
        assert!(matches!(
            run(&i, Choice::one("9"), &mut state()),
            Err(GuideError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn random_location_must_be_a_candidate() {
        let i = input(json!({"type": "random_location", "cards": ["01111", "01112"]}));
        run(&i, Choice::Cards { cards: vec!["01112".into()] }, &mut state()).unwrap();
        assert!(matches!(
            run(&i, Choice::Cards { cards: vec!["09999".into()] }, &mut state()),
            Err(GuideError::InvalidChoice { .. })
        ));
    }
}
