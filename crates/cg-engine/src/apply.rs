//! Effect application.
//!
//! [`apply`] mutates the state it is given. The controller always hands it
//! a staged copy and commits only when every effect of a step succeeded.

use cg_core::investigator::WeaknessDraw;
use cg_core::{CampaignState, CountUpdate, InvestigatorStatus, ScenarioStatus, SpecialXp, StateError};
use cg_script::effect::{
    CampaignDataEffect, CardSource, CountOperation, ScenarioDataEffect, Supply,
};
use cg_script::{Effect, InvestigatorSelector, StepId};
use serde::{Deserialize, Serialize};

use crate::context::{BindingContext, BoundInput, SupplyPool};
use crate::error::{GuideError, GuideResult};
use crate::evaluate::lead_investigator;

/// A request for the deck-building collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckSignal {
    /// Players should spend experience on their decks.
    UpgradeDecks,
    /// Players should save their decks.
    SaveDecks,
}

/// What applying one effect asks of the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    /// Steps to run next.
    pub steps: Vec<StepId>,
    /// Whether the effect completed the scenario.
    pub completes: bool,
    /// Signal for the deck collaborator.
    pub signal: Option<DeckSignal>,
}

/// Accumulated result of a group of effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Step lists requested, in application order.
    pub steps: Vec<Vec<StepId>>,
    /// Whether any effect completed the scenario.
    pub terminal: bool,
    /// Deck signals raised.
    pub signals: Vec<DeckSignal>,
}

impl Outcome {
    /// Fold one applied effect into the outcome.
    pub fn absorb(&mut self, applied: Applied) {
        if !applied.steps.is_empty() {
            self.steps.push(applied.steps);
        }
        self.terminal |= applied.completes;
        self.signals.extend(applied.signal);
    }

    /// Fold another outcome into this one.
    pub fn merge(&mut self, other: Outcome) {
        self.steps.extend(other.steps);
        self.terminal |= other.terminal;
        self.signals.extend(other.signals);
    }
}

/// Apply effects in order, stopping at the first failure.
pub fn apply_all<'e>(
    effects: impl IntoIterator<Item = &'e Effect>,
    state: &mut CampaignState,
    ctx: &BindingContext,
) -> GuideResult<Outcome> {
    let mut outcome = Outcome::default();
    for effect in effects {
        outcome.absorb(apply(effect, state, ctx)?);
    }
    Ok(outcome)
}

/// Apply one effect to `state`.
pub fn apply(effect: &Effect, state: &mut CampaignState, ctx: &BindingContext) -> GuideResult<Applied> {
    let mut applied = Applied::default();
    let user = effect.name();

    match effect {
        Effect::StoryStep { steps } => applied.steps = steps.clone(),
        Effect::EarnXp {
            investigator,
            fixed_investigator,
            bonus,
            input_scale,
            special_xp,
            transfer_special_xp,
        } => {
            let targets = select(*investigator, fixed_investigator.as_deref(), state, ctx, user)?;
            let scaled = input_scale.is_some() || *investigator == InvestigatorSelector::InputValue;
            for code in targets {
                let bound = ctx.input.as_ref().and_then(|i| i.number_for(&code));
                let amount = match bound {
                    Some(n) if scaled => n
                        .saturating_mul(input_scale.unwrap_or(1))
                        .saturating_mul(bonus.unwrap_or(1)),
                    None if input_scale.is_some() => {
                        return Err(GuideError::unbound("$input_value", user));
                    }
                    _ => bonus.unwrap_or(0),
                };
                earn_xp(state, &code, amount, *special_xp, *transfer_special_xp)?;
            }
        }
        Effect::AddCard {
            investigator,
            fixed_investigator,
            card,
            ..
        } => {
            for code in select(*investigator, fixed_investigator.as_deref(), state, ctx, user)? {
                state.investigator_mut(&code)?.add_card(card);
            }
        }
        Effect::AddWeakness {
            investigator,
            weakness_traits,
            count,
        } => {
            let count = match count {
                Some(_) => bound_total(ctx, user)?,
                None => 1,
            };
            let count = u32::try_from(count.max(0)).unwrap_or(0);
            for code in select(*investigator, None, state, ctx, user)? {
                state
                    .investigator_mut(&code)?
                    .pending_weaknesses
                    .push(WeaknessDraw {
                        traits: weakness_traits.clone(),
                        count,
                    });
            }
        }
        Effect::RemoveCard {
            investigator,
            fixed_investigator,
            card,
        } => {
            let targets = match investigator {
                Some(selector) => select(*selector, fixed_investigator.as_deref(), state, ctx, user)?,
                None => state.active_investigators(),
            };
            for code in targets {
                state.investigator_mut(&code)?.remove_card(card);
            }
        }
        Effect::ReplaceCard { old_card, new_card } => {
            for investigator in state.investigators.values_mut() {
                for _ in 0..investigator.remove_card(old_card) {
                    investigator.add_card(new_card);
                }
            }
        }
        Effect::Trauma {
            investigator,
            heal_input,
            mental,
            physical,
            mental_or_physical,
            killed,
            insane,
        } => {
            let kind = match mental_or_physical {
                Some(_) => Some(bound_trauma_kind(ctx, user)?),
                None => None,
            };
            for code in select(*investigator, None, state, ctx, user)? {
                let heal = match heal_input {
                    Some(_) => ctx
                        .input
                        .as_ref()
                        .and_then(|i| i.number_for(&code))
                        .ok_or_else(|| GuideError::unbound("$input_value", user))?,
                    None => 0,
                };
                let trauma = &mut state.investigator_mut(&code)?.trauma;
                if let Some(healed) = heal_input {
                    let current = trauma.get_mut(*healed);
                    *current = current.saturating_sub(u32::try_from(heal.max(0)).unwrap_or(0));
                }
                trauma.mental = trauma.mental.saturating_add(mental.unwrap_or(0));
                trauma.physical = trauma.physical.saturating_add(physical.unwrap_or(0));
                if let (Some(kind), Some(amount)) = (kind, mental_or_physical) {
                    let current = trauma.get_mut(kind);
                    *current = current.saturating_add(*amount);
                }
                trauma.killed |= *killed;
                trauma.insane |= *insane;
            }
        }
        Effect::CampaignLog {
            section,
            id,
            text,
            cross_out,
            remove,
        } => {
            let section = state.section_mut(section);
            if *remove {
                section.remove(id);
            } else if *cross_out {
                section.cross_out(id)?;
            } else {
                section.record(id, text.as_deref())?;
            }
        }
        Effect::CampaignLogCards {
            section,
            id,
            text,
            cards,
            cross_out,
            remove,
        } => {
            let cards = match cards {
                Some(source) => card_source(*source, state, ctx, user)?,
                None => Vec::new(),
            };
            let id = id.as_deref().unwrap_or(section);
            let section = state.section_mut(section);
            if *remove {
                section.remove(id);
            } else if *cross_out {
                section.cross_out(id)?;
            } else {
                section.record_cards(id, text.as_deref(), &cards)?;
            }
        }
        Effect::CampaignLogCount {
            section,
            id,
            operation,
            value,
        } => {
            let bound = ctx.input.as_ref().and_then(BoundInput::total);
            let update = count_update(*operation, *value, bound, user)?;
            state.section_mut(section).update_count(id.as_deref(), update)?;
        }
        Effect::CampaignLogInvestigatorCount {
            section,
            investigator,
            fixed_investigator,
            operation,
            value,
            ..
        } => {
            for code in select(*investigator, fixed_investigator.as_deref(), state, ctx, user)? {
                let bound = ctx.input.as_ref().and_then(|i| i.number_for(&code));
                let update = count_update(*operation, *value, bound, user)?;
                state
                    .section_mut(section)
                    .update_investigator_count(&code, update)?;
            }
        }
        Effect::CampaignData(setting) => campaign_data(setting, state),
        Effect::ScenarioData(setting) => {
            applied.completes = scenario_data(setting, state, ctx, user)?;
        }
        Effect::AddChaosToken { tokens } => {
            for token in tokens {
                state.chaos_bag.add(*token, 1);
            }
        }
        Effect::RemoveChaosToken { tokens } => {
            for token in tokens {
                state.chaos_bag.remove(*token, 1)?;
            }
        }
        Effect::FreeformCampaignLog { section } => {
            let text = ctx
                .input
                .as_ref()
                .and_then(BoundInput::values)
                .map(|values| values.join(" "))
                .ok_or_else(|| GuideError::unbound("$input_value", user))?;
            let section = state.section_mut(section);
            let last = section
                .entries()
                .iter()
                .filter_map(|e| e.id.strip_prefix("note_")?.parse::<usize>().ok())
                .max()
                .unwrap_or(0);
            section.record(&format!("note_{}", last + 1), Some(&text))?;
        }
        Effect::UpgradeDecks => applied.signal = Some(DeckSignal::UpgradeDecks),
        Effect::SaveDecks => applied.signal = Some(DeckSignal::SaveDecks),
        Effect::GainSupplies {
            section, supplies, ..
        } => gain_supplies(section, supplies, state, ctx, user)?,
    }

    Ok(applied)
}

/// Resolve an investigator selector to investigator codes.
fn select(
    selector: InvestigatorSelector,
    fixed: Option<&str>,
    state: &CampaignState,
    ctx: &BindingContext,
    user: &'static str,
) -> GuideResult<Vec<String>> {
    let codes = match selector {
        InvestigatorSelector::LeadInvestigator | InvestigatorSelector::Any => {
            lead_investigator(state).into_iter().collect()
        }
        InvestigatorSelector::All => state.playing_investigators(),
        InvestigatorSelector::Choice | InvestigatorSelector::InputValue => ctx
            .input
            .as_ref()
            .and_then(BoundInput::investigators)
            .ok_or_else(|| GuideError::unbound("$input_value", user))?,
        InvestigatorSelector::Defeated => state.investigators_where(InvestigatorStatus::is_defeated),
        InvestigatorSelector::NotResigned => {
            state.investigators_where(|s| s != InvestigatorStatus::Resigned)
        }
        InvestigatorSelector::AnyResigned => {
            state.investigators_where(|s| s == InvestigatorStatus::Resigned)
        }
        InvestigatorSelector::FixedInvestigator => vec![
            fixed
                .ok_or_else(|| GuideError::unbound("$fixed_investigator", user))?
                .to_string(),
        ],
    };
    Ok(codes)
}

fn earn_xp(
    state: &mut CampaignState,
    code: &str,
    amount: i64,
    special: Option<SpecialXp>,
    transfer: Option<SpecialXp>,
) -> GuideResult<()> {
    let redirect = state.campaign_data.redirect_experience.clone();
    let investigator = state.investigator_mut(code)?;
    if let Some(pool) = transfer {
        investigator.earn_special(pool, amount.saturating_neg());
    }
    match (special, redirect) {
        (Some(pool), _) => investigator.earn_special(pool, amount),
        (None, Some(section)) => {
            state
                .section_mut(&section)
                .update_investigator_count(code, CountUpdate::Add(amount))?;
        }
        (None, None) => investigator.earn_xp(amount),
    }
    Ok(())
}

fn count_update(
    operation: CountOperation,
    value: Option<i64>,
    bound: Option<i64>,
    user: &'static str,
) -> GuideResult<CountUpdate> {
    let bound = || bound.ok_or_else(|| GuideError::unbound("$input_value", user));
    Ok(match operation {
        CountOperation::Set => CountUpdate::Set(value.unwrap_or(0)),
        CountOperation::Add => CountUpdate::Add(value.unwrap_or(0)),
        CountOperation::SetInput => CountUpdate::Set(bound()?),
        CountOperation::AddInput => CountUpdate::Add(bound()?),
        CountOperation::SubtractInput => CountUpdate::Add(bound()?.saturating_neg()),
    })
}

fn bound_total(ctx: &BindingContext, user: &'static str) -> GuideResult<i64> {
    ctx.input
        .as_ref()
        .and_then(BoundInput::total)
        .ok_or_else(|| GuideError::unbound("$input_value", user))
}

fn bound_trauma_kind(ctx: &BindingContext, user: &'static str) -> GuideResult<cg_core::TraumaKind> {
    let values = ctx.input.as_ref().and_then(BoundInput::values).unwrap_or_default();
    values
        .iter()
        .find_map(|v| match v.as_str() {
            "mental" => Some(cg_core::TraumaKind::Mental),
            "physical" => Some(cg_core::TraumaKind::Physical),
            _ => None,
        })
        .ok_or_else(|| GuideError::unbound("$input_value", user))
}

fn card_source(
    source: CardSource,
    state: &CampaignState,
    ctx: &BindingContext,
    user: &'static str,
) -> GuideResult<Vec<String>> {
    Ok(match source {
        CardSource::LeadInvestigator => lead_investigator(state).into_iter().collect(),
        CardSource::AllInvestigators => state.playing_investigators(),
        CardSource::DefeatedInvestigators => {
            state.investigators_where(InvestigatorStatus::is_defeated)
        }
        CardSource::InputValue => ctx
            .input
            .as_ref()
            .and_then(|i| i.values().map(<[String]>::to_vec).or_else(|| i.investigators()))
            .ok_or_else(|| GuideError::unbound("$input_value", user))?,
    })
}

fn campaign_data(setting: &CampaignDataEffect, state: &mut CampaignState) {
    let data = &mut state.campaign_data;
    match setting {
        CampaignDataEffect::Result { value } => data.result = Some(*value),
        CampaignDataEffect::Difficulty { value } => data.difficulty = Some(*value),
        CampaignDataEffect::NextScenario { scenario } => {
            data.next_scenario = Some(scenario.clone());
        }
        CampaignDataEffect::SkipScenario { scenario } => {
            data.skipped_scenarios.insert(scenario.clone());
        }
        CampaignDataEffect::ReplayScenario { scenario } => {
            data.replayed_scenarios.insert(scenario.clone());
            data.next_scenario = Some(scenario.clone());
        }
        CampaignDataEffect::SwapChaosBag { .. } => data.swap_chaos_bag = true,
        CampaignDataEffect::RedirectExperience { investigator_count } => {
            data.redirect_experience = Some(investigator_count.clone());
        }
    }
}

/// Returns whether the scenario was completed.
fn scenario_data(
    setting: &ScenarioDataEffect,
    state: &mut CampaignState,
    ctx: &BindingContext,
    user: &'static str,
) -> GuideResult<bool> {
    let chosen = || {
        ctx.input
            .as_ref()
            .and_then(|i| i.investigators().or_else(|| i.values().map(<[String]>::to_vec)))
            .ok_or_else(|| GuideError::unbound("$input_value", user))
    };
    let data = &mut state.scenario_data;
    match setting {
        ScenarioDataEffect::LeadInvestigator { .. } => {
            data.lead_investigator = chosen()?.into_iter().next();
        }
        ScenarioDataEffect::PlayingScenario { .. } => data.playing = chosen()?,
        ScenarioDataEffect::InvestigatorStatus {
            investigator_status,
            ..
        } => {
            for code in chosen()? {
                data.investigator_status.insert(code, *investigator_status);
            }
        }
        ScenarioDataEffect::ScenarioStatus { status, resolution } => {
            data.status = *status;
            if resolution.is_some() {
                data.resolution.clone_from(resolution);
            }
            return Ok(*status == ScenarioStatus::Completed);
        }
    }
    Ok(false)
}

fn gain_supplies(
    section: &str,
    supplies: &[Supply],
    state: &mut CampaignState,
    ctx: &BindingContext,
    user: &'static str,
) -> GuideResult<()> {
    let Some(BoundInput::Supplies(chosen)) = &ctx.input else {
        return Err(GuideError::unbound("$input_value", user));
    };
    state.section_mut(section);

    for (code, ids) in chosen {
        let bought: Vec<&Supply> = ids
            .iter()
            .filter_map(|id| supplies.iter().find(|s| &s.id == id))
            .collect();
        let cost = bought.iter().fold(0_i64, |total, s| total.saturating_add(s.cost));

        let investigator = state.investigator_mut(code)?;
        let (available, debit) = match ctx.supply_pool {
            Some(SupplyPool::Points(points)) => (points, None),
            Some(SupplyPool::Special(pool)) => (investigator.special(pool), Some(pool)),
            None => (
                investigator.special(SpecialXp::SupplyPoints),
                Some(SpecialXp::SupplyPoints),
            ),
        };
        if cost > available {
            return Err(StateError::InsufficientSupplyPoints {
                investigator: code.clone(),
                cost,
                available,
            }
            .into());
        }
        if let Some(pool) = debit {
            investigator.earn_special(pool, -cost);
        }
        for supply in bought {
            investigator.gain_supply(section, &supply.id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use cg_core::{ChaosBag, ChaosToken, Investigator, SectionKind};
    use serde_json::json;

    fn effect(value: serde_json::Value) -> Effect {
        serde_json::from_value(value).unwrap()
    }

    fn state() -> CampaignState {
        CampaignState::new()
            .with_section("campaign_notes", SectionKind::Default)
            .with_section("cultists", SectionKind::Count)
            .with_section("vows", SectionKind::InvestigatorCount)
            .with_section("supplies", SectionKind::Supplies)
            .with_investigator(Investigator::new("01001", "Roland Banks"))
            .with_investigator(Investigator::new("01002", "Daisy Walker"))
            .with_chaos_bag(ChaosBag::from_counts([(ChaosToken::Skull, 1)]))
    }

    fn counts(pairs: &[(&str, i64)]) -> BindingContext {
        BindingContext::with_input(BoundInput::Counts(
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        ))
    }

    #[test]
    fn earn_xp_scales_bound_counts() {
        let mut s = state();
        let e = effect(json!({"type": "earn_xp", "investigator": "$input_value", "bonus": 2}));
        apply(&e, &mut s, &counts(&[("01001", 3), ("01002", 3)])).unwrap();
        assert_eq!(s.investigator("01001").unwrap().xp, 6);
        assert_eq!(s.investigator("01002").unwrap().xp, 6);
    }

    #[test]
    fn earn_xp_saturates_on_huge_counts() {
        let mut s = state();
        let e = effect(json!({"type": "earn_xp", "investigator": "all", "input_scale": 2}));
        let ctx = BindingContext::with_input(BoundInput::Number(i64::MAX / 2 + 1));
        apply(&e, &mut s, &ctx).unwrap();
        apply(&e, &mut s, &ctx).unwrap();
        assert_eq!(s.investigator("01001").unwrap().xp, i64::MAX);
    }

    #[test]
    fn huge_counts_saturate() {
        let mut s = state();
        let add = effect(json!({
            "type": "campaign_log_count", "section": "cultists", "operation": "add_input"
        }));
        let ctx = BindingContext::with_input(BoundInput::Number(i64::MAX));
        apply(&add, &mut s, &ctx).unwrap();
        apply(&add, &mut s, &ctx).unwrap();
        assert_eq!(s.section("cultists").unwrap().count(None), i64::MAX);

        let trauma = effect(json!({"type": "trauma", "investigator": "all", "mental": u32::MAX}));
        apply(&trauma, &mut s, &BindingContext::new()).unwrap();
        apply(&trauma, &mut s, &BindingContext::new()).unwrap();
        assert_eq!(s.investigator("01002").unwrap().trauma.mental, u32::MAX);
    }

    #[test]
    fn earn_xp_flat_bonus_for_everyone() {
        let mut s = state();
        let e = effect(json!({"type": "earn_xp", "investigator": "all", "bonus": 1}));
        apply(&e, &mut s, &BindingContext::new()).unwrap();
        assert_eq!(s.investigator("01002").unwrap().xp, 1);
    }

    #[test]
    fn input_scale_without_binding_is_unresolved() {
        let mut s = state();
        let e = effect(json!({"type": "earn_xp", "investigator": "all", "input_scale": 2}));
        assert_eq!(
            apply(&e, &mut s, &BindingContext::new()).unwrap_err(),
            GuideError::unbound("$input_value", "earn_xp")
        );
    }

    #[test]
    fn redirected_experience_lands_in_section() {
        let mut s = state();
        s.campaign_data.redirect_experience = Some("vows".into());
        let e = effect(json!({"type": "earn_xp", "investigator": "lead_investigator", "bonus": 2}));
        apply(&e, &mut s, &BindingContext::new()).unwrap();
        assert_eq!(s.investigator("01001").unwrap().xp, 0);
        assert_eq!(s.section("vows").unwrap().investigator_count("01001"), 2);
    }

    #[test]
    fn chaos_tokens_add_and_remove() {
        let mut s = state();
        let remove = effect(json!({"type": "remove_chaos_token", "tokens": ["skull"]}));
        let add = effect(json!({"type": "add_chaos_token", "tokens": ["skull"]}));
        apply(&remove, &mut s, &BindingContext::new()).unwrap();
        assert_eq!(s.chaos_bag.count(ChaosToken::Skull), 0);
        let err = apply(&remove, &mut s, &BindingContext::new()).unwrap_err();
        assert!(matches!(
            err,
            GuideError::State(StateError::InvalidChaosBagOperation { .. })
        ));
        apply(&add, &mut s, &BindingContext::new()).unwrap();
        assert_eq!(s, state());
    }

    #[test]
    fn log_entries_record_and_cross_out() {
        let mut s = state();
        let record = effect(json!({
            "type": "campaign_log", "section": "campaign_notes", "id": "ghoul_priest_alive"
        }));
        let cross = effect(json!({
            "type": "campaign_log", "section": "campaign_notes", "id": "ghoul_priest_alive",
            "cross_out": true
        }));
        apply(&record, &mut s, &BindingContext::new()).unwrap();
        assert!(s.section("campaign_notes").unwrap().has_entry("ghoul_priest_alive"));
        apply(&cross, &mut s, &BindingContext::new()).unwrap();
        assert!(s.section("campaign_notes").unwrap().is_crossed_out("ghoul_priest_alive"));

        let on_count = effect(json!({"type": "campaign_log", "section": "cultists", "id": "x"}));
        assert!(matches!(
            apply(&on_count, &mut s, &BindingContext::new()),
            Err(GuideError::State(StateError::SectionTypeMismatch { .. }))
        ));
    }

    #[test]
    fn count_operations() {
        let mut s = state();
        let add = effect(json!({
            "type": "campaign_log_count", "section": "cultists", "operation": "add", "value": 2
        }));
        let subtract = effect(json!({
            "type": "campaign_log_count", "section": "cultists", "operation": "subtract_input"
        }));
        apply(&add, &mut s, &BindingContext::new()).unwrap();
        apply(&subtract, &mut s, &BindingContext::with_input(BoundInput::Number(3))).unwrap();
        assert_eq!(s.section("cultists").unwrap().count(None), -1);
    }

    #[test]
    fn cards_come_from_bound_investigators() {
        let mut s = state();
        let e = effect(json!({
            "type": "campaign_log_cards", "section": "campaign_notes", "id": "sacrificed",
            "cards": "$input_value"
        }));
        let ctx = BindingContext::with_input(BoundInput::Investigators(vec!["01002".into()]));
        apply(&e, &mut s, &ctx).unwrap();
        assert_eq!(
            s.section("campaign_notes").unwrap().entry("sacrificed").unwrap().cards,
            vec!["01002"]
        );
    }

    #[test]
    fn replace_card_moves_every_copy() {
        let mut s = state();
        s.investigator_mut("01001").unwrap().add_card("01117");
        s.investigator_mut("01001").unwrap().add_card("01117");
        let e = effect(json!({"type": "replace_card", "old_card": "01117", "new_card": "01118"}));
        apply(&e, &mut s, &BindingContext::new()).unwrap();
        let roland = s.investigator("01001").unwrap();
        assert_eq!(roland.card_count("01117"), 0);
        assert_eq!(roland.card_count("01118"), 2);
    }

    #[test]
    fn trauma_from_bound_text_and_healing() {
        let mut s = state();
        let e = effect(json!({"type": "trauma", "investigator": "all", "mental_or_physical": 1}));
        let ctx = BindingContext::with_input(BoundInput::Values(vec!["physical".into()]));
        apply(&e, &mut s, &ctx).unwrap();
        assert_eq!(s.investigator("01002").unwrap().trauma.physical, 1);

        let heal = effect(json!({
            "type": "trauma", "investigator": "$input_value", "heal_input": "physical"
        }));
        apply(&heal, &mut s, &counts(&[("01002", 5)])).unwrap();
        assert_eq!(s.investigator("01002").unwrap().trauma.physical, 0);
        assert_eq!(s.investigator("01001").unwrap().trauma.physical, 1);
    }

    #[test]
    fn scenario_status_completion() {
        let mut s = state();
        let e = effect(json!({
            "type": "scenario_data", "setting": "scenario_status",
            "status": "completed", "resolution": "2"
        }));
        let applied = apply(&e, &mut s, &BindingContext::new()).unwrap();
        assert!(applied.completes);
        assert_eq!(s.scenario_data.resolution.as_deref(), Some("2"));
    }

    #[test]
    fn supplies_respect_budget() {
        let supplies = json!([
            {"id": "rope", "name": "Rope", "cost": 3},
            {"id": "map", "name": "Map", "cost": 2}
        ]);
        let e = effect(json!({
            "type": "gain_supplies", "section": "supplies", "investigator": "$input_value",
            "supplies": supplies
        }));
        let chosen = BTreeMap::from([("01001".to_string(), vec!["rope".to_string(), "map".to_string()])]);
        let mut ctx = BindingContext::with_input(BoundInput::Supplies(chosen));

        ctx.supply_pool = Some(SupplyPool::Points(4));
        let mut s = state();
        assert!(matches!(
            apply(&e, &mut s, &ctx),
            Err(GuideError::State(StateError::InsufficientSupplyPoints { cost: 5, available: 4, .. }))
        ));

        ctx.supply_pool = Some(SupplyPool::Points(5));
        apply(&e, &mut s, &ctx).unwrap();
        assert_eq!(s.investigator("01001").unwrap().supply_count("supplies", "rope"), 1);
        assert!(s.section("supplies").is_some());
    }

    #[test]
    fn supplies_debit_special_pool() {
        let e = effect(json!({
            "type": "gain_supplies", "section": "supplies", "investigator": "$input_value",
            "supplies": [{"id": "rope", "name": "Rope", "cost": 3}]
        }));
        let chosen = BTreeMap::from([("01001".to_string(), vec!["rope".to_string()])]);
        let ctx = BindingContext::with_input(BoundInput::Supplies(chosen));
        let mut s = state();
        s.investigator_mut("01001")
            .unwrap()
            .earn_special(SpecialXp::SupplyPoints, 4);
        apply(&e, &mut s, &ctx).unwrap();
        assert_eq!(s.investigator("01001").unwrap().special(SpecialXp::SupplyPoints), 1);
    }

    #[test]
    fn deck_signals_and_story_steps() {
        let mut s = state();
        let before = s.clone();
        let effects = [
            effect(json!({"type": "upgrade_decks"})),
            effect(json!({"type": "story_step", "steps": ["a", "b"]})),
        ];
        let outcome = apply_all(&effects, &mut s, &BindingContext::new()).unwrap();
        assert_eq!(outcome.signals, vec![DeckSignal::UpgradeDecks]);
        assert_eq!(outcome.steps, vec![vec!["a".to_string(), "b".to_string()]]);
        assert_eq!(s, before);
    }

    #[test]
    fn freeform_appends_numbered_notes() {
        let mut s = state();
        let e = effect(json!({"type": "freeform_campaign_log", "section": "campaign_notes"}));
        let ctx = BindingContext::with_input(BoundInput::Values(vec!["We kept the key".into()]));
        apply(&e, &mut s, &ctx).unwrap();
        apply(&e, &mut s, &ctx).unwrap();
        let section = s.section("campaign_notes").unwrap();
        assert_eq!(section.entries().len(), 2);
        assert_eq!(section.entry("note_2").unwrap().text.as_deref(), Some("We kept the key"));
    }

    #[test]
    fn freeform_note_after_removal_keeps_later_notes() {
        let mut s = state();
        let e = effect(json!({"type": "freeform_campaign_log", "section": "campaign_notes"}));
        let note = |text: &str| BindingContext::with_input(BoundInput::Values(vec![text.into()]));
        apply(&e, &mut s, &note("first")).unwrap();
        apply(&e, &mut s, &note("second")).unwrap();
        let remove = effect(json!({
            "type": "campaign_log", "section": "campaign_notes", "id": "note_1", "remove": true
        }));
        apply(&remove, &mut s, &BindingContext::new()).unwrap();
        apply(&e, &mut s, &note("third")).unwrap();

        let section = s.section("campaign_notes").unwrap();
        assert_eq!(section.entries().len(), 2);
        assert_eq!(section.entry("note_2").unwrap().text.as_deref(), Some("second"));
        assert_eq!(section.entry("note_3").unwrap().text.as_deref(), Some("third"));
    }
}
