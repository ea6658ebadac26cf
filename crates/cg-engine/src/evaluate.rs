//! Condition evaluation.
//!
//! Evaluation is pure: it reads the state and the binding context, computes
//! a value, and selects the option matching that value. Nothing is mutated.

use std::cmp::Ordering;
use std::fmt;

use cg_core::{CampaignState, InvestigatorStatus, LogSection};
use cg_script::condition::{
    AnyOrAll, CampaignDataCondition, CardHolder, InvestigatorData, MathOperation, Operand,
    ScenarioDataCondition, StatusCheck, TraumaCheck, TraumaSubject,
};
use cg_script::{Condition, ConditionKind, GuideOption};

use crate::context::BindingContext;
use crate::error::{GuideError, GuideResult};

/// The value a condition computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionValue {
    /// Boolean families.
    Bool(bool),
    /// Count families.
    Number(i64),
    /// String families; any of the strings may match an option.
    Strings(Vec<String>),
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Strings(values) if values.is_empty() => f.write_str("nothing"),
            Self::Strings(values) => write!(f, "{}", values.join(", ")),
        }
    }
}

/// Result of evaluating a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    /// The computed value.
    pub value: ConditionValue,
    /// The selected option.
    pub option: &'a GuideOption,
}

/// Evaluate a condition and select its option.
pub fn evaluate<'a>(
    condition: &'a Condition,
    state: &CampaignState,
    ctx: &BindingContext,
) -> GuideResult<Selection<'a>> {
    let value = compute(condition, state, ctx)?;
    let option = select(condition, &value)?;
    Ok(Selection { value, option })
}

/// Pick the option of `condition` matching `value`, falling back to the
/// default. A value no option covers is an error.
pub fn select<'a>(
    condition: &'a Condition,
    value: &ConditionValue,
) -> GuideResult<&'a GuideOption> {
    let default = condition.default_option.as_deref();
    match value {
        ConditionValue::Bool(b) => condition
            .options
            .iter()
            .find(|o| o.bool_condition == Some(*b))
            .or(default)
            .ok_or_else(|| unmatched(condition, value)),
        ConditionValue::Number(n) => {
            let by_number =
                move |n: i64| condition.options.iter().find(|o| o.num_condition == Some(n));
            let capped = condition
                .max
                .filter(|max| n > max)
                .and_then(by_number);
            by_number(*n)
                .or(capped)
                .or(default)
                .ok_or_else(|| unmatched(condition, value))
        }
        ConditionValue::Strings(values) => condition
            .options
            .iter()
            .find(|o| o.condition.as_ref().is_some_and(|c| values.contains(c)))
            .or(default)
            .ok_or_else(|| unmatched(condition, value)),
    }
}

fn unmatched(condition: &Condition, value: &ConditionValue) -> GuideError {
    GuideError::UnmatchedCondition {
        condition: condition.name(),
        value: value.to_string(),
    }
}

/// The lead investigator, falling back to the first playing investigator.
pub(crate) fn lead_investigator(state: &CampaignState) -> Option<String> {
    state
        .scenario_data
        .lead_investigator
        .clone()
        .or_else(|| state.playing_investigators().into_iter().next())
}

fn compute(
    condition: &Condition,
    state: &CampaignState,
    ctx: &BindingContext,
) -> GuideResult<ConditionValue> {
    let value = match &condition.kind {
        ConditionKind::Multi { conditions, count } => {
            let mut holding = 0u32;
            for sub in conditions {
                if truthy(sub, &compute(sub, state, ctx)?) {
                    holding += 1;
                }
            }
            ConditionValue::Bool(holding >= *count)
        }
        ConditionKind::CampaignLog { section, id }
        | ConditionKind::CampaignLogCards { section, id } => {
            ConditionValue::Bool(state.section(section).is_some_and(|s| s.has_entry(id)))
        }
        ConditionKind::CampaignLogCount { section, id } => {
            ConditionValue::Number(log_count(state, section, id.as_deref()))
        }
        ConditionKind::CampaignLogInvestigatorCount { section, investigator } => {
            let counts = state.playing_investigators().into_iter().map(|code| {
                state
                    .section(section)
                    .map_or(0, |s| s.investigator_count(&code))
            });
            let value = match investigator {
                AnyOrAll::All => counts.min(),
                AnyOrAll::Any => counts.max(),
            };
            ConditionValue::Number(value.unwrap_or(0))
        }
        ConditionKind::CampaignLogSectionExists { section } => {
            ConditionValue::Bool(state.log.contains_key(section))
        }
        ConditionKind::Math { op_a, op_b, operation } => {
            let a = operand(state, op_a);
            let b = operand(state, op_b);
            match operation {
                MathOperation::Compare => ConditionValue::Number(match a.cmp(&b) {
                    Ordering::Less => -1,
                    Ordering::Equal => 0,
                    Ordering::Greater => 1,
                }),
                MathOperation::Sum => ConditionValue::Number(a.saturating_add(b)),
                MathOperation::Equals => ConditionValue::Bool(a == b),
            }
        }
        ConditionKind::HasCard { investigator, card } => {
            let holds = |code: &str| {
                state
                    .investigator(code)
                    .is_some_and(|i| i.card_count(card) > 0)
            };
            let held = match investigator {
                CardHolder::Each => holds(bound_each(ctx, "has_card")?),
                CardHolder::Defeated => state
                    .investigators_where(InvestigatorStatus::is_defeated)
                    .iter()
                    .any(|code| holds(code)),
                CardHolder::Any => state.playing_investigators().iter().any(|code| holds(code)),
            };
            ConditionValue::Bool(held)
        }
        ConditionKind::CampaignData(data) => campaign_data(data, state),
        ConditionKind::ScenarioData(data) => scenario_data(data, state),
        ConditionKind::Trauma { investigator, trauma } => {
            let subjects = match investigator {
                TraumaSubject::LeadInvestigator => lead_investigator(state).into_iter().collect(),
                TraumaSubject::All => state.playing_investigators(),
                TraumaSubject::Each => vec![bound_each(ctx, "trauma")?.to_string()],
            };
            let has = |code: &String| {
                state.investigator(code).is_some_and(|i| match trauma {
                    TraumaCheck::Killed => i.trauma.killed,
                    TraumaCheck::Physical => i.trauma.physical > 0,
                    TraumaCheck::Mental => i.trauma.mental > 0,
                })
            };
            ConditionValue::Bool(!subjects.is_empty() && subjects.iter().all(has))
        }
        ConditionKind::CheckSupplies { investigator, section, id, .. } => {
            let playing = state.playing_investigators();
            let holds = |code: &String| {
                state
                    .investigator(code)
                    .is_some_and(|i| i.supply_count(section, id) > 0)
            };
            ConditionValue::Bool(match investigator {
                AnyOrAll::All => !playing.is_empty() && playing.iter().all(holds),
                AnyOrAll::Any => playing.iter().any(holds),
            })
        }
        ConditionKind::Investigator { investigator_data } => {
            let code = bound_each(ctx, "investigator")?;
            ConditionValue::Strings(attributes(state, code, *investigator_data))
        }
    };
    Ok(value)
}

fn campaign_data(data: &CampaignDataCondition, state: &CampaignState) -> ConditionValue {
    let campaign = &state.campaign_data;
    match data {
        CampaignDataCondition::Difficulty => ConditionValue::Strings(
            campaign
                .difficulty
                .map(|d| d.as_str().to_string())
                .into_iter()
                .collect(),
        ),
        CampaignDataCondition::ScenarioCompleted { scenario } => {
            ConditionValue::Bool(campaign.is_completed(scenario))
        }
        CampaignDataCondition::ScenarioReplayed { scenario } => {
            ConditionValue::Bool(campaign.is_replayed(scenario))
        }
        CampaignDataCondition::ChaosBag { token } => {
            ConditionValue::Number(i64::from(state.chaos_bag.count(*token)))
        }
        CampaignDataCondition::Investigator { investigator_data } => {
            let mut values: Vec<String> = state
                .playing_investigators()
                .iter()
                .flat_map(|code| attributes(state, code, *investigator_data))
                .collect();
            values.sort();
            values.dedup();
            ConditionValue::Strings(values)
        }
        CampaignDataCondition::LinkedCampaign => ConditionValue::Bool(campaign.linked_campaign),
        CampaignDataCondition::Version { min_version } => {
            ConditionValue::Bool(campaign.version >= *min_version)
        }
    }
}

fn scenario_data(data: &ScenarioDataCondition, state: &CampaignState) -> ConditionValue {
    match data {
        ScenarioDataCondition::Resolution => ConditionValue::Strings(
            state.scenario_data.resolution.iter().cloned().collect(),
        ),
        ScenarioDataCondition::InvestigatorStatus { investigator } => {
            let matching = match investigator {
                StatusCheck::Defeated => state.investigators_where(InvestigatorStatus::is_defeated),
                StatusCheck::Resigned => {
                    state.investigators_where(|s| s == InvestigatorStatus::Resigned)
                }
            };
            ConditionValue::Bool(!matching.is_empty())
        }
        ScenarioDataCondition::PlayerCount => {
            ConditionValue::Number(i64::from(state.player_count()))
        }
    }
}

fn log_count(state: &CampaignState, section: &str, id: Option<&str>) -> i64 {
    state.section(section).map_or(0, |s: &LogSection| s.count(id))
}

fn operand(state: &CampaignState, op: &Operand) -> i64 {
    match op {
        Operand::CampaignLogCount { section, id } => log_count(state, section, id.as_deref()),
        Operand::ChaosBag { token } => i64::from(state.chaos_bag.count(*token)),
        Operand::Constant { value } => *value,
    }
}

fn attributes(state: &CampaignState, code: &str, data: InvestigatorData) -> Vec<String> {
    let Some(investigator) = state.investigator(code) else {
        return Vec::new();
    };
    match data {
        InvestigatorData::Trait => investigator
            .traits
            .iter()
            .map(|t| t.to_lowercase())
            .collect(),
        InvestigatorData::Faction => investigator.faction.iter().cloned().collect(),
        InvestigatorData::Code => vec![investigator.code.clone()],
    }
}

fn bound_each<'c>(ctx: &'c BindingContext, user: &'static str) -> GuideResult<&'c str> {
    ctx.each
        .as_deref()
        .ok_or_else(|| GuideError::unbound("each", user))
}

/// Whether a sub-condition of `multi` holds.
fn truthy(condition: &Condition, value: &ConditionValue) -> bool {
    match value {
        ConditionValue::Bool(b) => *b,
        ConditionValue::Number(n) => *n > 0,
        ConditionValue::Strings(values) => condition
            .options
            .iter()
            .any(|o| o.condition.as_ref().is_some_and(|c| values.contains(c))),
    }
}
