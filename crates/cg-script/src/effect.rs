//! Effects: atomic state mutation instructions.

use cg_core::{CampaignResult, ChaosToken, Difficulty, InvestigatorStatus, ScenarioStatus, SpecialXp, TraumaKind};
use serde::{Deserialize, Serialize};

use crate::StepId;

/// Which investigators an effect applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestigatorSelector {
    /// The lead investigator of the current scenario.
    #[serde(rename = "lead_investigator")]
    LeadInvestigator,
    /// Every playing investigator.
    #[serde(rename = "all")]
    All,
    /// Any one investigator (the lead is used when nobody was chosen).
    #[serde(rename = "any")]
    Any,
    /// The investigator picked in the current input.
    #[serde(rename = "choice")]
    Choice,
    /// Investigators defeated in the current scenario.
    #[serde(rename = "defeated")]
    Defeated,
    /// Investigators who did not resign.
    #[serde(rename = "not_resigned")]
    NotResigned,
    /// Investigators who resigned.
    #[serde(rename = "any_resigned")]
    AnyResigned,
    /// Investigators bound by the most recent input.
    #[serde(rename = "$input_value")]
    InputValue,
    /// The investigator named by the effect's `fixed_investigator`.
    #[serde(rename = "$fixed_investigator")]
    FixedInvestigator,
}

/// Where the cards of a `campaign_log_cards` effect come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardSource {
    /// The lead investigator's code.
    #[serde(rename = "$lead_investigator")]
    LeadInvestigator,
    /// Every playing investigator's code.
    #[serde(rename = "$all_investigators")]
    AllInvestigators,
    /// Codes of defeated investigators.
    #[serde(rename = "$defeated_investigators")]
    DefeatedInvestigators,
    /// Values bound by the most recent input.
    #[serde(rename = "$input_value")]
    InputValue,
}

/// Marker for a value taken from the most recent input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputValue {
    /// `$input_value`.
    #[serde(rename = "$input_value")]
    InputValue,
}

/// How a count effect changes its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountOperation {
    /// Set to the bound numeric input.
    SetInput,
    /// Set to `value`.
    Set,
    /// Add the bound numeric input.
    AddInput,
    /// Add `value`.
    Add,
    /// Subtract the bound numeric input.
    SubtractInput,
}

/// A supply an investigator may buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    /// Supply id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Rules text.
    #[serde(default)]
    pub description: String,
    /// Cost in supply points.
    pub cost: i64,
    /// Whether more than one copy may be bought.
    #[serde(default)]
    pub multiple: bool,
}

/// Settings of the campaign data changed by a `campaign_data` effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "setting", rename_all = "snake_case")]
pub enum CampaignDataEffect {
    /// Set the campaign outcome; this ends the campaign.
    Result {
        /// The outcome.
        value: CampaignResult,
    },
    /// Change the difficulty.
    Difficulty {
        /// The new difficulty.
        value: Difficulty,
    },
    /// Choose the next scenario.
    NextScenario {
        /// Scenario id.
        scenario: String,
    },
    /// Mark a scenario as skipped.
    SkipScenario {
        /// Scenario id.
        scenario: String,
    },
    /// Queue a scenario to be played again.
    ReplayScenario {
        /// Scenario id.
        scenario: String,
    },
    /// Rebuild the chaos bag from the campaign's swap rules.
    SwapChaosBag {
        /// Whether this is the initial swap.
        #[serde(default)]
        initialize: bool,
    },
    /// Send future experience to an investigator-count section.
    RedirectExperience {
        /// The receiving section.
        investigator_count: String,
    },
}

/// Settings of the scenario data changed by a `scenario_data` effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "setting", rename_all = "snake_case")]
pub enum ScenarioDataEffect {
    /// Choose the lead investigator.
    LeadInvestigator {
        /// Always the bound input.
        investigator: InputValue,
    },
    /// Choose the playing investigators.
    PlayingScenario {
        /// Always the bound input.
        investigator: InputValue,
    },
    /// Record how investigators left the scenario.
    InvestigatorStatus {
        /// Always the bound input.
        investigator: InputValue,
        /// The status to record.
        investigator_status: InvestigatorStatus,
    },
    /// Change the scenario lifecycle.
    ScenarioStatus {
        /// The new status.
        status: ScenarioStatus,
        /// The resolution reached.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolution: Option<String>,
    },
}

/// An atomic state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Run additional steps next.
    StoryStep {
        /// Steps to push.
        steps: Vec<StepId>,
    },
    /// Award experience.
    EarnXp {
        /// Receiving investigators.
        investigator: InvestigatorSelector,
        /// Code used by `$fixed_investigator`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fixed_investigator: Option<String>,
        /// Flat amount, or multiplier when an input is bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bonus: Option<i64>,
        /// Multiplier applied to the bound numeric input.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_scale: Option<i64>,
        /// Pool receiving the experience instead of regular XP.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        special_xp: Option<SpecialXp>,
        /// Pool the experience is taken from when transferring.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transfer_special_xp: Option<SpecialXp>,
    },
    /// Add a story card to decks.
    AddCard {
        /// Receiving investigators.
        investigator: InvestigatorSelector,
        /// Code used by `$fixed_investigator`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fixed_investigator: Option<String>,
        /// Card code.
        card: String,
        /// Whether the players may decline the card.
        #[serde(default)]
        optional: bool,
    },
    /// Queue a random weakness draw.
    AddWeakness {
        /// Receiving investigators.
        investigator: InvestigatorSelector,
        /// Traits the weakness must have.
        weakness_traits: Vec<String>,
        /// Draw as many as the bound numeric input.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<InputValue>,
    },
    /// Remove a story card from decks.
    RemoveCard {
        /// Affected investigators (every one when absent).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        investigator: Option<InvestigatorSelector>,
        /// Code used by `$fixed_investigator`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fixed_investigator: Option<String>,
        /// Card code.
        card: String,
    },
    /// Swap one story card for another in every deck holding it.
    ReplaceCard {
        /// Card to remove.
        old_card: String,
        /// Card to add in its place.
        new_card: String,
    },
    /// Add or heal trauma.
    Trauma {
        /// Affected investigators.
        investigator: InvestigatorSelector,
        /// Heal this kind of trauma by the bound numeric input.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        heal_input: Option<TraumaKind>,
        /// Mental trauma to add.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mental: Option<u32>,
        /// Physical trauma to add.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        physical: Option<u32>,
        /// Trauma to add, of the kind named by the bound text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mental_or_physical: Option<u32>,
        /// Kill the investigators.
        #[serde(default)]
        killed: bool,
        /// Drive the investigators insane.
        #[serde(default)]
        insane: bool,
    },
    /// Write, cross out or remove a log entry.
    CampaignLog {
        /// Section id.
        section: String,
        /// Entry id.
        id: String,
        /// Replacement text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        /// Cross the entry out instead of writing it.
        #[serde(default)]
        cross_out: bool,
        /// Remove the entry.
        #[serde(default)]
        remove: bool,
    },
    /// Write a log entry holding cards.
    CampaignLogCards {
        /// Section id.
        section: String,
        /// Entry id (the section id when absent).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Replacement text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        /// Where the cards come from.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cards: Option<CardSource>,
        /// Cross the entry out.
        #[serde(default)]
        cross_out: bool,
        /// Remove the entry.
        #[serde(default)]
        remove: bool,
    },
    /// Change a log count.
    CampaignLogCount {
        /// Section id.
        section: String,
        /// Entry id; the section total when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// The change.
        operation: CountOperation,
        /// Operand of `set` and `add`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<i64>,
    },
    /// Change per-investigator counts.
    CampaignLogInvestigatorCount {
        /// Section id.
        section: String,
        /// Entry id, kept for display.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Affected investigators.
        investigator: InvestigatorSelector,
        /// Code used by `$fixed_investigator`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fixed_investigator: Option<String>,
        /// The change.
        operation: CountOperation,
        /// Operand of `set` and `add`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<i64>,
    },
    /// Change a campaign setting.
    CampaignData(CampaignDataEffect),
    /// Change a scenario setting.
    ScenarioData(ScenarioDataEffect),
    /// Add tokens to the chaos bag.
    AddChaosToken {
        /// Tokens to add, one copy per entry.
        tokens: Vec<ChaosToken>,
    },
    /// Remove tokens from the chaos bag.
    RemoveChaosToken {
        /// Tokens to remove, one copy per entry.
        tokens: Vec<ChaosToken>,
    },
    /// Append the bound text to a section.
    FreeformCampaignLog {
        /// Section id.
        section: String,
    },
    /// Ask the deck collaborator to upgrade decks.
    UpgradeDecks,
    /// Ask the deck collaborator to save decks.
    SaveDecks,
    /// Buy the supplies chosen in the bound input.
    GainSupplies {
        /// Supplies section.
        section: String,
        /// Supplies for sale.
        supplies: Vec<Supply>,
        /// Always the bound input.
        investigator: InputValue,
    },
}

impl Effect {
    /// Short name of the effect, as written in guide data.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StoryStep { .. } => "story_step",
            Self::EarnXp { .. } => "earn_xp",
            Self::AddCard { .. } => "add_card",
            Self::AddWeakness { .. } => "add_weakness",
            Self::RemoveCard { .. } => "remove_card",
            Self::ReplaceCard { .. } => "replace_card",
            Self::Trauma { .. } => "trauma",
            Self::CampaignLog { .. } => "campaign_log",
            Self::CampaignLogCards { .. } => "campaign_log_cards",
            Self::CampaignLogCount { .. } => "campaign_log_count",
            Self::CampaignLogInvestigatorCount { .. } => "campaign_log_investigator_count",
            Self::CampaignData(_) => "campaign_data",
            Self::ScenarioData(_) => "scenario_data",
            Self::AddChaosToken { .. } => "add_chaos_token",
            Self::RemoveChaosToken { .. } => "remove_chaos_token",
            Self::FreeformCampaignLog { .. } => "freeform_campaign_log",
            Self::UpgradeDecks => "upgrade_decks",
            Self::SaveDecks => "save_decks",
            Self::GainSupplies { .. } => "gain_supplies",
        }
    }

    /// The log section the effect writes to, if any.
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::CampaignLog { section, .. }
            | Self::CampaignLogCards { section, .. }
            | Self::CampaignLogCount { section, .. }
            | Self::CampaignLogInvestigatorCount { section, .. }
            | Self::FreeformCampaignLog { section }
            | Self::GainSupplies { section, .. } => Some(section),
            Self::CampaignData(CampaignDataEffect::RedirectExperience { investigator_count }) => {
                Some(investigator_count)
            }
            _ => None,
        }
    }

    /// The scenario the effect refers to, if any.
    pub fn scenario(&self) -> Option<&str> {
        match self {
            Self::CampaignData(
                CampaignDataEffect::NextScenario { scenario }
                | CampaignDataEffect::SkipScenario { scenario }
                | CampaignDataEffect::ReplayScenario { scenario },
            ) => Some(scenario),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_earn_xp() {
        let effect: Effect = serde_json::from_str(
            r#"{"type":"earn_xp","investigator":"$input_value","bonus":2}"#,
        )
        .unwrap();
        assert_eq!(
            effect,
            Effect::EarnXp {
                investigator: InvestigatorSelector::InputValue,
                fixed_investigator: None,
                bonus: Some(2),
                input_scale: None,
                special_xp: None,
                transfer_special_xp: None,
            }
        );
    }

    #[test]
    fn parse_nested_campaign_data() {
        let effect: Effect = serde_json::from_str(
            r#"{"type":"campaign_data","setting":"next_scenario","scenario":"the_midnight_masks"}"#,
        )
        .unwrap();
        assert_eq!(effect.scenario(), Some("the_midnight_masks"));
        assert_eq!(effect.name(), "campaign_data");
    }

    #[test]
    fn unit_effects_parse() {
        let effect: Effect = serde_json::from_str(r#"{"type":"upgrade_decks"}"#).unwrap();
        assert_eq!(effect, Effect::UpgradeDecks);
    }

    #[test]
    fn chaos_tokens_parse() {
        let effect: Effect =
            serde_json::from_str(r#"{"type":"remove_chaos_token","tokens":["skull","-1"]}"#)
                .unwrap();
        assert_eq!(
            effect,
            Effect::RemoveChaosToken {
                tokens: vec![ChaosToken::Skull, ChaosToken::MinusOne]
            }
        );
    }

    #[test]
    fn unknown_effect_type_is_rejected() {
        let err = serde_json::from_str::<Effect>(r#"{"type":"teleport"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }
}
