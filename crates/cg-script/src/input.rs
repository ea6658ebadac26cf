//! Inputs: the points where a run waits for a human decision.

use cg_core::SpecialXp;
use serde::{Deserialize, Serialize};

use crate::StepId;
use crate::choice::ChoiceKind;
use crate::condition::{Condition, GuideOption};
use crate::effect::{Effect, Supply};

/// One selectable choice of an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Choice id, recorded in the log.
    pub id: String,
    /// Display text.
    #[serde(default)]
    pub text: String,
    /// Extra description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The choice is offered only when this condition holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Whether the choice stays available after being picked.
    #[serde(default)]
    pub repeatable: bool,
    /// Whether the choice's text is set apart.
    #[serde(default)]
    pub border: bool,
    /// Effects applied before the bordered text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_border_effects: Vec<Effect>,
    /// Effects applied when picked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
    /// Steps pushed when picked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepId>,
}

impl ChoiceOption {
    /// Every effect of the choice, pre-border effects first.
    pub fn all_effects(&self) -> impl Iterator<Item = &Effect> {
        self.pre_border_effects.iter().chain(&self.effects)
    }
}

/// Which investigators an `investigator_choice` input asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigatorChoiceMode {
    /// Every investigator picks a choice.
    All,
    /// Some investigators pick a choice.
    Choice,
    /// One investigator picks a choice.
    Any,
    /// Resigned investigators pick a choice.
    Resigned,
}

/// Who may spend a supply in a `use_supplies` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyUsers {
    /// Investigators picked by the players.
    Choice,
    /// Every investigator holding the supply.
    All,
}

/// A suspension point and the kind of decision it expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    /// Players upgrade their decks.
    UpgradeDecks,
    /// Pick cards.
    CardChoice {
        /// Choices keyed by card code.
        #[serde(default)]
        choices: Vec<ChoiceOption>,
        /// Minimum number of cards.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u32>,
        /// Maximum number of cards.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u32>,
    },
    /// Buy supplies.
    Supplies {
        /// Points available, indexed by player count minus one.
        #[serde(default)]
        points: Vec<i64>,
        /// Supplies for sale.
        supplies: Vec<Supply>,
        /// Supplies section.
        section: String,
        /// Pay from this pool instead of `points`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        special_xp: Option<SpecialXp>,
    },
    /// Investigators spend a supply.
    UseSupplies {
        /// Supplies section.
        section: String,
        /// Supply id.
        id: String,
        /// Supply name.
        #[serde(default)]
        name: String,
        /// Question shown to the players.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
        /// Who may spend.
        investigator: SupplyUsers,
        /// Minimum number of investigators.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u32>,
        /// Maximum number of investigators.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u32>,
        /// Boolean options: whether anyone spent the supply.
        choices: Vec<GuideOption>,
    },
    /// Each investigator picks one of the choices.
    InvestigatorChoice {
        /// Which investigators are asked.
        investigator: InvestigatorChoiceMode,
        /// Whether investigators may pick nothing.
        #[serde(default)]
        optional: bool,
        /// Choices.
        choices: Vec<ChoiceOption>,
    },
    /// Pick exactly one choice.
    ChooseOne {
        /// Choices.
        choices: Vec<ChoiceOption>,
    },
    /// Tick any number of choices.
    Checklist {
        /// Choices.
        choices: Vec<ChoiceOption>,
        /// Question shown to the players.
        #[serde(default)]
        text: String,
    },
    /// Enter a number.
    Counter {
        /// Question shown to the players.
        #[serde(default)]
        text: String,
        /// Lowest allowed value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        /// Highest allowed value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
        /// Effects applied with the number bound.
        effects: Vec<Effect>,
    },
    /// Enter a number per investigator.
    InvestigatorCounter {
        /// Question shown to the players.
        #[serde(default)]
        text: String,
        /// Highest allowed value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
        /// Whether negative numbers are allowed.
        #[serde(default)]
        negative: bool,
        /// Effects applied per investigator with their number bound.
        effects: Vec<Effect>,
    },
    /// One investigator may spend a supply for the positive outcome.
    InvestigatorChoiceSupplies {
        /// Supplies section.
        section: String,
        /// Supply id.
        id: String,
        /// Supply name.
        #[serde(default)]
        name: String,
        /// Question shown to the players.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
        /// Taken when someone spends the supply.
        #[serde(rename = "positiveChoice")]
        positive_choice: ChoiceOption,
        /// Taken when nobody does.
        #[serde(rename = "negativeChoice")]
        negative_choice: ChoiceOption,
    },
    /// Choose who plays the scenario; the first one leads.
    ScenarioInvestigators {
        /// Steps pushed when nobody plays.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        choose_none_steps: Vec<StepId>,
        /// Effects applied to the lead investigator.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        lead_investigator_effects: Vec<Effect>,
    },
    /// Play the scenario and report how it ended.
    PlayScenario {
        /// Extra branches offered besides the resolutions.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        branches: Vec<ChoiceOption>,
        /// Whether resolutions are left out of the offered choices.
        #[serde(default)]
        no_resolutions: bool,
    },
    /// Enter free text.
    TextBox {
        /// Effects applied with the text bound.
        effects: Vec<Effect>,
    },
    /// Receive a decision from a linked campaign.
    ReceiveCampaignLink {
        /// Link id.
        id: String,
        /// Possible decisions.
        choices: Vec<ChoiceOption>,
    },
    /// Send a decision to a linked campaign.
    SendCampaignLink {
        /// Link id.
        id: String,
        /// The decision sent.
        decision: String,
    },
    /// Draw a random location.
    RandomLocation {
        /// Candidate location cards.
        cards: Vec<String>,
        /// Whether several locations are drawn.
        #[serde(default)]
        multiple: bool,
    },
    /// Players save their decks.
    SaveDecks,
}

impl Input {
    /// Short name of the input, as written in guide data.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpgradeDecks => "upgrade_decks",
            Self::CardChoice { .. } => "card_choice",
            Self::Supplies { .. } => "supplies",
            Self::UseSupplies { .. } => "use_supplies",
            Self::InvestigatorChoice { .. } => "investigator_choice",
            Self::ChooseOne { .. } => "choose_one",
            Self::Checklist { .. } => "checklist",
            Self::Counter { .. } => "counter",
            Self::InvestigatorCounter { .. } => "investigator_counter",
            Self::InvestigatorChoiceSupplies { .. } => "investigator_choice_supplies",
            Self::ScenarioInvestigators { .. } => "scenario_investigators",
            Self::PlayScenario { .. } => "play_scenario",
            Self::TextBox { .. } => "text_box",
            Self::ReceiveCampaignLink { .. } => "receive_campaign_link",
            Self::SendCampaignLink { .. } => "send_campaign_link",
            Self::RandomLocation { .. } => "random_location",
            Self::SaveDecks => "save_decks",
        }
    }

    /// Choice shapes this input accepts.
    pub fn choice_kinds(&self) -> &'static [ChoiceKind] {
        match self {
            Self::UpgradeDecks | Self::SendCampaignLink { .. } | Self::SaveDecks => {
                &[ChoiceKind::Acknowledge]
            }
            Self::RandomLocation { .. } => &[ChoiceKind::Cards, ChoiceKind::Acknowledge],
            Self::CardChoice { .. } => &[ChoiceKind::Cards],
            Self::Supplies { .. } => &[ChoiceKind::Supplies],
            Self::UseSupplies { .. }
            | Self::InvestigatorChoiceSupplies { .. }
            | Self::ScenarioInvestigators { .. } => &[ChoiceKind::Investigators],
            Self::InvestigatorChoice { .. } => &[ChoiceKind::Selections],
            Self::ChooseOne { .. }
            | Self::Checklist { .. }
            | Self::PlayScenario { .. }
            | Self::ReceiveCampaignLink { .. } => &[ChoiceKind::Choices],
            Self::Counter { .. } => &[ChoiceKind::Count],
            Self::InvestigatorCounter { .. } => &[ChoiceKind::Counts, ChoiceKind::Count],
            Self::TextBox { .. } => &[ChoiceKind::Text],
        }
    }

    /// Choices carried by the input, if it has any.
    pub fn choices(&self) -> &[ChoiceOption] {
        match self {
            Self::CardChoice { choices, .. }
            | Self::InvestigatorChoice { choices, .. }
            | Self::ChooseOne { choices }
            | Self::Checklist { choices, .. }
            | Self::ReceiveCampaignLink { choices, .. } => choices,
            Self::PlayScenario { branches, .. } => branches,
            _ => &[],
        }
    }

    /// Effects carried by the input outside of its choices.
    pub fn effects(&self) -> Vec<&Effect> {
        match self {
            Self::Counter { effects, .. }
            | Self::InvestigatorCounter { effects, .. }
            | Self::TextBox { effects }
            | Self::ScenarioInvestigators {
                lead_investigator_effects: effects,
                ..
            } => effects.iter().collect(),
            Self::UseSupplies { choices, .. } => {
                choices.iter().flat_map(GuideOption::all_effects).collect()
            }
            Self::InvestigatorChoiceSupplies {
                positive_choice,
                negative_choice,
                ..
            } => positive_choice
                .all_effects()
                .chain(negative_choice.all_effects())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Steps the input may push, outside of its choices.
    pub fn steps(&self) -> Vec<&StepId> {
        match self {
            Self::ScenarioInvestigators {
                choose_none_steps, ..
            } => choose_none_steps.iter().collect(),
            Self::UseSupplies { choices, .. } => {
                choices.iter().flat_map(|o| o.steps.iter()).collect()
            }
            Self::InvestigatorChoiceSupplies {
                positive_choice,
                negative_choice,
                ..
            } => positive_choice
                .steps
                .iter()
                .chain(&negative_choice.steps)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Log section the input itself reads or writes, if any.
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::Supplies { section, .. }
            | Self::UseSupplies { section, .. }
            | Self::InvestigatorChoiceSupplies { section, .. } => Some(section),
            _ => None,
        }
    }
}
