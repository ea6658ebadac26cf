//! Conditions and the options they select.

use cg_core::ChaosToken;
use serde::{Deserialize, Serialize};

use crate::StepId;
use crate::effect::Effect;

/// A branch of a condition.
///
/// Exactly one of `bool_condition`, `num_condition` and `condition` is set
/// for a regular option; a default option sets none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideOption {
    /// Selected when the condition evaluates to this boolean.
    #[serde(rename = "boolCondition", default, skip_serializing_if = "Option::is_none")]
    pub bool_condition: Option<bool>,
    /// Selected when the condition evaluates to this number.
    #[serde(rename = "numCondition", default, skip_serializing_if = "Option::is_none")]
    pub num_condition: Option<i64>,
    /// Selected when the condition evaluates to this string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Text shown when the option is offered as a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Whether the option's text is set apart.
    #[serde(default)]
    pub border: bool,
    /// Effects applied before the bordered text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_border_effects: Vec<Effect>,
    /// Effects applied when selected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
    /// Steps pushed when selected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepId>,
}

impl GuideOption {
    /// Every effect of the option, pre-border effects first.
    pub fn all_effects(&self) -> impl Iterator<Item = &Effect> {
        self.pre_border_effects.iter().chain(&self.effects)
    }
}

/// Which investigators a count or supply check aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnyOrAll {
    /// At least one investigator (maximum for counts).
    Any,
    /// Every investigator (minimum for counts).
    All,
}

/// Which investigators a `has_card` condition checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardHolder {
    /// The investigator bound as "each".
    Each,
    /// Defeated investigators.
    Defeated,
    /// Any playing investigator.
    Any,
}

/// Investigators a `trauma` condition checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraumaSubject {
    /// The lead investigator.
    LeadInvestigator,
    /// Every investigator.
    All,
    /// The investigator bound as "each".
    Each,
}

/// Trauma a `trauma` condition tests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraumaCheck {
    /// Killed.
    Killed,
    /// Has physical trauma.
    Physical,
    /// Has mental trauma.
    Mental,
}

/// Investigator attribute compared by string conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigatorData {
    /// Card traits.
    Trait,
    /// Faction.
    Faction,
    /// Card code.
    Code,
}

/// Investigator status a `scenario_data investigator_status` condition checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCheck {
    /// Someone was defeated.
    Defeated,
    /// Someone resigned.
    Resigned,
}

/// Arithmetic of a `math` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOperation {
    /// Sign of `a - b`.
    Compare,
    /// `a + b`.
    Sum,
    /// `a == b`.
    Equals,
}

/// An operand of a `math` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operand {
    /// A log count.
    CampaignLogCount {
        /// Section id.
        section: String,
        /// Entry id; the section total when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// Copies of a chaos token in the bag.
    ChaosBag {
        /// The token.
        token: ChaosToken,
    },
    /// A literal.
    Constant {
        /// The value.
        value: i64,
    },
}

/// Campaign data tested by a `campaign_data` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "campaign_data", rename_all = "snake_case")]
pub enum CampaignDataCondition {
    /// The difficulty name.
    Difficulty,
    /// Whether a scenario was completed.
    ScenarioCompleted {
        /// Scenario id.
        scenario: String,
    },
    /// Whether a scenario was queued for replay.
    ScenarioReplayed {
        /// Scenario id.
        scenario: String,
    },
    /// Copies of a chaos token in the bag.
    ChaosBag {
        /// The token.
        token: ChaosToken,
    },
    /// An attribute of any investigator.
    Investigator {
        /// The attribute.
        investigator_data: InvestigatorData,
    },
    /// Whether the campaign is linked.
    LinkedCampaign,
    /// Whether the guide is at least this version.
    Version {
        /// Minimum version.
        min_version: u32,
    },
}

/// Scenario data tested by a `scenario_data` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scenario_data", rename_all = "snake_case")]
pub enum ScenarioDataCondition {
    /// The resolution id.
    Resolution,
    /// Whether any investigator has this status.
    InvestigatorStatus {
        /// The status.
        investigator: StatusCheck,
    },
    /// Number of players.
    PlayerCount,
}

/// What a condition tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionKind {
    /// At least `count` sub-conditions hold.
    Multi {
        /// Sub-conditions.
        conditions: Vec<Condition>,
        /// Threshold.
        count: u32,
    },
    /// A log entry is present and not crossed out.
    CampaignLog {
        /// Section id.
        section: String,
        /// Entry id.
        id: String,
    },
    /// A log entry holding cards is present.
    CampaignLogCards {
        /// Section id.
        section: String,
        /// Entry id.
        id: String,
    },
    /// An entry count or section total.
    CampaignLogCount {
        /// Section id.
        section: String,
        /// Entry id; the section total when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// Per-investigator counts, aggregated.
    CampaignLogInvestigatorCount {
        /// Section id.
        section: String,
        /// `all` takes the minimum, `any` the maximum.
        investigator: AnyOrAll,
    },
    /// A section has been written.
    CampaignLogSectionExists {
        /// Section id.
        section: String,
    },
    /// Arithmetic over two operands.
    Math {
        /// First operand.
        #[serde(rename = "opA")]
        op_a: Operand,
        /// Second operand.
        #[serde(rename = "opB")]
        op_b: Operand,
        /// Operation.
        operation: MathOperation,
    },
    /// Investigators holding a story card.
    HasCard {
        /// Who is checked.
        investigator: CardHolder,
        /// Card code.
        card: String,
    },
    /// Campaign-wide data.
    CampaignData(CampaignDataCondition),
    /// Current scenario data.
    ScenarioData(ScenarioDataCondition),
    /// Trauma of investigators.
    Trauma {
        /// Who is checked.
        investigator: TraumaSubject,
        /// What is checked.
        trauma: TraumaCheck,
    },
    /// Investigators holding a supply.
    CheckSupplies {
        /// Aggregation.
        investigator: AnyOrAll,
        /// Supplies section.
        section: String,
        /// Supply id.
        id: String,
        /// Supply name.
        #[serde(default)]
        name: String,
    },
    /// An attribute of the investigator bound as "each".
    Investigator {
        /// The attribute.
        investigator_data: InvestigatorData,
    },
}

/// A predicate over campaign state with the options it selects from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// What is tested.
    #[serde(flatten)]
    pub kind: ConditionKind,
    /// Branches, matched against the computed value.
    #[serde(default)]
    pub options: Vec<GuideOption>,
    /// Branch used when no option matches.
    #[serde(rename = "defaultOption", default, skip_serializing_if = "Option::is_none")]
    pub default_option: Option<Box<GuideOption>>,
    /// Numeric values above this use the option for `max`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl Condition {
    /// Short name of the condition, as written in guide data.
    pub fn name(&self) -> &'static str {
        match &self.kind {
            ConditionKind::Multi { .. } => "multi",
            ConditionKind::CampaignLog { .. } => "campaign_log",
            ConditionKind::CampaignLogCards { .. } => "campaign_log_cards",
            ConditionKind::CampaignLogCount { .. } => "campaign_log_count",
            ConditionKind::CampaignLogInvestigatorCount { .. } => "campaign_log_investigator_count",
            ConditionKind::CampaignLogSectionExists { .. } => "campaign_log_section_exists",
            ConditionKind::Math { .. } => "math",
            ConditionKind::HasCard { .. } => "has_card",
            ConditionKind::CampaignData(_) => "campaign_data",
            ConditionKind::ScenarioData(_) => "scenario_data",
            ConditionKind::Trauma { .. } => "trauma",
            ConditionKind::CheckSupplies { .. } => "check_supplies",
            ConditionKind::Investigator { .. } => "investigator",
        }
    }

    /// Whether the condition computes a boolean, so its options can be
    /// checked for exhaustiveness before play.
    pub fn is_boolean(&self) -> bool {
        match &self.kind {
            ConditionKind::Multi { .. }
            | ConditionKind::CampaignLog { .. }
            | ConditionKind::CampaignLogCards { .. }
            | ConditionKind::CampaignLogSectionExists { .. }
            | ConditionKind::HasCard { .. }
            | ConditionKind::Trauma { .. }
            | ConditionKind::CheckSupplies { .. } => true,
            ConditionKind::Math { operation, .. } => matches!(operation, MathOperation::Equals),
            ConditionKind::CampaignData(data) => !matches!(
                data,
                CampaignDataCondition::Difficulty
                    | CampaignDataCondition::ChaosBag { .. }
                    | CampaignDataCondition::Investigator { .. }
            ),
            ConditionKind::ScenarioData(data) => {
                matches!(data, ScenarioDataCondition::InvestigatorStatus { .. })
            }
            ConditionKind::CampaignLogCount { .. }
            | ConditionKind::CampaignLogInvestigatorCount { .. }
            | ConditionKind::Investigator { .. } => false,
        }
    }

    /// Every option, the default last.
    pub fn all_options(&self) -> impl Iterator<Item = &GuideOption> {
        self.options.iter().chain(self.default_option.as_deref())
    }

    /// Log sections read by the condition and its sub-conditions.
    pub fn sections(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_sections(&mut out);
        out
    }

    fn collect_sections<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            ConditionKind::Multi { conditions, .. } => {
                for c in conditions {
                    c.collect_sections(out);
                }
            }
            ConditionKind::CampaignLog { section, .. }
            | ConditionKind::CampaignLogCards { section, .. }
            | ConditionKind::CampaignLogCount { section, .. }
            | ConditionKind::CampaignLogInvestigatorCount { section, .. }
            | ConditionKind::CampaignLogSectionExists { section }
            | ConditionKind::CheckSupplies { section, .. } => out.push(section),
            ConditionKind::Math { op_a, op_b, .. } => {
                for op in [op_a, op_b] {
                    if let Operand::CampaignLogCount { section, .. } = op {
                        out.push(section);
                    }
                }
            }
            _ => {}
        }
    }
}
