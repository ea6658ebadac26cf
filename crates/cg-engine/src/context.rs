//! Placeholder bindings threaded through every evaluation and effect.
//!
//! Guide data refers to the most recent decision through placeholders such
//! as `$input_value`. Instead of a global, the controller keeps a
//! [`BindingContext`] and passes it explicitly to
//! [`evaluate`](crate::evaluate) and [`apply`](crate::apply).

use std::collections::BTreeMap;

use cg_core::SpecialXp;
use cg_script::EffectsWithInput;
use serde::{Deserialize, Serialize};

/// The value bound to `$input_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BoundInput {
    /// Choice ids, card codes or free text.
    Values(Vec<String>),
    /// Investigator codes.
    Investigators(Vec<String>),
    /// A single number.
    Number(i64),
    /// A number per investigator.
    Counts(BTreeMap<String, i64>),
    /// Supplies chosen per investigator.
    Supplies(BTreeMap<String, Vec<String>>),
}

impl BoundInput {
    /// Investigators named by the binding.
    pub fn investigators(&self) -> Option<Vec<String>> {
        match self {
            Self::Investigators(codes) => Some(codes.clone()),
            Self::Counts(counts) => Some(counts.keys().cloned().collect()),
            Self::Supplies(supplies) => Some(supplies.keys().cloned().collect()),
            Self::Values(_) | Self::Number(_) => None,
        }
    }

    /// The number bound for one investigator.
    pub fn number_for(&self, investigator: &str) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Counts(counts) => counts.get(investigator).copied(),
            _ => None,
        }
    }

    /// The bound number; per-investigator counts are summed.
    pub fn total(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Counts(counts) => Some(counts.values().fold(0, |total, n| total.saturating_add(*n))),
            _ => None,
        }
    }

    /// The bound strings.
    pub fn values(&self) -> Option<&[String]> {
        match self {
            Self::Values(values) | Self::Investigators(values) => Some(values),
            _ => None,
        }
    }
}

/// Where `gain_supplies` takes its points from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyPool {
    /// A fixed budget per investigator.
    Points(i64),
    /// An investigator's special experience pool, debited on purchase.
    Special(SpecialXp),
}

/// Placeholder bindings in effect for the current step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingContext {
    /// `$input_value`, from the most recent resolved input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<BoundInput>,
    /// The investigator "each" conditions are evaluated for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub each: Option<String>,
    /// Budget for supply purchases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_pool: Option<SupplyPool>,
}

impl BindingContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with `$input_value` bound.
    pub fn with_input(input: BoundInput) -> Self {
        Self {
            input: Some(input),
            ..Self::default()
        }
    }

    /// This context with "each" bound to `investigator`.
    pub fn for_each(&self, investigator: &str) -> Self {
        Self {
            each: Some(investigator.to_string()),
            ..self.clone()
        }
    }

    /// Whether an `effects` step group was recorded for the current input.
    /// Groups without a recorded input always match.
    pub fn matches(&self, group: &EffectsWithInput) -> bool {
        if let Some(expected) = &group.input {
            let Some(actual) = self.input.as_ref().and_then(BoundInput::values) else {
                return false;
            };
            let mut expected = expected.clone();
            let mut actual = actual.to_vec();
            expected.sort();
            actual.sort();
            if expected != actual {
                return false;
            }
        }
        if let Some(expected) = &group.number_input {
            let Some(actual) = self.input.as_ref().and_then(BoundInput::total) else {
                return false;
            };
            if !expected.contains(&actual) {
                return false;
            }
        }
        true
    }
}
