//! Chaos tokens and the chaos bag.
//!
//! The chaos bag is a multiset: each token kind maps to how many copies are
//! in the bag. Kinds with zero copies are never stored, so two bags with the
//! same composition always compare (and serialize) equal.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// A single kind of chaos token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChaosToken {
    /// `+1` modifier.
    #[serde(rename = "+1")]
    PlusOne,
    /// `0` modifier.
    #[serde(rename = "0")]
    Zero,
    /// `-1` modifier.
    #[serde(rename = "-1")]
    MinusOne,
    /// `-2` modifier.
    #[serde(rename = "-2")]
    MinusTwo,
    /// `-3` modifier.
    #[serde(rename = "-3")]
    MinusThree,
    /// `-4` modifier.
    #[serde(rename = "-4")]
    MinusFour,
    /// `-5` modifier.
    #[serde(rename = "-5")]
    MinusFive,
    /// `-6` modifier.
    #[serde(rename = "-6")]
    MinusSix,
    /// `-7` modifier.
    #[serde(rename = "-7")]
    MinusSeven,
    /// `-8` modifier.
    #[serde(rename = "-8")]
    MinusEight,
    /// Skull symbol.
    #[serde(rename = "skull")]
    Skull,
    /// Cultist symbol.
    #[serde(rename = "cultist")]
    Cultist,
    /// Tablet symbol.
    #[serde(rename = "tablet")]
    Tablet,
    /// Elder thing symbol.
    #[serde(rename = "elder_thing")]
    ElderThing,
    /// Elder sign symbol.
    #[serde(rename = "elder_sign")]
    ElderSign,
    /// Automatic failure.
    #[serde(rename = "auto_fail")]
    AutoFail,
}

impl ChaosToken {
    /// Every token kind, in bag display order.
    pub const ALL: [ChaosToken; 16] = [
        Self::PlusOne,
        Self::Zero,
        Self::MinusOne,
        Self::MinusTwo,
        Self::MinusThree,
        Self::MinusFour,
        Self::MinusFive,
        Self::MinusSix,
        Self::MinusSeven,
        Self::MinusEight,
        Self::Skull,
        Self::Cultist,
        Self::Tablet,
        Self::ElderThing,
        Self::ElderSign,
        Self::AutoFail,
    ];

    /// The token's name as written in guide data.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlusOne => "+1",
            Self::Zero => "0",
            Self::MinusOne => "-1",
            Self::MinusTwo => "-2",
            Self::MinusThree => "-3",
            Self::MinusFour => "-4",
            Self::MinusFive => "-5",
            Self::MinusSix => "-6",
            Self::MinusSeven => "-7",
            Self::MinusEight => "-8",
            Self::Skull => "skull",
            Self::Cultist => "cultist",
            Self::Tablet => "tablet",
            Self::ElderThing => "elder_thing",
            Self::ElderSign => "elder_sign",
            Self::AutoFail => "auto_fail",
        }
    }

    /// Parse a token from its guide-data name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for ChaosToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A multiset of chaos tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChaosBag {
    tokens: BTreeMap<ChaosToken, u32>,
}

impl ChaosBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from `(token, count)` pairs. Zero counts are ignored.
    pub fn from_counts(counts: impl IntoIterator<Item = (ChaosToken, u32)>) -> Self {
        let mut bag = Self::new();
        for (token, count) in counts {
            bag.add(token, count);
        }
        bag
    }

    /// Number of copies of `token` in the bag.
    pub fn count(&self, token: ChaosToken) -> u32 {
        self.tokens.get(&token).copied().unwrap_or(0)
    }

    /// Total number of tokens in the bag.
    pub fn total(&self) -> u32 {
        self.tokens.values().fold(0, |total, n| total.saturating_add(*n))
    }

    /// Whether the bag holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Add `count` copies of `token`.
    pub fn add(&mut self, token: ChaosToken, count: u32) {
        if count == 0 {
            return;
        }
        let held = self.tokens.entry(token).or_insert(0);
        *held = held.saturating_add(count);
    }

    /// Remove `count` copies of `token`.
    ///
    /// Fails without touching the bag if it holds fewer than `count` copies.
    pub fn remove(&mut self, token: ChaosToken, count: u32) -> StateResult<()> {
        let available = self.count(token);
        if available < count {
            return Err(StateError::InvalidChaosBagOperation {
                token,
                requested: count,
                available,
            });
        }
        if available == count {
            self.tokens.remove(&token);
        } else {
            self.tokens.insert(token, available - count);
        }
        Ok(())
    }

    /// Iterate over `(token, count)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ChaosToken, u32)> + '_ {
        self.tokens.iter().map(|(t, c)| (*t, *c))
    }
}

impl fmt::Display for ChaosBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(token, count)| {
                if count == 1 {
                    token.to_string()
                } else {
                    format!("{token} x{count}")
                }
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
