//! Investigators and what the campaign remembers about them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// Experience pools that are tracked apart from regular XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialXp {
    /// Points spent on resupplying between scenarios.
    ResupplyPoints,
    /// Points spent on supplies.
    SupplyPoints,
    /// Unspent experience carried between decks.
    UnspectXp,
}

impl fmt::Display for SpecialXp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ResupplyPoints => "resupply_points",
            Self::SupplyPoints => "supply_points",
            Self::UnspectXp => "unspect_xp",
        })
    }
}

/// Kind of trauma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraumaKind {
    /// Physical trauma.
    Physical,
    /// Mental trauma.
    Mental,
}

/// Lasting harm suffered by an investigator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trauma {
    /// Physical trauma count.
    pub physical: u32,
    /// Mental trauma count.
    pub mental: u32,
    /// Whether the investigator was killed.
    pub killed: bool,
    /// Whether the investigator was driven insane.
    pub insane: bool,
}

impl Trauma {
    /// Trauma of the given kind.
    pub fn get(&self, kind: TraumaKind) -> u32 {
        match kind {
            TraumaKind::Physical => self.physical,
            TraumaKind::Mental => self.mental,
        }
    }

    /// Mutable trauma counter of the given kind.
    pub fn get_mut(&mut self, kind: TraumaKind) -> &mut u32 {
        match kind {
            TraumaKind::Physical => &mut self.physical,
            TraumaKind::Mental => &mut self.mental,
        }
    }
}

/// A weakness the card collaborator still has to draw for an investigator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaknessDraw {
    /// Traits the weakness must have (any of them).
    pub traits: Vec<String>,
    /// How many weaknesses to draw.
    pub count: u32,
}

/// One investigator taking part in the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investigator {
    /// Card code identifying the investigator.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Card faction (guardian, seeker, ...).
    #[serde(default)]
    pub faction: Option<String>,
    /// Card traits.
    #[serde(default)]
    pub traits: Vec<String>,
    /// Accumulated trauma.
    #[serde(default)]
    pub trauma: Trauma,
    /// Unspent experience. Never negative.
    #[serde(default)]
    pub xp: i64,
    /// Special experience pools.
    #[serde(default)]
    pub special_xp: BTreeMap<SpecialXp, i64>,
    /// Story cards added to the deck by the campaign (code → copies).
    #[serde(default)]
    pub story_cards: BTreeMap<String, u32>,
    /// Supplies per log section (section → supply id → copies).
    #[serde(default)]
    pub supplies: BTreeMap<String, BTreeMap<String, u32>>,
    /// Weaknesses still to be drawn.
    #[serde(default)]
    pub pending_weaknesses: Vec<WeaknessDraw>,
}

impl Investigator {
    /// Create an investigator with no history.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            faction: None,
            traits: Vec::new(),
            trauma: Trauma::default(),
            xp: 0,
            special_xp: BTreeMap::new(),
            story_cards: BTreeMap::new(),
            supplies: BTreeMap::new(),
            pending_weaknesses: Vec::new(),
        }
    }

    /// Set the faction.
    pub fn with_faction(mut self, faction: impl Into<String>) -> Self {
        self.faction = Some(faction.into());
        self
    }

    /// Add a trait.
    pub fn with_trait(mut self, name: impl Into<String>) -> Self {
        self.traits.push(name.into());
        self
    }

    /// Whether the investigator has left the campaign for good.
    pub fn is_eliminated(&self) -> bool {
        self.trauma.killed || self.trauma.insane
    }

    /// Whether the investigator has the trait (case-insensitive).
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    /// Add experience, clamping the total at zero.
    pub fn earn_xp(&mut self, amount: i64) {
        self.xp = self.xp.saturating_add(amount).max(0);
    }

    /// Balance of a special experience pool.
    pub fn special(&self, pool: SpecialXp) -> i64 {
        self.special_xp.get(&pool).copied().unwrap_or(0)
    }

    /// Add to a special experience pool, clamping at zero.
    pub fn earn_special(&mut self, pool: SpecialXp, amount: i64) {
        let balance = self.special(pool).saturating_add(amount).max(0);
        if balance == 0 {
            self.special_xp.remove(&pool);
        } else {
            self.special_xp.insert(pool, balance);
        }
    }

    /// Number of copies of a story card.
    pub fn card_count(&self, code: &str) -> u32 {
        self.story_cards.get(code).copied().unwrap_or(0)
    }

    /// Add one copy of a story card.
    pub fn add_card(&mut self, code: &str) {
        *self.story_cards.entry(code.to_string()).or_insert(0) += 1;
    }

    /// Remove every copy of a story card. Returns how many were removed.
    pub fn remove_card(&mut self, code: &str) -> u32 {
        self.story_cards.remove(code).unwrap_or(0)
    }

    /// Number of copies of a supply in a section.
    pub fn supply_count(&self, section: &str, supply: &str) -> u32 {
        self.supplies
            .get(section)
            .and_then(|s| s.get(supply))
            .copied()
            .unwrap_or(0)
    }

    /// Add one copy of a supply.
    pub fn gain_supply(&mut self, section: &str, supply: &str) {
        *self
            .supplies
            .entry(section.to_string())
            .or_default()
            .entry(supply.to_string())
            .or_insert(0) += 1;
    }

    /// Use up one copy of a supply.
    pub fn use_supply(&mut self, section: &str, supply: &str) -> StateResult<()> {
        let count = self.supply_count(section, supply);
        if count == 0 {
            return Err(StateError::MissingSupply {
                investigator: self.code.clone(),
                section: section.to_string(),
                supply: supply.to_string(),
            });
        }
        if let Some(held) = self.supplies.get_mut(section) {
            if count == 1 {
                held.remove(supply);
            } else {
                held.insert(supply.to_string(), count - 1);
            }
        }
        if self.supplies.get(section).is_some_and(|held| held.is_empty()) {
            self.supplies.remove(section);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_never_goes_negative() {
        let mut inv = Investigator::new("01001", "Roland Banks");
        inv.earn_xp(3);
        inv.earn_xp(-5);
        assert_eq!(inv.xp, 0);
    }

    #[test]
    fn special_pool_drops_empty_balance() {
        let mut inv = Investigator::new("01001", "Roland Banks");
        inv.earn_special(SpecialXp::SupplyPoints, 4);
        assert_eq!(inv.special(SpecialXp::SupplyPoints), 4);
        inv.earn_special(SpecialXp::SupplyPoints, -4);
        assert!(inv.special_xp.is_empty());
    }

    #[test]
    fn story_cards_are_a_multiset() {
        let mut inv = Investigator::new("01002", "Daisy Walker");
        inv.add_card("01117");
        inv.add_card("01117");
        assert_eq!(inv.card_count("01117"), 2);
        assert_eq!(inv.remove_card("01117"), 2);
        assert_eq!(inv.card_count("01117"), 0);
    }

    #[test]
    fn using_supplies() {
        let mut inv = Investigator::new("01003", "Skids O'Toole");
        inv.gain_supply("supplies", "rope");
        assert_eq!(inv.supply_count("supplies", "rope"), 1);

        inv.use_supply("supplies", "rope").unwrap();
        assert_eq!(inv.supply_count("supplies", "rope"), 0);
        assert!(inv.supplies.is_empty());

        let err = inv.use_supply("supplies", "rope").unwrap_err();
        assert!(matches!(err, StateError::MissingSupply { .. }));
    }

    #[test]
    fn traits_match_case_insensitively() {
        let inv = Investigator::new("01004", "Agnes Baker").with_trait("Sorcerer");
        assert!(inv.has_trait("sorcerer"));
        assert!(!inv.has_trait("Criminal"));
    }
}
