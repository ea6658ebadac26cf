//! Campaign log sections.
//!
//! A section is a titled part of the campaign log. Its declared
//! [`SectionKind`] decides what it may hold: `count` sections keep a single
//! running total, `investigator_count` sections keep one number per
//! investigator, and the other kinds hold discrete entries.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// Declared type of a campaign log section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Discrete entries, shown to players.
    #[default]
    Default,
    /// A single running total.
    Count,
    /// Supplies held by investigators.
    Supplies,
    /// One count per investigator.
    InvestigatorCount,
    /// Discrete entries that are never shown to players.
    Hidden,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Count => "count",
            Self::Supplies => "supplies",
            Self::InvestigatorCount => "investigator_count",
            Self::Hidden => "hidden",
        })
    }
}

/// A change to a numeric log value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountUpdate {
    /// Replace the value.
    Set(i64),
    /// Add to the value (negative to subtract).
    Add(i64),
}

impl CountUpdate {
    /// Apply the update to `current`, saturating at the bounds of `i64`.
    pub fn apply(self, current: i64) -> i64 {
        match self {
            Self::Set(value) => value,
            Self::Add(delta) => current.saturating_add(delta),
        }
    }
}

/// One entry of a log section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSectionEntry {
    /// Entry id, unique within its section.
    pub id: String,
    /// Text to display instead of the guide's default wording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Cards recorded with the entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<String>,
    /// Numeric value attached to the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    /// Whether the entry has been crossed out.
    #[serde(default)]
    pub crossed_out: bool,
}

impl LogSectionEntry {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            text: None,
            cards: Vec::new(),
            count: None,
            crossed_out: false,
        }
    }
}

/// A section of the campaign log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSection {
    /// Section id.
    pub id: String,
    /// Declared section type.
    pub kind: SectionKind,
    entries: Vec<LogSectionEntry>,
    #[serde(default)]
    total: i64,
    #[serde(default)]
    investigator_counts: BTreeMap<String, i64>,
}

impl LogSection {
    /// Create an empty section.
    pub fn new(id: impl Into<String>, kind: SectionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            entries: Vec::new(),
            total: 0,
            investigator_counts: BTreeMap::new(),
        }
    }

    fn mismatch(&self, operation: &'static str) -> StateError {
        StateError::SectionTypeMismatch {
            section: self.id.clone(),
            kind: self.kind,
            operation,
        }
    }

    /// Entries in the order they were recorded.
    pub fn entries(&self) -> &[LogSectionEntry] {
        &self.entries
    }

    /// Look up an entry.
    pub fn entry(&self, id: &str) -> Option<&LogSectionEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: &str) -> &mut LogSectionEntry {
        let index = match self.entries.iter().position(|e| e.id == id) {
            Some(index) => index,
            None => {
                self.entries.push(LogSectionEntry::new(id));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    /// Whether the entry is present and not crossed out.
    pub fn has_entry(&self, id: &str) -> bool {
        self.entry(id).is_some_and(|e| !e.crossed_out)
    }

    /// Whether the entry has been crossed out.
    pub fn is_crossed_out(&self, id: &str) -> bool {
        self.entry(id).is_some_and(|e| e.crossed_out)
    }

    /// Record a discrete entry, replacing its text if it already exists.
    pub fn record(&mut self, id: &str, text: Option<&str>) -> StateResult<()> {
        if self.kind == SectionKind::Count {
            return Err(self.mismatch("record discrete entries"));
        }
        let entry = self.entry_mut(id);
        if let Some(text) = text {
            entry.text = Some(text.to_string());
        }
        Ok(())
    }

    /// Record an entry holding a list of cards.
    pub fn record_cards(&mut self, id: &str, text: Option<&str>, cards: &[String]) -> StateResult<()> {
        if self.kind == SectionKind::Count {
            return Err(self.mismatch("record cards"));
        }
        let entry = self.entry_mut(id);
        if let Some(text) = text {
            entry.text = Some(text.to_string());
        }
        for card in cards {
            if !entry.cards.contains(card) {
                entry.cards.push(card.clone());
            }
        }
        Ok(())
    }

    /// Cross out an entry. Entries that were never recorded are added
    /// already crossed out.
    pub fn cross_out(&mut self, id: &str) -> StateResult<()> {
        if self.kind == SectionKind::Count {
            return Err(self.mismatch("cross out entries"));
        }
        self.entry_mut(id).crossed_out = true;
        Ok(())
    }

    /// Remove an entry entirely. Returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }

    /// Read a count: the running total of a `count` section, otherwise the
    /// count of entry `id`.
    pub fn count(&self, id: Option<&str>) -> i64 {
        match (self.kind, id) {
            (SectionKind::Count, _) | (_, None) => self.total,
            (_, Some(id)) => self.entry(id).and_then(|e| e.count).unwrap_or(0),
        }
    }

    /// Update a count and return the new value. A `count` section always
    /// updates its running total; other sections need an entry `id`.
    pub fn update_count(&mut self, id: Option<&str>, update: CountUpdate) -> StateResult<i64> {
        match (self.kind, id) {
            (SectionKind::Supplies | SectionKind::InvestigatorCount, _) => {
                Err(self.mismatch("hold entry counts"))
            }
            (SectionKind::Count, _) => {
                self.total = update.apply(self.total);
                Ok(self.total)
            }
            (_, None) => Err(self.mismatch("hold a running total")),
            (_, Some(id)) => {
                let entry = self.entry_mut(id);
                let value = update.apply(entry.count.unwrap_or(0));
                entry.count = Some(value);
                Ok(value)
            }
        }
    }

    /// An investigator's count in an `investigator_count` section.
    pub fn investigator_count(&self, investigator: &str) -> i64 {
        self.investigator_counts
            .get(investigator)
            .copied()
            .unwrap_or(0)
    }

    /// All investigator counts.
    pub fn investigator_counts(&self) -> &BTreeMap<String, i64> {
        &self.investigator_counts
    }

    /// Update an investigator's count and return the new value.
    pub fn update_investigator_count(
        &mut self,
        investigator: &str,
        update: CountUpdate,
    ) -> StateResult<i64> {
        if self.kind != SectionKind::InvestigatorCount {
            return Err(self.mismatch("hold investigator counts"));
        }
        let value = update.apply(self.investigator_count(investigator));
        self.investigator_counts
            .insert(investigator.to_string(), value);
        Ok(value)
    }
}
