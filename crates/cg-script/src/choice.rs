//! Choices: the values that resolve inputs, and the log entries recording
//! them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::StepId;

/// Shape of a [`Choice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    /// `{count}`.
    Count,
    /// `{counts}`.
    Counts,
    /// `{choices}`.
    Choices,
    /// `{selections}`.
    Selections,
    /// `{investigators}`.
    Investigators,
    /// `{cards}`.
    Cards,
    /// `{supplies}`.
    Supplies,
    /// `{text}`.
    Text,
    /// `{}`.
    Acknowledge,
}

impl fmt::Display for ChoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Count => "{count}",
            Self::Counts => "{counts}",
            Self::Choices => "{choices}",
            Self::Selections => "{selections}",
            Self::Investigators => "{investigators}",
            Self::Cards => "{cards}",
            Self::Supplies => "{supplies}",
            Self::Text => "{text}",
            Self::Acknowledge => "{}",
        })
    }
}

/// The value a human supplies to resolve an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    /// A single number.
    Count {
        /// The number.
        count: i64,
    },
    /// A number per investigator.
    Counts {
        /// Investigator code → number.
        counts: BTreeMap<String, i64>,
    },
    /// Picked choice ids.
    Choices {
        /// Choice ids, in the order picked.
        choices: Vec<String>,
    },
    /// A choice id per investigator.
    Selections {
        /// Investigator code → choice id.
        selections: BTreeMap<String, String>,
    },
    /// Picked investigators.
    Investigators {
        /// Investigator codes.
        investigators: Vec<String>,
    },
    /// Picked cards.
    Cards {
        /// Card codes.
        cards: Vec<String>,
    },
    /// Supplies bought per investigator.
    Supplies {
        /// Investigator code → supply ids.
        supplies: BTreeMap<String, Vec<String>>,
    },
    /// Free text.
    Text {
        /// The text.
        text: String,
    },
    /// Nothing to report; the players just continue.
    Acknowledge {},
}

impl Choice {
    /// Pick a single choice id.
    pub fn one(id: impl Into<String>) -> Self {
        Self::Choices {
            choices: vec![id.into()],
        }
    }

    /// Continue without a value.
    pub fn acknowledge() -> Self {
        Self::Acknowledge {}
    }

    /// Shape of this choice.
    pub fn kind(&self) -> ChoiceKind {
        match self {
            Self::Count { .. } => ChoiceKind::Count,
            Self::Counts { .. } => ChoiceKind::Counts,
            Self::Choices { .. } => ChoiceKind::Choices,
            Self::Selections { .. } => ChoiceKind::Selections,
            Self::Investigators { .. } => ChoiceKind::Investigators,
            Self::Cards { .. } => ChoiceKind::Cards,
            Self::Supplies { .. } => ChoiceKind::Supplies,
            Self::Text { .. } => ChoiceKind::Text,
            Self::Acknowledge {} => ChoiceKind::Acknowledge,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn pairs<V: fmt::Display>(map: &BTreeMap<String, V>) -> String {
            map.iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Self::Count { count } => write!(f, "{count}"),
            Self::Counts { counts } => f.write_str(&pairs(counts)),
            Self::Choices { choices } => f.write_str(&choices.join(", ")),
            Self::Selections { selections } => f.write_str(&pairs(selections)),
            Self::Investigators { investigators } if investigators.is_empty() => {
                f.write_str("nobody")
            }
            Self::Investigators { investigators } => f.write_str(&investigators.join(", ")),
            Self::Cards { cards } => f.write_str(&cards.join(", ")),
            Self::Supplies { supplies } => {
                let parts: Vec<String> = supplies
                    .iter()
                    .map(|(inv, ids)| format!("{inv}: {}", ids.join(" + ")))
                    .collect();
                f.write_str(&parts.join(", "))
            }
            Self::Text { text } => write!(f, "\"{text}\""),
            Self::Acknowledge {} => f.write_str("continue"),
        }
    }
}

/// Durable record of one resolved input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The input step that was resolved.
    pub step_id: StepId,
    /// The value it was resolved with.
    pub choice: Choice,
}

impl LogEntry {
    /// Create a log entry.
    pub fn new(step_id: impl Into<StepId>, choice: Choice) -> Self {
        Self {
            step_id: step_id.into(),
            choice,
        }
    }
}
