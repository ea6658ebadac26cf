use crate::chaos::ChaosToken;
use crate::log::SectionKind;

/// Alias for `Result<T, StateError>`.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur when mutating a campaign state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// More tokens were removed from the chaos bag than it holds.
    #[error("cannot remove {requested} {token} token(s): the chaos bag holds {available}")]
    InvalidChaosBagOperation {
        /// The token being removed.
        token: ChaosToken,
        /// How many tokens were requested.
        requested: u32,
        /// How many tokens are in the bag.
        available: u32,
    },

    /// A log operation does not fit the declared type of its section.
    #[error("log section \"{section}\" is a {kind} section and cannot {operation}")]
    SectionTypeMismatch {
        /// The section id.
        section: String,
        /// The declared section type.
        kind: SectionKind,
        /// What was attempted.
        operation: &'static str,
    },

    /// The investigator code is not part of the campaign.
    #[error("investigator not found: {0}")]
    UnknownInvestigator(String),

    /// An investigator tried to use a supply they do not hold.
    #[error("{investigator} has no \"{supply}\" supply in section \"{section}\"")]
    MissingSupply {
        /// The investigator code.
        investigator: String,
        /// The supplies section.
        section: String,
        /// The supply id.
        supply: String,
    },

    /// Chosen supplies cost more than the available points.
    #[error("{investigator} cannot spend {cost} supply points: only {available} available")]
    InsufficientSupplyPoints {
        /// The investigator code.
        investigator: String,
        /// Total cost of the chosen supplies.
        cost: i64,
        /// Points available to spend.
        available: i64,
    },
}
