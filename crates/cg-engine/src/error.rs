//! Error types for guide runs.

use cg_core::StateError;
use cg_script::{GraphId, StepId, UnknownStepError};
use thiserror::Error;

/// Result type for guide runs.
pub type GuideResult<T> = Result<T, GuideError>;

/// Errors raised while running a scenario graph.
///
/// Apart from [`GuideError::StaleResume`], [`GuideError::InvalidChoice`] and
/// [`GuideError::NotRunning`], these mean the guide data is corrupt or
/// incompatible and the run cannot continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuideError {
    /// A step id did not resolve in the graph.
    #[error(transparent)]
    UnknownStep(#[from] UnknownStepError),

    /// A saved run names a scenario graph the store does not hold.
    #[error("no scenario graph {0} is loaded")]
    UnknownGraph(GraphId),

    /// No option matched the computed value and there was no default.
    #[error("no option of the {condition} condition matches {value}")]
    UnmatchedCondition {
        /// Condition type.
        condition: &'static str,
        /// The computed value.
        value: String,
    },

    /// An effect or condition needs a value that is not bound.
    #[error("{placeholder} is not bound for {user}")]
    UnresolvedPlaceholder {
        /// The missing placeholder.
        placeholder: &'static str,
        /// The effect or condition that needed it.
        user: &'static str,
    },

    /// A resume did not target the pending prompt.
    #[error("stale resume: expected step {}, got \"{received}\"", describe_pending(.expected))]
    StaleResume {
        /// The step the run is waiting on.
        expected: Option<StepId>,
        /// The step the caller resumed.
        received: StepId,
    },

    /// The choice does not fit the pending input.
    #[error("invalid choice for step \"{step}\": {reason}")]
    InvalidChoice {
        /// The input step.
        step: StepId,
        /// What is wrong with the choice.
        reason: String,
    },

    /// The cursor drained without a resolution or completed status.
    #[error("scenario {graph} ran out of steps without reaching a resolution")]
    ImplicitCompletion {
        /// The graph that ran dry.
        graph: GraphId,
    },

    /// The run has already completed or failed.
    #[error("run is {status} and cannot be resumed")]
    NotRunning {
        /// Current status.
        status: crate::run::RunStatus,
    },

    /// A state mutation failed.
    #[error(transparent)]
    State(#[from] StateError),
}

impl GuideError {
    pub(crate) fn unbound(placeholder: &'static str, user: &'static str) -> Self {
        Self::UnresolvedPlaceholder { placeholder, user }
    }

    pub(crate) fn invalid_choice(step: &str, reason: impl Into<String>) -> Self {
        Self::InvalidChoice {
            step: step.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether a resume failing with this error leaves the run waiting for
    /// another choice instead of failing it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::StaleResume { .. } | Self::InvalidChoice { .. } | Self::NotRunning { .. }
        )
    }
}

fn describe_pending(expected: &Option<StepId>) -> String {
    match expected {
        Some(step) => format!("\"{step}\""),
        None => "<none>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_resume_message() {
        let err = GuideError::StaleResume {
            expected: Some("vp".into()),
            received: "other".into(),
        };
        assert_eq!(err.to_string(), "stale resume: expected step \"vp\", got \"other\"");

        let err = GuideError::StaleResume {
            expected: None,
            received: "other".into(),
        };
        assert_eq!(err.to_string(), "stale resume: expected step <none>, got \"other\"");
    }

    #[test]
    fn state_errors_convert() {
        let err: GuideError = StateError::UnknownInvestigator("x".into()).into();
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "investigator not found: x");
    }
}
