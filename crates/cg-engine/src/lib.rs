//! Campaign guide interpreter.
//!
//! Evaluates conditions against a [`cg_core::CampaignState`], applies
//! effects, and drives a scenario graph step by step, suspending whenever a
//! human decision is needed. Every resolved input is logged, so any run can
//! be rebuilt from its starting state and its [`GuideLog`].

pub mod apply;
pub mod context;
pub mod error;
pub mod evaluate;
pub mod recorder;
pub mod run;

mod resolve;

pub use apply::{Applied, DeckSignal, Outcome, apply, apply_all};
pub use context::{BindingContext, BoundInput, SupplyPool};
pub use error::{GuideError, GuideResult};
pub use evaluate::{ConditionValue, Selection, evaluate, select};
pub use recorder::{GuideLog, replay, replay_from};
pub use resolve::is_available;
pub use run::{GuideRun, Prompt, RunStatus, SavedRun};
