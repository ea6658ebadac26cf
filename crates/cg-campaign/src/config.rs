//! Configuration for a campaign session.

use std::path::PathBuf;

use cg_core::{CampaignState, Difficulty, Investigator};
use cg_script::Campaign;

/// Configuration for a campaign session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Campaign difficulty; picks the starting chaos bag.
    pub difficulty: Difficulty,
    /// Investigators starting the campaign.
    pub investigators: Vec<Investigator>,
    /// Directory for JSON checkpoints.
    pub checkpoint_dir: Option<PathBuf>,
    /// Persist a checkpoint after every resolved input and scenario change.
    pub autosave: bool,
    /// RNG seed for prompts that draw at random.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Standard,
            investigators: Vec::new(),
            checkpoint_dir: None,
            autosave: true,
            seed: 42,
        }
    }
}

impl SessionConfig {
    /// Set the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Add a starting investigator.
    pub fn with_investigator(mut self, investigator: Investigator) -> Self {
        self.investigators.push(investigator);
        self
    }

    /// Write checkpoints to `dir`.
    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    /// Turn autosave on or off.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The state a new campaign starts from: declared log sections, the
    /// investigators, and the chaos bag for the chosen difficulty.
    pub fn initial_state(&self, campaign: &Campaign) -> CampaignState {
        let mut state = campaign
            .campaign_log
            .iter()
            .fold(CampaignState::new(), |state, section| {
                state.with_section(section.id.clone(), section.kind)
            });
        for investigator in &self.investigators {
            state.add_investigator(investigator.clone());
        }
        if let Some(bag) = campaign.chaos_bags.get(&self.difficulty) {
            state.chaos_bag = bag.clone();
        }
        state.campaign_data.difficulty = Some(self.difficulty);
        state.campaign_data.version = campaign.version;
        state
    }
}
