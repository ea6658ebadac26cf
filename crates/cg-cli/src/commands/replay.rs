use std::path::Path;
use std::sync::Arc;

use cg_campaign::CampaignSession;
use colored::Colorize;

pub fn run(guide: &Path, save: &Path) -> Result<(), String> {
    let campaign = Arc::new(super::load_guide(guide)?);
    let saved = super::read_session(save)?;
    let choices: usize = saved.scenarios.iter().map(|s| s.log.len()).sum();

    let session = CampaignSession::restore(campaign, &saved)
        .map_err(|e| format!("replay failed: {e}"))?;

    println!(
        "  {} {} choices across {} scenarios",
        "Replayed".bold(),
        choices,
        saved.scenarios.len()
    );
    for completed in &session.state().campaign_data.completed_scenarios {
        println!(
            "  {} {} ({})",
            "✓".green(),
            completed.scenario,
            completed.resolution.as_deref().unwrap_or("no resolution")
        );
    }

    if session.is_finished() {
        let result = session
            .state()
            .campaign_data
            .result
            .map_or_else(|| "over".to_string(), |r| r.to_string());
        println!("  Campaign finished: {}", result.bold());
    } else if let Some(prompt) = session.prompt() {
        println!(
            "  Waiting in {} at step '{}'",
            session.current_scenario().unwrap_or("?"),
            prompt.step_id
        );
    }
    println!();
    super::print_state(session.state());

    Ok(())
}
