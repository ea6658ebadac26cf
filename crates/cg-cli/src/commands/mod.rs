pub mod check;
pub mod log;
pub mod play;
pub mod replay;

use std::fs;
use std::path::Path;

use cg_campaign::SavedSession;
use cg_core::CampaignState;
use cg_script::{Campaign, SchemaError, render_schema_error};
use comfy_table::{ContentArrangement, Table};

/// Load and validate a guide, printing diagnostics to stderr on failure.
fn load_guide(path: &Path) -> Result<Campaign, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    cg_script::load_campaign(&raw).map_err(|e| {
        let filename = path.display().to_string();
        eprint!("{}", render_schema_error(&raw, &filename, &e));
        if let SchemaError::Invalid { issues, .. } = &e {
            eprintln!(
                "  {} error{}",
                issues.len(),
                if issues.len() == 1 { "" } else { "s" }
            );
        }
        "guide failed to load".to_string()
    })
}

fn read_session(path: &Path) -> Result<SavedSession, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&raw).map_err(|e| format!("invalid session file {}: {e}", path.display()))
}

fn write_session(path: &Path, saved: &SavedSession) -> Result<(), String> {
    let json = serde_json::to_string_pretty(saved).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), scenarios = saved.scenarios.len(), "session written");
    Ok(())
}

/// Print investigators and the written campaign log.
fn print_state(state: &CampaignState) {
    if !state.investigators.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Investigator", "XP", "Physical", "Mental", "Status"]);
        for investigator in state.investigators.values() {
            let status = if investigator.trauma.killed {
                "killed"
            } else if investigator.trauma.insane {
                "insane"
            } else {
                "active"
            };
            table.add_row(vec![
                format!("{} ({})", investigator.name, investigator.code),
                investigator.xp.to_string(),
                investigator.trauma.physical.to_string(),
                investigator.trauma.mental.to_string(),
                status.to_string(),
            ]);
        }
        println!("{table}");
    }

    if !state.log.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Section", "Entry", "Count"]);
        for (id, section) in &state.log {
            for entry in section.entries() {
                let name = if entry.crossed_out {
                    format!("~{}~", entry.id)
                } else {
                    entry.id.clone()
                };
                let count = entry.count.map(|c| c.to_string()).unwrap_or_default();
                table.add_row(vec![id.clone(), name, count]);
            }
            if section.entries().is_empty() {
                table.add_row(vec![id.clone(), "—".to_string(), section.count(None).to_string()]);
            }
        }
        println!("{table}");
    }

    println!("  Chaos bag: {}", describe_bag(state));
}

fn describe_bag(state: &CampaignState) -> String {
    if state.chaos_bag.is_empty() {
        return "empty".to_string();
    }
    state
        .chaos_bag
        .iter()
        .map(|(token, count)| format!("{}×{count}", token.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}
