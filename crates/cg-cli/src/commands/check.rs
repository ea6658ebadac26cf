use std::path::Path;

use comfy_table::{ContentArrangement, Table};

pub fn run(guide: &Path) -> Result<(), String> {
    let campaign = super::load_guide(guide)?;

    println!("  All checks passed for '{}'.", campaign.name);
    println!(
        "  {} scenarios, {} steps",
        campaign.scenarios.len(),
        campaign.step_count()
    );

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Scenario", "Name", "Steps", "Resolutions"]);
    for id in &campaign.scenarios {
        let Some(graph) = campaign.graph(id) else {
            continue;
        };
        let resolutions: Vec<&str> = graph.resolutions.iter().map(|r| r.id.as_str()).collect();
        table.add_row(vec![
            id.clone(),
            graph.name.clone(),
            graph.steps().len().to_string(),
            resolutions.join(", "),
        ]);
    }
    println!("{table}");

    Ok(())
}
