use std::path::Path;

use cg_engine::GuideLog;

pub fn run(save: &Path, format: &str) -> Result<(), String> {
    let saved = super::read_session(save)?;
    let render: fn(&GuideLog) -> String = match format {
        "text" | "txt" => GuideLog::export_text,
        "markdown" | "md" => GuideLog::export_markdown,
        _ => return Err(format!("unknown format '{format}' (use text or markdown)")),
    };

    for (index, scenario) in saved.scenarios.iter().enumerate() {
        if index > 0 {
            println!();
        }
        if format.starts_with('m') {
            println!("## {}\n", scenario.scenario);
        } else {
            println!("[{}]", scenario.scenario);
        }
        print!("{}", render(&scenario.log));
    }

    Ok(())
}
