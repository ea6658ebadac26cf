use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use cg_campaign::{CampaignSession, SessionConfig};
use cg_core::{Difficulty, Investigator};
use cg_engine::Prompt;
use cg_script::{Choice, ChoiceKind, Input};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn run(
    guide: &Path,
    save: Option<&Path>,
    difficulty: &str,
    investigators: &[String],
    seed: u64,
) -> Result<(), String> {
    let campaign = Arc::new(super::load_guide(guide)?);
    let difficulty = Difficulty::parse(difficulty)
        .ok_or_else(|| format!("unknown difficulty '{difficulty}' (use easy, standard, hard or expert)"))?;
    let config = investigators
        .iter()
        .map(String::as_str)
        .map(parse_investigator)
        .fold(
            SessionConfig::default().with_difficulty(difficulty).with_seed(seed),
            SessionConfig::with_investigator,
        );

    let resumed = save.filter(|path| path.exists());
    let mut session = match resumed {
        Some(path) => {
            let saved = super::read_session(path)?;
            CampaignSession::restore(campaign, &saved)
        }
        None => CampaignSession::start(campaign, &config),
    }
    .map_err(|e| format!("failed to start campaign: {e}"))?;

    let verb = if resumed.is_some() { "Resuming" } else { "Starting" };
    println!("  {} {}", verb.bold(), session.campaign().name);
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    while let Some(prompt) = session.prompt() {
        show_prompt(&prompt, session.current_scenario().unwrap_or("?"), &offered(&prompt, &session));
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break, // EOF
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        match input {
            "quit" | "q" => break,
            "help" => {
                print_help();
                continue;
            }
            "state" => {
                super::print_state(session.state());
                println!();
                continue;
            }
            "undo" => {
                match session.undo() {
                    Ok(true) => println!("  Took back the last choice.\n"),
                    Ok(false) => println!("{}\n", "Nothing to undo in this scenario.".yellow()),
                    Err(e) => println!("{}\n", e.to_string().yellow()),
                }
                continue;
            }
            _ => {}
        }

        let step_id = prompt.step_id.to_string();
        let choice = match parse_choice(input, &prompt, &offered(&prompt, &session), &mut rng) {
            Ok(choice) => choice,
            Err(msg) => {
                println!("{}\n", msg.yellow());
                continue;
            }
        };

        match session.resume_with_choice(&step_id, choice) {
            Ok(()) => {
                if let Some(path) = save {
                    super::write_session(path, &session.save())?;
                }
                println!();
            }
            Err(e) if e.is_recoverable() => println!("{}\n", e.to_string().yellow()),
            Err(e) => return Err(format!("scenario failed: {e}")),
        }
    }

    if let Some(path) = save {
        super::write_session(path, &session.save())?;
        println!("  Session saved to {}", path.display());
    }

    if session.is_finished() {
        let data = &session.state().campaign_data;
        let result = data
            .result
            .map_or_else(|| "over".to_string(), |r| r.to_string());
        println!("  {} {}", "Campaign finished:".bold(), result);
        println!("  {} scenarios played\n", data.completed_scenarios.len());
        super::print_state(session.state());
    } else if let Some(failure) = session.run().and_then(|run| run.failure()) {
        return Err(format!("scenario failed: {failure}"));
    }

    Ok(())
}

/// `CODE` or `CODE:Name`.
fn parse_investigator(spec: &str) -> Investigator {
    match spec.split_once(':') {
        Some((code, name)) => Investigator::new(code.trim(), name.trim()),
        None => Investigator::new(spec.trim(), spec.trim()),
    }
}

/// Choices offered by a prompt as `(id, label)` pairs, in display order.
fn offered(prompt: &Prompt<'_>, session: &CampaignSession) -> Vec<(String, String)> {
    let mut options = Vec::new();
    if let Input::PlayScenario { no_resolutions: false, .. } = prompt.input {
        let resolutions = session.run().map(|run| run.graph().resolutions.as_slice()).unwrap_or_default();
        for resolution in resolutions {
            let label = if resolution.title.is_empty() {
                format!("Resolution {}", resolution.id)
            } else {
                resolution.title.clone()
            };
            options.push((resolution.id.clone(), label));
        }
    }
    match prompt.available_choices() {
        Ok(choices) => options.extend(choices.into_iter().map(|c| {
            let label = if c.text.is_empty() { c.id.clone() } else { c.text.clone() };
            (c.id.clone(), label)
        })),
        Err(e) => println!("{}", e.to_string().yellow()),
    }
    options
}

fn show_prompt(prompt: &Prompt<'_>, scenario: &str, options: &[(String, String)]) {
    println!("  [{}] {}", scenario.dimmed(), prompt.step.label().bold());
    if let Some(text) = prompt.step.text.as_deref().filter(|_| prompt.step.title.is_some()) {
        println!("  {text}");
    }
    for (index, (id, label)) in options.iter().enumerate() {
        println!("    {}) {label} {}", index + 1, format!("[{id}]").dimmed());
    }

    let investigators = || prompt.state.playing_investigators().join(", ");
    let hint = match prompt.input {
        Input::RandomLocation { .. } => "Press Enter to draw a location at random".to_string(),
        Input::Supplies { supplies, .. } => {
            let stock: Vec<String> = supplies
                .iter()
                .map(|s| format!("{} ({}, cost {})", s.id, s.name, s.cost))
                .collect();
            format!(
                "Supplies: {}\n  Enter CODE=id+id for each of {}",
                stock.join(", "),
                investigators()
            )
        }
        _ => match prompt.expects().first() {
            Some(ChoiceKind::Choices) => "Enter choice numbers or ids, comma separated".to_string(),
            Some(ChoiceKind::Count) => "Enter a number".to_string(),
            Some(ChoiceKind::Counts) => {
                format!("Enter one number for everyone, or CODE=N for each of {}", investigators())
            }
            Some(ChoiceKind::Selections) => {
                format!("Enter CODE=choice for each of {}", investigators())
            }
            Some(ChoiceKind::Investigators) => {
                format!("Enter investigator codes from {} (blank for none)", investigators())
            }
            Some(ChoiceKind::Cards) => "Enter card codes, comma separated".to_string(),
            Some(ChoiceKind::Supplies) => "Enter CODE=id+id for each investigator".to_string(),
            Some(ChoiceKind::Text) => "Enter text".to_string(),
            Some(ChoiceKind::Acknowledge) | None => "Press Enter to continue".to_string(),
        },
    };
    println!("  {}", hint.dimmed());
}

fn parse_choice(
    input: &str,
    prompt: &Prompt<'_>,
    options: &[(String, String)],
    rng: &mut StdRng,
) -> Result<Choice, String> {
    if input.starts_with('{') {
        return serde_json::from_str(input).map_err(|e| format!("invalid choice JSON: {e}"));
    }
    match prompt.input {
        Input::RandomLocation { cards, .. } if input.is_empty() => {
            if cards.is_empty() {
                return Ok(Choice::acknowledge());
            }
            let card = cards[rng.random_range(0..cards.len())].clone();
            println!("  Drew {}", card.bold());
            return Ok(Choice::Cards { cards: vec![card] });
        }
        _ => {}
    }

    let kind = prompt.expects().first().copied().unwrap_or(ChoiceKind::Acknowledge);
    let choice = match kind {
        ChoiceKind::Choices => Choice::Choices {
            choices: list(input)
                .into_iter()
                .map(|token| option_id(&token, options))
                .collect(),
        },
        ChoiceKind::Count => Choice::Count {
            count: number(input)?,
        },
        ChoiceKind::Counts if !input.contains('=') => Choice::Count {
            count: number(input)?,
        },
        ChoiceKind::Counts => {
            let mut counts = BTreeMap::new();
            for (code, value) in pairs(input)? {
                counts.insert(code, number(&value)?);
            }
            Choice::Counts { counts }
        }
        ChoiceKind::Selections => Choice::Selections {
            selections: pairs(input)?
                .into_iter()
                .map(|(code, token)| (code, option_id(&token, options)))
                .collect(),
        },
        ChoiceKind::Investigators => Choice::Investigators {
            investigators: list(input),
        },
        ChoiceKind::Cards => Choice::Cards {
            cards: list(input)
                .into_iter()
                .map(|token| option_id(&token, options))
                .collect(),
        },
        ChoiceKind::Supplies => Choice::Supplies {
            supplies: pairs(input)?
                .into_iter()
                .map(|(code, bought)| {
                    let ids = bought
                        .split('+')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect();
                    (code, ids)
                })
                .collect(),
        },
        ChoiceKind::Text => Choice::Text {
            text: input.to_string(),
        },
        ChoiceKind::Acknowledge => Choice::acknowledge(),
    };
    Ok(choice)
}

/// A 1-based option number, or the token itself as an id.
fn option_id(token: &str, options: &[(String, String)]) -> String {
    token
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| options.get(index))
        .map_or_else(|| token.to_string(), |(id, _)| id.clone())
}

fn list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn pairs(input: &str) -> Result<Vec<(String, String)>, String> {
    list(input)
        .into_iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| format!("expected CODE=value, got '{pair}'"))
        })
        .collect()
}

fn number(input: &str) -> Result<i64, String> {
    input
        .trim()
        .parse()
        .map_err(|_| format!("'{input}' is not a number"))
}

fn print_help() {
    println!("  Answer the prompt, or use one of:");
    println!("    state   show investigators, campaign log and chaos bag");
    println!("    undo    take back the last choice of this scenario");
    println!("    quit    save (with --save) and exit");
    println!("  Any prompt also accepts a raw JSON choice such as {{\"count\": 2}}.\n");
}
