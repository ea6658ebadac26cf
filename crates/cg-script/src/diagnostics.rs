//! Terminal rendering of schema errors.

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::error::{SchemaError, SchemaIssue};

/// Render a schema error against the guide source for terminal output.
///
/// Syntax and shape errors point at the offending byte. Validation issues
/// point at the first occurrence of the identifier they are about.
pub fn render_schema_error(source: &str, filename: &str, error: &SchemaError) -> String {
    let mut output = Vec::new();

    match error {
        SchemaError::Syntax { message, span, .. } | SchemaError::Shape { message, span, .. } => {
            let mut report = Report::build(ReportKind::Error, (filename, span.clone()))
                .with_message(error.to_string())
                .with_label(
                    Label::new((filename, span.clone()))
                        .with_message(message)
                        .with_color(Color::Red),
                );
            if let SchemaError::Shape { .. } = error {
                report = report
                    .with_help("check the `type` tags and required fields of the object ending here");
            }
            report
                .finish()
                .write((filename, Source::from(source)), &mut output)
                .ok();
        }
        SchemaError::Invalid { issues, .. } => {
            for issue in issues {
                render_issue(source, filename, issue, &mut output);
            }
        }
        SchemaError::Io { .. } => {
            output.extend_from_slice(format!("error: {error}\n").as_bytes());
        }
    }

    String::from_utf8(output).unwrap_or_default()
}

fn render_issue(source: &str, filename: &str, issue: &SchemaIssue, output: &mut Vec<u8>) {
    let needle = issue.needle();
    let span = source
        .find(&needle)
        .map_or(0..0, |start| start..start + needle.len());

    let mut report =
        Report::build(ReportKind::Error, (filename, span.clone())).with_message(issue.to_string());
    if !span.is_empty() {
        report = report.with_label(
            Label::new((filename, span))
                .with_message(label_for(issue))
                .with_color(Color::Yellow),
        );
    }
    if let Some(help) = help_for(issue) {
        report = report.with_help(help);
    }
    report
        .finish()
        .write((filename, Source::from(source)), output)
        .ok();
}

fn label_for(issue: &SchemaIssue) -> &'static str {
    match issue {
        SchemaIssue::DuplicateStep { .. } | SchemaIssue::DuplicateScenario(_) => "first defined here",
        SchemaIssue::DanglingStep { .. } => "no step with this id",
        SchemaIssue::UnknownScenario { .. } => "no scenario with this id",
        SchemaIssue::UndeclaredSection { .. } => "not declared in campaign_log",
        SchemaIssue::UnknownResolution { .. } => "not among the scenario's resolutions",
        SchemaIssue::NonExhaustiveCondition { .. } => "branch can select no option",
    }
}

fn help_for(issue: &SchemaIssue) -> Option<&str> {
    match issue {
        SchemaIssue::DanglingStep { help, .. }
        | SchemaIssue::UnknownScenario { help, .. }
        | SchemaIssue::UndeclaredSection { help, .. }
        | SchemaIssue::UnknownResolution { help, .. } => help.as_deref(),
        SchemaIssue::NonExhaustiveCondition { .. } => Some("add the missing boolCondition option or a defaultOption"),
        SchemaIssue::DuplicateStep { .. } | SchemaIssue::DuplicateScenario(_) => None,
    }
}
