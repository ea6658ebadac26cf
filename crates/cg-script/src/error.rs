//! Load-time errors.

use std::ops::Range;

use crate::StepId;

/// Alias for `Result<T, SchemaError>`.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Why a guide failed to load.
///
/// A schema error is fatal to the guide being loaded only; guides already
/// in a [`ScriptStore`](crate::ScriptStore) are unaffected.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum SchemaError {
    /// The guide file could not be read.
    #[error("cannot read {path}: {error}")]
    #[diagnostic(code(cg::schema::io))]
    Io {
        /// The file path.
        path: String,
        /// The I/O error.
        error: std::io::Error,
    },

    /// The guide is not well-formed JSON.
    #[error("invalid JSON at line {line}, column {column}: {message}")]
    #[diagnostic(code(cg::schema::syntax))]
    Syntax {
        /// Parser message.
        message: String,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
        /// Byte range of the offending text.
        span: Range<usize>,
    },

    /// The JSON does not have the shape of a guide (unknown `type` tag,
    /// missing field, wrong value type).
    #[error("invalid guide at line {line}, column {column}: {message}")]
    #[diagnostic(
        code(cg::schema::shape),
        help("check the `type` tags and required fields of the object ending here")
    )]
    Shape {
        /// Deserializer message.
        message: String,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
        /// Byte range of the offending text.
        span: Range<usize>,
    },

    /// The guide parsed, but its references do not hold together.
    #[error("campaign \"{campaign}\" failed validation with {count} issue(s)", count = .issues.len())]
    #[diagnostic(code(cg::schema::invalid))]
    Invalid {
        /// Campaign id.
        campaign: String,
        /// Every problem found.
        #[related]
        issues: Vec<SchemaIssue>,
    },
}

impl SchemaError {
    /// Build a syntax or shape error from a `serde_json` error.
    pub fn from_json(source: &str, error: &serde_json::Error) -> Self {
        let line = error.line();
        let column = error.column();
        let span = span_at(source, line, column);
        let message = strip_position(&error.to_string());
        match error.classify() {
            serde_json::error::Category::Data => Self::Shape {
                message,
                line,
                column,
                span,
            },
            _ => Self::Syntax {
                message,
                line,
                column,
                span,
            },
        }
    }

    /// Byte range in the guide source the error points at, if known.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Self::Syntax { span, .. } | Self::Shape { span, .. } => Some(span.clone()),
            Self::Io { .. } | Self::Invalid { .. } => None,
        }
    }

    /// Problems found by reference validation.
    pub fn issues(&self) -> &[SchemaIssue] {
        match self {
            Self::Invalid { issues, .. } => issues,
            _ => &[],
        }
    }
}

/// One problem found while validating a parsed guide.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum SchemaIssue {
    /// Two steps in one graph share an id.
    #[error("{scope}: duplicate step id \"{id}\"")]
    #[diagnostic(code(cg::schema::duplicate_step))]
    DuplicateStep {
        /// Where the steps live.
        scope: String,
        /// The repeated id.
        id: StepId,
    },

    /// Two scenarios share an id.
    #[error("duplicate scenario id \"{0}\"")]
    #[diagnostic(code(cg::schema::duplicate_scenario))]
    DuplicateScenario(String),

    /// A step list names a step that does not exist.
    #[error("{scope}: {from} references unknown step \"{target}\"")]
    #[diagnostic(code(cg::schema::dangling_step))]
    DanglingStep {
        /// Graph being validated.
        scope: String,
        /// What holds the reference.
        from: String,
        /// The missing step id.
        target: StepId,
        /// Suggested replacement.
        #[help]
        help: Option<String>,
    },

    /// A scenario reference names a scenario that does not exist.
    #[error("{from} references unknown scenario \"{target}\"")]
    #[diagnostic(code(cg::schema::unknown_scenario))]
    UnknownScenario {
        /// What holds the reference.
        from: String,
        /// The missing scenario id.
        target: String,
        /// Suggested replacement.
        #[help]
        help: Option<String>,
    },

    /// A log effect or condition names a section the campaign never declares.
    #[error("{scope}: {from} uses undeclared log section \"{section}\"")]
    #[diagnostic(code(cg::schema::undeclared_section))]
    UndeclaredSection {
        /// Graph being validated.
        scope: String,
        /// What holds the reference.
        from: String,
        /// The section id.
        section: String,
        /// Suggested replacement.
        #[help]
        help: Option<String>,
    },

    /// A resolution step names a resolution its scenario does not declare.
    #[error("{scope}: {from} reaches undeclared resolution \"{resolution}\"")]
    #[diagnostic(code(cg::schema::unknown_resolution))]
    UnknownResolution {
        /// Graph being validated.
        scope: String,
        /// The resolution step.
        from: String,
        /// The missing resolution id.
        resolution: String,
        /// Suggested replacement.
        #[help]
        help: Option<String>,
    },

    /// A branch on a boolean condition leaves one value without an option.
    #[error("{scope}: branch step \"{step}\" has no {condition} option for {missing} and no defaultOption")]
    #[diagnostic(code(cg::schema::non_exhaustive_condition))]
    NonExhaustiveCondition {
        /// Graph being validated.
        scope: String,
        /// The branch step.
        step: StepId,
        /// Condition type.
        condition: &'static str,
        /// The uncovered value.
        missing: bool,
    },
}

impl SchemaIssue {
    /// The quoted identifier the issue is about, used to locate it in the
    /// guide source.
    pub fn needle(&self) -> String {
        let id = match self {
            Self::DuplicateStep { id, .. } => id,
            Self::DuplicateScenario(id) => id,
            Self::DanglingStep { target, .. } | Self::UnknownScenario { target, .. } => target,
            Self::UndeclaredSection { section, .. } => section,
            Self::UnknownResolution { resolution, .. } => resolution,
            Self::NonExhaustiveCondition { step, .. } => step,
        };
        format!("\"{id}\"")
    }
}

fn span_at(source: &str, line: usize, column: usize) -> Range<usize> {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let start = (line_start + column.saturating_sub(1)).min(source.len());
    let end = source[start..]
        .chars()
        .next()
        .map_or(start, |c| start + c.len_utf8());
    start..end
}

fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(index) => message[..index].to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_points_at_offending_byte() {
        let source = "{\n  \"campaign\": ,\n}";
        let err = serde_json::from_str::<serde_json::Value>(source).unwrap_err();
        let schema = SchemaError::from_json(source, &err);

        assert!(matches!(schema, SchemaError::Syntax { line: 2, .. }));
        let span = schema.span().unwrap();
        assert_eq!(&source[span], ",");
    }

    #[test]
    fn data_error_is_a_shape_error() {
        let source = r#"{"campaign": 3}"#;
        let err = serde_json::from_str::<crate::GuideDocument>(source).unwrap_err();
        let schema = SchemaError::from_json(source, &err);
        assert!(matches!(schema, SchemaError::Shape { .. }));
        assert!(!schema.to_string().contains(" at line 1, column"));
    }

    #[test]
    fn invalid_counts_issues() {
        let err = SchemaError::Invalid {
            campaign: "night".into(),
            issues: vec![SchemaIssue::DuplicateScenario("the_gathering".into())],
        };
        assert_eq!(
            err.to_string(),
            "campaign \"night\" failed validation with 1 issue(s)"
        );
        assert_eq!(err.issues()[0].needle(), "\"the_gathering\"");
    }

    #[test]
    fn span_clamps_to_source() {
        assert_eq!(span_at("ab", 9, 9), 2..2);
    }
}
