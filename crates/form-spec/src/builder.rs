//! Validation of a single authored question coming from the builder form.

use serde::Serialize;
use tracing::debug;

use crate::errors::{ErrorMessages, Issue, IssueCode, PathSegment, project_builder_issues};
use crate::raw::RawFieldValues;
use crate::spec::question::{
    DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH, InputType, LabelValuePair, NumberQuestion,
    OptionsQuestion, QuestionCommon, QuestionDefinition, TextQuestion,
};

/// Raw key prefix that marks an option entry, e.g. `option-3`.
pub const OPTION_FIELD_PREFIX: &str = "option-";
/// Value a checkbox submits when ticked.
pub const CHECKBOX_ON: &str = "on";

const TITLE_MIN_CHARS: u32 = 3;
const TITLE_MAX_CHARS: u32 = 255;
const OPTION_MIN_CHARS: u32 = 1;
const OPTION_MAX_CHARS: u32 = 255;
const LENGTH_BOUND_FLOOR: u32 = 3;

/// Outcome shape handed to presentation code: exactly one side is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDefinition {
    pub data: Option<QuestionDefinition>,
    pub error_messages: Option<ErrorMessages>,
}

impl From<Result<QuestionDefinition, ErrorMessages>> for ParsedDefinition {
    fn from(result: Result<QuestionDefinition, ErrorMessages>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error_messages: None,
            },
            Err(errors) => Self {
                data: None,
                error_messages: Some(errors),
            },
        }
    }
}

/// Validates raw builder fields into a normalized question definition.
pub fn parse_question(raw: &RawFieldValues) -> Result<QuestionDefinition, ErrorMessages> {
    check_question(raw).map_err(|issues| project_builder_issues(&issues))
}

/// Same as [`parse_question`] but keeps the structural issues unprojected.
pub fn check_question(raw: &RawFieldValues) -> Result<QuestionDefinition, Vec<Issue>> {
    let input_type = match raw.get("inputType").map(str::parse::<InputType>) {
        Some(Ok(kind)) => kind,
        other => {
            let received = raw.get("inputType").map(str::to_string);
            debug!(?received, present = other.is_some(), "rejecting question discriminator");
            return Err(vec![Issue::general(IssueCode::UnknownInputType {
                received,
            })]);
        }
    };

    let mut issues = Vec::new();
    let common = parse_common(raw, &mut issues);
    let definition = match input_type {
        InputType::Text => QuestionDefinition::Text(TextQuestion {
            common,
            min_length: length_bound(raw, "minLength", DEFAULT_MIN_LENGTH),
            max_length: length_bound(raw, "maxLength", DEFAULT_MAX_LENGTH),
        }),
        InputType::Number => QuestionDefinition::Number(NumberQuestion {
            common,
            min_value: numeric_bound(raw, "minValue", &mut issues),
            max_value: numeric_bound(raw, "maxValue", &mut issues),
        }),
        InputType::Options => {
            let options = collect_options(raw);
            for (idx, option) in options.iter().enumerate() {
                if let Some(code) = char_bounds(&option.value, OPTION_MIN_CHARS, OPTION_MAX_CHARS)
                {
                    issues.push(Issue::new(
                        vec![PathSegment::Field("options".into()), PathSegment::Index(idx)],
                        code,
                    ));
                }
            }
            QuestionDefinition::Options(OptionsQuestion { common, options })
        }
    };

    if issues.is_empty() {
        Ok(definition)
    } else {
        Err(issues)
    }
}

/// Option entries in submission order; label and value are the same string.
pub fn collect_options(raw: &RawFieldValues) -> Vec<LabelValuePair> {
    raw.entries_with_prefix(OPTION_FIELD_PREFIX)
        .map(|(_, value)| LabelValuePair::mirrored(value))
        .collect()
}

/// Renders a definition back into the raw fields the builder form would
/// submit for it.
pub fn to_raw_fields(definition: &QuestionDefinition) -> RawFieldValues {
    let common = definition.common();
    let mut raw = RawFieldValues::new()
        .with("title", common.title.clone())
        .with("inputType", definition.input_type().as_str());
    if let Some(description) = &common.description {
        raw.push("description", description.clone());
    }
    if common.is_required {
        raw.push("isRequired", CHECKBOX_ON);
    }

    match definition {
        QuestionDefinition::Text(question) => {
            raw.push("minLength", question.min_length.to_string());
            raw.push("maxLength", question.max_length.to_string());
        }
        QuestionDefinition::Number(question) => {
            raw.push("minValue", bound_to_raw(question.min_value));
            raw.push("maxValue", bound_to_raw(question.max_value));
        }
        QuestionDefinition::Options(question) => {
            for (idx, option) in question.options.iter().enumerate() {
                raw.push(format!("{OPTION_FIELD_PREFIX}{idx}"), option.value.clone());
            }
        }
    }
    raw
}

fn parse_common(raw: &RawFieldValues, issues: &mut Vec<Issue>) -> QuestionCommon {
    let title = match raw.get("title") {
        Some(title) => {
            let title = title.trim();
            if let Some(code) = char_bounds(title, TITLE_MIN_CHARS, TITLE_MAX_CHARS) {
                issues.push(Issue::at("title", code));
            }
            title.to_string()
        }
        None => {
            issues.push(Issue::at("title", IssueCode::Required));
            String::new()
        }
    };

    QuestionCommon {
        title,
        description: raw.get("description").map(str::to_string),
        is_required: raw.get("isRequired") == Some(CHECKBOX_ON),
    }
}

fn char_bounds(value: &str, min: u32, max: u32) -> Option<IssueCode> {
    let chars = value.chars().count();
    if chars < min as usize {
        Some(IssueCode::TooShort { minimum: min })
    } else if chars > max as usize {
        Some(IssueCode::TooLong { maximum: max })
    } else {
        None
    }
}

/// Text length bounds never fail: anything unparsable or below the floor
/// falls back to `default`.
fn length_bound(raw: &RawFieldValues, field: &str, default: u32) -> u32 {
    let parsed = raw
        .get(field)
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value >= LENGTH_BOUND_FLOOR);
    match parsed {
        Some(value) => value,
        None => {
            debug!(field, default, "length bound replaced by default");
            default
        }
    }
}

/// Blank or missing numeric bounds mean "unbounded".
fn numeric_bound(raw: &RawFieldValues, field: &str, issues: &mut Vec<Issue>) -> Option<i64> {
    let value = raw.get(field).filter(|value| !value.trim().is_empty())?;
    match parse_integer(value) {
        Ok(bound) => Some(bound),
        Err(code) => {
            issues.push(Issue::at(field, code));
            None
        }
    }
}

fn parse_integer(value: &str) -> Result<i64, IssueCode> {
    let trimmed = value.trim();
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Ok(integer);
    }
    match trimmed.parse::<f64>() {
        Ok(number) if !number.is_finite() => Err(IssueCode::NotANumber),
        Ok(number)
            if number.fract() == 0.0 && number >= i64::MIN as f64 && number <= i64::MAX as f64 =>
        {
            Ok(number as i64)
        }
        Ok(_) => Err(IssueCode::NotAnInteger),
        Err(_) => Err(IssueCode::NotANumber),
    }
}

fn bound_to_raw(bound: Option<i64>) -> String {
    bound.map(|value| value.to_string()).unwrap_or_default()
}
