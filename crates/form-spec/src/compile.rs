//! Compiles an ordered question list into the validator used for form
//! submissions.
//!
//! Every question owns the field `{prefix}-{position}` (`text-0`,
//! `number-1`, `select-2`). Position is identity: removing a question
//! renames every field after it on the next compilation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{FieldErrors, Issue, IssueCode, project_field_issues};
use crate::raw::RawFieldValues;
use crate::spec::question::QuestionDefinition;

/// Constraint set applied to one submission field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    Text {
        required: bool,
        min_length: u32,
        max_length: u32,
    },
    Number {
        required: bool,
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Choice {
        required: bool,
        allowed: Vec<String>,
    },
}

impl FieldRule {
    pub fn is_required(&self) -> bool {
        match self {
            FieldRule::Text { required, .. }
            | FieldRule::Number { required, .. }
            | FieldRule::Choice { required, .. } => *required,
        }
    }

    /// Checks one raw value. `Ok(None)` means "no value" was accepted.
    pub fn apply(&self, raw: Option<&str>) -> Result<Option<FieldValue>, IssueCode> {
        match self {
            FieldRule::Text {
                required: true,
                min_length,
                max_length,
            } => {
                let text = raw.ok_or(IssueCode::Required)?;
                let chars = text.chars().count();
                if chars < *min_length as usize {
                    return Err(IssueCode::TooShort {
                        minimum: *min_length,
                    });
                }
                if chars > *max_length as usize {
                    return Err(IssueCode::TooLong {
                        maximum: *max_length,
                    });
                }
                Ok(Some(FieldValue::Text(text.to_string())))
            }
            FieldRule::Text {
                required: false, ..
            } => Ok(non_empty(raw).map(|text| FieldValue::Text(text.to_string()))),
            FieldRule::Number {
                required,
                minimum,
                maximum,
            } => {
                // Whitespace-only input counts as no value.
                let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
                    return if *required {
                        Err(IssueCode::Required)
                    } else {
                        Ok(None)
                    };
                };
                let number = text
                    .parse::<f64>()
                    .ok()
                    .filter(|number| number.is_finite())
                    .ok_or(IssueCode::NotANumber)?;
                if let Some(minimum) = minimum
                    && number < *minimum as f64
                {
                    return Err(IssueCode::TooSmall { minimum: *minimum });
                }
                if let Some(maximum) = maximum
                    && number > *maximum as f64
                {
                    return Err(IssueCode::TooBig { maximum: *maximum });
                }
                Ok(Some(FieldValue::Number(number)))
            }
            FieldRule::Choice { required, allowed } => {
                let Some(choice) = non_empty(raw) else {
                    return if *required {
                        Err(IssueCode::Required)
                    } else {
                        Ok(None)
                    };
                };
                if allowed.iter().any(|value| value == choice) {
                    Ok(Some(FieldValue::Choice(choice.to_string())))
                } else {
                    Err(IssueCode::InvalidOption)
                }
            }
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.is_empty())
}

/// Typed value of a validated field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Choice(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) | FieldValue::Choice(text) => Some(text),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => Some(*number),
            _ => None,
        }
    }
}

/// Validated submission: every compiled field, `None` when left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormSubmission(BTreeMap<String, Option<FieldValue>>);

impl FormSubmission {
    /// Value of `field`, or `None` when absent or left empty.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field).and_then(Option::as_ref)
    }

    /// Whether the field was part of the compiled schema.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FieldValue>)> {
        self.0
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_ref()))
    }
}

/// Renderer-facing outcome: exactly one side is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedForm {
    pub data: Option<FormSubmission>,
    pub error_messages: Option<FieldErrors>,
}

impl ParsedForm {
    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledField {
    pub name: String,
    pub position: usize,
    pub rule: FieldRule,
}

/// Validator derived from one snapshot of a question list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFormSchema {
    fields: Vec<CompiledField>,
}

/// Builds the submission validator for `questions`.
pub fn compile(questions: &[QuestionDefinition]) -> CompiledFormSchema {
    let fields = questions
        .iter()
        .enumerate()
        .map(|(position, question)| CompiledField {
            name: question.field_name(position),
            position,
            rule: compile_rule(question),
        })
        .collect::<Vec<_>>();
    debug!(fields = fields.len(), "compiled form schema");
    CompiledFormSchema { fields }
}

fn compile_rule(question: &QuestionDefinition) -> FieldRule {
    let required = question.is_required();
    match question {
        QuestionDefinition::Text(text) => FieldRule::Text {
            required,
            min_length: text.min_length,
            max_length: text.max_length,
        },
        QuestionDefinition::Number(number) => FieldRule::Number {
            required,
            minimum: number.min_value,
            maximum: number.max_value,
        },
        QuestionDefinition::Options(options) => FieldRule::Choice {
            required,
            allowed: options
                .options
                .iter()
                .map(|option| option.value.clone())
                .collect(),
        },
    }
}

impl CompiledFormSchema {
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    /// Validates a submission, keeping the structural issues unprojected.
    /// Keys that match no compiled field are ignored.
    pub fn check(&self, raw: &RawFieldValues) -> Result<FormSubmission, Vec<Issue>> {
        let mut values = BTreeMap::new();
        let mut issues = Vec::new();
        for field in &self.fields {
            match field.rule.apply(raw.get(&field.name)) {
                Ok(value) => {
                    values.insert(field.name.clone(), value);
                }
                Err(code) => issues.push(Issue::at(field.name.clone(), code)),
            }
        }

        if issues.is_empty() {
            Ok(FormSubmission(values))
        } else {
            debug!(failures = issues.len(), "form submission rejected");
            Err(issues)
        }
    }

    pub fn validate(&self, raw: &RawFieldValues) -> Result<FormSubmission, FieldErrors> {
        self.check(raw).map_err(|issues| project_field_issues(&issues))
    }

    pub fn parse_form_data(&self, raw: &RawFieldValues) -> ParsedForm {
        match self.validate(raw) {
            Ok(data) => ParsedForm {
                data: Some(data),
                error_messages: None,
            },
            Err(errors) => ParsedForm {
                data: None,
                error_messages: Some(errors),
            },
        }
    }

    /// JSON Schema describing the typed submission produced by
    /// [`CompiledFormSchema::validate`].
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            properties.insert(field.name.clone(), field_schema(&field.rule));
            if field.rule.is_required() {
                required.push(Value::String(field.name.clone()));
            }
        }

        let mut root = Map::new();
        root.insert("type".into(), Value::String("object".into()));
        root.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            root.insert("required".into(), Value::Array(required));
        }
        Value::Object(root)
    }
}

fn field_schema(rule: &FieldRule) -> Value {
    let mut schema = Map::new();
    let base_type = match rule {
        FieldRule::Text {
            required,
            min_length,
            max_length,
        } => {
            if *required {
                schema.insert("minLength".into(), Value::Number((*min_length).into()));
                schema.insert("maxLength".into(), Value::Number((*max_length).into()));
            }
            "string"
        }
        FieldRule::Number {
            minimum, maximum, ..
        } => {
            if let Some(minimum) = minimum {
                schema.insert("minimum".into(), Value::Number((*minimum).into()));
            }
            if let Some(maximum) = maximum {
                schema.insert("maximum".into(), Value::Number((*maximum).into()));
            }
            "number"
        }
        FieldRule::Choice { allowed, required } => {
            let mut choices = allowed
                .iter()
                .cloned()
                .map(Value::String)
                .collect::<Vec<_>>();
            if !required {
                choices.push(Value::Null);
            }
            schema.insert("enum".into(), Value::Array(choices));
            "string"
        }
    };

    let type_value = if rule.is_required() {
        Value::String(base_type.into())
    } else {
        Value::Array(vec![
            Value::String(base_type.into()),
            Value::String("null".into()),
        ])
    };
    schema.insert("type".into(), type_value);
    Value::Object(schema)
}
