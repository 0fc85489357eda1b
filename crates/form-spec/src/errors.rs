//! Structural validation failures and their projection into the
//! path-addressed error maps consumed by presentation code.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Message shown for context-free failures on a rendered form field.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Key used in [`FieldErrors`] for failures that are not tied to a field.
pub const FORM_ERROR_KEY: &str = "form";

/// Segment of an issue path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// Reason a value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueCode {
    Required,
    TooShort { minimum: u32 },
    TooLong { maximum: u32 },
    TooSmall { minimum: i64 },
    TooBig { maximum: i64 },
    NotANumber,
    NotAnInteger,
    InvalidOption,
    UnknownInputType { received: Option<String> },
}

impl IssueCode {
    pub fn message(&self) -> String {
        match self {
            IssueCode::Required => "Required".into(),
            IssueCode::TooShort { minimum } => {
                format!("String must contain at least {minimum} character(s)")
            }
            IssueCode::TooLong { maximum } => {
                format!("String must contain at most {maximum} character(s)")
            }
            IssueCode::TooSmall { minimum } => {
                format!("Number must be greater than or equal to {minimum}")
            }
            IssueCode::TooBig { maximum } => {
                format!("Number must be less than or equal to {maximum}")
            }
            IssueCode::NotANumber => "Expected number, received nan".into(),
            IssueCode::NotAnInteger => "Expected integer, received float".into(),
            IssueCode::InvalidOption => "Invalid option selected".into(),
            IssueCode::UnknownInputType { .. } => "Invalid input type".into(),
        }
    }

    /// Failures that say nothing beyond "a value is missing".
    pub fn is_generic(&self) -> bool {
        matches!(self, IssueCode::Required)
    }
}

/// One structural validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    #[serde(flatten)]
    pub code: IssueCode,
}

impl Issue {
    pub fn new(path: Vec<PathSegment>, code: IssueCode) -> Self {
        Self { path, code }
    }

    /// Issue attached to a single top-level field.
    pub fn at(field: impl Into<String>, code: IssueCode) -> Self {
        Self::new(vec![PathSegment::Field(field.into())], code)
    }

    /// Issue with no path.
    pub fn general(code: IssueCode) -> Self {
        Self::new(Vec::new(), code)
    }

    pub fn message(&self) -> String {
        self.code.message()
    }

    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Builder-side errors: at most one message per field, options keyed by
/// their position in the submitted option list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<usize, String>,
}

impl ErrorMessages {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Message recorded for a raw builder field name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let slot = match name {
            "title" => &self.title,
            "description" => &self.description,
            "isRequired" => &self.is_required,
            "maxLength" => &self.max_length,
            "minLength" => &self.min_length,
            "maxValue" => &self.max_value,
            "minValue" => &self.min_value,
            _ => return None,
        };
        slot.as_deref()
    }

    fn slot_mut(&mut self, name: &str) -> &mut Option<String> {
        match name {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "isRequired" => &mut self.is_required,
            "maxLength" => &mut self.max_length,
            "minLength" => &mut self.min_length,
            "maxValue" => &mut self.max_value,
            "minValue" => &mut self.min_value,
            _ => &mut self.general,
        }
    }
}

/// Folds builder issues into [`ErrorMessages`]; the last issue per path wins.
pub fn project_builder_issues(issues: &[Issue]) -> ErrorMessages {
    issues.iter().fold(ErrorMessages::default(), |mut acc, issue| {
        let message = issue.message();
        match issue.path.as_slice() {
            [PathSegment::Field(name), PathSegment::Index(idx), ..] if name == "options" => {
                acc.options.insert(*idx, message);
            }
            [PathSegment::Field(name), ..] => {
                *acc.slot_mut(name) = Some(message);
            }
            _ => acc.general = Some(message),
        }
        acc
    })
}

/// Flat map from submission field name to a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }
}

/// Folds submission issues into [`FieldErrors`]. Generic failures become
/// [`REQUIRED_MESSAGE`]; other messages pass through verbatim.
pub fn project_field_issues(issues: &[Issue]) -> FieldErrors {
    issues.iter().fold(FieldErrors::default(), |mut acc, issue| {
        let key = match issue.path.first() {
            Some(segment) => segment.to_string(),
            None => FORM_ERROR_KEY.to_string(),
        };
        let message = if issue.code.is_generic() {
            REQUIRED_MESSAGE.to_string()
        } else {
            issue.message()
        };
        acc.insert(key, message);
        acc
    })
}
