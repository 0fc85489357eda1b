use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default lower bound applied to text answers.
pub const DEFAULT_MIN_LENGTH: u32 = 3;
/// Default upper bound applied to text answers.
pub const DEFAULT_MAX_LENGTH: u32 = 255;

/// Supported input types, in the order the builder offers them.
pub const INPUT_TYPES: [InputType; 3] = [InputType::Text, InputType::Number, InputType::Options];

/// Discriminator of a question definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Number,
    Options,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Number => "number",
            InputType::Options => "options",
        }
    }

    /// Label shown in the builder's type picker.
    pub fn label(&self) -> &'static str {
        match self {
            InputType::Text => "Text",
            InputType::Number => "Number",
            InputType::Options => "Options",
        }
    }

    /// Prefix of the compiled field name, e.g. `select` in `select-2`.
    pub fn field_prefix(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Number => "number",
            InputType::Options => "select",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown input type '{0}'")]
pub struct UnknownInputType(pub String);

impl FromStr for InputType {
    type Err = UnknownInputType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        INPUT_TYPES
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| UnknownInputType(raw.to_string()))
    }
}

/// Fields shared by every question variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCommon {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
}

/// Free text question. `min_length <= max_length` is not guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextQuestion {
    #[serde(flatten)]
    pub common: QuestionCommon,
    pub min_length: u32,
    pub max_length: u32,
}

/// Numeric question; a `None` bound is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumberQuestion {
    #[serde(flatten)]
    pub common: QuestionCommon,
    #[serde(default)]
    pub min_value: Option<i64>,
    #[serde(default)]
    pub max_value: Option<i64>,
}

/// Single-select question over a closed list of options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionsQuestion {
    #[serde(flatten)]
    pub common: QuestionCommon,
    #[serde(default)]
    pub options: Vec<LabelValuePair>,
}

/// One selectable option. The builder always stores `label == value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LabelValuePair {
    pub label: String,
    pub value: String,
}

impl LabelValuePair {
    /// Option whose label mirrors its value.
    pub fn mirrored(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// One authored form field, tagged by `inputType` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "inputType", rename_all = "snake_case")]
pub enum QuestionDefinition {
    Text(TextQuestion),
    Number(NumberQuestion),
    Options(OptionsQuestion),
}

impl QuestionDefinition {
    pub fn input_type(&self) -> InputType {
        match self {
            QuestionDefinition::Text(_) => InputType::Text,
            QuestionDefinition::Number(_) => InputType::Number,
            QuestionDefinition::Options(_) => InputType::Options,
        }
    }

    pub fn common(&self) -> &QuestionCommon {
        match self {
            QuestionDefinition::Text(question) => &question.common,
            QuestionDefinition::Number(question) => &question.common,
            QuestionDefinition::Options(question) => &question.common,
        }
    }

    pub fn title(&self) -> &str {
        &self.common().title
    }

    pub fn description(&self) -> Option<&str> {
        self.common().description.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.common().is_required
    }

    /// Name of the submission field this question occupies at `position`.
    pub fn field_name(&self, position: usize) -> String {
        format!("{}-{}", self.input_type().field_prefix(), position)
    }
}
