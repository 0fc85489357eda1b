use serde_json::{Map, Value, json};

use crate::compile::compile;
use crate::errors::FieldErrors;
use crate::spec::question::{LabelValuePair, QuestionDefinition};

/// Input control used to render a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldControl {
    TextInput,
    NumberInput,
    Select,
}

impl FieldControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldControl::TextInput => "text",
            FieldControl::NumberInput => "number",
            FieldControl::Select => "select",
        }
    }
}

/// Describes a single fillable field.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub name: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub control: FieldControl,
    pub required: bool,
    pub options: Vec<LabelValuePair>,
    pub error: Option<String>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub fields: Vec<RenderField>,
    pub schema: Value,
}

/// Build the renderer payload from the question list and the errors of the
/// last submission, if any.
pub fn build_render_payload(
    questions: &[QuestionDefinition],
    errors: Option<&FieldErrors>,
) -> RenderPayload {
    let fields = questions
        .iter()
        .enumerate()
        .map(|(position, question)| {
            let name = question.field_name(position);
            let (control, options) = match question {
                QuestionDefinition::Text(_) => (FieldControl::TextInput, Vec::new()),
                QuestionDefinition::Number(_) => (FieldControl::NumberInput, Vec::new()),
                QuestionDefinition::Options(select) => {
                    (FieldControl::Select, select.options.clone())
                }
            };
            RenderField {
                error: errors
                    .and_then(|errors| errors.get(&name))
                    .map(str::to_string),
                name,
                label: question.title().to_string(),
                placeholder: match control {
                    FieldControl::Select => None,
                    _ => question.description().map(str::to_string),
                },
                control,
                required: question.is_required(),
                options,
            }
        })
        .collect();

    RenderPayload {
        fields,
        schema: compile(questions).to_json_schema(),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("name".into(), Value::String(field.name.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert(
                "placeholder".into(),
                field
                    .placeholder
                    .clone()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            );
            map.insert("control".into(), Value::String(field.control.as_str().into()));
            map.insert("required".into(), Value::Bool(field.required));
            if field.control == FieldControl::Select {
                map.insert(
                    "options".into(),
                    Value::Array(
                        field
                            .options
                            .iter()
                            .map(|option| json!({ "label": option.label, "value": option.value }))
                            .collect(),
                    ),
                );
            }
            if let Some(error) = &field.error {
                map.insert("error".into(), Value::String(error.clone()));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "fields": fields,
        "schema": payload.schema,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    if payload.fields.is_empty() {
        lines.push("The form has no questions yet.".to_string());
    }

    for field in &payload.fields {
        let mut entry = format!("{} [{}] {}", field.name, field.control.as_str(), field.label);
        if field.required {
            entry.push_str(" (required)");
        }
        lines.push(entry);
        if let Some(placeholder) = &field.placeholder {
            lines.push(format!("    hint: {}", placeholder));
        }
        if !field.options.is_empty() {
            let values = field
                .options
                .iter()
                .map(|option| option.label.as_str())
                .collect::<Vec<_>>();
            lines.push(format!("    options: {}", values.join(", ")));
        }
        if let Some(error) = &field.error {
            lines.push(format!("    error: {}", error));
        }
    }

    lines.join("\n")
}
