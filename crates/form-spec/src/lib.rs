#![allow(missing_docs)]

pub mod builder;
pub mod compile;
pub mod errors;
pub mod memo;
pub mod raw;
pub mod render;
pub mod spec;

pub use builder::{
    CHECKBOX_ON, OPTION_FIELD_PREFIX, ParsedDefinition, check_question, collect_options,
    parse_question, to_raw_fields,
};
pub use compile::{
    CompiledField, CompiledFormSchema, FieldRule, FieldValue, FormSubmission, ParsedForm, compile,
};
pub use errors::{
    ErrorMessages, FORM_ERROR_KEY, FieldErrors, Issue, IssueCode, PathSegment, REQUIRED_MESSAGE,
    project_builder_issues, project_field_issues,
};
pub use memo::SchemaCache;
pub use raw::{RawFieldValues, RawFieldsError};
pub use render::{
    FieldControl, RenderField, RenderPayload, build_render_payload, render_json_ui, render_text,
};
pub use spec::{
    INPUT_TYPES, InputType, LabelValuePair, NumberQuestion, OptionsQuestion, QuestionCommon,
    QuestionDefinition, QuestionList, Schema, TextQuestion,
};

/// JSON Schema of the persisted question definition format.
pub fn definition_json_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(QuestionDefinition)).unwrap_or_default()
}
