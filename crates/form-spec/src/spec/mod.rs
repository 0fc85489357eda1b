pub mod question;
pub mod schema;

pub use question::{
    DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH, INPUT_TYPES, InputType, LabelValuePair,
    NumberQuestion, OptionsQuestion, QuestionCommon, QuestionDefinition, TextQuestion,
    UnknownInputType,
};
pub use schema::{QuestionList, Schema};
