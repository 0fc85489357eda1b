use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::QuestionDefinition;

/// Ordered questions of one form. A question's index is its identity.
pub type QuestionList = Vec<QuestionDefinition>;

/// A stored form: its identifier plus the ordered question list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub id: String,
    pub data: QuestionList,
}

impl Schema {
    pub fn new(id: impl Into<String>, data: QuestionList) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
