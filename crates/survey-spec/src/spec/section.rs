use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::QuestionSpec;

/// One step of the survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    #[serde(rename = "sectionId")]
    pub id: String,
    #[serde(rename = "sectionTitle")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<QuestionSpec>,
}

impl SectionSpec {
    pub fn required_questions(&self) -> impl Iterator<Item = &QuestionSpec> {
        self.questions.iter().filter(|question| question.required)
    }
}
