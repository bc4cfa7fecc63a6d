use serde::Serialize;

use crate::answers::{AnswerSet, REQUIRED_MESSAGE, ValidationErrors};
use crate::spec::survey::SurveySpec;

/// Outcome of validating every step of a survey at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: ValidationErrors,
    /// Missing required ids in survey order.
    pub missing_required: Vec<String>,
}

/// Checks all required questions across all sections.
pub fn validate(spec: &SurveySpec, answers: &AnswerSet) -> ValidationResult {
    let missing_required: Vec<String> = spec
        .questions()
        .filter(|question| question.required && !answers.is_filled(&question.id))
        .map(|question| question.id.clone())
        .collect();

    let errors = missing_required
        .iter()
        .map(|id| (id.clone(), REQUIRED_MESSAGE.to_string()))
        .collect::<ValidationErrors>();

    ValidationResult {
        valid: missing_required.is_empty(),
        errors,
        missing_required,
    }
}
