use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::question::{QuestionSpec, QuestionType};
use crate::spec::section::SectionSpec;

/// Configuration problems detected when a survey is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("survey defines no sections")]
    NoSections,
    #[error("section at position {0} has an empty id")]
    EmptySectionId(usize),
    #[error("question id '{0}' is used more than once")]
    DuplicateQuestion(String),
    #[error("question '{0}' has an empty id or label")]
    EmptyQuestion(String),
    #[error("choice question '{0}' declares no options")]
    MissingOptions(String),
    #[error("question '{question}' repeats option value '{value}'")]
    DuplicateOption { question: String, value: String },
    #[error("range question '{0}' needs both min and max")]
    MissingBounds(String),
    #[error("range question '{0}' has min greater than max")]
    InvertedBounds(String),
    #[error("range question '{0}' has a default outside its bounds")]
    DefaultOutOfBounds(String),
}

/// Failure to turn a JSON document into a usable survey.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse survey document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid survey: {0}")]
    Schema(#[from] SchemaError),
}

/// Root of a survey JSON document: `{ "survey": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurveyDocument {
    pub survey: SurveySpec,
}

/// Ordered sections making up one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurveySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sections: Vec<SectionSpec>,
}

impl SurveyDocument {
    /// Parses and checks a `{ "survey": ... }` document.
    pub fn load(json: &str) -> Result<SurveySpec, LoadError> {
        let document: SurveyDocument = serde_json::from_str(json)?;
        document.survey.check()?;
        Ok(document.survey)
    }
}

impl SurveySpec {
    /// Identifier used when labelling submissions.
    pub fn id_or_default(&self) -> &str {
        self.id.as_deref().unwrap_or("survey")
    }

    pub fn step_count(&self) -> usize {
        self.sections.len()
    }

    pub fn last_step(&self) -> usize {
        self.sections.len().saturating_sub(1)
    }

    pub fn section(&self, step: usize) -> Option<&SectionSpec> {
        self.sections.get(step)
    }

    pub fn questions(&self) -> impl Iterator<Item = &QuestionSpec> {
        self.sections
            .iter()
            .flat_map(|section| section.questions.iter())
    }

    pub fn question_count(&self) -> usize {
        self.sections
            .iter()
            .map(|section| section.questions.len())
            .sum()
    }

    pub fn question(&self, id: &str) -> Option<&QuestionSpec> {
        self.questions().find(|question| question.id == id)
    }

    /// Step index of the section holding `id`.
    pub fn step_of(&self, id: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.questions.iter().any(|question| question.id == id))
    }

    /// Reports the first configuration problem in the survey, if any.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.sections.is_empty() {
            return Err(SchemaError::NoSections);
        }

        let mut seen = BTreeSet::new();
        for (position, section) in self.sections.iter().enumerate() {
            if section.id.trim().is_empty() {
                return Err(SchemaError::EmptySectionId(position));
            }
            for question in &section.questions {
                if question.id.trim().is_empty() || question.label.trim().is_empty() {
                    return Err(SchemaError::EmptyQuestion(question.id.clone()));
                }
                if !seen.insert(question.id.as_str()) {
                    return Err(SchemaError::DuplicateQuestion(question.id.clone()));
                }
                check_question(question)?;
            }
        }

        Ok(())
    }
}

fn check_question(question: &QuestionSpec) -> Result<(), SchemaError> {
    if question.kind.has_options() {
        if question.options.is_empty() {
            return Err(SchemaError::MissingOptions(question.id.clone()));
        }
        let mut values = BTreeSet::new();
        for option in &question.options {
            if !values.insert(option.value.as_str()) {
                return Err(SchemaError::DuplicateOption {
                    question: question.id.clone(),
                    value: option.value.clone(),
                });
            }
        }
    }

    if question.kind == QuestionType::Range {
        let (Some(min), Some(max)) = (question.min, question.max) else {
            return Err(SchemaError::MissingBounds(question.id.clone()));
        };
        if min > max {
            return Err(SchemaError::InvertedBounds(question.id.clone()));
        }
        if let Some(default) = question.default
            && !(min..=max).contains(&default)
        {
            return Err(SchemaError::DefaultOutOfBounds(question.id.clone()));
        }
    }

    Ok(())
}
