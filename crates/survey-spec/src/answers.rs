use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::spec::question::{QuestionSpec, QuestionType};
use crate::spec::survey::SurveySpec;

/// Message recorded for every required question left unanswered.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Question id to error message, as produced by full-form validation.
pub type ValidationErrors = BTreeMap<String, String>;

/// Shape errors raised when an answer does not fit its question.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("question '{0}' is not part of this survey")]
    UnknownQuestion(String),
    #[error("question '{id}' is a {kind} question and cannot take a {input} input")]
    InputMismatch {
        id: String,
        kind: &'static str,
        input: &'static str,
    },
    #[error("question '{id}' expects a whole number, got '{raw}'")]
    NotANumber { id: String, raw: String },
    #[error("question '{id}' expects {expected}")]
    TypeMismatch { id: String, expected: &'static str },
    #[error("answers must be a JSON object")]
    NotAnObject,
}

/// A stored answer, shaped by the declared question type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// text, email and textarea.
    Text(String),
    /// select and radio.
    Choice(String),
    /// range.
    Scale(i64),
    /// checkbox.
    Multi(BTreeSet<String>),
}

impl AnswerValue {
    /// Presence rule shared by progress and validation: trimmed strings must
    /// be non-empty, sets need a member, scale values always count.
    pub fn is_filled(&self) -> bool {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => !text.trim().is_empty(),
            AnswerValue::Scale(_) => true,
            AnswerValue::Multi(values) => !values.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => Some(text),
            _ => None,
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            AnswerValue::Multi(values) => values.contains(value),
            AnswerValue::Choice(choice) => choice == value,
            _ => false,
        }
    }

    /// Display form used by text renderers and prompts.
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Text(text) | AnswerValue::Choice(text) => text.clone(),
            AnswerValue::Scale(value) => value.to_string(),
            AnswerValue::Multi(values) => values.iter().cloned().collect::<Vec<_>>().join(", "),
        }
    }

    fn from_json(question: &QuestionSpec, value: &Value) -> Result<Self, AnswerError> {
        let mismatch = |expected| AnswerError::TypeMismatch {
            id: question.id.clone(),
            expected,
        };
        match question.kind {
            QuestionType::Text | QuestionType::Email | QuestionType::Textarea => value
                .as_str()
                .map(|text| AnswerValue::Text(text.to_string()))
                .ok_or_else(|| mismatch("a string")),
            QuestionType::Select | QuestionType::Radio => value
                .as_str()
                .map(|text| AnswerValue::Choice(text.to_string()))
                .ok_or_else(|| mismatch("a string")),
            QuestionType::Range => match value {
                Value::Number(number) => number
                    .as_i64()
                    .map(AnswerValue::Scale)
                    .ok_or_else(|| mismatch("a whole number")),
                Value::String(raw) => parse_scale(question, raw),
                _ => Err(mismatch("a whole number")),
            },
            QuestionType::Checkbox => value
                .as_array()
                .ok_or_else(|| mismatch("an array of strings"))?
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| mismatch("an array of strings"))
                })
                .collect::<Result<BTreeSet<_>, _>>()
                .map(AnswerValue::Multi),
        }
    }
}

/// Raw input event coming from a rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerInput {
    /// Replaces the answer of a single-value question.
    Value(String),
    /// Adds or removes one checkbox member.
    Toggle { value: String, checked: bool },
}

impl AnswerInput {
    pub fn value(value: impl Into<String>) -> Self {
        AnswerInput::Value(value.into())
    }

    pub fn check(value: impl Into<String>) -> Self {
        AnswerInput::Toggle {
            value: value.into(),
            checked: true,
        }
    }

    pub fn uncheck(value: impl Into<String>) -> Self {
        AnswerInput::Toggle {
            value: value.into(),
            checked: false,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AnswerInput::Value(_) => "value",
            AnswerInput::Toggle { .. } => "toggle",
        }
    }
}

/// Answers collected in the current session, keyed by question id.
///
/// A key only exists once an answer was supplied; a checkbox whose last
/// member was removed keeps an empty set, which still counts as unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct AnswerSet {
    values: BTreeMap<String, AnswerValue>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&AnswerValue> {
        self.values.get(id)
    }

    /// True when `id` holds a non-empty answer.
    pub fn is_filled(&self, id: &str) -> bool {
        self.values.get(id).is_some_and(AnswerValue::is_filled)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.values.iter()
    }

    /// Applies one input event to the answer of `question`.
    ///
    /// Nothing changes when the input does not fit the question type.
    pub fn apply(&mut self, question: &QuestionSpec, input: AnswerInput) -> Result<(), AnswerError> {
        match (question.kind, input) {
            (QuestionType::Checkbox, AnswerInput::Toggle { value, checked }) => {
                let mut members = match self.values.remove(&question.id) {
                    Some(AnswerValue::Multi(members)) => members,
                    _ => BTreeSet::new(),
                };
                if checked {
                    members.insert(value);
                } else {
                    members.remove(&value);
                }
                self.values
                    .insert(question.id.clone(), AnswerValue::Multi(members));
                Ok(())
            }
            (QuestionType::Range, AnswerInput::Value(raw)) => {
                let value = parse_scale(question, &raw)?;
                self.values.insert(question.id.clone(), value);
                Ok(())
            }
            (QuestionType::Select | QuestionType::Radio, AnswerInput::Value(raw)) => {
                self.values
                    .insert(question.id.clone(), AnswerValue::Choice(raw));
                Ok(())
            }
            (
                QuestionType::Text | QuestionType::Email | QuestionType::Textarea,
                AnswerInput::Value(raw),
            ) => {
                self.values.insert(question.id.clone(), AnswerValue::Text(raw));
                Ok(())
            }
            (kind, input) => Err(AnswerError::InputMismatch {
                id: question.id.clone(),
                kind: kind.as_str(),
                input: input.label(),
            }),
        }
    }

    /// Loads an answers document, using the survey to pick each value's shape.
    pub fn from_json(survey: &SurveySpec, answers: &Value) -> Result<Self, AnswerError> {
        let map = answers.as_object().ok_or(AnswerError::NotAnObject)?;
        let mut values = BTreeMap::new();
        for (id, value) in map {
            let question = survey
                .question(id)
                .ok_or_else(|| AnswerError::UnknownQuestion(id.clone()))?;
            values.insert(id.clone(), AnswerValue::from_json(question, value)?);
        }
        Ok(Self { values })
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn parse_scale(question: &QuestionSpec, raw: &str) -> Result<AnswerValue, AnswerError> {
    raw.trim()
        .parse::<i64>()
        .map(AnswerValue::Scale)
        .map_err(|_| AnswerError::NotANumber {
            id: question.id.clone(),
            raw: raw.to_string(),
        })
}
