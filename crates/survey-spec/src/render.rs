use serde_json::{Map, Value, json};

use crate::{
    answers::{AnswerValue, ValidationErrors},
    engine::{FormState, Phase},
    progress::{Progress, step_is_valid},
    spec::{question::QuestionType, survey::SurveySpec},
};

pub const SUBMIT_LABEL: &str = "Submit Your Story";
pub const SUBMITTING_LABEL: &str = "Submitting...";

/// Position of a step relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Complete,
    /// Behind the current step but still missing a required answer.
    Incomplete,
    Current,
    Upcoming,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Complete => "complete",
            StepStatus::Incomplete => "incomplete",
            StepStatus::Current => "current",
            StepStatus::Upcoming => "upcoming",
        }
    }
}

/// Entry of the step indicator.
#[derive(Debug, Clone)]
pub struct RenderStep {
    pub index: usize,
    pub id: String,
    pub title: String,
    pub status: StepStatus,
    pub valid: bool,
}

#[derive(Debug, Clone)]
pub struct RenderOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Bounds and captions of a range question.
#[derive(Debug, Clone)]
pub struct RenderScale {
    pub min: i64,
    pub max: i64,
    pub default: Option<i64>,
    pub min_label: Option<String>,
    pub max_label: Option<String>,
    /// Value the slider sits on: the answer, or the default when unanswered.
    pub shown: Option<i64>,
}

/// Describes a single question for render outputs.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub id: String,
    pub label: String,
    pub kind: QuestionType,
    pub required: bool,
    pub placeholder: Option<String>,
    pub options: Vec<RenderOption>,
    pub scale: Option<RenderScale>,
    pub current_value: Option<AnswerValue>,
    pub error: Option<String>,
}

/// Validation error raised on a question outside the current step.
#[derive(Debug, Clone)]
pub struct RenderStepError {
    pub step: usize,
    pub id: String,
    pub label: String,
    pub message: String,
}

/// Navigation affordances for the current step.
#[derive(Debug, Clone, Copy)]
pub struct RenderNavigation {
    pub can_go_back: bool,
    pub can_advance: bool,
    pub is_last_step: bool,
    pub can_submit: bool,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub survey_title: String,
    pub step: usize,
    pub step_count: usize,
    pub section_title: String,
    pub section_description: Option<String>,
    pub progress: Progress,
    pub percent: u8,
    pub step_valid: bool,
    pub phase: Phase,
    pub notice: Option<String>,
    pub notice_is_error: bool,
    pub navigation: RenderNavigation,
    pub submit_label: &'static str,
    pub steps: Vec<RenderStep>,
    pub questions: Vec<RenderQuestion>,
    pub errors: ValidationErrors,
    pub other_step_errors: Vec<RenderStepError>,
}

/// Build the renderer payload from the survey and the session state.
pub fn build_render_payload(survey: &SurveySpec, state: &FormState) -> RenderPayload {
    let answers = state.answers();
    let progress = state.progress(survey);
    let step = state.step();
    let section = survey.section(step);
    let step_valid = state.current_step_valid(survey);
    let is_last_step = state.is_last_step(survey);
    let editing = state.phase() == Phase::Editing;

    let steps = survey
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            let valid = step_is_valid(section, answers);
            RenderStep {
                index,
                id: section.id.clone(),
                title: section.title.clone(),
                status: match index.cmp(&step) {
                    std::cmp::Ordering::Less if valid => StepStatus::Complete,
                    std::cmp::Ordering::Less => StepStatus::Incomplete,
                    std::cmp::Ordering::Equal => StepStatus::Current,
                    std::cmp::Ordering::Greater => StepStatus::Upcoming,
                },
                valid,
            }
        })
        .collect();

    let other_step_errors = state
        .errors()
        .iter()
        .filter_map(|(id, message)| {
            let owner = survey.step_of(id).filter(|owner| *owner != step)?;
            let label = survey
                .question(id)
                .map(|question| question.label.clone())
                .unwrap_or_else(|| id.clone());
            Some(RenderStepError {
                step: owner,
                id: id.clone(),
                label,
                message: message.clone(),
            })
        })
        .collect::<Vec<_>>();

    let questions = section
        .map(|section| {
            section
                .questions
                .iter()
                .map(|question| {
                    let current_value = answers.get(&question.id).cloned();
                    let options = question
                        .options
                        .iter()
                        .map(|option| RenderOption {
                            value: option.value.clone(),
                            label: option.label.clone(),
                            selected: current_value
                                .as_ref()
                                .is_some_and(|value| value.contains(&option.value)),
                        })
                        .collect();
                    let scale = match (question.kind, question.min, question.max) {
                        (QuestionType::Range, Some(min), Some(max)) => {
                            let labels = question.scale_labels.clone().unwrap_or_default();
                            let shown = match &current_value {
                                Some(AnswerValue::Scale(value)) => Some(*value),
                                _ => question.default,
                            };
                            Some(RenderScale {
                                min,
                                max,
                                default: question.default,
                                min_label: labels.min,
                                max_label: labels.max,
                                shown,
                            })
                        }
                        _ => None,
                    };
                    RenderQuestion {
                        id: question.id.clone(),
                        label: question.label.clone(),
                        kind: question.kind,
                        required: question.required,
                        placeholder: question.placeholder.clone(),
                        options,
                        scale,
                        current_value,
                        error: state.errors().get(&question.id).cloned(),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let submit_label = if state.phase() == Phase::Submitting {
        SUBMITTING_LABEL
    } else {
        SUBMIT_LABEL
    };

    RenderPayload {
        survey_title: survey.title.clone().unwrap_or_else(|| "Survey".to_string()),
        step,
        step_count: survey.step_count(),
        section_title: section.map(|section| section.title.clone()).unwrap_or_default(),
        section_description: section.and_then(|section| section.description.clone()),
        progress,
        percent: progress.percent(),
        step_valid,
        phase: state.phase(),
        notice: state.notice().map(|notice| notice.message()),
        notice_is_error: state.notice().is_some_and(|notice| notice.is_error()),
        navigation: RenderNavigation {
            can_go_back: editing && step > 0,
            can_advance: editing && !is_last_step && step_valid,
            is_last_step,
            can_submit: editing && is_last_step,
        },
        submit_label,
        steps,
        questions,
        errors: state.errors().clone(),
        other_step_errors,
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let questions = payload
        .questions
        .iter()
        .map(|question| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(question.id.clone()));
            map.insert("label".into(), Value::String(question.label.clone()));
            map.insert("type".into(), Value::String(question.kind.as_str().into()));
            map.insert("required".into(), Value::Bool(question.required));
            if let Some(placeholder) = &question.placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
            if !question.options.is_empty() {
                map.insert(
                    "options".into(),
                    Value::Array(
                        question
                            .options
                            .iter()
                            .map(|option| {
                                json!({
                                    "value": option.value,
                                    "label": option.label,
                                    "selected": option.selected,
                                })
                            })
                            .collect(),
                    ),
                );
            }
            if let Some(scale) = &question.scale {
                map.insert(
                    "scale".into(),
                    json!({
                        "min": scale.min,
                        "max": scale.max,
                        "default": scale.default,
                        "minLabel": scale.min_label,
                        "maxLabel": scale.max_label,
                        "shown": scale.shown,
                    }),
                );
            }
            if let Some(value) = &question.current_value {
                map.insert(
                    "current_value".into(),
                    serde_json::to_value(value).unwrap_or(Value::Null),
                );
            }
            if let Some(error) = &question.error {
                map.insert("error".into(), Value::String(error.clone()));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    let steps = payload
        .steps
        .iter()
        .map(|step| {
            json!({
                "index": step.index,
                "id": step.id,
                "title": step.title,
                "status": step.status.as_str(),
                "valid": step.valid,
            })
        })
        .collect::<Vec<_>>();

    let other_step_errors = payload
        .other_step_errors
        .iter()
        .map(|error| {
            json!({
                "step": error.step,
                "id": error.id,
                "label": error.label,
                "message": error.message,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "survey_title": payload.survey_title,
        "phase": payload.phase.as_str(),
        "step": payload.step,
        "step_count": payload.step_count,
        "section": {
            "title": payload.section_title,
            "description": payload.section_description,
        },
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
            "percent": payload.percent,
        },
        "step_valid": payload.step_valid,
        "navigation": {
            "can_go_back": payload.navigation.can_go_back,
            "can_advance": payload.navigation.can_advance,
            "is_last_step": payload.navigation.is_last_step,
            "can_submit": payload.navigation.can_submit,
            "submit_label": payload.submit_label,
        },
        "notice": payload.notice,
        "steps": steps,
        "questions": questions,
        "errors": payload.errors,
        "other_step_errors": other_step_errors,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} [{}] {}% complete",
        payload.survey_title, payload.phase.as_str(), payload.percent
    ));
    lines.push(progress_bar(payload.percent));
    lines.push(format!(
        "Step {} of {}",
        payload.step + 1,
        payload.step_count
    ));
    lines.push(step_indicator(&payload.steps));
    lines.push(String::new());
    lines.push(format!("== {} ==", payload.section_title));
    if let Some(description) = &payload.section_description {
        lines.push(description.clone());
    }

    for question in &payload.questions {
        let mut header = format!(
            "- {} ({}, {})",
            question.label,
            question.id,
            question.kind.as_str()
        );
        if question.required {
            header.push_str(" *");
        }
        lines.push(header);

        for option in &question.options {
            let marker = match (question.kind, option.selected) {
                (QuestionType::Checkbox, true) => "[x]",
                (QuestionType::Checkbox, false) => "[ ]",
                (_, true) => "(*)",
                (_, false) => "( )",
            };
            lines.push(format!("    {} {} = {}", marker, option.value, option.label));
        }

        if let Some(scale) = &question.scale {
            lines.push(format!(
                "    {} {} .. {} {}",
                scale.min_label.as_deref().unwrap_or(""),
                scale.min,
                scale.max,
                scale.max_label.as_deref().unwrap_or("")
            ));
            if let Some(shown) = scale.shown {
                lines.push(format!("    Current: {}", shown));
            }
        } else if question.options.is_empty() {
            match &question.current_value {
                Some(value) => lines.push(format!("    = {}", value.display())),
                None => {
                    if let Some(placeholder) = &question.placeholder {
                        lines.push(format!("    ({})", placeholder));
                    }
                }
            }
        }

        if let Some(error) = &question.error {
            lines.push(format!("    ! {}", error));
        }
    }

    if !payload.other_step_errors.is_empty() {
        lines.push(String::new());
        lines.push("Also needed on other steps:".to_string());
        for error in &payload.other_step_errors {
            lines.push(format!(
                "  Step {}: {} ({}) ! {}",
                error.step + 1,
                error.label,
                error.id,
                error.message
            ));
        }
    }

    lines.push(String::new());
    let mut controls = Vec::new();
    if payload.navigation.can_go_back {
        controls.push("prev".to_string());
    }
    if payload.navigation.is_last_step {
        if payload.navigation.can_submit || payload.phase == Phase::Submitting {
            controls.push(format!("submit ({})", payload.submit_label));
        }
    } else if payload.navigation.can_advance {
        controls.push("next".to_string());
    } else {
        controls.push("next (answer the required questions first)".to_string());
    }
    lines.push(format!("Controls: {}", controls.join(" | ")));

    if let Some(notice) = &payload.notice {
        lines.push(notice.clone());
    }

    lines.join("\n")
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent) / 5;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(20 - filled))
}

fn step_indicator(steps: &[RenderStep]) -> String {
    steps
        .iter()
        .map(|step| match step.status {
            StepStatus::Complete => "(v)".to_string(),
            StepStatus::Incomplete => "(!)".to_string(),
            StepStatus::Current => format!("[{}]", step.index + 1),
            StepStatus::Upcoming => format!("({})", step.index + 1),
        })
        .collect::<Vec<_>>()
        .join("--")
}
