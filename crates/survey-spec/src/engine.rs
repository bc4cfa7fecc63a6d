//! Reducer-style form engine.
//!
//! [`FormState`] is owned by the caller and only changes through [`reduce`],
//! [`begin_submit`] and [`finish_submit`]. Each call takes the survey by
//! reference so one immutable schema can back any number of sessions.

use thiserror::Error;
use tracing::debug;

use crate::answers::{AnswerError, AnswerInput, AnswerSet, ValidationErrors};
use crate::progress::{Progress, step_is_valid};
use crate::spec::survey::SurveySpec;
use crate::submit::{Receipt, Submission};
use crate::validate::validate;

/// Where the session is in its submit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Editing,
    Submitting,
    Submitted,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Editing => "editing",
            Phase::Submitting => "submitting",
            Phase::Submitted => "submitted",
        }
    }
}

/// Aggregate notice shown to the user after a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MissingRequired { count: usize },
    SubmissionFailed { attempts: u32, reason: String },
    Submitted { reference: Option<String> },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::MissingRequired { count: 1 } => {
                "Please answer the required question before submitting.".to_string()
            }
            Notice::MissingRequired { count } => {
                format!("Please answer the {count} required questions before submitting.")
            }
            Notice::SubmissionFailed { attempts, reason } => format!(
                "We could not send your answers after {attempts} attempt(s): {reason}. \
                 Your answers are kept; please try again."
            ),
            Notice::Submitted { .. } => "Thank you for sharing your story!".to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::Submitted { .. })
    }
}

/// User intents a rendering surface can dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    Answer { id: String, input: AnswerInput },
    Next,
    Previous,
    GoTo(usize),
}

impl FormAction {
    pub fn answer(id: impl Into<String>, input: AnswerInput) -> Self {
        FormAction::Answer {
            id: id.into(),
            input,
        }
    }
}

/// Whether an accepted action actually moved the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error("a submission is in flight")]
    Busy,
    #[error("the form has already been submitted")]
    Closed,
}

/// Reasons a submit attempt never reached the sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRefusal {
    #[error("submission is only possible from the last step")]
    NotOnLastStep,
    #[error("a submission is already in flight")]
    Busy,
    #[error("the form has already been submitted")]
    Closed,
    #[error("{} required question(s) are unanswered", .0.len())]
    Invalid(ValidationErrors),
}

/// Result of one submission as reported back to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Delivered(Receipt),
    Failed { attempts: u32, reason: String },
}

/// Complete state of one form session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormState {
    answers: AnswerSet,
    step: usize,
    errors: ValidationErrors,
    phase: Phase,
    notice: Option<Notice>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session from previously collected answers, at the first step.
    pub fn with_answers(answers: AnswerSet) -> Self {
        Self {
            answers,
            ..Self::default()
        }
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn progress(&self, survey: &SurveySpec) -> Progress {
        Progress::measure(survey, &self.answers)
    }

    /// Whether the required questions of the current step are answered.
    pub fn current_step_valid(&self, survey: &SurveySpec) -> bool {
        survey
            .section(self.step)
            .is_none_or(|section| step_is_valid(section, &self.answers))
    }

    pub fn is_last_step(&self, survey: &SurveySpec) -> bool {
        self.step >= survey.last_step()
    }

    fn ensure_editable(&self) -> Result<(), FormError> {
        match self.phase {
            Phase::Editing => Ok(()),
            Phase::Submitting => Err(FormError::Busy),
            Phase::Submitted => Err(FormError::Closed),
        }
    }
}

/// Applies one action to `state`.
///
/// Refused navigation (invalid step, bounds) is not an error and reports
/// [`Transition::Unchanged`].
pub fn reduce(
    survey: &SurveySpec,
    state: &mut FormState,
    action: FormAction,
) -> Result<Transition, FormError> {
    state.ensure_editable()?;
    match action {
        FormAction::Answer { id, input } => update_answer(survey, state, &id, input),
        FormAction::Next => Ok(next_step(survey, state)),
        FormAction::Previous => Ok(previous_step(state)),
        FormAction::GoTo(target) => Ok(go_to_step(survey, state, target)),
    }
}

fn update_answer(
    survey: &SurveySpec,
    state: &mut FormState,
    id: &str,
    input: AnswerInput,
) -> Result<Transition, FormError> {
    let question = survey
        .question(id)
        .ok_or_else(|| AnswerError::UnknownQuestion(id.to_string()))?;
    state.answers.apply(question, input)?;
    debug!(question_id = id, "answer updated");

    if state.answers.is_filled(id) && state.errors.remove(id).is_some() {
        debug!(question_id = id, "validation error cleared");
        if state.errors.is_empty()
            && matches!(state.notice, Some(Notice::MissingRequired { .. }))
        {
            state.notice = None;
        }
    }
    Ok(Transition::Changed)
}

fn next_step(survey: &SurveySpec, state: &mut FormState) -> Transition {
    if state.is_last_step(survey) || !state.current_step_valid(survey) {
        return Transition::Unchanged;
    }
    state.step += 1;
    debug!(step = state.step, "advanced");
    Transition::Changed
}

fn previous_step(state: &mut FormState) -> Transition {
    if state.step == 0 {
        return Transition::Unchanged;
    }
    state.step -= 1;
    debug!(step = state.step, "went back");
    Transition::Changed
}

fn go_to_step(survey: &SurveySpec, state: &mut FormState, target: usize) -> Transition {
    if target >= survey.step_count() || target == state.step {
        return Transition::Unchanged;
    }
    // forward jumps must not skip over an incomplete step
    if target > state.step
        && !survey.sections[state.step..target]
            .iter()
            .all(|section| step_is_valid(section, &state.answers))
    {
        return Transition::Unchanged;
    }
    state.step = target;
    debug!(step = target, "jumped");
    Transition::Changed
}

/// Runs the submission gate and, when it passes, enters `Submitting`.
///
/// Validation errors are replaced wholesale on every call that reaches the
/// gate. The returned envelope carries a snapshot of the answers.
pub fn begin_submit(
    survey: &SurveySpec,
    state: &mut FormState,
) -> Result<Submission, SubmitRefusal> {
    match state.phase {
        Phase::Editing => {}
        Phase::Submitting => return Err(SubmitRefusal::Busy),
        Phase::Submitted => return Err(SubmitRefusal::Closed),
    }
    if !state.is_last_step(survey) {
        return Err(SubmitRefusal::NotOnLastStep);
    }

    let result = validate(survey, &state.answers);
    state.errors = result.errors;
    if !result.valid {
        debug!(missing = state.errors.len(), "submission refused");
        state.notice = Some(Notice::MissingRequired {
            count: state.errors.len(),
        });
        return Err(SubmitRefusal::Invalid(state.errors.clone()));
    }

    state.phase = Phase::Submitting;
    state.notice = None;
    debug!("submitting");
    Ok(Submission::new(survey, state.answers.clone()))
}

/// Leaves `Submitting` with the sink's final outcome.
pub fn finish_submit(state: &mut FormState, outcome: SubmitOutcome) -> Transition {
    if state.phase != Phase::Submitting {
        return Transition::Unchanged;
    }
    match outcome {
        SubmitOutcome::Delivered(receipt) => {
            state.phase = Phase::Submitted;
            state.notice = Some(Notice::Submitted {
                reference: receipt.reference,
            });
            debug!("submitted");
        }
        SubmitOutcome::Failed { attempts, reason } => {
            state.phase = Phase::Editing;
            state.notice = Some(Notice::SubmissionFailed { attempts, reason });
            debug!(attempts, "submission failed, back to editing");
        }
    }
    Transition::Changed
}
