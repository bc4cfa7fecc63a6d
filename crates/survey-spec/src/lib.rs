#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod engine;
pub mod progress;
pub mod render;
pub mod spec;
pub mod submit;
pub mod validate;

pub use answers::{AnswerError, AnswerInput, AnswerSet, AnswerValue, REQUIRED_MESSAGE, ValidationErrors};
pub use answers_schema::generate as answers_schema;
pub use engine::{
    FormAction, FormError, FormState, Notice, Phase, SubmitOutcome, SubmitRefusal, Transition,
    begin_submit, finish_submit, reduce,
};
pub use progress::{Progress, progress_percent, step_is_valid};
pub use render::{
    RenderPayload, RenderQuestion, RenderStepError, build_render_payload, render_json_ui,
    render_text,
};
pub use spec::{
    ChoiceOption, LoadError, QuestionSpec, QuestionType, SchemaError, SectionSpec, SurveyDocument,
    SurveySpec,
};
pub use submit::{Receipt, RetryPolicy, SinkError, Submission, SubmissionSink, Submitter};
pub use validate::{ValidationResult, validate};

/// Health and demographics survey bundled as the default schema.
pub const DEFAULT_SURVEY_JSON: &str = include_str!("../data/health_survey.json");

/// Loads the bundled survey.
pub fn default_survey() -> Result<SurveySpec, LoadError> {
    SurveyDocument::load(DEFAULT_SURVEY_JSON)
}
