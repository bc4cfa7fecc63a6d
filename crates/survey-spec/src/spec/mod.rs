pub mod question;
pub mod section;
pub mod survey;

pub use question::{ChoiceOption, QuestionSpec, QuestionType, ScaleLabels};
pub use section::SectionSpec;
pub use survey::{LoadError, SchemaError, SurveyDocument, SurveySpec};
