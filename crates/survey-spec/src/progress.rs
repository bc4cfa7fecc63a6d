use crate::answers::AnswerSet;
use crate::spec::section::SectionSpec;
use crate::spec::survey::SurveySpec;

/// Answered versus total question counters across the whole survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    pub fn measure(survey: &SurveySpec, answers: &AnswerSet) -> Self {
        let answered = survey
            .questions()
            .filter(|question| answers.is_filled(&question.id))
            .count();
        Self {
            answered,
            total: survey.question_count(),
        }
    }

    /// Completion rounded half-up to a whole percent, 0 for an empty survey.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let answered = self.answered.min(self.total);
        ((200 * answered + self.total) / (2 * self.total)) as u8
    }
}

pub fn progress_percent(survey: &SurveySpec, answers: &AnswerSet) -> u8 {
    Progress::measure(survey, answers).percent()
}

/// Whether every required question of `section` holds a non-empty answer.
pub fn step_is_valid(section: &SectionSpec, answers: &AnswerSet) -> bool {
    section
        .required_questions()
        .all(|question| answers.is_filled(&question.id))
}
