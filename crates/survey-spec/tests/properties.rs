use proptest::prelude::*;

use survey_spec::{
    AnswerInput, AnswerSet, AnswerValue, Progress, QuestionSpec, QuestionType, SurveySpec,
    default_survey,
};

fn survey() -> SurveySpec {
    default_survey().expect("bundled survey")
}

/// Turns a generated event into an input that fits the question kind.
fn input_for(
    question: &QuestionSpec,
    text: &str,
    number: i64,
    pick: usize,
    checked: bool,
) -> AnswerInput {
    let option = || question.options[pick % question.options.len()].value.clone();
    match question.kind {
        QuestionType::Text | QuestionType::Email | QuestionType::Textarea => {
            AnswerInput::value(text)
        }
        QuestionType::Select | QuestionType::Radio => AnswerInput::value(option()),
        QuestionType::Range => AnswerInput::value(number.to_string()),
        QuestionType::Checkbox => AnswerInput::Toggle {
            value: option(),
            checked,
        },
    }
}

fn event_strategy() -> impl Strategy<Value = (usize, String, i64, usize, bool)> {
    (
        any::<usize>(),
        "[ a-z]{0,6}",
        -20i64..20,
        any::<usize>(),
        any::<bool>(),
    )
}

proptest! {
    /// Progress stays within 0..=100 for any sequence of answers.
    #[test]
    fn progress_stays_in_bounds(events in prop::collection::vec(event_strategy(), 0..40)) {
        let survey = survey();
        let questions = survey.questions().collect::<Vec<_>>();
        let mut answers = AnswerSet::new();
        for (index, text, number, pick, checked) in &events {
            let question = questions[index % questions.len()];
            let input = input_for(question, text, *number, *pick, *checked);
            prop_assert!(answers.apply(question, input).is_ok());
        }

        let progress = Progress::measure(&survey, &answers);
        prop_assert!(progress.answered <= progress.total);
        prop_assert!(progress.percent() <= 100);
        if progress.answered == 0 {
            prop_assert_eq!(progress.percent(), 0);
        }
        if progress.answered == progress.total {
            prop_assert_eq!(progress.percent(), 100);
        }
    }

    /// Checking a value that was not selected and unchecking it again
    /// leaves the stored set as it was.
    #[test]
    fn checkbox_toggle_restores_prior_set(
        toggles in prop::collection::vec((any::<usize>(), any::<bool>()), 0..12),
        pick in any::<usize>(),
    ) {
        let survey = survey();
        let conditions = survey.question("conditions").expect("conditions question");
        let mut answers = AnswerSet::new();
        for (index, checked) in toggles {
            let value = conditions.options[index % conditions.options.len()].value.clone();
            answers
                .apply(conditions, AnswerInput::Toggle { value, checked })
                .expect("toggle accepted");
        }

        let value = conditions.options[pick % conditions.options.len()].value.clone();
        prop_assume!(!answers
            .get("conditions")
            .is_some_and(|current| current.contains(&value)));
        let before = answers.get("conditions").cloned();

        answers.apply(conditions, AnswerInput::check(value.clone())).expect("check");
        answers.apply(conditions, AnswerInput::uncheck(value)).expect("uncheck");

        let prior = before.unwrap_or_else(|| AnswerValue::Multi(Default::default()));
        prop_assert_eq!(answers.get("conditions"), Some(&prior));
    }
}
