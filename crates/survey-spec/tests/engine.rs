use survey_spec::{
    AnswerError, AnswerInput, AnswerSet, AnswerValue, FormAction, FormError, FormState, Phase,
    Receipt, SubmitOutcome, SubmitRefusal, SurveyDocument, SurveySpec, Transition, begin_submit,
    finish_submit, reduce,
};

fn simple() -> SurveySpec {
    SurveyDocument::load(include_str!("../tests/fixtures/simple_survey.json")).expect("fixture")
}

fn two_step() -> SurveySpec {
    SurveyDocument::load(include_str!("../tests/fixtures/two_step_survey.json")).expect("fixture")
}

fn answer(survey: &SurveySpec, state: &mut FormState, id: &str, input: AnswerInput) {
    reduce(survey, state, FormAction::answer(id, input)).expect("answer accepted");
}

#[test]
fn new_session_starts_empty_at_first_step() {
    let survey = two_step();
    let state = FormState::new();
    assert_eq!(state.step(), 0);
    assert_eq!(state.phase(), Phase::Editing);
    assert!(state.answers().is_empty());
    assert_eq!(state.progress(&survey).percent(), 0);
    assert!(!state.current_step_valid(&survey));
}

#[test]
fn checkbox_toggle_round_trips() {
    let survey = simple();
    let mut state = FormState::new();
    answer(&survey, &mut state, "tags", AnswerInput::check("a"));
    let before = state.answers().get("tags").cloned();

    answer(&survey, &mut state, "tags", AnswerInput::check("b"));
    answer(&survey, &mut state, "tags", AnswerInput::uncheck("b"));
    assert_eq!(state.answers().get("tags").cloned(), before);

    answer(&survey, &mut state, "tags", AnswerInput::uncheck("a"));
    assert_eq!(
        state.answers().get("tags"),
        Some(&AnswerValue::Multi(Default::default()))
    );
    assert!(!state.answers().is_filled("tags"));
}

#[test]
fn single_values_replace_previous_answer() {
    let survey = two_step();
    let mut state = FormState::new();
    answer(&survey, &mut state, "name", AnswerInput::value("Ana"));
    answer(&survey, &mut state, "name", AnswerInput::value("Priya"));
    assert_eq!(
        state.answers().get("name"),
        Some(&AnswerValue::Text("Priya".into()))
    );

    answer(&survey, &mut state, "mood", AnswerInput::value("4"));
    assert_eq!(state.answers().get("mood"), Some(&AnswerValue::Scale(4)));
}

#[test]
fn mismatched_inputs_are_rejected_without_change() {
    let survey = two_step();
    let mut state = FormState::new();

    let err = reduce(
        &survey,
        &mut state,
        FormAction::answer("name", AnswerInput::check("x")),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FormError::Answer(AnswerError::InputMismatch { .. })
    ));

    let err = reduce(
        &survey,
        &mut state,
        FormAction::answer("mood", AnswerInput::value("lots")),
    )
    .unwrap_err();
    assert!(matches!(err, FormError::Answer(AnswerError::NotANumber { .. })));

    let err = reduce(
        &survey,
        &mut state,
        FormAction::answer("missing", AnswerInput::value("x")),
    )
    .unwrap_err();
    assert_eq!(
        err,
        FormError::Answer(AnswerError::UnknownQuestion("missing".into()))
    );
    assert!(state.answers().is_empty());
}

#[test]
fn advancing_an_invalid_step_is_refused() {
    let survey = two_step();
    let mut state = FormState::new();
    answer(&survey, &mut state, "nickname", AnswerInput::value("P"));

    let before = state.clone();
    assert_eq!(
        reduce(&survey, &mut state, FormAction::Next),
        Ok(Transition::Unchanged)
    );
    assert_eq!(state, before);
    assert!(state.errors().is_empty());

    answer(&survey, &mut state, "name", AnswerInput::value("Priya"));
    assert_eq!(
        reduce(&survey, &mut state, FormAction::Next),
        Ok(Transition::Changed)
    );
    assert_eq!(state.step(), 1);
}

#[test]
fn navigation_stays_within_bounds() {
    let survey = two_step();
    let mut state = FormState::new();
    assert_eq!(
        reduce(&survey, &mut state, FormAction::Previous),
        Ok(Transition::Unchanged)
    );
    assert_eq!(
        reduce(&survey, &mut state, FormAction::GoTo(7)),
        Ok(Transition::Unchanged)
    );

    answer(&survey, &mut state, "name", AnswerInput::value("Priya"));
    reduce(&survey, &mut state, FormAction::Next).expect("next");
    answer(&survey, &mut state, "mood", AnswerInput::value("3"));
    answer(&survey, &mut state, "colour", AnswerInput::value("red"));
    reduce(&survey, &mut state, FormAction::Next).expect("next");
    assert_eq!(state.step(), 2);
    assert_eq!(
        reduce(&survey, &mut state, FormAction::Next),
        Ok(Transition::Unchanged)
    );
    assert_eq!(state.step(), 2);
}

#[test]
fn forward_jumps_need_valid_intermediate_steps() {
    let survey = two_step();
    let mut state = FormState::new();
    answer(&survey, &mut state, "name", AnswerInput::value("Priya"));

    assert_eq!(
        reduce(&survey, &mut state, FormAction::GoTo(2)),
        Ok(Transition::Unchanged)
    );
    assert_eq!(
        reduce(&survey, &mut state, FormAction::GoTo(1)),
        Ok(Transition::Changed)
    );
    assert_eq!(
        reduce(&survey, &mut state, FormAction::GoTo(0)),
        Ok(Transition::Changed)
    );
    assert_eq!(state.step(), 0);
}

#[test]
fn submit_is_only_offered_on_the_last_step() {
    let survey = two_step();
    let mut state = FormState::new();
    assert_eq!(
        begin_submit(&survey, &mut state),
        Err(SubmitRefusal::NotOnLastStep)
    );
    assert!(state.errors().is_empty());
}

#[test]
fn failed_submit_lists_exactly_the_missing_required_ids() {
    let survey = simple();
    let mut state = FormState::new();
    answer(&survey, &mut state, "tags", AnswerInput::check("a"));

    let refusal = begin_submit(&survey, &mut state).unwrap_err();
    let SubmitRefusal::Invalid(errors) = refusal else {
        panic!("expected validation refusal");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["name"], "This field is required");
    assert_eq!(state.errors(), &errors);
    assert_eq!(state.phase(), Phase::Editing);
    assert_eq!(state.step(), 0);
    assert_eq!(state.progress(&survey).percent(), 50);
    assert!(state.notice().is_some_and(|notice| notice.is_error()));
}

#[test]
fn answering_clears_only_that_error() {
    let survey = two_step();
    let mut state = FormState::new();
    answer(&survey, &mut state, "name", AnswerInput::value("Priya"));
    reduce(&survey, &mut state, FormAction::Next).expect("next");
    reduce(&survey, &mut state, FormAction::GoTo(2)).expect("goto");
    // step 1 is incomplete, so the jump is refused
    assert_eq!(state.step(), 1);

    answer(&survey, &mut state, "mood", AnswerInput::value("2"));
    answer(&survey, &mut state, "colour", AnswerInput::value("blue"));
    reduce(&survey, &mut state, FormAction::Next).expect("next");
    answer(&survey, &mut state, "name", AnswerInput::value(""));
    answer(&survey, &mut state, "colour", AnswerInput::value(" "));

    begin_submit(&survey, &mut state).unwrap_err();
    assert_eq!(state.errors().len(), 2);

    answer(&survey, &mut state, "colour", AnswerInput::value("red"));
    assert_eq!(state.errors().len(), 1);
    assert!(state.errors().contains_key("name"));

    answer(&survey, &mut state, "name", AnswerInput::value("  "));
    assert!(state.errors().contains_key("name"));
    answer(&survey, &mut state, "name", AnswerInput::value("Priya"));
    assert!(state.errors().is_empty());
    assert!(state.notice().is_none());
}

#[test]
fn example_session_reaches_submitted() {
    let survey = simple();
    let mut state = FormState::new();
    answer(&survey, &mut state, "tags", AnswerInput::check("a"));
    begin_submit(&survey, &mut state).unwrap_err();
    assert_eq!(state.progress(&survey).percent(), 50);

    answer(&survey, &mut state, "name", AnswerInput::value("Priya"));
    let submission = begin_submit(&survey, &mut state).expect("gate passes");
    assert_eq!(state.phase(), Phase::Submitting);
    assert!(state.errors().is_empty());
    assert_eq!(submission.survey_id, "simple");
    assert_eq!(submission.answers, *state.answers());

    assert_eq!(begin_submit(&survey, &mut state), Err(SubmitRefusal::Busy));
    assert_eq!(
        reduce(&survey, &mut state, FormAction::Previous),
        Err(FormError::Busy)
    );

    finish_submit(&mut state, SubmitOutcome::Delivered(Receipt::default()));
    assert_eq!(state.phase(), Phase::Submitted);
    assert_eq!(state.progress(&survey).percent(), 100);
    assert!(state.errors().is_empty());
}

#[test]
fn submitted_sessions_are_closed() {
    let survey = simple();
    let mut draft = FormState::new();
    answer(&survey, &mut draft, "name", AnswerInput::value("Priya"));
    let mut state = FormState::with_answers(draft.answers().clone());
    begin_submit(&survey, &mut state).expect("gate passes");
    finish_submit(&mut state, SubmitOutcome::Delivered(Receipt::default()));

    assert_eq!(
        reduce(
            &survey,
            &mut state,
            FormAction::answer("name", AnswerInput::value("Other"))
        ),
        Err(FormError::Closed)
    );
    assert_eq!(begin_submit(&survey, &mut state), Err(SubmitRefusal::Closed));
    assert_eq!(
        finish_submit(&mut state, SubmitOutcome::Delivered(Receipt::default())),
        Transition::Unchanged
    );
}

#[test]
fn failed_delivery_returns_to_editing() {
    let survey = simple();
    let mut state = FormState::with_answers(AnswerSet::new());
    answer(&survey, &mut state, "name", AnswerInput::value("Priya"));
    begin_submit(&survey, &mut state).expect("gate passes");
    finish_submit(
        &mut state,
        SubmitOutcome::Failed {
            attempts: 3,
            reason: "offline".into(),
        },
    );
    assert_eq!(state.phase(), Phase::Editing);
    assert_eq!(state.step(), survey.last_step());
    assert!(state.answers().is_filled("name"));
    let message = state.notice().expect("notice").message();
    assert!(message.contains("offline"));
}
