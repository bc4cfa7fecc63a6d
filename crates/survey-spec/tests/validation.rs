use serde_json::{Value, json};

use survey_spec::{
    AnswerError, AnswerSet, SchemaError, SurveyDocument, SurveySpec, answers_schema,
    default_survey, progress_percent, validate,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "simple_survey" => include_str!("../tests/fixtures/simple_survey.json"),
        "two_step_survey" => include_str!("../tests/fixtures/two_step_survey.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn load(name: &str) -> SurveySpec {
    SurveyDocument::load(fixture(name)).expect("fixture loads")
}

#[test]
fn bundled_survey_passes_schema_check() {
    let survey = default_survey().expect("default survey");
    assert_eq!(survey.step_count(), 5);
    assert!(survey.question_count() > 10);
}

#[test]
fn validation_reports_missing() {
    let spec = load("two_step_survey");
    let result = validate(&spec, &AnswerSet::new());
    assert!(!result.valid);
    assert_eq!(result.missing_required, vec!["name", "mood", "colour"]);
    assert_eq!(result.errors["name"], "This field is required");
    assert_eq!(result.errors.len(), 3);
}

#[test]
fn whitespace_and_empty_sets_are_not_answers() {
    let spec = load("simple_survey");
    let answers =
        AnswerSet::from_json(&spec, &json!({ "name": "   ", "tags": [] })).expect("answers");
    assert_eq!(progress_percent(&spec, &answers), 0);
    assert_eq!(validate(&spec, &answers).missing_required, vec!["name"]);
}

#[test]
fn progress_counts_every_section() {
    let spec = load("two_step_survey");
    let answers = AnswerSet::from_json(
        &spec,
        &json!({ "name": "Priya", "mood": 4, "colour": "blue" }),
    )
    .expect("answers");
    // 3 of 5 questions
    assert_eq!(progress_percent(&spec, &answers), 60);
    assert!(validate(&spec, &answers).valid);
}

#[test]
fn answers_json_is_schema_directed() {
    let spec = load("two_step_survey");
    let answers = AnswerSet::from_json(&spec, &json!({ "mood": "2" })).expect("numeric string");
    assert_eq!(
        serde_json::to_value(&answers).expect("serialize"),
        json!({ "mood": 2 })
    );

    let err = AnswerSet::from_json(&spec, &json!({ "unknown": "x" })).unwrap_err();
    assert_eq!(err, AnswerError::UnknownQuestion("unknown".into()));

    let err = AnswerSet::from_json(&spec, &json!({ "name": ["a"] })).unwrap_err();
    assert!(matches!(err, AnswerError::TypeMismatch { .. }));

    assert_eq!(
        AnswerSet::from_json(&spec, &json!([])).unwrap_err(),
        AnswerError::NotAnObject
    );
}

#[test]
fn schema_check_rejects_bad_configuration() {
    let duplicate: Value = json!({
        "survey": {
            "sections": [
                {
                    "sectionId": "s",
                    "sectionTitle": "S",
                    "questions": [
                        { "questionId": "q", "question": "Q", "type": "text" },
                        { "questionId": "q", "question": "Q again", "type": "email" }
                    ]
                }
            ]
        }
    });
    let document: SurveyDocument = serde_json::from_value(duplicate).expect("deserialize");
    assert_eq!(
        document.survey.check(),
        Err(SchemaError::DuplicateQuestion("q".into()))
    );

    let no_options: SurveyDocument = serde_json::from_value(json!({
        "survey": {
            "sections": [
                {
                    "sectionId": "s",
                    "sectionTitle": "S",
                    "questions": [{ "questionId": "pick", "question": "Pick", "type": "radio" }]
                }
            ]
        }
    }))
    .expect("deserialize");
    assert_eq!(
        no_options.survey.check(),
        Err(SchemaError::MissingOptions("pick".into()))
    );

    let bad_range: SurveyDocument = serde_json::from_value(json!({
        "survey": {
            "sections": [
                {
                    "sectionId": "s",
                    "sectionTitle": "S",
                    "questions": [{
                        "questionId": "scale",
                        "question": "Scale",
                        "type": "range",
                        "min": 1,
                        "max": 5,
                        "default": 9
                    }]
                }
            ]
        }
    }))
    .expect("deserialize");
    assert_eq!(
        bad_range.survey.check(),
        Err(SchemaError::DefaultOutOfBounds("scale".into()))
    );

    let empty = r#"{ "survey": { "sections": [] } }"#;
    assert!(SurveyDocument::load(empty).is_err());
}

#[test]
fn answers_schema_contains_required_properties() {
    let spec = load("two_step_survey");
    let schema = answers_schema(&spec);
    let props = schema.get("properties").unwrap().as_object().unwrap();
    assert!(props.contains_key("name"));
    assert!(props.contains_key("note"));
    assert_eq!(props["mood"]["type"], "integer");
    assert_eq!(props["mood"]["maximum"], 5);
    assert_eq!(props["colour"]["enum"], json!(["red", "blue"]));
    let required = schema.get("required").unwrap().as_array().unwrap();
    assert!(required.iter().any(|value| value.as_str() == Some("name")));
    assert!(!required.iter().any(|value| value.as_str() == Some("note")));
}
