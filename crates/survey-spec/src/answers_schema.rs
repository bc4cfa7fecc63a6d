use serde_json::{Map, Value, json};

use crate::spec::question::{QuestionSpec, QuestionType};
use crate::spec::survey::SurveySpec;

/// JSON Schema describing an answers document for `spec`.
pub fn generate(spec: &SurveySpec) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for question in spec.questions() {
        properties.insert(question.id.clone(), property_schema(question));
        if question.required {
            required.push(Value::String(question.id.clone()));
        }
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": spec.title.clone().unwrap_or_else(|| spec.id_or_default().to_string()),
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn property_schema(question: &QuestionSpec) -> Value {
    let option_values = || {
        question
            .options
            .iter()
            .map(|option| Value::String(option.value.clone()))
            .collect::<Vec<_>>()
    };

    let mut schema = match question.kind {
        QuestionType::Text | QuestionType::Textarea => json!({ "type": "string" }),
        QuestionType::Email => json!({ "type": "string", "format": "email" }),
        QuestionType::Select | QuestionType::Radio => {
            json!({ "type": "string", "enum": option_values() })
        }
        QuestionType::Checkbox => json!({
            "type": "array",
            "uniqueItems": true,
            "items": { "type": "string", "enum": option_values() },
        }),
        QuestionType::Range => {
            let mut range = json!({ "type": "integer" });
            if let Some(min) = question.min {
                range["minimum"] = Value::from(min);
            }
            if let Some(max) = question.max {
                range["maximum"] = Value::from(max);
            }
            if let Some(default) = question.default {
                range["default"] = Value::from(default);
            }
            range
        }
    };

    schema["title"] = Value::String(question.label.clone());
    if question.required && question.kind == QuestionType::Checkbox {
        schema["minItems"] = Value::from(1);
    } else if question.required && !matches!(question.kind, QuestionType::Range) {
        schema["minLength"] = Value::from(1);
    }
    schema
}
