use std::collections::BTreeSet;

use survey_spec::{
    AnswerInput, AnswerSet, AnswerValue, FormAction, QuestionSpec, QuestionType, RenderPayload,
    render_json_ui, render_text,
};

/// Output mode of the session display.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum RenderMode {
    Text,
    Json,
}

/// Prints the rendered step and command feedback.
pub struct WizardPresenter {
    mode: RenderMode,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(mode: RenderMode, show_answers_json: bool) -> Self {
        Self {
            mode,
            show_answers_json,
        }
    }

    pub fn show_payload(&self, payload: &RenderPayload) {
        match self.mode {
            RenderMode::Text => println!("{}", render_text(payload)),
            RenderMode::Json => println!("{}", render_json_ui(payload)),
        }
    }

    pub fn show_help(&self) {
        println!("Commands:");
        for (usage, summary) in HELP {
            println!("  {:<24} {}", usage, summary);
        }
    }

    pub fn show_prompt(&self, question: &QuestionSpec, current: Option<&AnswerValue>) {
        let mut line = question.label.clone();
        if question.required {
            line.push_str(" *");
        }
        if let Some(hint) = hint(question) {
            line.push(' ');
            line.push_str(&hint);
        }
        println!("{}", line);
        for (index, option) in question.options.iter().enumerate() {
            println!("  {}) {} = {}", index + 1, option.value, option.label);
        }
        if let Some(value) = current {
            println!("Current: {} (blank keeps it)", value.display());
        } else if let Some(placeholder) = &question.placeholder {
            println!("({})", placeholder);
        }
    }

    pub fn show_error(&self, message: &str) {
        eprintln!("{}", message);
    }

    pub fn show_completion(&self, answers: &AnswerSet, reference: Option<&str>) {
        println!("Done ✅");
        if let Some(reference) = reference {
            println!("Receipt: {}", reference);
        }
        if self.show_answers_json {
            match answers.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize answers to JSON: {}", err),
            }
        }
    }
}

const HELP: &[(&str, &str)] = &[
    ("fill", "answer every question of this step in turn"),
    ("set <id> <value>", "answer a single-value question"),
    ("check <id> <value>", "tick a checkbox option"),
    ("uncheck <id> <value>", "untick a checkbox option"),
    ("next", "go to the next step"),
    ("prev", "go to the previous step"),
    ("goto <n>", "jump to step n"),
    ("show", "print the current step again"),
    ("submit", "submit the survey (last step only)"),
    ("help", "print this list"),
    ("exit", "leave without submitting"),
];

/// One line typed into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardCommand {
    Fill,
    Set { id: String, value: String },
    Check { id: String, value: String },
    Uncheck { id: String, value: String },
    Next,
    Prev,
    /// Zero-based target step.
    Goto(usize),
    Show,
    Submit,
    Help,
    Exit,
}

impl WizardCommand {
    pub fn parse(line: &str) -> Result<Self, AnswerParseError> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));

        let id_and_value = |command: &str| -> Result<(String, String), AnswerParseError> {
            rest.split_once(char::is_whitespace)
                .map(|(id, value)| (id.to_string(), value.trim().to_string()))
                .or_else(|| (!rest.is_empty()).then(|| (rest.to_string(), String::new())))
                .ok_or_else(|| {
                    AnswerParseError::new(
                        format!("'{}' needs a question id", command),
                        Some(format!("{} <id> <value>", command)),
                    )
                })
        };

        match verb.to_ascii_lowercase().as_str() {
            "fill" | "f" => Ok(WizardCommand::Fill),
            "set" => {
                let (id, value) = id_and_value("set")?;
                Ok(WizardCommand::Set { id, value })
            }
            "check" => {
                let (id, value) = id_and_value("check")?;
                Ok(WizardCommand::Check { id, value })
            }
            "uncheck" => {
                let (id, value) = id_and_value("uncheck")?;
                Ok(WizardCommand::Uncheck { id, value })
            }
            "next" | "n" => Ok(WizardCommand::Next),
            "prev" | "p" | "back" => Ok(WizardCommand::Prev),
            "goto" | "g" => rest
                .parse::<usize>()
                .ok()
                .filter(|step| *step > 0)
                .map(|step| WizardCommand::Goto(step - 1))
                .ok_or_else(|| {
                    AnswerParseError::new("goto needs a step number", Some("goto <n>".into()))
                }),
            "show" | "" => Ok(WizardCommand::Show),
            "submit" => Ok(WizardCommand::Submit),
            "help" | "?" => Ok(WizardCommand::Help),
            "exit" | "quit" => Ok(WizardCommand::Exit),
            other => Err(AnswerParseError::new(
                format!("unknown command '{}'", other),
                Some("type 'help' for the list of commands".into()),
            )),
        }
    }
}

/// Error produced when parsing input from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }

    pub fn describe(&self) -> String {
        match &self.debug_message {
            Some(debug) => format!("Invalid input: {}\n  Expected: {}", self.user_message, debug),
            None => format!("Invalid input: {}", self.user_message),
        }
    }
}

/// Maps a typed option (value or 1-based number) onto a declared option value.
pub fn resolve_option(question: &QuestionSpec, raw: &str) -> Result<String, AnswerParseError> {
    let raw = raw.trim();
    if let Some(option) = question.option(raw) {
        return Ok(option.value.clone());
    }
    raw.parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| question.options.get(index))
        .map(|option| option.value.clone())
        .ok_or_else(|| {
            AnswerParseError::new(
                format!("'{}' is not an option of '{}'", raw, question.id),
                Some(
                    question
                        .options
                        .iter()
                        .map(|option| option.value.as_str())
                        .collect::<Vec<_>>()
                        .join("/"),
                ),
            )
        })
}

/// Turns one `fill` answer into engine actions; blank input keeps the answer.
pub fn parse_answer(
    question: &QuestionSpec,
    current: Option<&AnswerValue>,
    raw: &str,
) -> Result<Vec<FormAction>, AnswerParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let id = question.id.clone();

    match question.kind {
        QuestionType::Text | QuestionType::Email | QuestionType::Textarea => {
            Ok(vec![FormAction::answer(id, AnswerInput::value(raw))])
        }
        QuestionType::Select | QuestionType::Radio => {
            let value = resolve_option(question, raw)?;
            Ok(vec![FormAction::answer(id, AnswerInput::value(value))])
        }
        QuestionType::Range => {
            raw.parse::<i64>().map_err(|_| {
                AnswerParseError::new(format!("'{}' is not a whole number", raw), hint(question))
            })?;
            Ok(vec![FormAction::answer(id, AnswerInput::value(raw))])
        }
        QuestionType::Checkbox => {
            let wanted = if raw == "-" {
                BTreeSet::new()
            } else {
                raw.split(',')
                    .filter(|part| !part.trim().is_empty())
                    .map(|part| resolve_option(question, part))
                    .collect::<Result<BTreeSet<_>, _>>()?
            };
            let existing = match current {
                Some(AnswerValue::Multi(members)) => members.clone(),
                _ => BTreeSet::new(),
            };
            let mut actions = existing
                .difference(&wanted)
                .map(|value| FormAction::answer(id.clone(), AnswerInput::uncheck(value.clone())))
                .collect::<Vec<_>>();
            actions.extend(
                wanted
                    .difference(&existing)
                    .map(|value| FormAction::answer(id.clone(), AnswerInput::check(value.clone()))),
            );
            Ok(actions)
        }
    }
}

fn hint(question: &QuestionSpec) -> Option<String> {
    match question.kind {
        QuestionType::Email => Some("(email)".to_string()),
        QuestionType::Select | QuestionType::Radio => Some("(pick one)".to_string()),
        QuestionType::Checkbox => Some("(comma-separated, '-' clears)".to_string()),
        QuestionType::Range => match (question.min, question.max) {
            (Some(min), Some(max)) => Some(format!("({}-{})", min, max)),
            _ => Some("(number)".to_string()),
        },
        QuestionType::Text | QuestionType::Textarea => None,
    }
}
