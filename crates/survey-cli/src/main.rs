mod config;
mod sink;
mod wizard;

use clap::{Parser, Subcommand};
use config::ConfigLoader;
use schemars::schema_for;
use serde_json::{Map, Value};
use sink::ConfiguredSink;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use survey_spec::{
    AnswerSet, FormAction, FormState, SubmitOutcome, SubmitRefusal, Submitter,
    SurveyDocument, SurveySpec, Transition, answers_schema, build_render_payload, default_survey,
    reduce, render_json_ui, render_text, validate,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wizard::{
    AnswerParseError, RenderMode, WizardCommand, WizardPresenter, parse_answer, resolve_option,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based survey form runner",
    long_about = "Runs multi-step surveys in the terminal and validates answer files against a survey"
)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill in a survey step by step and submit it.
    Run {
        /// Survey JSON document; the bundled health survey when omitted.
        #[arg(long, value_name = "SURVEY")]
        survey: Option<PathBuf>,
        /// Optional JSON file containing initial answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// TOML file with submission and retry settings.
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Also print the answers as JSON once submitted.
        #[arg(long)]
        answers_json: bool,
        /// Render output mode for each step.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Check an answers file against every required question.
    Validate {
        #[arg(long, value_name = "SURVEY")]
        survey: Option<PathBuf>,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
    },
    /// Print one step of the survey as the runner would show it.
    Render {
        #[arg(long, value_name = "SURVEY")]
        survey: Option<PathBuf>,
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// 1-based step number.
        #[arg(long, default_value_t = 1)]
        step: usize,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Print a JSON Schema for survey documents or for a survey's answers.
    Schema {
        #[arg(long, value_name = "SURVEY")]
        survey: Option<PathBuf>,
        /// Describe the answers document of the survey instead.
        #[arg(long)]
        answers: bool,
    },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            survey,
            answers,
            config,
            answers_json,
            format,
        } => run_wizard(survey, answers, config, answers_json, format).await,
        Command::Validate { survey, answers } => run_validate(survey, answers),
        Command::Render {
            survey,
            answers,
            step,
            format,
        } => run_render(survey, answers, step, format),
        Command::Schema { survey, answers } => run_schema(survey, answers),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_survey(path: Option<&Path>) -> CliResult<SurveySpec> {
    let survey = match path {
        Some(path) => SurveyDocument::load(&fs::read_to_string(path)?)?,
        None => default_survey()?,
    };
    debug!(
        survey_id = survey.id_or_default(),
        steps = survey.step_count(),
        "survey loaded"
    );
    Ok(survey)
}

fn load_answers(survey: &SurveySpec, path: Option<&Path>) -> CliResult<AnswerSet> {
    let answers = match path {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Value::Object(Map::new()),
    };
    Ok(AnswerSet::from_json(survey, &answers)?)
}

async fn run_wizard(
    survey_path: Option<PathBuf>,
    answers_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    answers_json: bool,
    format: RenderMode,
) -> CliResult<()> {
    let config = ConfigLoader::load(config_path.as_deref())?;
    let survey = load_survey(survey_path.as_deref())?;
    let answers = load_answers(&survey, answers_path.as_deref())?;
    let sink = ConfiguredSink::from_config(&config.submission)?;
    let submitter = Submitter::new(sink).with_policy(config.retry.policy());
    let presenter = WizardPresenter::new(format, answers_json);
    let mut state = FormState::with_answers(answers);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    info!(survey_id = survey.id_or_default(), "session started");
    presenter.show_payload(&build_render_payload(&survey, &state));
    presenter.show_help();

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next().transpose()? else {
            return Err("wizard aborted: input closed".into());
        };

        let command = match WizardCommand::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                presenter.show_error(&err.describe());
                continue;
            }
        };

        match command {
            WizardCommand::Exit => return Err("wizard aborted by user".into()),
            WizardCommand::Help => presenter.show_help(),
            WizardCommand::Show => {}
            WizardCommand::Fill => fill_step(&survey, &mut state, &presenter, &mut lines)?,
            WizardCommand::Set { id, value } => {
                let action = single_value_action(&survey, &id, &value);
                apply_reported(&survey, &mut state, &presenter, action);
            }
            WizardCommand::Check { id, value } => {
                let action = toggle_action(&survey, &id, &value, true);
                apply_reported(&survey, &mut state, &presenter, action);
            }
            WizardCommand::Uncheck { id, value } => {
                let action = toggle_action(&survey, &id, &value, false);
                apply_reported(&survey, &mut state, &presenter, action);
            }
            WizardCommand::Next => {
                if navigate(&survey, &mut state, &presenter, FormAction::Next)
                    == Transition::Unchanged
                {
                    if state.is_last_step(&survey) {
                        presenter.show_error("This is the last step; use 'submit'.");
                    } else {
                        presenter.show_error("Answer the required questions of this step first.");
                    }
                }
            }
            WizardCommand::Prev => {
                navigate(&survey, &mut state, &presenter, FormAction::Previous);
            }
            WizardCommand::Goto(step) => {
                if navigate(&survey, &mut state, &presenter, FormAction::GoTo(step))
                    == Transition::Unchanged
                    && state.step() != step
                {
                    presenter.show_error("That step is not reachable yet.");
                }
            }
            WizardCommand::Submit => {
                match submitter.submit(&survey, &mut state).await {
                    Ok(SubmitOutcome::Delivered(receipt)) => {
                        presenter.show_payload(&build_render_payload(&survey, &state));
                        presenter.show_completion(state.answers(), receipt.reference.as_deref());
                        return Ok(());
                    }
                    Ok(SubmitOutcome::Failed { .. }) => {}
                    Err(SubmitRefusal::Invalid(errors)) => {
                        debug!(missing = errors.len(), "submit refused");
                    }
                    Err(refusal) => presenter.show_error(&refusal.to_string()),
                }
            }
        }

        presenter.show_payload(&build_render_payload(&survey, &state));
    }
}

fn single_value_action(
    survey: &SurveySpec,
    id: &str,
    value: &str,
) -> Result<FormAction, AnswerParseError> {
    let question = survey
        .question(id)
        .ok_or_else(|| AnswerParseError::new(format!("unknown question '{}'", id), None))?;
    let value = if question.kind.has_options() {
        resolve_option(question, value)?
    } else {
        value.to_string()
    };
    Ok(FormAction::answer(id, survey_spec::AnswerInput::value(value)))
}

fn toggle_action(
    survey: &SurveySpec,
    id: &str,
    value: &str,
    checked: bool,
) -> Result<FormAction, AnswerParseError> {
    let question = survey
        .question(id)
        .ok_or_else(|| AnswerParseError::new(format!("unknown question '{}'", id), None))?;
    let value = resolve_option(question, value)?;
    Ok(FormAction::answer(
        id,
        survey_spec::AnswerInput::Toggle { value, checked },
    ))
}

fn apply_reported(
    survey: &SurveySpec,
    state: &mut FormState,
    presenter: &WizardPresenter,
    action: Result<FormAction, AnswerParseError>,
) {
    match action {
        Ok(action) => {
            if let Err(err) = reduce(survey, state, action) {
                presenter.show_error(&err.to_string());
            }
        }
        Err(err) => presenter.show_error(&err.describe()),
    }
}

fn navigate(
    survey: &SurveySpec,
    state: &mut FormState,
    presenter: &WizardPresenter,
    action: FormAction,
) -> Transition {
    match reduce(survey, state, action) {
        Ok(transition) => transition,
        Err(err) => {
            presenter.show_error(&err.to_string());
            Transition::Unchanged
        }
    }
}

fn fill_step<B: BufRead>(
    survey: &SurveySpec,
    state: &mut FormState,
    presenter: &WizardPresenter,
    lines: &mut io::Lines<B>,
) -> CliResult<()> {
    let Some(section) = survey.section(state.step()) else {
        return Ok(());
    };
    for question in &section.questions {
        loop {
            presenter.show_prompt(question, state.answers().get(&question.id));
            print!("> ");
            io::stdout().flush()?;
            let Some(line) = lines.next().transpose()? else {
                return Err("wizard aborted: input closed".into());
            };
            let actions = match parse_answer(question, state.answers().get(&question.id), &line)
            {
                Ok(actions) => actions,
                Err(err) => {
                    presenter.show_error(&err.describe());
                    continue;
                }
            };
            for action in actions {
                reduce(survey, state, action)?;
            }
            break;
        }
    }
    Ok(())
}

fn run_validate(survey_path: Option<PathBuf>, answers_path: PathBuf) -> CliResult<()> {
    let survey = load_survey(survey_path.as_deref())?;
    let answers = load_answers(&survey, Some(&answers_path))?;

    let result = validate(&survey, &answers);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    println!(
        "Progress: {}%",
        survey_spec::progress_percent(&survey, &answers)
    );
    if !result.missing_required.is_empty() {
        println!("Missing required answers:");
        for id in &result.missing_required {
            println!("  {} - {}", id, result.errors[id]);
        }
    }

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_render(
    survey_path: Option<PathBuf>,
    answers_path: Option<PathBuf>,
    step: usize,
    format: RenderMode,
) -> CliResult<()> {
    let survey = load_survey(survey_path.as_deref())?;
    let answers = load_answers(&survey, answers_path.as_deref())?;
    if step == 0 || step > survey.step_count() {
        return Err(format!(
            "step {} is out of range (1-{})",
            step,
            survey.step_count()
        )
        .into());
    }

    let mut state = FormState::with_answers(answers);
    reduce(&survey, &mut state, FormAction::GoTo(step - 1))?;
    if state.step() != step - 1 {
        return Err(format!(
            "step {} is not reachable until the earlier steps are complete",
            step
        )
        .into());
    }

    let payload = build_render_payload(&survey, &state);
    match format {
        RenderMode::Text => println!("{}", render_text(&payload)),
        RenderMode::Json => println!("{}", serde_json::to_string_pretty(&render_json_ui(&payload))?),
    }
    Ok(())
}

fn run_schema(survey_path: Option<PathBuf>, answers: bool) -> CliResult<()> {
    let schema = if answers {
        answers_schema(&load_survey(survey_path.as_deref())?)
    } else {
        serde_json::to_value(schema_for!(SurveyDocument))?
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
