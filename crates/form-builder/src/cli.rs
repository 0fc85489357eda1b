use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use form_spec::{
    ErrorMessages, FieldErrors, QuestionDefinition, RawFieldValues, build_render_payload,
    definition_json_schema, render_json_ui, render_text, to_raw_fields,
};
use form_store::{FileBackend, SimulatedApi, load_view};
use serde_json::{Value, json};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{BuilderConfig, ConfigOverrides};
use crate::session::{ADD_FAILED, BuilderOutcome, BuilderSession, Notice};

type FileSession = BuilderSession<SimulatedApi<Arc<FileBackend>>>;

#[derive(Parser, Debug)]
#[command(
    name = "form-builder",
    about = "Author question definitions and validate form submissions against them",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Directory holding the stored schema, draft and view
    #[arg(long, value_name = "DIR", env = "FORM_BUILDER_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Artificial delay before each storage call
    #[arg(long, value_name = "MS", env = "FORM_BUILDER_LATENCY_MS", global = true)]
    latency_ms: Option<u64>,

    /// Share of storage calls that fail on purpose (0..=1)
    #[arg(
        long,
        value_name = "P",
        env = "FORM_BUILDER_FAILURE_PROBABILITY",
        global = true
    )]
    failure_probability: Option<f64>,

    /// Print machine readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Stored(StoredCommand),
    /// Show or switch between builder and preview
    #[command(subcommand)]
    View(ViewCommand),
    /// Print the JSON Schema of the stored question format
    ModelSchema,
}

/// Commands that read or change the stored schema.
#[derive(Subcommand, Debug)]
enum StoredCommand {
    /// List the questions of the stored schema
    List,
    /// Validate a question definition and append it to the schema
    Add(FieldArgs),
    /// Validate a question definition and replace the question at INDEX
    Update {
        index: usize,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Remove the question at INDEX
    Remove { index: usize },
    /// Inspect or edit the unsaved question
    #[command(subcommand)]
    Draft(DraftCommand),
    /// Print the JSON Schema of the compiled form
    Compile,
    /// Validate a filled-in form against the schema
    Submit(FieldArgs),
    /// Render the form, with field errors when values are given
    Preview(FieldArgs),
}

#[derive(Subcommand, Debug)]
enum DraftCommand {
    Show,
    Set(FieldArgs),
    Clear,
}

#[derive(Subcommand, Debug)]
enum ViewCommand {
    Show,
    Toggle,
}

#[derive(Args, Debug, Default)]
struct FieldArgs {
    /// Raw form value, repeatable
    #[arg(short = 'f', long = "field", value_name = "KEY=VALUE")]
    fields: Vec<String>,
}

impl FieldArgs {
    fn raw(&self) -> Result<RawFieldValues> {
        RawFieldValues::from_assignments(&self.fields).context("invalid --field value")
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Logs go to stderr so `--json` output stays parseable.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = BuilderConfig::resolve(&ConfigOverrides {
        data_dir: cli.data_dir.clone(),
        latency_ms: cli.latency_ms,
        failure_probability: cli.failure_probability,
    })
    .context("failed to resolve configuration")?;
    let backend = Arc::new(FileBackend::new(&config.data_dir));
    let output = Output { json: cli.json };

    match cli.command {
        Commands::ModelSchema => output.json_value(&definition_json_schema()),
        Commands::View(ViewCommand::Show) => {
            let view = load_view(backend.as_ref());
            output.either(&json!({ "view": view }), view.as_str())
        }
        Commands::View(ViewCommand::Toggle) => {
            let mut session = open_session(&config, &backend).await?;
            let view = session
                .toggle_view(backend.as_ref())
                .context("unable to switch view")?;
            output.either(&json!({ "view": view }), view.as_str())
        }
        Commands::Stored(command) => {
            let session = open_session(&config, &backend).await?;
            run_stored(command, session, &output).await
        }
    }
}

async fn open_session(config: &BuilderConfig, backend: &Arc<FileBackend>) -> Result<FileSession> {
    let api = SimulatedApi::new(Arc::clone(backend), config.api);
    let session = BuilderSession::load(api)
        .await
        .context("unable to load data")?;
    Ok(session.with_view(load_view(backend.as_ref())))
}

async fn run_stored(command: StoredCommand, mut session: FileSession, output: &Output) -> Result<()> {
    match command {
        StoredCommand::List => {
            let questions = session.questions();
            let value = json!({ "schemaId": session.schema_id(), "questions": questions });
            output.either(&value, &list_text(questions))
        }
        StoredCommand::Add(fields) => {
            let outcome = session.submit_question(&fields.raw()?).await;
            let stored = stored_or_bail(outcome, output)?;
            let notice = stored.unwrap_or_else(|| Notice::error(ADD_FAILED));
            let notice = notice_or_bail(notice)?;
            let value = json!({
                "notice": notice,
                "schemaId": session.schema_id(),
                "index": session.questions().len().checked_sub(1),
            });
            output.either(&value, notice.message())
        }
        StoredCommand::Update { index, fields } => {
            let outcome = session.update_question(index, &fields.raw()?).await;
            if let Some(notice) = stored_or_bail(outcome, output)? {
                notice_or_bail(notice)?;
            }
            let message = format!("Question {index} updated");
            output.either(&json!({ "updated": index }), &message)
        }
        StoredCommand::Remove { index } => {
            if let Some(notice) = session.remove_question(index).await {
                notice_or_bail(notice)?;
            }
            let message = format!("Question {index} removed");
            output.either(&json!({ "removed": index }), &message)
        }
        StoredCommand::Draft(DraftCommand::Show) => {
            let draft = session.draft();
            let text = match draft {
                Some(draft) => draft_text(draft),
                None => "No draft saved.".to_string(),
            };
            output.either(&json!({ "draft": draft }), &text)
        }
        StoredCommand::Draft(DraftCommand::Set(fields)) => {
            let outcome = session.save_draft(&fields.raw()?).await;
            if let Some(notice) = stored_or_bail(outcome, output)? {
                notice_or_bail(notice)?;
            }
            output.either(&json!({ "draft": session.draft() }), "Draft saved")
        }
        StoredCommand::Draft(DraftCommand::Clear) => {
            session
                .discard_draft()
                .await
                .context("unable to discard the draft")?;
            output.either(&json!({ "draft": null }), "Draft discarded")
        }
        StoredCommand::Compile => output.json_value(&session.compiled_schema().to_json_schema()),
        StoredCommand::Submit(fields) => match session.preview_submit(&fields.raw()?) {
            Ok((submission, notice)) => {
                let value = json!({ "notice": notice, "data": submission });
                output.either(&value, notice.message())
            }
            Err(errors) => {
                output.field_errors(&errors)?;
                bail!("form submission is invalid");
            }
        },
        StoredCommand::Preview(fields) => {
            let raw = fields.raw()?;
            let errors = if raw.is_empty() {
                None
            } else {
                session.compiled_schema().validate(&raw).err()
            };
            let payload = build_render_payload(session.questions(), errors.as_ref());
            if output.json {
                output.json_value(&render_json_ui(&payload))
            } else {
                println!("{}", render_text(&payload));
                Ok(())
            }
        }
    }
}

fn stored_or_bail(outcome: BuilderOutcome, output: &Output) -> Result<Option<Notice>> {
    match outcome {
        BuilderOutcome::Stored(notice) => Ok(notice),
        BuilderOutcome::Invalid(messages) => {
            output.builder_errors(&messages)?;
            bail!("question definition is invalid");
        }
    }
}

fn notice_or_bail(notice: Notice) -> Result<Notice> {
    if notice.is_error() {
        bail!("{notice}");
    }
    Ok(notice)
}

fn list_text(questions: &[QuestionDefinition]) -> String {
    if questions.is_empty() {
        return "No questions yet.".to_string();
    }
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let required = if question.is_required() { " (required)" } else { "" };
            format!(
                "{index}. [{}] {}{required}",
                question.input_type(),
                question.title()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn draft_text(draft: &QuestionDefinition) -> String {
    to_raw_fields(draft)
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn builder_error_lines(messages: &ErrorMessages) -> Vec<String> {
    let named = [
        ("form", &messages.general),
        ("title", &messages.title),
        ("description", &messages.description),
        ("isRequired", &messages.is_required),
        ("minLength", &messages.min_length),
        ("maxLength", &messages.max_length),
        ("minValue", &messages.min_value),
        ("maxValue", &messages.max_value),
    ];
    let mut lines: Vec<String> = named
        .into_iter()
        .filter_map(|(field, message)| message.as_ref().map(|m| format!("{field}: {m}")))
        .collect();
    lines.extend(
        messages
            .options
            .iter()
            .map(|(position, message)| format!("option {position}: {message}")),
    );
    lines
}

struct Output {
    json: bool,
}

impl Output {
    fn json_value(&self, value: &Value) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn either(&self, value: &Value, text: &str) -> Result<()> {
        if self.json {
            self.json_value(value)
        } else {
            println!("{text}");
            Ok(())
        }
    }

    fn builder_errors(&self, messages: &ErrorMessages) -> Result<()> {
        if self.json {
            return self.json_value(&json!({ "errors": messages }));
        }
        for line in builder_error_lines(messages) {
            println!("{line}");
        }
        Ok(())
    }

    fn field_errors(&self, errors: &FieldErrors) -> Result<()> {
        if self.json {
            return self.json_value(&json!({ "errors": errors }));
        }
        for (field, message) in errors.iter() {
            println!("{field}: {message}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn lists_questions_with_required_marker() {
        let questions: Vec<QuestionDefinition> = serde_json::from_value(json!([
            {"inputType": "text", "title": "Name", "description": null, "isRequired": true, "minLength": 3, "maxLength": 255},
            {"inputType": "number", "title": "Age", "description": null, "isRequired": false, "minValue": null, "maxValue": null}
        ]))
        .unwrap();
        assert_eq!(
            list_text(&questions),
            "0. [text] Name (required)\n1. [number] Age"
        );
        assert_eq!(list_text(&[]), "No questions yet.");
    }

    #[test]
    fn error_lines_name_fields_and_option_positions() {
        let mut messages = ErrorMessages::default();
        messages.title = Some("Required".into());
        messages.options.insert(1, "Required".into());
        assert_eq!(
            builder_error_lines(&messages),
            vec!["title: Required".to_string(), "option 1: Required".to_string()]
        );
    }
}
