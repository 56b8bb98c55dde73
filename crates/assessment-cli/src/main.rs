mod wizard;

use assessment_engine::{AssessmentService, EngineConfig, FileStore};
use assessment_spec::{
    Assessment, AssessmentResponse, PreviewSession, Question, QuestionId, QuestionType,
    ResponseMap, ResponseValue, SubmitOutcome, ValidationReport, check_document,
    validate_responses,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wizard::{AnswerParseError, PreviewPresenter, PromptContext, Verbosity};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Assessment builder and preview CLI",
    long_about = "Creates, checks, validates and previews per-job candidate assessments backed by a directory store"
)]
struct Cli {
    /// Engine configuration JSON (templates and save checks).
    #[arg(long, global = true, value_name = "FILE", env = "TALENTFLOW_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaTarget {
    Assessment,
    Response,
}

#[derive(Subcommand)]
enum Command {
    /// Create the assessment for a job with a starter section and question.
    Init {
        /// Job the assessment belongs to.
        #[arg(long, value_name = "JOB_ID")]
        job_id: String,
        /// Job title used to name the new assessment.
        #[arg(long, value_name = "TITLE")]
        job_title: String,
        /// Store directory (defaults to TALENTFLOW_STORE_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
        /// Replace the job's existing assessment.
        #[arg(long)]
        force: bool,
    },
    /// List the stored assessments with their section and question counts.
    List {
        /// Store directory (defaults to TALENTFLOW_STORE_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },
    /// Report structural problems in an assessment document.
    Check {
        /// Path to the assessment JSON.
        #[arg(long, value_name = "ASSESSMENT")]
        assessment: PathBuf,
    },
    /// Validate a response map against an assessment.
    Validate {
        /// Path to the assessment JSON.
        #[arg(long, value_name = "ASSESSMENT")]
        assessment: PathBuf,
        /// Path to the responses JSON (question id to answer).
        #[arg(long, value_name = "RESPONSES")]
        responses: PathBuf,
    },
    /// Answer a stored assessment as a candidate would, in a text shell.
    Preview {
        /// Job whose assessment should be previewed.
        #[arg(long, value_name = "JOB_ID")]
        job_id: String,
        /// Store directory (defaults to TALENTFLOW_STORE_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
        /// Candidate recorded on the submitted responses.
        #[arg(long, value_name = "ID", default_value = "preview")]
        candidate: String,
        /// Show progress, visible questions and length hints.
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also print the submitted response record as JSON.
        #[arg(long)]
        responses_json: bool,
    },
    /// Print the JSON schema of the assessment or response record format.
    Schema {
        #[arg(long, value_enum, default_value_t = SchemaTarget::Assessment)]
        target: SchemaTarget,
    },
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Init {
            job_id,
            job_title,
            store,
            force,
        } => run_init(config, &job_id, &job_title, store, force),
        Command::List { store } => run_list(store),
        Command::Check { assessment } => run_check(&assessment),
        Command::Validate {
            assessment,
            responses,
        } => run_validate(&assessment, &responses),
        Command::Preview {
            job_id,
            store,
            candidate,
            verbose,
            responses_json,
        } => run_preview(config, &job_id, store, &candidate, verbose, responses_json),
        Command::Schema { target } => run_schema(target),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    match path {
        Some(path) => {
            debug!("Loading engine config from {}", path.display());
            Ok(EngineConfig::load(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn resolve_store_root(store: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match store {
        Some(path) => path,
        None => env::var_os("TALENTFLOW_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if candidate.as_os_str().is_empty() {
        return Err("store directory cannot be empty".into());
    }
    Ok(candidate)
}

fn run_init(
    config: EngineConfig,
    job_id: &str,
    job_title: &str,
    store: Option<PathBuf>,
    force: bool,
) -> CliResult<()> {
    let root = resolve_store_root(store)?;
    let mut service = AssessmentService::new(FileStore::new(root), config);
    let path = service.store().assessment_path(job_id);
    if !force && service.load(job_id)?.is_some() {
        return Err(format!(
            "an assessment for job '{}' already exists at {}; pass --force to replace it",
            job_id,
            path.display()
        )
        .into());
    }

    let mut builder = service.new_builder(job_id, job_title)?;
    let section_id = builder.add_section();
    builder.add_question(&section_id)?;
    let stored = service.save(&mut builder)?;
    println!("Assessment {} written to {}", stored.id, path.display());
    Ok(())
}

fn run_list(store: Option<PathBuf>) -> CliResult<()> {
    let store = FileStore::new(resolve_store_root(store)?);
    let assessments = store.list_assessments()?;
    if assessments.is_empty() {
        println!("No assessments found in {}", store.root().display());
        return Ok(());
    }
    for assessment in &assessments {
        println!(
            "{}  {} ({} sections, {} questions)",
            assessment.job_id,
            assessment.title,
            assessment.sections.len(),
            assessment.question_count()
        );
    }
    Ok(())
}

fn run_check(assessment_path: &Path) -> CliResult<()> {
    let assessment = read_assessment(assessment_path)?;
    let issues = check_document(&assessment);
    if issues.is_empty() {
        println!(
            "No issues found ({} sections, {} questions)",
            assessment.sections.len(),
            assessment.question_count()
        );
        return Ok(());
    }
    println!("Issues:");
    for issue in &issues {
        println!("  {}", issue);
    }
    Err(format!("{} issue(s) found", issues.len()).into())
}

fn run_validate(assessment_path: &Path, responses_path: &Path) -> CliResult<()> {
    let assessment = read_assessment(assessment_path)?;
    let responses_json = fs::read_to_string(responses_path)?;
    let responses: ResponseMap = serde_json::from_str(&responses_json)?;

    let report = validate_responses(&assessment, &responses);
    println!(
        "Validation result: {}",
        if report.valid { "valid" } else { "invalid" }
    );
    describe_validation(&assessment, &report);

    if report.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(assessment: &Assessment, report: &ValidationReport) {
    if !report.errors.is_empty() {
        println!("Errors:");
        for (question_id, error) in &report.errors {
            let title = assessment
                .find_question(question_id)
                .map(|question| question.title.as_str())
                .unwrap_or("<unknown>");
            println!("  {} ({}) - {}", question_id, title, error);
        }
    }
    if !report.hidden.is_empty() {
        println!("Hidden (not validated): {}", report.hidden.join(", "));
    }
    if !report.unknown_fields.is_empty() {
        println!(
            "Unknown response fields: {}",
            report.unknown_fields.join(", ")
        );
    }
}

fn run_schema(target: SchemaTarget) -> CliResult<()> {
    let schema = match target {
        SchemaTarget::Assessment => schemars::schema_for!(Assessment),
        SchemaTarget::Response => schemars::schema_for!(AssessmentResponse),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn read_assessment(path: &Path) -> CliResult<Assessment> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn run_preview(
    config: EngineConfig,
    job_id: &str,
    store: Option<PathBuf>,
    candidate: &str,
    verbose: bool,
    responses_json: bool,
) -> CliResult<()> {
    let root = resolve_store_root(store)?;
    let mut service = AssessmentService::new(FileStore::new(root), config);
    let assessment = service.require(job_id)?;
    let mut session = PreviewSession::new(&assessment);
    let mut presenter =
        PreviewPresenter::new(Verbosity::from_verbose(verbose), responses_json);
    presenter.show_header(&session);

    // After a rejected submit only failing and newly revealed questions are asked.
    let mut asked: BTreeSet<QuestionId> = BTreeSet::new();
    let mut failing: BTreeSet<QuestionId> = BTreeSet::new();
    loop {
        presenter.show_status(&session);
        for question in assessment.questions() {
            if !session.is_visible(&question.id)
                || (asked.contains(&question.id) && !failing.contains(&question.id))
            {
                continue;
            }
            prompt_question(&mut session, question, &presenter)?;
            asked.insert(question.id.clone());
        }

        let submission = service.submit(&mut session, candidate)?;
        match submission.outcome {
            SubmitOutcome::Submitted => {
                if let Some(record) = &submission.record {
                    presenter.show_completion(record);
                }
                break;
            }
            SubmitOutcome::Rejected(errors) => {
                presenter.show_rejection(&session, &errors);
                failing = errors.into_keys().collect();
            }
            SubmitOutcome::AlreadySubmitted => break,
        }
    }

    Ok(())
}

fn prompt_question(
    session: &mut PreviewSession<'_>,
    question: &Question,
    presenter: &PreviewPresenter,
) -> CliResult<()> {
    loop {
        let prompt = PromptContext::new(session, question);
        presenter.show_prompt(&prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("input closed before the assessment was submitted".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("preview aborted by user".into());
        }

        match parse_answer(question, trimmed) {
            Ok(ParsedAnswer::Keep) => return Ok(()),
            Ok(ParsedAnswer::Set(value)) => {
                session.update_response(&question.id, value)?;
                return Ok(());
            }
            Ok(ParsedAnswer::Toggle(options)) => {
                for option in &options {
                    session.toggle_choice(&question.id, option)?;
                }
                return Ok(());
            }
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

/// What a line of input does to the current answer.
#[derive(Debug, PartialEq)]
enum ParsedAnswer {
    /// Blank input: leave the answer as it is.
    Keep,
    Set(ResponseValue),
    /// Multi-choice input: flip each listed option.
    Toggle(Vec<String>),
}

fn parse_answer(question: &Question, raw: &str) -> Result<ParsedAnswer, AnswerParseError> {
    if raw.is_empty() {
        return Ok(ParsedAnswer::Keep);
    }
    match question.kind {
        QuestionType::SingleChoice => {
            resolve_choice(question, raw).map(|option| ParsedAnswer::Set(option.into()))
        }
        QuestionType::MultiChoice => {
            let mut picked: Vec<String> = Vec::new();
            for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
                let option = resolve_choice(question, part)?;
                if !picked.contains(&option) {
                    picked.push(option);
                }
            }
            Ok(ParsedAnswer::Toggle(picked))
        }
        QuestionType::ShortText
        | QuestionType::LongText
        | QuestionType::Numeric
        | QuestionType::FileUpload => Ok(ParsedAnswer::Set(raw.into())),
    }
}

/// Match an option by its 1-based position or by its text (case-insensitive).
fn resolve_choice(question: &Question, raw: &str) -> Result<String, AnswerParseError> {
    let choices = question.choices();
    if let Ok(position) = raw.parse::<usize>()
        && let Some(option) = position.checked_sub(1).and_then(|index| choices.get(index))
    {
        return Ok(option.clone());
    }
    choices
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
        .cloned()
        .ok_or_else(|| {
            AnswerParseError::new(
                format!("'{}' is not one of the options", raw),
                Some(format!("one of: {}", choices.join(", "))),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use assessment_spec::Section;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn remote_question() -> Question {
        Question::new("remote", QuestionType::SingleChoice, "Remote?")
            .required()
            .with_options(["Yes", "No", "Hybrid preferred"])
    }

    fn stack_question() -> Question {
        Question::new("stack", QuestionType::MultiChoice, "Stack?")
            .with_options(["Rust", "Go", "Kafka"])
    }

    fn screening() -> Assessment {
        let mut assessment = Assessment::new("job_1", "Screening");
        assessment.id = "assessment_1".into();
        assessment.sections.push(Section::new("s1", "Basics").with_questions(vec![
            remote_question(),
            Question::new("why", QuestionType::ShortText, "Why remote?")
                .required()
                .shown_when(assessment_spec::ConditionalLogic::new("remote", "Yes")),
        ]));
        assessment
    }

    fn write_store(root: &Path, assessment: &Assessment) {
        let dir = root.join("assessments");
        fs::create_dir_all(&dir).expect("store dir");
        fs::write(
            dir.join(format!("{}.assessment.json", assessment.job_id)),
            serde_json::to_string_pretty(assessment).expect("serialize"),
        )
        .expect("write assessment");
    }

    #[test]
    fn parse_answer_single_choice_accepts_index_and_text() {
        let question = remote_question();
        assert_eq!(
            parse_answer(&question, "2").unwrap(),
            ParsedAnswer::Set("No".into())
        );
        assert_eq!(
            parse_answer(&question, "hybrid PREFERRED").unwrap(),
            ParsedAnswer::Set("Hybrid preferred".into())
        );
        assert!(parse_answer(&question, "4").is_err());
        assert!(parse_answer(&question, "Maybe").is_err());
    }

    #[test]
    fn parse_answer_multi_choice_lists_toggles() {
        let question = stack_question();
        assert_eq!(
            parse_answer(&question, "1, kafka, 1").unwrap(),
            ParsedAnswer::Toggle(vec!["Rust".into(), "Kafka".into()])
        );
        assert!(parse_answer(&question, "Rust, Java").is_err());
    }

    #[test]
    fn parse_answer_blank_keeps_current_answer() {
        assert_eq!(
            parse_answer(&remote_question(), "").unwrap(),
            ParsedAnswer::Keep
        );
    }

    #[test]
    fn parse_answer_passes_numeric_text_through() {
        let question = Question::new("salary", QuestionType::Numeric, "Salary");
        assert_eq!(
            parse_answer(&question, "abc").unwrap(),
            ParsedAnswer::Set("abc".into())
        );
    }

    #[test]
    fn init_creates_assessment_from_job_title() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = assert_fs::TempDir::new()?;

        let mut cmd = Command::cargo_bin("talentflow-assessments")?;
        cmd.arg("init")
            .arg("--job-id")
            .arg("job_1")
            .arg("--job-title")
            .arg("Backend Engineer")
            .arg("--store")
            .arg(workspace.path())
            .assert()
            .success();

        let path = workspace
            .path()
            .join("assessments")
            .join("job_1.assessment.json");
        let document: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(document["title"].as_str(), Some("Backend Engineer Assessment"));
        assert_eq!(document["jobId"].as_str(), Some("job_1"));
        assert_eq!(document["sections"][0]["title"].as_str(), Some("New Section"));
        assert_eq!(
            document["sections"][0]["questions"][0]["type"].as_str(),
            Some("short-text")
        );

        let mut again = Command::cargo_bin("talentflow-assessments")?;
        again
            .args(["init", "--job-id", "job_1", "--job-title", "Other"])
            .env("TALENTFLOW_STORE_DIR", workspace.path())
            .assert()
            .failure();
        Ok(())
    }

    #[test]
    fn init_uses_configured_templates() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = TempDir::new()?;
        let config_path = workspace.path().join("engine.json");
        fs::write(
            &config_path,
            r#"{ "title_template": "{{job_title}} screening" }"#,
        )?;

        let mut cmd = Command::cargo_bin("talentflow-assessments")?;
        cmd.args(["init", "--job-id", "job_2", "--job-title", "SRE"])
            .arg("--store")
            .arg(workspace.path())
            .env("TALENTFLOW_CONFIG", &config_path)
            .assert()
            .success();

        let path = workspace
            .path()
            .join("assessments")
            .join("job_2.assessment.json");
        let document: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(document["title"].as_str(), Some("SRE screening"));
        Ok(())
    }

    #[test]
    fn list_shows_stored_assessments() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = TempDir::new()?;

        let output = Command::cargo_bin("talentflow-assessments")?
            .arg("list")
            .arg("--store")
            .arg(workspace.path())
            .output()?;
        assert!(output.status.success());
        assert!(String::from_utf8(output.stdout)?.contains("No assessments found"));

        write_store(workspace.path(), &screening());
        let output = Command::cargo_bin("talentflow-assessments")?
            .arg("list")
            .env("TALENTFLOW_STORE_DIR", workspace.path())
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("job_1  Screening (1 sections, 2 questions)"));
        Ok(())
    }

    #[test]
    fn check_reports_forward_dependencies() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = TempDir::new()?;
        let mut assessment = screening();
        assessment.sections[0].questions[0].conditional_logic =
            Some(assessment_spec::ConditionalLogic::new("why", "x"));
        let path = workspace.path().join("broken.json");
        fs::write(&path, serde_json::to_string(&assessment)?)?;

        let output = Command::cargo_bin("talentflow-assessments")?
            .arg("check")
            .arg("--assessment")
            .arg(&path)
            .output()?;
        assert!(!output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("depends on later question 'why'"));
        Ok(())
    }

    #[test]
    fn validate_reports_visible_failures_only() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = TempDir::new()?;
        let assessment_path = workspace.path().join("assessment.json");
        fs::write(&assessment_path, serde_json::to_string(&screening())?)?;

        let hidden_path = workspace.path().join("hidden.json");
        fs::write(&hidden_path, r#"{ "remote": "No" }"#)?;
        let output = Command::cargo_bin("talentflow-assessments")?
            .arg("validate")
            .arg("--assessment")
            .arg(&assessment_path)
            .arg("--responses")
            .arg(&hidden_path)
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("Validation result: valid"));
        assert!(stdout.contains("Hidden (not validated): why"));

        let shown_path = workspace.path().join("shown.json");
        fs::write(&shown_path, r#"{ "remote": "Yes" }"#)?;
        let output = Command::cargo_bin("talentflow-assessments")?
            .arg("validate")
            .arg("--assessment")
            .arg(&assessment_path)
            .arg("--responses")
            .arg(&shown_path)
            .output()?;
        assert!(!output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        assert!(stdout.contains("why (Why remote?) - This field is required"));
        Ok(())
    }

    #[test]
    fn preview_reprompts_failures_and_records_responses()
    -> Result<(), Box<dyn std::error::Error>> {
        let workspace = TempDir::new()?;
        write_store(workspace.path(), &screening());

        // The first pass skips the required question; the retry answers it
        // and then the follow-up it reveals.
        let stdin = ["", "1", "Fully remote team", ""].join("\n") + "\n";
        let output = Command::cargo_bin("talentflow-assessments")?
            .args(["preview", "--job-id", "job_1", "--candidate", "cand_1"])
            .arg("--store")
            .arg(workspace.path())
            .arg("--responses-json")
            .write_stdin(stdin)
            .output()?;
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout)?;
        let stderr = String::from_utf8(output.stderr)?;
        assert!(stderr.contains("Remote? - This field is required"));
        assert!(stdout.contains("Done ✅"));
        assert!(stdout.contains("Responses (CBOR hex): "));
        assert!(stdout.contains("\"candidateId\": \"cand_1\""));

        let responses_dir = workspace.path().join("responses");
        let stored: Vec<_> = fs::read_dir(&responses_dir)?.collect::<Result<_, _>>()?;
        assert_eq!(stored.len(), 1);
        let record = AssessmentResponse::from_cbor(&fs::read(stored[0].path())?)?;
        assert_eq!(record.assessment_id, "assessment_1");
        assert_eq!(record.responses.get("remote"), Some(&"Yes".into()));
        assert_eq!(
            record.responses.get("why"),
            Some(&"Fully remote team".into())
        );
        Ok(())
    }

    #[test]
    fn preview_fails_when_input_ends_early() -> Result<(), Box<dyn std::error::Error>> {
        let workspace = TempDir::new()?;
        write_store(workspace.path(), &screening());

        Command::cargo_bin("talentflow-assessments")?
            .args(["preview", "--job-id", "job_1"])
            .arg("--store")
            .arg(workspace.path())
            .write_stdin("\n")
            .assert()
            .failure();
        assert!(!workspace.path().join("responses").exists());
        Ok(())
    }

    #[test]
    fn schema_describes_assessment_documents() -> Result<(), Box<dyn std::error::Error>> {
        let output = Command::cargo_bin("talentflow-assessments")?
            .arg("schema")
            .output()?;
        assert!(output.status.success());
        let schema: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(schema["title"].as_str(), Some("Assessment"));
        assert!(schema["properties"]["jobId"].is_object());
        Ok(())
    }
}
