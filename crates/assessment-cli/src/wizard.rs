use std::fmt::Write;

use assessment_spec::{AssessmentResponse, ErrorMap, PreviewSession, Question, QuestionType};

/// Controls which bits of state the preview prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: progress, visible questions, descriptions.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints a preview session as a sequence of text prompts.
pub struct PreviewPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_responses_json: bool,
}

impl PreviewPresenter {
    pub fn new(verbosity: Verbosity, show_responses_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_responses_json,
        }
    }

    pub fn show_header(&mut self, session: &PreviewSession<'_>) {
        if self.header_printed {
            return;
        }
        let assessment = session.assessment();
        println!("Assessment: {}", assessment.title);
        if self.verbosity.is_verbose()
            && let Some(description) = &assessment.description
        {
            println!("{}", description);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, session: &PreviewSession<'_>) {
        if self.verbosity.is_verbose() {
            println!(
                "Progress: {}/{} answered ({} questions in total)",
                session.answered_count(),
                session.visible_count(),
                session.total_questions()
            );
            self.print_visible_questions(session);
        } else if session.visible_count() == 0 {
            println!("No visible questions are available; check your conditional logic.");
        }
    }

    fn print_visible_questions(&self, session: &PreviewSession<'_>) {
        println!("Visible questions:");
        for question in session.visible_questions() {
            let mut entry = format!(" - {} ({})", question.id, question.title);
            if question.required {
                entry.push_str(" [required]");
            }
            println!("{}", entry);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.title)
        } else {
            format!("{} {}", prompt.index, prompt.title)
        };
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(description) = &prompt.description {
            println!("{}", description);
        }
        for (position, choice) in prompt.choices.iter().enumerate() {
            println!("  {}) {}", position + 1, choice);
        }
        if let Some(current) = &prompt.current {
            println!("Current: {}", current);
        }
        if self.verbosity.is_verbose()
            && let Some(length_hint) = &prompt.length_hint
        {
            println!("{}", length_hint);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_rejection(&self, session: &PreviewSession<'_>, errors: &ErrorMap) {
        eprintln!("Please fix the following before submitting:");
        for (question_id, error) in errors {
            let title = session
                .assessment()
                .find_question(question_id)
                .map(|question| question.title.as_str())
                .unwrap_or(question_id.as_str());
            eprintln!("  {} - {}", title, error);
        }
    }

    pub fn show_completion(&self, record: &AssessmentResponse) {
        println!("Done ✅");
        match record.to_cbor() {
            Ok(bytes) => {
                println!("Responses (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize responses to CBOR: {}", err);
            }
        }
        if self.show_responses_json {
            match record.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize responses to JSON: {}", err);
                }
            }
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub choices: Vec<String>,
    pub current: Option<String>,
    pub length_hint: Option<String>,
}

impl PromptContext {
    pub fn new(session: &PreviewSession<'_>, question: &Question) -> Self {
        let index = session
            .visible_questions()
            .position(|visible| visible.id == question.id)
            .map_or(0, |position| position + 1);
        let current = session.response(&question.id).and_then(|value| {
            if value.is_empty() {
                None
            } else if let Some(choices) = value.as_choices() {
                Some(choices.join(", "))
            } else {
                value.as_text().map(String::from)
            }
        });
        Self {
            index: index.max(1),
            total: session.visible_count(),
            title: question.title.clone(),
            description: question.description.clone(),
            required: question.required,
            hint: kind_hint(question),
            choices: question.choices().to_vec(),
            current,
            length_hint: session.length_hint(&question.id),
        }
    }
}

fn kind_hint(question: &Question) -> Option<String> {
    match question.kind {
        QuestionType::SingleChoice => Some("(pick one by number or text)".to_string()),
        QuestionType::MultiChoice => {
            Some("(comma-separated numbers or text; picking again removes)".to_string())
        }
        QuestionType::Numeric => {
            let range = question
                .validation
                .as_ref()
                .map(|constraint| (constraint.min, constraint.max));
            match range {
                Some((Some(min), Some(max))) => Some(format!("(number from {} to {})", min, max)),
                Some((Some(min), None)) => Some(format!("(number, at least {})", min)),
                Some((None, Some(max))) => Some(format!("(number, at most {})", max)),
                _ => Some("(number)".to_string()),
            }
        }
        QuestionType::FileUpload => Some("(file name)".to_string()),
        QuestionType::ShortText | QuestionType::LongText => None,
    }
}

/// Error produced when parsing answers from the user.
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
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut encoded, "{:02x}", byte);
    }
    encoded
}
