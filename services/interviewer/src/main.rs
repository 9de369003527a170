use anyhow::{Context, Result};
use clap::Parser;
use interviewer_core::engine::InterviewEngine;
use interviewer_core::models::{Difficulty, InterviewerStyle, QuestionType, SessionConfig};
use interviewer_core::prompts::PromptSet;
use interviewer_core::session_state::SessionController;
use interviewer_core::settings::Settings;
use interviewer_core::transcriber::Transcriber;
use interviewer_service::{Backends, Shell};
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoLocal;

/// Practice a job interview in the terminal.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The position you are interviewing for, e.g. "Software Engineer"
    #[arg(long)]
    position: String,

    /// professional_friendly, challenging, supportive, formal or casual
    #[arg(long, default_value = "professional_friendly")]
    style: InterviewerStyle,

    /// easy, medium or hard
    #[arg(long, default_value = "medium")]
    difficulty: Difficulty,

    /// Question type to include; repeat to rotate through several
    #[arg(long = "question-type")]
    question_types: Vec<QuestionType>,

    /// Number of questions before the session ends [default: INTERVIEWER_MAX_QUESTIONS]
    #[arg(long)]
    max_questions: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let settings = Arc::new(Settings::from_env().context("Failed to load application configuration")?);

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(settings.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 4. Load Prompts ---
    let prompts = match &settings.interview.prompts_dir {
        Some(dir) => PromptSet::with_overrides(dir).context("Failed to load prompt overrides")?,
        None => PromptSet::builtin(),
    };

    // --- 5. Initialize API Clients ---
    let backends = Backends::from_settings(&settings)?;
    let engine = InterviewEngine::new(backends.llm.clone(), settings.clone(), prompts);
    let transcriber = Transcriber::new(backends.speech.clone(), &settings);
    let mut controller = SessionController::new(engine, Some(transcriber));

    // --- 6. Start the Session ---
    let mut config = SessionConfig::new(
        &args.position,
        args.max_questions.unwrap_or(settings.interview.max_questions),
    )
    .with_style(args.style)
    .with_difficulty(args.difficulty);
    if !args.question_types.is_empty() {
        config = config.with_question_types(args.question_types);
    }
    controller.start(config).context("Failed to start the session")?;

    // --- 7. Run the Shell ---
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut shell = Shell::new(controller, std::io::stdout());
    let summary = shell.run(stdin).await?;
    tracing::info!("session finished: {:?}", summary);

    // --- 8. Report Token Usage ---
    let usage = backends.usage_report();
    if !usage.is_empty() {
        println!("\nToken usage");
        for line in usage {
            println!("  {line}");
        }
    }
    Ok(())
}
