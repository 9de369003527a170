//! Line-oriented practice shell.
//!
//! Plain text is taken as the answer to the current question; lines starting
//! with `/` are commands.

use anyhow::{Context, Result};
use interviewer_core::error::{InvalidStateError, SessionError};
use interviewer_core::models::{Criterion, Question, SessionStatus, SessionSummary};
use interviewer_core::session_state::{Evaluation, SessionController};
use interviewer_core::transcriber::AudioFormat;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
Type your answer and press Enter, or use a command:
  /audio <path>  answer with a recorded audio file (wav, mp3, m4a, flac, ogg)
  /skip          skip the current question
  /next          ask for a question again after a failed attempt
  /hint          show hints for the current question
  /pause         pause the session
  /resume        resume a paused session
  /end           finish the session and show the summary
  /help          show this help";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Answer(String),
    Audio(PathBuf),
    Skip,
    Next,
    Hint,
    Pause,
    Resume,
    End,
    Help,
    Empty,
    Unknown(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ShellCommand::Answer(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match (name.to_lowercase().as_str(), arg) {
            ("audio", path) if !path.is_empty() => ShellCommand::Audio(PathBuf::from(path)),
            ("skip", _) => ShellCommand::Skip,
            ("next", _) => ShellCommand::Next,
            ("hint", _) => ShellCommand::Hint,
            ("pause", _) => ShellCommand::Pause,
            ("resume", _) => ShellCommand::Resume,
            ("end", _) | ("quit", _) => ShellCommand::End,
            ("help", _) => ShellCommand::Help,
            _ => ShellCommand::Unknown(line.to_string()),
        }
    }
}

pub struct Shell<W> {
    controller: SessionController,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(controller: SessionController, out: W) -> Self {
        Self { controller, out }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Runs the session until it completes, `/end` is entered or input runs out.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<SessionSummary> {
        writeln!(self.out, "{HELP}\n")?;
        self.ask_next().await?;

        let mut lines = input.lines();
        while self.controller.status() != SessionStatus::Completed {
            let Some(line) = lines.next_line().await.context("Failed to read input")? else {
                break;
            };
            if !self.handle(ShellCommand::parse(&line)).await? {
                break;
            }
        }

        let summary = match self.controller.status() {
            SessionStatus::Completed => self.controller.summary(),
            _ => self.controller.complete()?,
        };
        writeln!(self.out, "\n{}", render_summary(&summary))?;
        Ok(summary)
    }

    /// Returns `false` once the user asked to stop.
    async fn handle(&mut self, command: ShellCommand) -> Result<bool> {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Help => writeln!(self.out, "{HELP}")?,
            ShellCommand::Unknown(line) => writeln!(self.out, "Unknown command '{line}'. Type /help.")?,
            ShellCommand::End => return Ok(false),
            ShellCommand::Answer(text) => {
                let result = self.controller.submit_answer(&text).await;
                self.after_evaluation(result).await?;
            }
            ShellCommand::Audio(path) => {
                let result = match read_audio(&path).await {
                    Ok((bytes, format)) => self.controller.submit_audio(bytes, format.extension()).await,
                    Err(e) => {
                        writeln!(self.out, "{e:#}")?;
                        return Ok(true);
                    }
                };
                self.after_evaluation(result).await?;
            }
            ShellCommand::Skip => match self.controller.skip_question() {
                Ok(true) => writeln!(self.out, "Skipped. That was the last question.")?,
                Ok(false) => {
                    writeln!(self.out, "Skipped.")?;
                    self.ask_next().await?;
                }
                Err(e) => self.report(&e)?,
            },
            ShellCommand::Next => self.ask_next().await?,
            ShellCommand::Hint => {
                let Some(question) = self.controller.current_question() else {
                    writeln!(self.out, "No question is waiting for an answer.")?;
                    return Ok(true);
                };
                let rendered = render_guidance(question);
                for hint in self.controller.hints() {
                    writeln!(self.out, "  * {hint}")?;
                }
                if !rendered.is_empty() {
                    writeln!(self.out, "{rendered}")?;
                }
            }
            ShellCommand::Pause => match self.controller.pause() {
                Ok(()) => writeln!(self.out, "Paused. Type /resume to continue.")?,
                Err(e) => self.report(&e.into())?,
            },
            ShellCommand::Resume => match self.controller.resume() {
                Ok(()) => {
                    writeln!(self.out, "Resumed.")?;
                    match self.controller.current_question() {
                        Some(question) => {
                            let rendered = render_question(question, self.controller.state().questions_asked());
                            writeln!(self.out, "{rendered}")?;
                        }
                        None => self.ask_next().await?,
                    }
                }
                Err(e) => self.report(&e.into())?,
            },
        }
        Ok(true)
    }

    async fn after_evaluation(&mut self, result: Result<Evaluation, SessionError>) -> Result<()> {
        match result {
            Ok(evaluation) => {
                writeln!(self.out, "{}", render_evaluation(&evaluation))?;
                if self.controller.is_conversational() {
                    self.interviewer_reply(&evaluation).await?;
                }
                if !evaluation.session_completed {
                    self.ask_next().await?;
                }
            }
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    /// A failed reply is logged and skipped; the session carries on without it.
    async fn interviewer_reply(&mut self, evaluation: &Evaluation) -> Result<()> {
        match self.controller.interviewer_reply(evaluation.answer.question_id()).await {
            Ok(reply) => writeln!(self.out, "\nInterviewer: {reply}")?,
            Err(e) => tracing::warn!("no interviewer reply: {}", e),
        }
        Ok(())
    }

    async fn ask_next(&mut self) -> Result<()> {
        match self.controller.next_question().await {
            Ok(question) => {
                let rendered = render_question(&question, self.controller.state().questions_asked());
                writeln!(self.out, "{rendered}")?;
            }
            Err(SessionError::InvalidState(InvalidStateError::QuestionLimitReached { max })) => {
                writeln!(self.out, "All {max} question(s) have been asked.")?;
            }
            Err(SessionError::Generation(e)) => {
                tracing::error!("question generation failed: {}", e);
                writeln!(self.out, "Could not get a question: {e}\nType /next to try again.")?;
            }
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    fn report(&mut self, error: &SessionError) -> Result<()> {
        tracing::warn!("{}", error);
        writeln!(self.out, "{error}")?;
        Ok(())
    }
}

async fn read_audio(path: &Path) -> Result<(Vec<u8>, AudioFormat)> {
    let format = AudioFormat::from_path(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read audio file {}", path.display()))?;
    Ok((bytes, format))
}

pub fn render_question(question: &Question, number: usize) -> String {
    format!(
        "\nQuestion {number} ({}, {}):\n{}",
        question.question_type(),
        question.difficulty(),
        question.text()
    )
}

/// Key points and follow-ups that came with the question, if any.
pub fn render_guidance(question: &Question) -> String {
    let mut out = String::new();
    if !question.key_points().is_empty() {
        out.push_str("Key points to cover:");
        for point in question.key_points() {
            out.push_str(&format!("\n  - {point}"));
        }
    }
    if !question.follow_ups().is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("Be ready for follow-ups like:");
        for follow_up in question.follow_ups() {
            out.push_str(&format!("\n  - {follow_up}"));
        }
    }
    out
}

pub fn render_evaluation(evaluation: &Evaluation) -> String {
    let Some(score) = &evaluation.score else {
        return "\nAnswer recorded.".to_string();
    };
    let bounds = score.bounds();
    let mut out = format!("\nScore: {:.1}/{}\n", score.overall(), bounds.max());
    for criterion in Criterion::ALL {
        out.push_str(&format!("  {:<12} {:.1}\n", criterion.as_str(), score.score(criterion)));
    }
    out.push_str(&format!("Feedback: {}", score.feedback()));
    if !score.suggestions().is_empty() {
        out.push_str("\nSuggestions:");
        for suggestion in score.suggestions() {
            out.push_str(&format!("\n  - {suggestion}"));
        }
    }
    out
}

pub fn render_summary(summary: &SessionSummary) -> String {
    let mut out = String::from("Session summary\n");
    out.push_str(&format!("  Questions asked: {}\n", summary.questions_asked));
    out.push_str(&format!(
        "  Answered: {}, skipped: {}\n",
        summary.answers_given, summary.questions_skipped
    ));
    match summary.average_score {
        Some(average) => out.push_str(&format!("  Average score: {average:.1}\n")),
        None => out.push_str("  Average score: n/a\n"),
    }
    for (criterion, average) in &summary.criterion_averages {
        out.push_str(&format!("    {:<12} {:.1}\n", criterion.as_str(), average));
    }
    if let Some(minutes) = summary.duration_minutes {
        out.push_str(&format!("  Duration: {minutes:.1} min\n"));
    }
    out.trim_end().to_string()
}
