//! Interactive review of stage results on the terminal.
//!
//! When a stage requires review, the reviewer sees:
//!
//! ```text
//! ═══════════════════════════════════════════════════════════════
//!   Review: Design architecture (attempt 1)
//! ═══════════════════════════════════════════════════════════════
//!
//! Summary:     layered with 5 components and 6 relationships
//! Confidence:  0.82 (anthropic/claude-sonnet-4-5)
//!
//! Result:
//!   { ...pretty-printed payload... }
//!
//! Commands:
//!   /approve             - Accept and continue
//!   /changes <comments>  - Re-run the stage with your comments
//!   /reject              - Stop the workflow
//!
//! review>
//! ```
//!
//! | Command | Aliases | Description |
//! |---------|---------|-------------|
//! | `/approve` | `approve`, `a` | Accept the result |
//! | `/changes <text>` | `changes`, `c` | Request changes, text becomes an amendment |
//! | `/reject [reason]` | `reject`, `r` | Fail the session as rejected |
//! | `/show` | `show`, `s` | Print the full result again |

use archmesh_application::{ReviewHandler, ReviewHandlerError, ReviewOutcome};
use archmesh_domain::core::string::truncate;
use archmesh_domain::{ReviewDecision, SessionId, StageResult};
use async_trait::async_trait;
use colored::Colorize;
use std::future::Future;
use std::io::{self, BufRead, Write};

/// Longest payload excerpt printed before the reviewer asks for `/show`.
const PAYLOAD_PREVIEW: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReviewCommand {
    Approve,
    Reject(String),
    /// Changes requested; `None` means the comments still have to be asked for
    Changes(Option<String>),
    Show,
    Empty,
    Unknown(String),
}

fn parse_command(input: &str) -> ReviewCommand {
    let input = input.trim();
    let (word, rest) = match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    };
    let rest = (!rest.is_empty()).then(|| rest.to_string());

    match word.to_lowercase().as_str() {
        "" => ReviewCommand::Empty,
        "/approve" | "approve" | "a" => ReviewCommand::Approve,
        "/reject" | "reject" | "r" => ReviewCommand::Reject(rest.unwrap_or_default()),
        "/changes" | "changes" | "c" => ReviewCommand::Changes(rest),
        "/show" | "show" | "s" => ReviewCommand::Show,
        _ => ReviewCommand::Unknown(input.to_string()),
    }
}

/// Read one reply line; EOF means the reviewer went away.
fn read_reply(reader: &mut impl BufRead) -> Result<String, ReviewHandlerError> {
    let mut input = String::new();
    let read = reader
        .read_line(&mut input)
        .map_err(|e| ReviewHandlerError::IoError(format!("Failed to read input: {}", e)))?;
    if read == 0 {
        return Err(ReviewHandlerError::Cancelled);
    }
    Ok(input.trim().to_string())
}

/// Await `review` unless `interrupt` completes first, which counts as a
/// cancelled review.
pub async fn review_until_interrupted<R, I>(
    review: R,
    interrupt: I,
) -> Result<ReviewOutcome, ReviewHandlerError>
where
    R: Future<Output = Result<ReviewOutcome, ReviewHandlerError>>,
    I: Future,
{
    tokio::select! {
        outcome = review => outcome,
        _ = interrupt => Err(ReviewHandlerError::Cancelled),
    }
}

/// Terminal-based [`ReviewHandler`].
pub struct InteractiveReviewHandler;

impl InteractiveReviewHandler {
    pub fn new() -> Self {
        Self
    }

    fn display_result(&self, session_id: &SessionId, result: &StageResult, full: bool) {
        let rule = "═══════════════════════════════════════════════════════════════";
        println!();
        println!("{}", rule.yellow().bold());
        println!(
            "{}",
            format!(
                "  Review: {} (attempt {})",
                result.stage.display_name(),
                result.attempt
            )
            .yellow()
            .bold()
        );
        println!("{}", rule.yellow().bold());
        println!();
        println!("{} {}", "Session:    ".cyan().bold(), session_id);
        println!("{} {}", "Summary:    ".cyan().bold(), result.payload.summary());
        println!(
            "{} {:.2} ({}/{})",
            "Confidence: ".cyan().bold(),
            result.confidence,
            result.provider,
            result.model
        );
        println!();

        let payload = serde_json::to_string_pretty(&result.payload)
            .unwrap_or_else(|_| result.raw_output.clone());
        let shown = if full {
            payload
        } else {
            truncate(&payload, PAYLOAD_PREVIEW)
        };
        println!("{}", "Result:".cyan().bold());
        for line in shown.lines() {
            println!("  {}", line);
        }
        println!();

        println!("{}", "Commands:".cyan().bold());
        println!("  {}             - Accept and continue", "/approve".green());
        println!(
            "  {}  - Re-run the stage with your comments",
            "/changes <comments>".yellow()
        );
        println!("  {}              - Stop the workflow", "/reject".red());
        println!("  {}                - Show the full result", "/show".dimmed());
        println!();
    }

    /// Prompt and read one line on a blocking thread.
    async fn read_line(&self, prompt: &str) -> Result<String, ReviewHandlerError> {
        print!("{} ", prompt.magenta().bold());
        io::stdout().flush().map_err(|e| {
            ReviewHandlerError::IoError(format!("Failed to flush stdout: {}", e))
        })?;

        tokio::task::spawn_blocking(|| read_reply(&mut io::stdin().lock()))
            .await
            .map_err(|e| ReviewHandlerError::IoError(format!("Input reader failed: {}", e)))?
    }
}

impl Default for InteractiveReviewHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewHandler for InteractiveReviewHandler {
    async fn request_review(
        &self,
        session_id: &SessionId,
        result: &StageResult,
    ) -> Result<ReviewOutcome, ReviewHandlerError> {
        self.display_result(session_id, result, false);

        loop {
            let input = self.read_line("review>").await?;

            match parse_command(&input) {
                ReviewCommand::Approve => {
                    println!("{}", "✓ Stage approved".green());
                    return Ok(ReviewOutcome::new(ReviewDecision::Approve, ""));
                }
                ReviewCommand::Reject(reason) => {
                    println!("{}", "✗ Stage rejected".red());
                    return Ok(ReviewOutcome::new(ReviewDecision::Reject, reason));
                }
                ReviewCommand::Changes(Some(comments)) => {
                    println!("{}", "↻ Changes requested, re-running stage".yellow());
                    return Ok(ReviewOutcome::new(
                        ReviewDecision::ChangesRequested,
                        comments,
                    ));
                }
                ReviewCommand::Changes(None) => {
                    let comments = self.read_line("comments>").await?;
                    if comments.is_empty() {
                        println!("{}", "Changes need a comment; nothing submitted.".yellow());
                        continue;
                    }
                    println!("{}", "↻ Changes requested, re-running stage".yellow());
                    return Ok(ReviewOutcome::new(
                        ReviewDecision::ChangesRequested,
                        comments,
                    ));
                }
                ReviewCommand::Show => self.display_result(session_id, result, true),
                ReviewCommand::Empty => continue,
                ReviewCommand::Unknown(input) => {
                    println!();
                    println!("Unknown command: {}", input.red());
                    println!("Available commands: /approve, /changes <comments>, /reject, /show");
                    println!();
                }
            }
        }
    }
}
