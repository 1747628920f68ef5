//! Console output formatter for workflow results

use archmesh_application::WorkflowStatus;
use archmesh_domain::core::string::truncate;
use archmesh_domain::{DiagramArtifact, WorkflowState};
use colored::Colorize;
use serde::Serialize;

/// Formats workflow status and diagrams for console display
pub struct ConsoleFormatter;

#[derive(Serialize)]
struct JsonReport<'a> {
    status: &'a WorkflowStatus,
    diagrams: &'a [DiagramArtifact],
}

impl ConsoleFormatter {
    /// Turn off ANSI colors for everything formatted afterwards
    pub fn disable_color() {
        colored::control::set_override(false);
    }

    /// Format the final status, optionally followed by diagram sources
    pub fn format(status: &WorkflowStatus, diagrams: &[DiagramArtifact], show_diagrams: bool) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("ArchMesh Workflow"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Session:".cyan().bold(),
            status.session_id
        ));
        output.push_str(&format!(
            "{} {} ({})\n",
            "Project:".cyan().bold(),
            status.project_id,
            status.mode
        ));
        output.push_str(&format!(
            "{} {}\n",
            "State:".cyan().bold(),
            Self::state_label(&status.state)
        ));
        output.push_str(&format!(
            "{} {:.0}%\n",
            "Progress:".cyan().bold(),
            status.overall_progress * 100.0
        ));

        output.push_str(&Self::section_header("Stages"));
        for progress in &status.stage_progress {
            let result = status.results.iter().find(|r| r.stage == progress.stage);
            let line = match result {
                Some(r) => format!(
                    "  {} {:<28} {} (attempt {}, confidence {:.2}, {}/{})\n",
                    "v".green(),
                    progress.stage.display_name(),
                    r.summary,
                    r.attempt,
                    r.confidence,
                    r.provider,
                    r.model
                ),
                None => format!(
                    "  {} {:<28} {:.0}%\n",
                    "-".dimmed(),
                    progress.stage.display_name(),
                    progress.fraction * 100.0
                ),
            };
            output.push_str(&line);
        }

        if !status.errors.is_empty() {
            output.push_str(&Self::section_header("Errors"));
            for error in &status.errors {
                let attempt = error
                    .attempt
                    .map(|a| format!(" attempt {}", a))
                    .unwrap_or_default();
                let marker = if error.fatal { "x".red() } else { "!".yellow() };
                output.push_str(&format!(
                    "  {} {}{}: {}\n",
                    marker,
                    error.stage,
                    attempt,
                    truncate(&error.message, 200)
                ));
            }
        }

        if !diagrams.is_empty() {
            output.push_str(&Self::section_header("Diagrams"));
            for diagram in diagrams {
                output.push_str(&format!(
                    "\n{}\n",
                    format!(
                        "── {} [{}, {}] ──",
                        diagram.title, diagram.diagram_type, diagram.format
                    )
                    .yellow()
                    .bold()
                ));
                if show_diagrams {
                    output.push_str(&diagram.source);
                    output.push('\n');
                } else {
                    output.push_str(&format!("  id: {}\n", diagram.id));
                }
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(status: &WorkflowStatus, diagrams: &[DiagramArtifact]) -> String {
        serde_json::to_string_pretty(&JsonReport { status, diagrams })
            .unwrap_or_else(|_| "{}".to_string())
    }

    fn state_label(state: &WorkflowState) -> String {
        let text = state.to_string();
        match state {
            WorkflowState::Completed => text.green().bold().to_string(),
            WorkflowState::Failed { .. } => text.red().bold().to_string(),
            WorkflowState::AwaitingReview { .. } => text.yellow().to_string(),
            WorkflowState::Pending | WorkflowState::Running { .. } => text.cyan().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "═".repeat(60);
        format!(
            "{}\n  {}\n{}\n",
            line.cyan(),
            title.cyan().bold(),
            line.cyan()
        )
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n", format!("── {} ──", title).cyan().bold())
    }

    fn footer() -> String {
        format!("\n{}\n", "═".repeat(60).cyan())
    }
}
