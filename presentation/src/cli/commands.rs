//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the final workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary with stage results and diagrams
    Text,
    /// Status snapshot and diagrams as JSON
    Json,
}

/// How stages that require review are decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewMode {
    Interactive,
    AutoApprove,
    AutoReject,
}

/// CLI arguments for archmesh
#[derive(Parser, Debug)]
#[command(name = "archmesh")]
#[command(author, version, about = "Staged architecture design workflows driven by LLMs")]
#[command(long_about = r#"
ArchMesh turns a product brief (greenfield) or a description of an existing
system (brownfield) into a reviewed architecture, one stage at a time.

Greenfield stages:
1. parse_requirements    Extract actors, requirements and quality attributes
2. design_architecture   Propose components, relationships and NFR tactics

Brownfield stages:
1. analyze_existing_system
2. parse_requirements
3. design_architecture
4. plan_integration      Integration flows and migration steps

Stages listed under [workflow] review_stages pause for your decision.
Diagrams (PlantUML or Mermaid) are generated after each accepted stage.

Configuration files are loaded from (in priority order):
1. ARCHMESH_* environment variables (ARCHMESH_WORKFLOW__MAX_ATTEMPTS=5)
2. --config <path>          Explicit config file
3. ./archmesh.toml          Project-level config
4. ~/.config/archmesh/config.toml   Global config

Example:
  archmesh "Online booking for a chain of 40 hotels, 2k bookings/hour at peak"
  archmesh --mode brownfield --input-file legacy-billing.md --auto-approve
  archmesh --format mermaid -o json brief.txt
"#)]
pub struct Cli {
    /// The brief or system description (reads --input-file when omitted)
    pub input: Option<String>,

    /// Read the input text from a file
    #[arg(short, long, value_name = "PATH", conflicts_with = "input")]
    pub input_file: Option<PathBuf>,

    /// Workflow mode: greenfield or brownfield
    #[arg(short, long, default_value = "greenfield")]
    pub mode: String,

    /// Project the session belongs to
    #[arg(short, long, default_value = "default")]
    pub project: String,

    /// Approve every review without prompting
    #[arg(long, conflicts_with = "auto_reject")]
    pub auto_approve: bool,

    /// Reject the first stage that requires review
    #[arg(long)]
    pub auto_reject: bool,

    /// Diagram format: plantuml or mermaid (overrides [diagrams] format)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Skip diagram generation
    #[arg(long)]
    pub no_diagrams: bool,

    /// Provider environment: development or production (overrides [providers] environment)
    #[arg(short, long, value_name = "ENV")]
    pub env: Option<String>,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Write diagnostic logs to this file in addition to stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append structured workflow events (JSONL) to this file
    #[arg(long, value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Review mode requested on the command line, if any.
    pub fn review_mode(&self) -> Option<ReviewMode> {
        if self.auto_approve {
            Some(ReviewMode::AutoApprove)
        } else if self.auto_reject {
            Some(ReviewMode::AutoReject)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["archmesh", "a hotel booking system"]).unwrap();
        assert_eq!(cli.input.as_deref(), Some("a hotel booking system"));
        assert_eq!(cli.mode, "greenfield");
        assert_eq!(cli.project, "default");
        assert_eq!(cli.review_mode(), None);
        assert_eq!(cli.output, None);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "archmesh",
            "--mode",
            "brownfield",
            "--input-file",
            "legacy.md",
            "--auto-approve",
            "-o",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.mode, "brownfield");
        assert_eq!(cli.input_file, Some(PathBuf::from("legacy.md")));
        assert_eq!(cli.review_mode(), Some(ReviewMode::AutoApprove));
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_conflicting_review_flags() {
        assert!(Cli::try_parse_from(["archmesh", "x", "--auto-approve", "--auto-reject"]).is_err());
        assert!(Cli::try_parse_from(["archmesh", "x", "--input-file", "y"]).is_err());
    }
}
