//! CLI entrypoint for ArchMesh
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use archmesh_application::{
    AutoApproveReview, AutoRejectReview, DiagramService, NoWorkflowLogger, NotificationPublisher,
    ReviewHandler, ReviewHandlerError, StageExecutor, WorkflowError, WorkflowEventLogger,
    WorkflowService,
};
use archmesh_domain::{DiagramPlanner, SessionId, WorkflowState};
use archmesh_infrastructure::{
    ConfigLoader, FileConfig, FileOutputFormat, FileReviewMode, InMemoryDiagramRepository,
    InMemorySessionStore, JsonlWorkflowLogger, RoutingGateway, TemplateDiagramRenderer,
    http_adapters,
};
use archmesh_presentation::{
    Cli, ConsoleFormatter, InteractiveReviewHandler, OutputFormat, ProgressReporter, ReviewMode,
    SimpleProgress, follow, review_until_interrupted,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    apply_cli_overrides(&cli, &mut config);

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config error: {}", issue);
        }
        bail!("Invalid configuration ({} issue(s))", issues.len());
    }

    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    let _log_guard = init_logging(cli.verbose, log_file.as_deref())?;

    info!("Starting ArchMesh");

    let input = read_input(&cli)?;
    let workflow_config = config.to_workflow_config()?;
    let selection = config.to_provider_selection()?;

    // === Dependency Injection ===
    let gateway = Arc::new(RoutingGateway::new(http_adapters(&config.providers)));
    let executor = StageExecutor::new(gateway, selection);

    let event_log = cli.event_log.clone().or_else(|| config.logging.event_log.clone());
    let logger: Arc<dyn WorkflowEventLogger> = match event_log.as_deref() {
        Some(path) => match JsonlWorkflowLogger::new(path) {
            Some(logger) => {
                info!("Writing workflow events to {}", logger.path().display());
                Arc::new(logger)
            }
            None => Arc::new(NoWorkflowLogger),
        },
        None => Arc::new(NoWorkflowLogger),
    };

    let diagrams = Arc::new(
        DiagramService::new(
            DiagramPlanner::new(workflow_config.diagram_format),
            Arc::new(TemplateDiagramRenderer::new()),
            Arc::new(InMemoryDiagramRepository::new()),
        )
        .with_logger(logger.clone()),
    );
    let publisher = Arc::new(NotificationPublisher::new());
    let service = Arc::new(
        WorkflowService::new(
            Arc::new(InMemorySessionStore::new()),
            executor,
            publisher.clone(),
            workflow_config,
        )
        .with_diagrams(diagrams.clone())
        .with_logger(logger),
    );

    let reviewer = review_handler(&cli, &config);

    // === Run ===
    let session_id = service.start(cli.project.as_str(), &cli.mode, input).await?;
    let stages = service.session(&session_id).await?.stages().to_vec();

    let subscription = publisher.subscribe(&session_id);
    let subscription_handle = subscription.handle;
    let seed = publisher.latest(&session_id);
    let progress = if cli.quiet {
        None
    } else if cli.verbose > 0 {
        Some(tokio::spawn(follow(SimpleProgress::new(), subscription, seed)))
    } else {
        Some(tokio::spawn(follow(
            ProgressReporter::new(&stages),
            subscription,
            seed,
        )))
    };

    let final_state = drive(&service, &session_id, reviewer.as_ref()).await?;

    publisher.unsubscribe(subscription_handle);
    if let Some(progress) = progress {
        let _ = progress.await;
    }

    // === Output ===
    let status = service.get_status(&session_id).await?;
    let artifacts = diagrams.list_for_session(&session_id).await?;

    if !config.output.color {
        ConsoleFormatter::disable_color();
    }
    let output = match output_format(&cli, &config) {
        OutputFormat::Text => {
            ConsoleFormatter::format(&status, &artifacts, config.output.show_diagrams)
        }
        OutputFormat::Json => ConsoleFormatter::format_json(&status, &artifacts),
    };
    println!("{}", output);

    Ok(match final_state {
        WorkflowState::Completed => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Run the session until it reaches a terminal state, answering reviews
/// along the way. Ctrl+C cancels the session, also while a review prompt
/// is open.
async fn drive(
    service: &Arc<WorkflowService>,
    session_id: &SessionId,
    reviewer: &dyn ReviewHandler,
) -> Result<WorkflowState> {
    loop {
        tokio::select! {
            _ = service.wait_idle() => {}
            _ = tokio::signal::ctrl_c() => {
                warn!(session_id = %session_id, "Interrupted, cancelling workflow");
                cancel_quietly(service, session_id).await?;
                service.wait_idle().await;
            }
        }

        let session = service.session(session_id).await?;
        match session.state() {
            state if state.is_terminal() => return Ok(state),
            WorkflowState::AwaitingReview { stage } => {
                let result = session
                    .latest_result(stage)
                    .cloned()
                    .with_context(|| format!("no result to review for {}", stage))?;

                let review = reviewer.request_review(session_id, &result);
                let interrupt = tokio::signal::ctrl_c();
                let outcome = match review_until_interrupted(review, interrupt).await {
                    Ok(outcome) => outcome,
                    Err(ReviewHandlerError::Cancelled) => {
                        cancel_quietly(service, session_id).await?;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                match service
                    .submit_review(session_id, outcome.decision, outcome.comments)
                    .await
                {
                    Ok(_) => {}
                    // The session moved on (e.g. cancelled) while the prompt was open.
                    Err(e @ WorkflowError::InvalidState { .. }) => warn!("{}", e),
                    Err(e) => return Err(e.into()),
                }
            }
            state => bail!("Workflow stalled in state {}", state),
        }
    }
}

async fn cancel_quietly(service: &WorkflowService, session_id: &SessionId) -> Result<()> {
    match service.cancel(session_id).await {
        Ok(()) | Err(WorkflowError::InvalidState { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn apply_cli_overrides(cli: &Cli, config: &mut FileConfig) {
    if let Some(format) = &cli.format {
        config.diagrams.format = format.clone();
    }
    if cli.no_diagrams {
        config.diagrams.enabled = false;
    }
    if let Some(env) = &cli.env {
        config.providers.environment = env.clone();
    }
}

fn review_handler(cli: &Cli, config: &FileConfig) -> Box<dyn ReviewHandler> {
    let mode = cli.review_mode().unwrap_or(match config.workflow.review_mode {
        FileReviewMode::Interactive => ReviewMode::Interactive,
        FileReviewMode::AutoApprove => ReviewMode::AutoApprove,
        FileReviewMode::AutoReject => ReviewMode::AutoReject,
    });
    match mode {
        ReviewMode::Interactive => Box::new(InteractiveReviewHandler::new()),
        ReviewMode::AutoApprove => Box::new(AutoApproveReview),
        ReviewMode::AutoReject => Box::new(AutoRejectReview),
    }
}

fn output_format(cli: &Cli, config: &FileConfig) -> OutputFormat {
    cli.output.unwrap_or(match config.output.format {
        FileOutputFormat::Text => OutputFormat::Text,
        FileOutputFormat::Json => OutputFormat::Json,
    })
}

fn read_input(cli: &Cli) -> Result<String> {
    let text = match (&cli.input, &cli.input_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))?,
        (None, None) => bail!("Input is required: pass the brief as an argument or use --input-file"),
    };
    if text.trim().is_empty() {
        bail!("Input is empty");
    }
    Ok(text)
}

/// Install the tracing subscriber; the returned guard flushes the log file.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(stderr_layer).init();
        return Ok(None);
    };

    let path: PathBuf = path.to_path_buf();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path {}", path.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(Some(guard))
}
