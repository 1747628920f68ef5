//! Progress reporting for workflow sessions
//!
//! Both reporters consume the [`ProgressEvent`] stream of one session from a
//! [`Subscription`] until the session reaches a terminal status.

use archmesh_application::Subscription;
use archmesh_domain::{ProgressEvent, ProgressStatus, StageName};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;

const BAR_LEN: u64 = 100;

/// Receives progress events for display.
pub trait ProgressView: Send {
    fn on_event(&mut self, event: &ProgressEvent);

    fn finish(&mut self);
}

/// Drain `subscription` into `view` until a terminal event or until the
/// publisher side goes away.
///
/// `seed` is the publisher's latest event at subscription time; it is shown
/// first so a late subscriber does not miss the current state, and is not
/// shown twice if it is also queued.
pub async fn follow(
    mut view: impl ProgressView,
    mut subscription: Subscription,
    seed: Option<ProgressEvent>,
) {
    if let Some(event) = &seed {
        view.on_event(event);
        if event.status.is_terminal() {
            view.finish();
            return;
        }
    }
    while let Some(event) = subscription.receiver.recv().await {
        if seed.as_ref() == Some(&event) {
            continue;
        }
        view.on_event(&event);
        if event.status.is_terminal() {
            break;
        }
    }
    view.finish();
}

/// Reports progress with one bar per stage plus an overall bar
pub struct ProgressReporter {
    multi: MultiProgress,
    overall: ProgressBar,
    stages: HashMap<StageName, ProgressBar>,
    last_stage: Option<StageName>,
}

impl ProgressReporter {
    pub fn new(stages: &[StageName]) -> Self {
        Self::with_target(stages, ProgressDrawTarget::stderr())
    }

    /// Reporter that draws nowhere; state is still tracked.
    pub fn hidden(stages: &[StageName]) -> Self {
        Self::with_target(stages, ProgressDrawTarget::hidden())
    }

    fn with_target(stages: &[StageName], target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let overall = multi.add(ProgressBar::new(BAR_LEN));
        overall.set_style(Self::overall_style());
        overall.set_prefix("Workflow");

        let stages = stages
            .iter()
            .map(|stage| {
                let bar = multi.add(ProgressBar::new(BAR_LEN));
                bar.set_style(Self::stage_style());
                bar.set_prefix(stage.display_name());
                bar.set_message("waiting".dimmed().to_string());
                (*stage, bar)
            })
            .collect();

        Self {
            multi,
            overall,
            stages,
            last_stage: None,
        }
    }

    fn overall_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("  {prefix:<28} [{bar:30.green/white}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn percent(fraction: f64) -> u64 {
        (fraction.clamp(0.0, 1.0) * BAR_LEN as f64).round() as u64
    }

    pub fn overall_position(&self) -> u64 {
        self.overall.position()
    }

    pub fn stage_message(&self, stage: StageName) -> Option<String> {
        self.stages.get(&stage).map(|bar| bar.message())
    }

    pub fn draw_target_hidden(&self) -> bool {
        self.multi.is_hidden()
    }
}

impl ProgressView for ProgressReporter {
    fn on_event(&mut self, event: &ProgressEvent) {
        self.overall.set_position(Self::percent(event.progress));
        self.overall.set_message(event.message.clone());

        // Stages before the current one are done once the workflow has moved on.
        if self.last_stage != Some(event.stage) {
            if let Some(previous) = self.last_stage.and_then(|s| self.stages.get(&s)) {
                if !previous.is_finished() && event.status != ProgressStatus::Failed {
                    previous.finish_with_message("done".green().to_string());
                }
            }
            self.last_stage = Some(event.stage);
        }

        let Some(bar) = self.stages.get(&event.stage) else {
            return;
        };
        match event.status {
            ProgressStatus::Running => {
                bar.set_position(bar.position().max(10));
                bar.set_message(event.message.clone());
            }
            ProgressStatus::ReviewRequired => {
                bar.set_position(BAR_LEN);
                bar.set_message("awaiting review".yellow().to_string());
            }
            ProgressStatus::Completed => {
                bar.finish_with_message("done".green().to_string());
            }
            ProgressStatus::Failed => {
                bar.abandon_with_message(event.message.red().to_string());
            }
        }
    }

    fn finish(&mut self) {
        for bar in self.stages.values() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
        self.overall.finish();
    }
}

/// Simple text-based progress (no fancy UI)
#[derive(Default)]
pub struct SimpleProgress {
    lines: Vec<String>,
    echo: bool,
}

impl SimpleProgress {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            echo: true,
        }
    }

    /// Collects lines without printing them.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl ProgressView for SimpleProgress {
    fn on_event(&mut self, event: &ProgressEvent) {
        let marker = match event.status {
            ProgressStatus::Running => "->".cyan(),
            ProgressStatus::ReviewRequired => "??".yellow(),
            ProgressStatus::Completed => "v".green(),
            ProgressStatus::Failed => "x".red(),
        };
        let line = format!(
            "{} [{:>3}%] {}: {}",
            marker,
            ProgressReporter::percent(event.progress),
            event.stage.display_name().bold(),
            event.message
        );
        if self.echo {
            eprintln!("{}", line);
        }
        self.lines.push(line);
    }

    fn finish(&mut self) {}
}
