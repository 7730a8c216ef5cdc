use epipred::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;

/// What a stage steps through while running, and what it yields when done.
fn units(stage: Option<&str>) -> (&'static str, &'static str) {
    match stage {
        Some("Loading predictions") => ("tables", "records"),
        Some("Binder selection") => ("alleles", "binders"),
        Some("Promiscuous aggregation") => ("windows", "promiscuous cores"),
        Some("Clustering") => ("proteins", "clustered proteins"),
        Some("Region search") => ("proteins", "regions"),
        _ => ("steps", "items"),
    }
}

/// A finished analysis stage and the number of items it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: &'static str,
    pub items: usize,
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (_, label) = units(Some(self.stage));
        write!(f, "✓ {}: {} {}", self.stage, self.items, label)
    }
}

struct StageDisplay {
    bar: ProgressBar,
    stage: Option<&'static str>,
    completed: Vec<StageReport>,
    notes: Vec<String>,
}

impl StageDisplay {
    fn handle(&mut self, progress: Progress) {
        match progress {
            Progress::StageStart { name } => {
                self.stage = Some(name);
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                self.bar.set_message(name);
            }
            Progress::TaskStart { total_steps } => {
                let (steps, _) = units(self.stage);
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_length(total_steps);
                self.bar.set_style(bar_style());
                self.bar.set_prefix(steps);
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => {
                let length = self.bar.length().unwrap_or(0);
                self.bar.set_position(length);
            }
            Progress::StageFinish { items } => {
                let report = StageReport {
                    stage: self.stage.take().unwrap_or("Stage"),
                    items,
                };
                self.bar.disable_steady_tick();
                self.bar.finish_with_message(report.to_string());
                self.completed.push(report);
            }
            Progress::Message(msg) => {
                if self.bar.is_hidden() {
                    eprintln!("  {}", msg);
                } else {
                    self.bar.println(format!("  {}", msg));
                }
                self.notes.push(msg);
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} {prefix}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

/// Renders analysis progress on stderr: a spinner per stage, a bar while tables load, and one
/// summary line per finished stage.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<StageDisplay>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        bar.finish_and_clear();
        Self {
            display: Arc::new(Mutex::new(StageDisplay {
                bar,
                stage: None,
                completed: Vec::new(),
                notes: Vec::new(),
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = Arc::clone(&self.display);
        Box::new(move |progress: Progress| {
            let Ok(mut display) = display.lock() else {
                warn!("Progress display mutex was poisoned. Cannot update progress.");
                return;
            };
            display.handle(progress);
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
