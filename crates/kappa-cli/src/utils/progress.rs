use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use kappa_rta::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Where the run is, independent of how it is drawn.
#[derive(Debug, Default, Clone, PartialEq)]
struct GridProgress {
    phase: &'static str,
    in_grid: bool,
    restored: Option<usize>,
    total: u64,
    done: u64,
    last_grid_point: Option<usize>,
}

impl GridProgress {
    fn source(&self) -> &'static str {
        if self.restored.is_some() {
            "stored"
        } else {
            "computed"
        }
    }

    fn bar_message(&self) -> String {
        match self.last_grid_point {
            Some(gp) => format!("gp {:<6} {}", gp, self.source()),
            None => format!("{} linewidths", self.source()),
        }
    }

    fn summary(&self) -> String {
        format!(
            "✓ {}/{} grid points, {} linewidths",
            self.done,
            self.total,
            self.source()
        )
    }
}

/// Renders the progress of a `kappa rta` run: a spinner per phase and a bar
/// over the grid points.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: ProgressBar,
    state: Arc<Mutex<GridProgress>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(spinner_style());
        Self {
            bar,
            state: Arc::new(Mutex::new(GridProgress::default())),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let handler = self.clone();
        Box::new(move |event| handler.handle(event))
    }

    fn handle(&self, event: Progress) {
        let Ok(mut state) = self.state.lock() else {
            warn!("Progress state mutex was poisoned. Cannot update progress.");
            return;
        };

        match event {
            Progress::PhaseStart { name } => {
                state.phase = name;
                self.bar.reset();
                self.bar.set_style(spinner_style());
                self.bar.set_message(name);
                self.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::Restored { grid_points } => {
                state.restored = Some(grid_points);
                self.bar.suspend(|| {
                    eprintln!("  Linewidths of {} grid point(s) read from the store", grid_points)
                });
            }
            Progress::GridStart { total } => {
                state.in_grid = true;
                state.total = total;
                state.done = 0;
                state.last_grid_point = None;
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_style(bar_style());
                self.bar.set_length(total);
                self.bar.set_message(state.bar_message());
            }
            Progress::GridPointFinished { grid_point, .. } => {
                state.done += 1;
                state.last_grid_point = Some(grid_point);
                self.bar.set_position(state.done);
                self.bar.set_message(state.bar_message());
            }
            Progress::GridFinish => {
                self.bar.set_position(state.total);
                self.bar.finish_with_message(state.summary());
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                if state.in_grid {
                    state.in_grid = false;
                } else {
                    self.bar.finish_with_message(format!("✓ {}", state.phase));
                }
            }
            Progress::Message(msg) => {
                self.bar.suspend(|| eprintln!("  {}", msg));
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
