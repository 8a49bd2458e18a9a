//! Progress accounting, decoupled from how (or whether) it is drawn

use crate::config::TransformConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Receives a count after each unit of work
pub trait Progress {
    /// Called once before work starts; `None` means the total is unknown
    fn start(&self, _total: Option<u64>) {}

    fn inc(&self, delta: u64);

    fn finish(&self) {}
}

/// Discards all progress
pub struct NoProgress;

impl Progress for NoProgress {
    fn inc(&self, _delta: u64) {}
}

impl Progress for ProgressBar {
    fn start(&self, total: Option<u64>) {
        match total {
            Some(len) => {
                self.set_length(len);
                self.set_style(bar_style());
            }
            None => {
                self.set_style(spinner_style());
                self.enable_steady_tick(Duration::from_millis(100));
            }
        }
    }

    fn inc(&self, delta: u64) {
        ProgressBar::inc(self, delta);
    }

    fn finish(&self) {
        self.finish_and_clear();
    }
}

/// Progress for one transform step: an stderr bar, or nothing when disabled
pub fn progress_for(config: &TransformConfig, message: &str) -> Box<dyn Progress> {
    if !config.show_progress {
        return Box::new(NoProgress);
    }

    let pb = ProgressBar::new(0);
    pb.set_message(message.to_string());
    Box::new(pb)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {pos} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
