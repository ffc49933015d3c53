//! Progress reporting for council dispatches

use colored::Colorize;
use council_application::ports::progress::DispatchProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports dispatch progress with a console progress bar
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchProgress for ProgressReporter {
    fn on_dispatch_start(&self, total_warriors: usize) {
        let bar = ProgressBar::new(total_warriors as u64);
        bar.set_style(Self::style());
        bar.set_prefix("Council");
        bar.set_message("dispatching...");
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn on_warrior_complete(&self, warrior: &str, success: bool) {
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            let status = if success {
                format!("{} {}", "v".green(), warrior)
            } else {
                format!("{} {}", "x".red(), warrior)
            };
            bar.set_message(status);
            bar.inc(1);
        }
    }

    fn on_dispatch_complete(&self, answered: usize, total: usize) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_with_message(format!("{}/{} answered", answered, total));
        }
    }
}
