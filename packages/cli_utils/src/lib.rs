#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the AdSpecta tools.
//!
//! [`init_logger`] routes `log` output through `indicatif-log-bridge` so log
//! lines do not tear progress bars, and [`StepProgress`] is the bar used for
//! long-running fixed-length jobs such as model training.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// A fixed-length progress bar advanced one step at a time.
pub struct StepProgress {
    bar: ProgressBar,
}

impl StepProgress {
    /// Adds a bar with `total` steps to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress, message: &str, total: u64) -> Self {
        let bar = multi.add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(
                "{msg} {wide_bar:.green/dim} {pos}/{len} [{elapsed_precise}, eta {eta}]",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(200));

        Self { bar }
    }

    /// Moves the bar to `completed` steps.
    pub fn set_position(&self, completed: u64) {
        self.bar.set_position(completed);
    }

    /// Returns the number of completed steps.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Completes the bar and leaves `msg` in its place.
    pub fn finish(&self, msg: impl Into<String>) {
        self.bar.finish_with_message(msg.into());
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Already initialized in tests.
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn step_progress_tracks_position() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let progress = StepProgress::new(&multi, "Training", 10);

        progress.set_position(4);
        assert_eq!(progress.position(), 4);

        progress.set_position(10);
        progress.finish("done");
        assert_eq!(progress.position(), 10);
    }

    #[test]
    fn init_logger_can_be_called_twice() {
        let _first = init_logger();
        let _second = init_logger();
    }
}
