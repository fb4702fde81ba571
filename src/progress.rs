//! Terminal progress bars for monitors.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::monitor::{Monitor, MonitorState, ProgressSink};

impl ProgressSink for ProgressBar {
    fn update(&self, progress: u64, total: Option<u64>) {
        if let Some(total) = total {
            self.set_length(total);
        }
        self.set_position(progress);
    }

    fn finish(&self, state: MonitorState) {
        match state {
            MonitorState::Done => self.finish_with_message("done"),
            MonitorState::Cancelled => self.abandon_with_message("cancelled"),
            MonitorState::Running => {}
        }
    }
}

/// A root monitor mirrored by a progress bar.
///
/// The bar counts the direct dependencies of whatever is evaluated under the
/// monitor.
pub fn monitor_with_bar() -> (Monitor, ProgressBar) {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=>-");

    let bar = ProgressBar::new(0).with_style(style);
    let monitor = Monitor::with_sink(Arc::new(bar.clone()));

    (monitor, bar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computations::{all_of, constant};

    #[test]
    fn test_bar_follows_monitor() {
        let (monitor, bar) = monitor_with_bar();
        bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());

        let all = all_of(vec![constant(1), constant(2), constant(3)]);
        assert!(all.evaluate(&monitor).is_present());
        monitor.set_done();

        assert_eq!(bar.length(), Some(3));
        assert_eq!(bar.position(), 3);
        assert!(bar.is_finished());
    }
}
