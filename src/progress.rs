//! Progress bars, spinners and log-only output.
//!
//! With `--log-only` every bar is hidden and phase messages go to stderr as
//! plain lines, so output stays readable when piped or tailed.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

/// Progress bar over `len` queries. Hidden in log-only mode.
pub fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
    }
    pb.set_message(msg.to_string());
    pb
}

/// Spinner for downloads and catalog parsing. Hidden in log-only mode,
/// where the start message is logged instead.
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        eprintln!("{}...", msg);
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{msg} {spinner} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Finish a bar or spinner with a final message, which is logged to stderr
/// in log-only mode since the bar itself is never drawn.
pub fn finish(pb: &ProgressBar, msg: String) {
    if is_log_only() {
        eprintln!("{}", msg);
    }
    pb.finish_with_message(msg);
}

/// Log progress periodically for tail-friendly output.
/// Only logs in log-only mode, every `interval` items and at the end.
pub fn log_progress(phase: &str, current: u64, total: u64, interval: u64) {
    if total == 0 || interval == 0 {
        return;
    }
    if is_log_only() && (current % interval == 0 || current == total) {
        let pct = 100.0 * current as f64 / total as f64;
        eprintln!("[{}] {}/{} ({:.1}%)", phase, current, total, pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_secs_f64(12.34)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_log_progress_ignores_empty_totals() {
        // Must not divide by zero or panic.
        log_progress("Matching", 0, 0, 10);
        log_progress("Matching", 5, 10, 0);
    }
}
