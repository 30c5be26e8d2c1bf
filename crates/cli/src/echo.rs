use std::time::Duration;

use gleaner_core::{AttemptOutcome, DocumentRecord, RetrievalAttempt, TextStats};
use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Gleaner".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Retrieve web pages and extract their main content\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print every retrieval strategy that was tried, in order
pub fn print_attempts(attempts: &[RetrievalAttempt]) {
    for attempt in attempts {
        let line = attempt.to_string();
        if attempt.outcome == AttemptOutcome::Success {
            eprintln!("  {} {}", "✓".green(), line.bright_white());
        } else {
            eprintln!("  {} {}", "✗".red(), line.dimmed());
        }
    }
    eprintln!();
}

/// Print timing information with color coding
fn print_timing(label: &str, duration: Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 1000.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print record details summary
pub fn print_record_details(record: &DocumentRecord) {
    eprintln!("  {} {}", "Title:".dimmed(), record.title().bright_white());
    eprintln!("  {} {}", "Images:".dimmed(), record.images().len().to_string().bright_white());
    if record.is_synthetic() {
        eprintln!("  {} {}", "Content:".dimmed(), "simulated".bright_yellow());
    }
    eprintln!();
}

/// Print word, character and reading-time counts
pub fn print_stats(stats: &TextStats) {
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Statistics".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Words:".dimmed(), stats.word_count.to_string().bright_white());
    eprintln!("  {} {}", "Characters:".dimmed(), stats.char_count.to_string().bright_white());
    eprintln!("  {} {} min\n", "Reading time:".dimmed(), stats.reading_time_minutes.to_string().bright_white());
}

/// Print timing summary
pub fn print_timing_summary(total: Duration, timings: &[(&str, Duration)]) {
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Timing Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for (label, duration) in timings {
        print_timing(label, *duration);
    }

    eprintln!("  {} {:>8.2}ms\n", format!("{}:", "Total").bold().dimmed(), total.as_secs_f64() * 1000.0);
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
