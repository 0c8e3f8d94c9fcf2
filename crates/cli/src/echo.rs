use owo_colors::OwoColorize;
use shelfmark_core::Entry;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Shelfmark".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Save articles into your reading archive\n".dimmed());
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

/// Short human-readable summary of an ingested entry.
///
/// Labels are dimmed when `color` is set; files get plain text.
pub fn format_summary(entry: &Entry, color: bool) -> String {
    let tags = entry.tags().iter().map(|t| t.label.as_str()).collect::<Vec<_>>().join(", ");
    let published_at = entry.published_at.map(|d| d.to_rfc3339());
    let authors = entry.published_by.as_ref().map(|a| a.join(", "));
    let reading_time = format!("{} min", entry.reading_time);

    let rows = [
        ("Title", entry.title.as_deref()),
        ("URL", Some(entry.url.as_str())),
        ("Origin", entry.origin_url.as_deref()),
        ("Domain", entry.domain_name.as_deref()),
        ("Language", entry.language.as_deref()),
        ("Published", published_at.as_deref()),
        ("Authors", authors.as_deref()),
        ("Status", entry.http_status.as_deref()),
        ("Type", entry.mimetype.as_deref()),
        ("Preview", entry.preview_picture.as_deref()),
        ("Reading", Some(reading_time.as_str())),
        ("Tags", (!tags.is_empty()).then_some(tags.as_str())),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        let Some(value) = value else { continue };
        let label = format!("{label}:");
        if color {
            out.push_str(&format!("{:<11} {}\n", label.dimmed(), value.bright_white()));
        } else {
            out.push_str(&format!("{label:<11} {value}\n"));
        }
    }
    out
}
