//! Table and value formatting for CLI output.

use std::collections::BTreeSet;

use comfy_table::{ContentArrangement, Table};

/// Borderless table with the given headers.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_header(headers);
    table
}

/// Human-readable byte count (binary units).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = None;
    for candidate in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = Some(candidate);
    }

    match unit {
        Some(unit) => format!("{value:.1} {unit}"),
        None => format!("{bytes} B"),
    }
}

/// Relative "N units ago" for a timestamp.
pub fn format_ago(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let secs = chrono::Utc::now().signed_duration_since(*dt).num_seconds();
    if secs < 0 {
        return "just now".to_string();
    }

    let (amount, unit) = match secs {
        s if s < 60 => (s, "seconds"),
        s if s < 3600 => (s / 60, "minutes"),
        s if s < 86_400 => (s / 3600, "hours"),
        s if s < 30 * 86_400 => (s / 86_400, "days"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "months"),
        s => (s / (365 * 86_400), "years"),
    };
    format!("{amount} {unit} ago")
}

/// Digest algorithm plus the first 12 characters of the hash.
pub fn short_digest(digest: &str) -> String {
    let truncate = |s: &str| s.chars().take(12).collect::<String>();
    match digest.split_once(':') {
        Some((algorithm, hex)) => format!("{}:{}", algorithm, truncate(hex)),
        None => truncate(digest),
    }
}

/// Comma-separated stack ids, `-` when there are none.
pub fn format_stacks(ids: &BTreeSet<&str>) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter().copied().collect::<Vec<_>>().join(",")
}
