// src/format.rs
// =============================================================================
// Small display helpers shared by the views.
//
// - num_short: 1500 -> "1.5K", 2_000_000 -> "2M"
// - group_number: 1234567 -> "1,234,567"
// - long_date: "2024-01-05T10:00:00Z" -> "January 5, 2024"
// - blog_url: adds a scheme to bare blog hosts from user profiles
// =============================================================================

use chrono::{DateTime, NaiveDate};

const SI_UNITS: [(f64, &str); 6] = [
    (1e3, "K"),
    (1e6, "M"),
    (1e9, "B"),
    (1e12, "T"),
    (1e15, "P"),
    (1e18, "E"),
];

/// Short human form of a count, used on star/fork/watcher badges.
pub fn num_short(value: u64) -> String {
    if value < 1000 {
        return value.to_string();
    }

    let num = value as f64;
    let (divisor, suffix) = SI_UNITS
        .iter()
        .rev()
        .find(|(unit, _)| num >= *unit)
        .copied()
        .unwrap_or(SI_UNITS[0]);

    let scaled = format!("{:.2}", num / divisor);
    // "1.50" -> "1.5", "2.00" -> "2"
    let trimmed = scaled.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{suffix}")
}

/// Full count with thousands separators, used for tooltips / long labels.
pub fn group_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Long-style date for an RFC 3339 timestamp, or an empty string when the
/// input cannot be parsed.
pub fn long_date(timestamp: &str) -> String {
    let date = DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(timestamp, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => String::new(),
    }
}

/// GitHub stores blogs as typed by the user ("example.com"); links need a
/// scheme.
pub fn blog_url(blog: &str) -> String {
    if blog.starts_with("http") {
        blog.to_string()
    } else {
        format!("https://{blog}")
    }
}
