pub(crate) mod emoji;

use chrono::{Datelike, Local, NaiveDate, Utc};

pub(crate) use emoji::random_emoji;

/// Picks a block key for `candidate` that does not collide with `existing`.
///
/// `candidate` is used as-is when free. Otherwise a trailing `" <digits>"`
/// suffix is stripped and `"<stem> 1"`, `"<stem> 2"`, ... are probed in order.
pub fn make_unique_key<S: AsRef<str>>(candidate: &str, existing: &[S]) -> String {
    let taken = |name: &str| existing.iter().any(|e| e.as_ref() == name);

    if !taken(candidate) {
        return candidate.to_string();
    }

    let stem = numbered_stem(candidate).unwrap_or(candidate);

    let mut n: u64 = 1;
    loop {
        let probe = format!("{stem} {n}");
        if !taken(&probe) {
            return probe;
        }
        n += 1;
    }
}

// Matches `<stem> <digits>` with a non-empty stem.
fn numbered_stem(name: &str) -> Option<&str> {
    let (stem, suffix) = name.rsplit_once(' ')?;
    if stem.is_empty() || suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(stem)
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Key of the journal block for the current local day.
pub(crate) fn today_key() -> String {
    format_day(Local::now().date_naive())
}

/// `"June 1st 2024"` style day label.
pub fn format_day(date: NaiveDate) -> String {
    let day = date.day();
    format!(
        "{} {}{} {}",
        date.format("%B"),
        day,
        ordinal_suffix(day),
        date.year()
    )
}

fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Human readable distance between `then_ms` and `now_ms`, e.g.
/// "a few seconds ago", "5 minutes ago", "in 2 hours".
pub fn relative_time(then_ms: i64, now_ms: i64) -> String {
    let delta = now_ms.saturating_sub(then_ms);
    let secs = (delta.unsigned_abs() as f64 / 1000.0).round();
    let mins = (secs / 60.0).round();
    let hours = (mins / 60.0).round();
    let days = (hours / 24.0).round();

    let phrase = if secs < 45.0 {
        "a few seconds".to_string()
    } else if secs < 90.0 {
        "a minute".to_string()
    } else if mins < 45.0 {
        format!("{mins} minutes")
    } else if mins < 90.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{hours} hours")
    } else if hours < 36.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{days} days")
    } else if days < 45.0 {
        "a month".to_string()
    } else if days < 320.0 {
        format!("{} months", (days / 30.4).round().max(2.0))
    } else if days < 548.0 {
        "a year".to_string()
    } else {
        format!("{} years", (days / 365.0).round().max(2.0))
    };

    if delta < 0 {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

const KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Short random key for a text block inside rich-text content.
pub(crate) fn mint_content_key() -> String {
    let mut buf = [0u8; 5];
    if getrandom::getrandom(&mut buf).is_err() {
        // Entropy is unavailable only in broken hosts; fall back to the clock.
        let t = now_ms().unsigned_abs();
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (t >> (i * 8)) as u8;
        }
    }
    buf.iter()
        .map(|b| KEY_ALPHABET[*b as usize % KEY_ALPHABET.len()] as char)
        .collect()
}
