use std::time::Duration;

/// Discord's hard limit for plain message content.
pub const MESSAGE_CHAR_LIMIT: usize = 2000;

const ELLIPSIS: char = '…';

/// Label a duration in its largest whole unit (e.g. 3600s -> "1 hour", 90s -> "90 seconds").
pub fn format_interval(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (amount, unit) = if secs > 0 && secs % 86_400 == 0 {
        (secs / 86_400, "day")
    } else if secs > 0 && secs % 3_600 == 0 {
        (secs / 3_600, "hour")
    } else if secs > 0 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

/// Cut `text` down to at most `limit` characters, marking the cut with an ellipsis.
pub fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_owned();
    }

    let mut truncated: String = text.chars().take(limit.saturating_sub(1)).collect();
    truncated.push(ELLIPSIS);
    truncated
}

/// Break `@everyone`/`@here` style pings inside untrusted text.
pub fn neutralize_mentions(text: &str) -> String {
    text.replace('@', "@\u{200B}")
}
