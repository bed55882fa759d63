use chrono::{DateTime, Utc};

/// Length used for post summaries in the feed.
pub const CARD_SUMMARY_LEN: usize = 120;
/// Length used for compact rows in the management listing.
pub const ROW_SUMMARY_LEN: usize = 50;
const VISIBLE_TAGS: usize = 3;

/// Cuts `text` to `max_len` characters and appends `...` when it was longer.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    }
}

/// Renders up to three tags as `#tag`, followed by `+N` for the remainder.
pub fn tag_summary(tags: &[String]) -> String {
    let mut parts: Vec<String> = tags
        .iter()
        .take(VISIBLE_TAGS)
        .map(|tag| format!("#{tag}"))
        .collect();
    if tags.len() > VISIBLE_TAGS {
        parts.push(format!("+{}", tags.len() - VISIBLE_TAGS));
    }
    parts.join(" ")
}

/// `dd/mm/yyyy`.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%d/%m/%Y").to_string()
}
