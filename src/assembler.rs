//! Final record assembly: quality gate, word count, timestamp.

use crate::models::{ArticleRecord, ExtractedFields, UNKNOWN};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

/// Build an [`ArticleRecord`] stamped with the current UTC time.
///
/// The length gate repeats the extractor's so that fields from any
/// extraction path get the same check.
///
/// # Arguments
///
/// * `url` - Normalized article URL the fields came from
/// * `extracted` - Raw fields from the extractor
/// * `min_content_length` - Smallest accepted body length, in characters
///
/// # Returns
///
/// `None` when the title is blank or the content is shorter than
/// `min_content_length` characters. Missing author or date become `"Unknown"`.
pub fn assemble(
    url: &str,
    extracted: ExtractedFields,
    min_content_length: usize,
) -> Option<ArticleRecord> {
    assemble_at(url, extracted, min_content_length, Utc::now())
}

/// [`assemble`] with an explicit timestamp.
pub fn assemble_at(
    url: &str,
    extracted: ExtractedFields,
    min_content_length: usize,
    now: DateTime<Utc>,
) -> Option<ArticleRecord> {
    let title = extracted.title.trim();
    if title.is_empty() {
        debug!(%url, "Rejected: empty title");
        return None;
    }
    let chars = extracted.content.chars().count();
    if chars < min_content_length {
        debug!(%url, chars, min = min_content_length, "Rejected: content too short");
        return None;
    }

    Some(ArticleRecord {
        url: url.to_string(),
        title: title.to_string(),
        author: or_unknown(extracted.author),
        date_published: or_unknown(extracted.date_published),
        word_count: extracted.content.split_whitespace().count(),
        content: extracted.content,
        scraped_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

fn or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fields(content: &str) -> ExtractedFields {
        ExtractedFields {
            title: "How To Squat".into(),
            author: None,
            date_published: Some("  ".into()),
            content: content.into(),
        }
    }

    #[test]
    fn test_rejects_short_content() {
        let content = "x".repeat(50);
        assert_eq!(assemble("https://example.com/t/a/1", fields(&content), 100), None);
    }

    #[test]
    fn test_accepts_content_over_minimum() {
        // 30 words of four letters plus separators: 30 * 4 + 29 = 149 chars.
        let content = vec!["lift"; 30].join(" ") + ".";
        assert_eq!(content.chars().count(), 150);

        let record = assemble("https://example.com/t/a/1", fields(&content), 100).unwrap();

        assert_eq!(record.word_count, 30);
        assert_eq!(record.title, "How To Squat");
        assert_eq!(record.author, "Unknown");
        assert_eq!(record.date_published, "Unknown");
        assert!(record.scraped_at.ends_with('Z'));
    }

    #[test]
    fn test_content_at_exact_minimum_is_accepted() {
        let at_minimum = "x".repeat(100);
        let record = assemble("https://example.com/t/a/1", fields(&at_minimum), 100).unwrap();
        assert_eq!(record.content.chars().count(), 100);

        let one_short = "x".repeat(99);
        assert_eq!(assemble("https://example.com/t/a/1", fields(&one_short), 100), None);
    }

    #[test]
    fn test_rejects_blank_title() {
        let mut f = fields(&"word ".repeat(40));
        f.title = "   ".into();
        assert_eq!(assemble("https://example.com/t/a/1", f, 100), None);
    }

    #[test]
    fn test_timestamp_format() {
        let now = Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap();
        let record = assemble_at(
            "https://example.com/t/a/1",
            fields(&"word ".repeat(40)),
            100,
            now,
        )
        .unwrap();
        assert_eq!(record.scraped_at, "2025-05-06T14:30:00.000Z");
    }

    #[test]
    fn test_word_count_uses_whitespace_tokens() {
        let content = format!("{}\n\n{}\tend", "alpha beta ".repeat(30), "gamma");
        let record = assemble("https://example.com/t/a/1", fields(&content), 100).unwrap();
        assert_eq!(record.word_count, 62);
    }
}
