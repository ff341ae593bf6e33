//! JSON export of article records.
//!
//! The file holds one flat array; every element carries exactly the
//! [`ArticleRecord`] fields in declaration order.

use crate::models::ArticleRecord;
use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize `records` as a pretty-printed JSON array and write it to `path`,
/// creating the parent directory first.
///
/// # Arguments
///
/// * `records` - Validated articles, written in the given order
/// * `path` - Target file; an existing file is overwritten
///
/// # Errors
///
/// Returns an error if the directory is not writable, serialization fails or
/// the file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_articles(records: &[ArticleRecord], path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_writable_dir(parent).await?;
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).await?;
    info!("Wrote article JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN;

    #[tokio::test]
    async fn test_write_articles_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("articles.json");
        let records = vec![ArticleRecord {
            url: "https://example.com/t/how-to-squat/12345".into(),
            title: "How To Squat".into(),
            author: UNKNOWN.into(),
            date_published: "2024-03-01".into(),
            content: "Brace, descend, drive.".into(),
            word_count: 3,
            scraped_at: "2025-05-06T14:30:00.000Z".into(),
        }];

        write_articles(&records, &path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<ArticleRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, records);
        assert!(raw.trim_start().starts_with('['));
    }

    #[tokio::test]
    async fn test_write_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");

        write_articles(&[], &path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
