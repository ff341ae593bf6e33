//! CSV export of article records.
//!
//! One header row, then one row per record. Columns follow the
//! [`ArticleRecord`] field declaration order; quoting of commas, quotes and
//! embedded newlines is left to the `csv` writer.

use crate::models::ArticleRecord;
use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Header row, in [`ArticleRecord`] field order.
pub const COLUMNS: [&str; 7] = [
    "url",
    "title",
    "author",
    "date_published",
    "content",
    "word_count",
    "scraped_at",
];

/// Render `records` as CSV text, header first.
///
/// The header is written even when `records` is empty.
///
/// # Errors
///
/// Returns an error if a record fails to serialize.
pub fn render_csv(records: &[ArticleRecord]) -> Result<String, Box<dyn Error>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Write `records` as CSV to `path`, creating the parent directory first.
///
/// # Arguments
///
/// * `records` - Validated articles, written in the given order
/// * `path` - Target file; an existing file is overwritten
///
/// # Errors
///
/// Returns an error if serialization, directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_articles_csv(
    records: &[ArticleRecord],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_writable_dir(parent).await?;
    }
    fs::write(path, render_csv(records)?).await?;
    info!("Wrote article CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tricky_record() -> ArticleRecord {
        ArticleRecord {
            url: "https://example.com/t/how-to-squat/12345".into(),
            title: "Squats, \"Really\" Explained".into(),
            author: "Coach, Strength".into(),
            date_published: "2024-03-01".into(),
            content: "Brace hard, then descend.\nDrive up, \"fast\".".into(),
            word_count: 7,
            scraped_at: "2025-05-06T14:30:00.000Z".into(),
        }
    }

    #[test]
    fn test_empty_csv_has_header_only() {
        let csv = render_csv(&[]).unwrap();
        assert_eq!(
            csv,
            "url,title,author,date_published,content,word_count,scraped_at\n"
        );
    }

    #[tokio::test]
    async fn test_write_csv_round_trips_quoted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("articles.csv");
        let records = vec![tricky_record()];

        write_articles_csv(&records, &path).await.unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(String::from)
            .collect();
        assert_eq!(headers, COLUMNS);

        let parsed: Vec<ArticleRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(parsed, records);
    }
}
