//! Run-level quality metrics.
//!
//! The driver feeds every outcome in here: produced records and skips by
//! reason. The rendered report is logged at the end of the run and optionally
//! written to disk by [`crate::outputs::report`].

use crate::models::{ArticleRecord, SkipReason};
use std::collections::BTreeMap;
use std::fmt;

/// Terms that mark an article as on-topic for a fitness site.
pub const FITNESS_KEYWORDS: &[&str] = &[
    "workout",
    "exercise",
    "training",
    "muscle",
    "strength",
    "fitness",
    "bodybuilding",
    "lifting",
    "gym",
    "rep",
    "sets",
    "weight",
    "protein",
    "diet",
    "nutrition",
];

/// Whether the title or content mentions any fitness keyword.
pub fn is_fitness_related(record: &ArticleRecord) -> bool {
    let text = format!("{} {}", record.title, record.content).to_lowercase();
    FITNESS_KEYWORDS.iter().any(|k| text.contains(k))
}

/// Counters for one run, rendered as the summary report via `Display`.
///
/// Every scraped URL counts once toward `attempted`, either as a produced
/// record or as exactly one skip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityMetrics {
    /// URLs handed to the scraper.
    pub attempted: usize,
    /// Records that passed validation.
    pub produced: usize,
    /// Produced records mentioning at least one [`FITNESS_KEYWORDS`] term.
    pub fitness_related: usize,
    /// Sum of `word_count` over produced records.
    pub total_words: usize,
    /// Skip counts keyed by [`SkipReason::label`].
    pub skipped: BTreeMap<&'static str, usize>,
}

impl QualityMetrics {
    /// Count a produced record.
    pub fn record_success(&mut self, record: &ArticleRecord) {
        self.attempted += 1;
        self.produced += 1;
        self.total_words += record.word_count;
        if is_fitness_related(record) {
            self.fitness_related += 1;
        }
    }

    /// Count a skipped URL under its reason label.
    pub fn record_skip(&mut self, reason: &SkipReason) {
        self.attempted += 1;
        *self.skipped.entry(reason.label()).or_default() += 1;
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Share of attempted URLs that produced a record, in percent.
    pub fn quality_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.produced as f64 * 100.0 / self.attempted as f64
        }
    }

    /// Mean words per produced record, 0 when nothing was produced.
    pub fn average_words(&self) -> usize {
        self.total_words.checked_div(self.produced).unwrap_or(0)
    }
}

impl fmt::Display for QualityMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data Quality Report")?;
        writeln!(f, "===================")?;
        writeln!(f, "Attempted URLs: {}", self.attempted)?;
        writeln!(f, "Articles Produced: {}", self.produced)?;
        writeln!(f, "Quality Rate: {:.1}%", self.quality_rate())?;
        writeln!(f, "Fitness-Related Articles: {}", self.fitness_related)?;
        writeln!(f, "Total Words: {}", self.total_words)?;
        writeln!(f, "Average Words per Article: {}", self.average_words())?;
        writeln!(f, "Skipped: {}", self.skipped_total())?;
        for (label, count) in &self.skipped {
            writeln!(f, "  {label}: {count}")?;
        }
        Ok(())
    }
}
