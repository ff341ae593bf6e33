//! Output sinks for a finished run.
//!
//! # Submodules
//!
//! - [`json`]: Writes the article records as a JSON array
//! - [`csv`]: Writes the same records as CSV rows
//! - [`report`]: Writes the plain-text quality and summary report
//!
//! # Output Structure
//!
//! ```text
//! data/
//! ├── articles.json        # [ArticleRecord, ...]
//! ├── articles.csv         # optional, see `csv_file`
//! └── summary_report.txt   # optional, see `report_file`
//! ```

pub mod csv;
pub mod json;
pub mod report;
