//! Summary report built from bulk_extractor's `report.xml`.
//!
//! The report carries a "Run Summary" section with the program, command line,
//! start time and elapsed time, followed by a table of per-scanner hit counts
//! sorted by count (descending, ties keep document order). The summary line
//! is the total number of hits across all scanners; the total is kept in a
//! `u128` so any number of `u64` counts sums without overflow.

use std::fs;
use std::io;
use std::path::Path;

use roxmltree::Document;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::markdown::{MarkdownTable, Priority, Report};
use crate::xml::{field_text, node_text, XmlPath};

/// File name the extractor writes its run summary to.
pub const REPORT_XML: &str = "report.xml";

/// Report title.
pub const REPORT_TITLE: &str = "Bulk Extractor Results";

/// Body and summary used when the extractor produced no `report.xml`.
pub const REPORT_UNAVAILABLE: &str = "Execution successful, but the report is not available.";

/// Header used when the report has no `feature_files` container.
pub const NO_FINDINGS: &str = "There are no findings to report.";

const PROGRAM: &str = "creator/program";
const VERSION: &str = "creator/version";
const COMMAND_LINE: &str = "creator/execution_environment/command_line";
const START_TIME: &str = "creator/execution_environment/start_time";
const ELAPSED_SECONDS: &str = "report/elapsed_seconds";
const FEATURE_FILES: &str = ".//feature_files";
const FEATURE_NAMES: &str = ".//feature_file/name";
const FEATURE_COUNTS: &str = ".//feature_file/count";

/// Hit count reported by one scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerResult {
    pub name: String,
    pub count: u64,
}

/// Outcome of summarizing an extraction directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "report", rename_all = "snake_case")]
pub enum SummaryReport {
    /// The extractor succeeded but wrote no `report.xml`.
    Unavailable,
    Generated(Report),
}

impl SummaryReport {
    pub fn summary(&self) -> &str {
        match self {
            Self::Unavailable => REPORT_UNAVAILABLE,
            Self::Generated(report) => &report.summary,
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            Self::Unavailable => Priority::default(),
            Self::Generated(report) => report.priority,
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Unavailable => None,
            Self::Generated(report) => Some(report),
        }
    }

    pub fn to_markdown(&self) -> String {
        match self {
            Self::Unavailable => REPORT_UNAVAILABLE.to_string(),
            Self::Generated(report) => report.to_markdown(),
        }
    }
}

/// Summarize the `report.xml` inside an extraction output directory.
///
/// A missing `report.xml` is not an error; it yields
/// [`SummaryReport::Unavailable`]. A report that exists but cannot be
/// parsed, or holds a non-numeric count, is.
pub fn generate_summary_report(output_dir: &Path) -> ReportResult<SummaryReport> {
    let report_path = output_dir.join(REPORT_XML);

    let contents = match fs::read_to_string(&report_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %report_path.display(), "report.xml not produced");
            return Ok(SummaryReport::Unavailable);
        }
        Err(source) => {
            return Err(ReportError::Io {
                path: report_path,
                source,
            })
        }
    };

    summarize_xml(&contents).map(SummaryReport::Generated)
}

/// Build a report from the text of a `report.xml`.
pub fn summarize_xml(xml: &str) -> ReportResult<Report> {
    let doc = Document::parse(xml)?;
    let mut report = Report::new(REPORT_TITLE);

    report
        .add_section()
        .add_header("Run Summary")
        .add_bullet(format!(
            "Program: {} - {}",
            field_text(&doc, PROGRAM),
            field_text(&doc, VERSION)
        ))
        .add_bullet(format!("Command Line: {}", field_text(&doc, COMMAND_LINE)))
        .add_bullet(format!("Start Time: {}", field_text(&doc, START_TIME)))
        .add_bullet(format!("Elapsed Time: {}", field_text(&doc, ELAPSED_SECONDS)));

    let mut total: u128 = 0;
    let section = report.add_section();

    if XmlPath::new(FEATURE_FILES).first(doc.root_element()).is_some() {
        let mut results = scanner_results(&doc)?;
        total = results.iter().map(|r| u128::from(r.count)).sum();
        sort_by_count(&mut results);

        let mut table = MarkdownTable::new(["Name", "Count"]);
        for result in &results {
            table.add_row(vec![result.name.clone(), result.count.to_string()])?;
        }
        section.add_header("Scanner Results").add_table(table);
    } else {
        section.add_header(NO_FINDINGS);
    }

    report.summary = extracted_summary(total);
    Ok(report)
}

/// Pair every `feature_file/name` with the `feature_file/count` at the same index.
pub fn scanner_results(doc: &Document<'_>) -> ReportResult<Vec<ScannerResult>> {
    let root = doc.root_element();
    let names = XmlPath::new(FEATURE_NAMES).select(root);
    let counts = XmlPath::new(FEATURE_COUNTS).select(root);

    if names.len() != counts.len() {
        tracing::warn!(
            names = names.len(),
            counts = counts.len(),
            "unpaired feature_file entries ignored"
        );
    }

    names
        .into_iter()
        .zip(counts)
        .map(|(name, count)| {
            let name = node_text(name);
            let value = node_text(count);
            match value.trim().parse::<u64>() {
                Ok(count) => Ok(ScannerResult { name, count }),
                Err(_) => Err(ReportError::InvalidCount { name, value }),
            }
        })
        .collect()
}

/// Sort by count, highest first. Equal counts keep their relative order.
pub fn sort_by_count(results: &mut [ScannerResult]) {
    results.sort_by(|a, b| b.count.cmp(&a.count));
}

pub fn extracted_summary(total: u128) -> String {
    format!("{} artifacts have been extracted.", total)
}
