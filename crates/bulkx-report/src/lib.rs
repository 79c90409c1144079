//! bulk_extractor report handling
//!
//! Reads the `report.xml` written by bulk_extractor and turns it into a
//! markdown [`Report`] with a one-line summary for the task status.

pub mod error;
pub mod markdown;
pub mod summary;
pub mod xml;

pub use error::{ReportError, ReportResult};
pub use markdown::{MarkdownTable, Priority, Report, Section};
pub use summary::{
    generate_summary_report, summarize_xml, ScannerResult, SummaryReport, REPORT_UNAVAILABLE,
    REPORT_XML,
};
pub use xml::{field_text, XmlPath, NOT_AVAILABLE};
