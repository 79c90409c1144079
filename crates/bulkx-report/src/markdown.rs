//! Report model rendered as markdown for the task pipeline.
//!
//! A [`Report`] is a title, an ordered list of [`Section`]s and a one-line
//! summary used as the task status. Sections hold an optional header, a
//! bullet list and an optional [`MarkdownTable`].

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};

/// Priority attached to a report for host-side triage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Pipe-delimited markdown table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    /// Create an empty table with the given column headers.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. The row must have one cell per column.
    pub fn add_row(&mut self, row: Vec<String>) -> ReportResult<()> {
        if row.len() != self.columns.len() {
            return Err(ReportError::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Render as markdown, one line per row plus header and separator.
    pub fn to_markdown(&self) -> String {
        let mut out = render_row(&self.columns);
        out.push_str(&render_row(
            &self.columns.iter().map(|_| "---".to_string()).collect::<Vec<_>>(),
        ));
        for row in &self.rows {
            out.push_str(&render_row(row));
        }
        out
    }
}

fn render_row(cells: &[String]) -> String {
    let cells: Vec<String> = cells.iter().map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |\n", cells.join(" | "))
}

/// One section of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub header: Option<String>,
    pub bullets: Vec<String>,
    pub table: Option<MarkdownTable>,
}

impl Section {
    pub fn add_header(&mut self, header: impl Into<String>) -> &mut Self {
        self.header = Some(header.into());
        self
    }

    pub fn add_bullet(&mut self, bullet: impl Into<String>) -> &mut Self {
        self.bullets.push(bullet.into());
        self
    }

    pub fn add_table(&mut self, table: MarkdownTable) -> &mut Self {
        self.table = Some(table);
        self
    }

    /// Render the header, bullets and table as blank-line separated blocks.
    pub fn to_markdown(&self) -> String {
        let mut blocks = Vec::new();

        if let Some(ref header) = self.header {
            blocks.push(format!("## {}\n", header.trim()));
        }
        if !self.bullets.is_empty() {
            blocks.push(self.bullets.iter().map(|b| format!("- {}\n", b)).collect());
        }
        if let Some(ref table) = self.table {
            blocks.push(table.to_markdown());
        }

        blocks.join("\n")
    }
}

/// A titled markdown report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub sections: Vec<Section>,
    /// One-line summary, used as the task status.
    pub summary: String,
    #[serde(default)]
    pub priority: Priority,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
            summary: String::new(),
            priority: Priority::default(),
        }
    }

    /// Append an empty section and return it for filling in.
    pub fn add_section(&mut self) -> &mut Section {
        self.sections.push(Section::default());
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n", self.title);
        for section in &self.sections {
            out.push('\n');
            out.push_str(&section.to_markdown());
        }
        out
    }
}
