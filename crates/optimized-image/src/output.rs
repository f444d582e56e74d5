//! Output formatting.

use crate::cli::OutputFormat;
use crate::orchestrator::{FileOutcome, FileReport};
use image_transformer::{ComponentKind, TransformError};
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, Report};
use serde::Serialize;
use source_edit::{ByteOffset, LineCol, LineIndex};

/// A position in the source.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// Byte offset.
    pub offset: u32,
}

impl Position {
    fn at(index: &LineIndex, offset: ByteOffset) -> Self {
        let start = index.line_col(offset).unwrap_or(LineCol::new(0, 0));
        Self {
            line: start.line + 1,
            column: start.col + 1,
            offset: u32::from(offset),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonTag {
    kind: ComponentKind,
    start: Position,
    end: Position,
}

#[derive(Debug, Serialize)]
struct JsonError {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<Position>,
}

/// One line of JSON output.
#[derive(Debug, Serialize)]
struct JsonFile<'a> {
    filename: &'a str,
    changed: bool,
    tags: Vec<JsonTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

/// Formats file reports for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the report of one file.
    pub fn format(&self, report: &FileReport) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(report),
            OutputFormat::Json => self.format_json(report),
        }
    }

    /// One `file:line:col Kind` line per rewritten tag; failures as reports.
    fn format_human(&self, report: &FileReport) -> String {
        let mut output = String::new();
        match &report.outcome {
            FileOutcome::Transformed(result) => {
                let index = LineIndex::new(&report.source);
                for tag in &result.tags {
                    let start = Position::at(&index, tag.span.start);
                    output.push_str(&format!(
                        "{}:{}:{} {}\n",
                        report.path, start.line, start.column, tag.kind
                    ));
                }
            }
            FileOutcome::Failed(err) => {
                output.push_str(&render_report(report, err));
            }
            FileOutcome::Io(err) => {
                output.push_str(&format!("error: {err}\n"));
            }
        }
        output
    }

    fn format_json(&self, report: &FileReport) -> String {
        let index = LineIndex::new(&report.source);
        let (tags, error) = match &report.outcome {
            FileOutcome::Transformed(result) => (
                result
                    .tags
                    .iter()
                    .map(|tag| JsonTag {
                        kind: tag.kind,
                        start: Position::at(&index, tag.span.start),
                        end: Position::at(&index, tag.span.end),
                    })
                    .collect(),
                None,
            ),
            FileOutcome::Failed(err) => (
                Vec::new(),
                Some(JsonError {
                    message: err.to_string(),
                    code: err.code().map(|code| code.to_string()),
                    start: err.span().map(|span| Position::at(&index, span.start)),
                }),
            ),
            FileOutcome::Io(err) => (
                Vec::new(),
                Some(JsonError {
                    message: err.to_string(),
                    code: err.code().map(|code| code.to_string()),
                    start: None,
                }),
            ),
        };

        let file = JsonFile {
            filename: report.path.as_str(),
            changed: !tags.is_empty(),
            tags,
            error,
        };
        let mut line = serde_json::to_string(&file).unwrap_or_default();
        line.push('\n');
        line
    }
}

/// Renders a transform error with the offending source.
fn render_report(report: &FileReport, err: &TransformError) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let diagnostic = Report::new(err.clone()).with_source_code(NamedSource::new(
        report.path.as_str(),
        report.source.clone(),
    ));

    let mut buf = String::new();
    if handler.render_report(&mut buf, diagnostic.as_ref()).is_err() {
        buf = format!("{}: {err}\n", report.path);
    }
    buf
}

/// Totals of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of files processed.
    pub file_count: usize,
    /// Number of files with at least one rewritten tag.
    pub changed_count: usize,
    /// Number of rewritten tags.
    pub tag_count: usize,
    /// Number of files that failed.
    pub error_count: usize,
}

impl RunSummary {
    pub fn record(&mut self, report: &FileReport) {
        self.file_count += 1;
        match &report.outcome {
            FileOutcome::Transformed(result) => {
                self.tag_count += result.tags.len();
                if result.changed() {
                    self.changed_count += 1;
                }
            }
            FileOutcome::Failed(_) | FileOutcome::Io(_) => self.error_count += 1,
        }
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        let plural = |count: usize, word: &str| {
            if count == 1 {
                format!("{count} {word}")
            } else {
                format!("{count} {word}s")
            }
        };
        format!(
            "optimized-image rewrote {} in {} of {} and found {}",
            plural(self.tag_count, "tag"),
            plural(self.changed_count, "file"),
            plural(self.file_count, "file"),
            plural(self.error_count, "error"),
        )
    }
}
