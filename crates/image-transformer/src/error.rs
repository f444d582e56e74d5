//! Error types for the transformer.

use miette::{Diagnostic, SourceSpan};
use source_edit::{EditError, LineCol, LineIndex, Span};
use thiserror::Error;

/// A fatal error for one file.
///
/// Every variant that points at source text carries the offending byte range,
/// so callers can render it with [`miette`] or convert it to a line/column.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum TransformError {
    #[error("failed to parse {file}: {message}")]
    #[diagnostic(code(optimized_image::parse))]
    Parse {
        file: String,
        message: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("only static boolean values are allowed for `{attribute}`")]
    #[diagnostic(
        code(optimized_image::static_boolean),
        help("write `{attribute}`, `{attribute}={{true}}` or `{attribute}={{false}}`")
    )]
    StaticBoolean {
        attribute: String,
        #[label("not a boolean literal")]
        span: SourceSpan,
    },

    #[error("only a static array of numbers is allowed for `{attribute}`")]
    #[diagnostic(code(optimized_image::static_number_array))]
    StaticNumberArray {
        attribute: String,
        #[label("expected an array literal")]
        span: SourceSpan,
    },

    #[error("only static number values are allowed in `{attribute}` (element {index})")]
    #[diagnostic(code(optimized_image::static_number))]
    StaticNumber {
        attribute: String,
        index: usize,
        #[label("not a number literal")]
        span: SourceSpan,
    },

    #[error("`{attribute}` element {index} must be a positive integer")]
    #[diagnostic(code(optimized_image::positive_integer))]
    NotPositiveInteger {
        attribute: String,
        index: usize,
        #[label("expected a positive integer")]
        span: SourceSpan,
    },

    #[error("only static string values are allowed for `{attribute}`")]
    #[diagnostic(code(optimized_image::static_string))]
    StaticString {
        attribute: String,
        #[label("not a string literal")]
        span: SourceSpan,
    },

    #[error("type `{name}` not found in images.config")]
    #[diagnostic(
        code(optimized_image::unknown_type),
        help("known types: {known}")
    )]
    UnknownType {
        name: String,
        known: String,
        #[label("unknown type")]
        span: SourceSpan,
    },

    #[error(transparent)]
    #[diagnostic(code(optimized_image::edit))]
    Edit(#[from] EditError),
}

impl TransformError {
    /// Returns the byte range this error points at, if any.
    pub fn span(&self) -> Option<Span> {
        let span = match self {
            Self::Parse { span, .. }
            | Self::StaticBoolean { span, .. }
            | Self::StaticNumberArray { span, .. }
            | Self::StaticNumber { span, .. }
            | Self::NotPositiveInteger { span, .. }
            | Self::StaticString { span, .. }
            | Self::UnknownType { span, .. } => span,
            Self::Edit(_) => return None,
        };
        let start = span.offset() as u32;
        Some(Span::new(start, start + span.len() as u32))
    }

    /// Returns the 0-indexed position of the error in `source`.
    pub fn line_col(&self, source: &str) -> Option<LineCol> {
        LineIndex::new(source).line_col(self.span()?.start)
    }
}

pub(crate) fn source_span(span: Span) -> SourceSpan {
    SourceSpan::from((usize::from(span.start), usize::from(span.len())))
}
