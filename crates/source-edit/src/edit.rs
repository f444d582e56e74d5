//! Ordered text edits spliced into a source string.

use text_size::TextSize;
use thiserror::Error;

use crate::offset_map::OffsetMapBuilder;
use crate::{OffsetMap, Span};

/// Replaces the bytes covered by `span` with `text`.
///
/// An empty span is an insertion, empty text a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Span,
    pub text: String,
}

impl TextEdit {
    pub fn insert(at: impl Into<TextSize>, text: impl Into<String>) -> Self {
        Self {
            span: Span::empty(at),
            text: text.into(),
        }
    }

    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }

    pub fn delete(span: Span) -> Self {
        Self {
            span,
            text: String::new(),
        }
    }
}

/// Errors raised while applying edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit at {} overlaps edit at {}", range_label(.second), range_label(.first))]
    Overlap { first: Span, second: Span },

    #[error("edit at {} is outside the source ({len} bytes)", range_label(.span))]
    OutOfBounds { span: Span, len: usize },
}

fn range_label(span: &Span) -> String {
    format!("{}..{}", u32::from(span.start), u32::from(span.end))
}

/// The rewritten text together with its mapping back to the input.
#[derive(Debug, Clone)]
pub struct Applied {
    pub code: String,
    pub offsets: OffsetMap,
}

/// A set of edits against one source string.
///
/// Edits may be pushed in any order. Insertions at the same offset keep the
/// order they were pushed in.
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    edits: Vec<TextEdit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edit: TextEdit) {
        self.edits.push(edit);
    }

    pub fn extend(&mut self, edits: impl IntoIterator<Item = TextEdit>) {
        self.edits.extend(edits);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextEdit> {
        self.edits.iter()
    }

    /// Splices every edit into `source`.
    pub fn apply(&self, source: &str) -> Result<Applied, EditError> {
        let mut ordered: Vec<&TextEdit> = self.edits.iter().collect();
        // Stable: same-offset insertions keep push order.
        ordered.sort_by_key(|edit| (edit.span.start, edit.span.end));

        let mut code = String::with_capacity(source.len());
        let mut offsets = OffsetMapBuilder::default();
        let mut cursor = 0usize;
        let mut previous: Option<Span> = None;

        for edit in ordered {
            let range = edit.span.range();
            if range.end > source.len()
                || !source.is_char_boundary(range.start)
                || !source.is_char_boundary(range.end)
            {
                return Err(EditError::OutOfBounds {
                    span: edit.span,
                    len: source.len(),
                });
            }
            if let Some(first) = previous {
                if first.overlaps(edit.span) || usize::from(first.end) > range.start {
                    return Err(EditError::Overlap {
                        first,
                        second: edit.span,
                    });
                }
            }

            if cursor < range.start {
                offsets.copied(cursor, &source[cursor..range.start]);
                code.push_str(&source[cursor..range.start]);
            }
            offsets.replaced(edit.span, &edit.text);
            code.push_str(&edit.text);

            cursor = cursor.max(range.end);
            previous = Some(edit.span);
        }

        if cursor < source.len() {
            offsets.copied(cursor, &source[cursor..]);
            code.push_str(&source[cursor..]);
        }

        Ok(Applied {
            code,
            offsets: offsets.build(),
        })
    }
}
