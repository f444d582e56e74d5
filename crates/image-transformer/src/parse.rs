//! Parsing source files with swc.

use std::sync::Arc;

use camino::Utf8Path;
use source_edit::Span;
use swc_common::{BytePos, FileName, SourceMap, Spanned};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{parse_file_as_module, EsSyntax, Syntax, TsSyntax};

use crate::error::{source_span, TransformError};

/// A parsed module plus the text it was parsed from.
pub struct ParsedModule<'s> {
    pub module: Module,
    pub text: SourceText<'s>,
}

/// Source text of a parsed file, with conversion from swc spans.
///
/// swc positions are global to its `SourceMap`; every span stored by the
/// transformer is relative to the start of the file instead.
///
/// swc drops a leading byte-order mark before assigning positions, so spans
/// are shifted past it to stay aligned with `source`.
#[derive(Clone, Copy)]
pub struct SourceText<'s> {
    source: &'s str,
    start: BytePos,
    bom: u32,
}

const BOM: char = '\u{feff}';

impl<'s> SourceText<'s> {
    pub fn new(source: &'s str, start: BytePos) -> Self {
        let bom = if source.starts_with(BOM) {
            BOM.len_utf8() as u32
        } else {
            0
        };
        Self { source, start, bom }
    }

    #[inline]
    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Converts an swc span to a file-relative span.
    pub fn span(&self, span: swc_common::Span) -> Span {
        Span::new(
            span.lo.0.saturating_sub(self.start.0) + self.bom,
            span.hi.0.saturating_sub(self.start.0) + self.bom,
        )
    }

    pub fn span_of(&self, node: &impl Spanned) -> Span {
        self.span(node.span())
    }

    /// Returns the source text of a node, or an empty string when the span
    /// does not fall inside this file.
    pub fn slice(&self, span: swc_common::Span) -> &'s str {
        self.span(span).slice(self.source).unwrap_or_default()
    }
}

/// Picks the swc syntax from the file extension.
///
/// Files without a recognised TypeScript extension are parsed as JavaScript
/// with JSX.
pub fn syntax_for(filename: Option<&Utf8Path>) -> Syntax {
    match filename.and_then(Utf8Path::extension) {
        Some("ts" | "mts" | "cts") => Syntax::Typescript(TsSyntax {
            tsx: false,
            ..Default::default()
        }),
        Some("tsx") => Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
    }
}

pub fn parse_module<'s>(
    source: &'s str,
    filename: Option<&Utf8Path>,
) -> Result<ParsedModule<'s>, TransformError> {
    let name = filename.map_or_else(|| "<input>".to_string(), |path| path.to_string());
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Custom(name.clone()).into(), source.to_string());
    let text = SourceText::new(source, fm.start_pos);

    let module = parse_file_as_module(
        &fm,
        syntax_for(filename),
        EsVersion::Es2022,
        None,
        &mut Vec::new(),
    )
    .map_err(|err| TransformError::Parse {
        file: name,
        span: source_span(text.span(err.span())),
        message: err.kind().msg().into_owned(),
    })?;

    Ok(ParsedModule { module, text })
}
