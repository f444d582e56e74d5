//! Rewriting qualifying `Img` and `Svg` tags.
//!
//! Each rule turns one tag into a list of [`TextEdit`]s against the original
//! source: the marker attribute is always appended after the last existing
//! attribute, so earlier attributes keep their order and formatting.

mod img;
mod svg;
mod variants;

pub use img::rewrite_img;
pub use svg::rewrite_svg;
pub use variants::{ResourceVariantMap, SizeKey, UrlPolicy, VariantType};

use source_edit::{ByteOffset, Span, TextEdit};
use swc_common::Spanned;
use swc_ecma_ast::{JSXAttrOrSpread, JSXOpeningElement};

use crate::attributes::{attr_name, AttributeReader};
use crate::location::ResourceLocation;
use crate::parse::SourceText;

/// Attribute whose presence marks a tag as already rewritten.
pub const MARKER_ATTRIBUTE: &str = "rawSrc";

/// Attribute holding the primary resource reference.
pub const SOURCE_ATTRIBUTE: &str = "src";

/// A tag that passed classification, with its resolved resource location.
pub struct Tag<'a, 's> {
    pub opening: &'a JSXOpeningElement,
    pub attrs: AttributeReader<'a, 's>,
    pub text: &'a SourceText<'s>,
    pub location: ResourceLocation,
}

impl<'a, 's> Tag<'a, 's> {
    pub fn new(
        opening: &'a JSXOpeningElement,
        text: &'a SourceText<'s>,
        location: ResourceLocation,
    ) -> Self {
        Self {
            opening,
            attrs: AttributeReader::new(opening, text),
            text,
            location,
        }
    }

    /// End of the tag name, or of its type arguments.
    fn name_end(&self) -> ByteOffset {
        match &self.opening.type_args {
            Some(args) => self.text.span(args.span).end,
            None => self.text.span(self.opening.name.span()).end,
        }
    }

    /// Where new attributes go: right after the last attribute.
    fn insertion_point(&self) -> ByteOffset {
        match self.opening.attrs.last() {
            Some(attr) => self.text.span(attr.span()).end,
            None => self.name_end(),
        }
    }

    fn source_index(&self) -> Option<usize> {
        self.opening.attrs.iter().position(|attr| {
            matches!(attr, JSXAttrOrSpread::JSXAttr(attr) if attr_name(attr) == Some(SOURCE_ATTRIBUTE))
        })
    }

    /// Span of the value of the source attribute, `{...}` included.
    fn source_value_span(&self) -> Option<Span> {
        let value = self.attrs.find(SOURCE_ATTRIBUTE)?.value.as_ref()?;
        Some(self.text.span_of(value))
    }

    /// The source attribute plus the whitespace directly before it.
    ///
    /// Comments between the previous attribute and the source attribute are
    /// kept, and so is the line break ending a line comment.
    fn source_removal_span(&self) -> Option<Span> {
        let index = self.source_index()?;
        let lower = match index.checked_sub(1) {
            Some(previous) => self.text.span(self.opening.attrs[previous].span()).end,
            None => self.name_end(),
        };
        let attr = self.text.span(self.opening.attrs[index].span());
        let gap = Span::new(lower, attr.start).slice(self.text.source())?;
        let kept = gap.trim_end();
        let start = if kept.is_empty() {
            u32::from(lower)
        } else {
            let removed = &gap[kept.len()..];
            let line_break = removed.find('\n').map_or(0, |at| at + 1);
            u32::from(lower) + (kept.len() + line_break) as u32
        };
        Some(Span::new(start, attr.end))
    }

    fn append(&self, attributes: &[String]) -> TextEdit {
        let mut text = String::new();
        for attribute in attributes {
            text.push(' ');
            text.push_str(attribute);
        }
        TextEdit::insert(self.insertion_point(), text)
    }
}
