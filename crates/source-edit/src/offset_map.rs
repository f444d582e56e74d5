//! Mapping from rewritten output offsets back to the input.

use text_size::TextSize;

use crate::{ByteOffset, Span};

/// One contiguous piece of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub generated: Span,
    pub original: Span,
    /// True when the text was copied unchanged, so offsets inside it map 1:1.
    pub verbatim: bool,
}

/// Ordered output segments produced by [`EditSet::apply`](crate::EditSet::apply).
#[derive(Debug, Clone, Default)]
pub struct OffsetMap {
    segments: Vec<Segment>,
}

impl OffsetMap {
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Maps an output offset to the input.
    ///
    /// Offsets inside copied text map exactly; offsets inside inserted or
    /// replacing text map to the start of the span they replaced.
    pub fn original_offset(&self, generated: ByteOffset) -> Option<ByteOffset> {
        let idx = match self
            .segments
            .binary_search_by(|segment| segment.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.checked_sub(1)?,
        };
        let segment = self.segments.get(idx)?;
        if generated >= segment.generated.end {
            return None;
        }

        if segment.verbatim {
            Some(segment.original.start + (generated - segment.generated.start))
        } else {
            Some(segment.original.start)
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct OffsetMapBuilder {
    segments: Vec<Segment>,
    generated: ByteOffset,
}

impl OffsetMapBuilder {
    pub(crate) fn copied(&mut self, original_start: usize, text: &str) {
        let len = TextSize::from(text.len() as u32);
        let start = TextSize::from(original_start as u32);
        self.push(Span::new(start, start + len), len, true);
    }

    pub(crate) fn replaced(&mut self, original: Span, text: &str) {
        self.push(original, TextSize::from(text.len() as u32), false);
    }

    fn push(&mut self, original: Span, len: TextSize, verbatim: bool) {
        if len == TextSize::from(0) {
            return;
        }
        let generated = Span::new(self.generated, self.generated + len);
        self.segments.push(Segment {
            generated,
            original,
            verbatim,
        });
        self.generated = generated.end;
    }

    pub(crate) fn build(self) -> OffsetMap {
        OffsetMap {
            segments: self.segments,
        }
    }
}
