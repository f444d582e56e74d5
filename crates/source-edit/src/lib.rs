//! Source positions and text edits for optimized-image.
//!
//! The transformer never re-prints the syntax tree. Instead it records
//! [`TextEdit`]s against byte spans of the original file and splices them in
//! one pass, which keeps untouched formatting and comments byte for byte.
//! Applying an [`EditSet`] also yields an [`OffsetMap`] that maps positions in
//! the rewritten output back to the input.

mod edit;
mod line_index;
mod offset_map;
mod span;

pub use edit::{Applied, EditError, EditSet, TextEdit};
pub use line_index::{LineCol, LineIndex};
pub use offset_map::{OffsetMap, Segment};
pub use span::{ByteOffset, Span};
