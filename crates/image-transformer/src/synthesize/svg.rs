use source_edit::TextEdit;

use super::{Tag, MARKER_ATTRIBUTE};
use crate::query::Query;

/// Query flag asking the loader for inline markup instead of a URL.
pub const INCLUDE_FLAG: &str = "include";

/// Moves the source reference into the marker attribute with the include
/// flag, removing the original source attribute.
pub fn rewrite_svg(tag: &Tag<'_, '_>) -> Vec<TextEdit> {
    let location = tag.location.with_query(&Query::new().with_flag(INCLUDE_FLAG));

    let mut edits = Vec::with_capacity(2);
    if let Some(span) = tag.source_removal_span() {
        edits.push(TextEdit::delete(span));
    }
    edits.push(tag.append(&[format!(
        "{MARKER_ATTRIBUTE}={{{}}}",
        location.render_require()
    )]));
    edits
}
