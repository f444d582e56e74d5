use source_edit::TextEdit;
use tracing::trace;

use super::variants::{ResourceVariantMap, UrlPolicy};
use super::{Tag, MARKER_ATTRIBUTE};
use crate::config::{GlobalConfig, ImageConfig, ARRAY_FIELDS, BOOLEAN_FIELDS};
use crate::error::TransformError;
use crate::query::Query;

/// Attribute selecting a named preset from the global configuration.
pub const TYPE_ATTRIBUTE: &str = "type";

/// Flags that, when set, are merged into the tag's own source reference.
const BASE_FLAGS: [&str; 3] = ["inline", "url", "original"];

/// Builds the variant map for an `Img` tag.
///
/// Settings are merged from the package defaults, the global default, the
/// selected type and finally the tag's own attributes. Settings that came
/// from the global configuration are written back onto the tag.
pub fn rewrite_img(
    tag: &Tag<'_, '_>,
    config: &GlobalConfig,
    policy: UrlPolicy,
) -> Result<Vec<TextEdit>, TransformError> {
    let explicit = explicit_config(tag)?;
    let type_name = tag.attrs.enumerated(TYPE_ATTRIBUTE, config.type_names())?;
    let global = config.layer(type_name.as_deref());
    let merged = ImageConfig::package_defaults()
        .overlay(&global)
        .overlay(&explicit);

    let mut base = Query::new();
    for flag in BASE_FLAGS {
        if merged.boolean(flag) == Some(true) {
            base.insert_flag(flag);
        }
    }

    let mut edits = Vec::with_capacity(2);
    if !base.is_empty() {
        if let Some(span) = tag.source_value_span() {
            let location = tag.location.with_query(&base);
            edits.push(TextEdit::replace(
                span,
                format!("{{{}}}", location.render_require()),
            ));
        }
    }

    let variants = ResourceVariantMap::build(&tag.location, &merged, &base, policy);
    trace!(
        type_name = type_name.as_deref().unwrap_or("default"),
        locators = variants.locator_count(),
        "built variant map"
    );

    let mut attributes = materialized_attributes(tag, &global);
    attributes.push(format!("{MARKER_ATTRIBUTE}={{{}}}", variants.render()));
    edits.push(tag.append(&attributes));
    Ok(edits)
}

/// Settings written on the tag itself.
fn explicit_config(tag: &Tag<'_, '_>) -> Result<ImageConfig, TransformError> {
    let mut config = ImageConfig::default();
    for field in BOOLEAN_FIELDS {
        if let Some(value) = tag.attrs.boolean(field)? {
            config.set_boolean(field, value);
        }
    }
    for field in ARRAY_FIELDS {
        if let Some(value) = tag.attrs.number_array(field)? {
            config.set_array(field, value);
        }
    }
    Ok(config)
}

/// Global settings the tag does not spell out, as attribute text.
fn materialized_attributes(tag: &Tag<'_, '_>, global: &ImageConfig) -> Vec<String> {
    let mut attributes = Vec::new();
    for field in BOOLEAN_FIELDS {
        match global.boolean(field) {
            Some(_) if tag.attrs.has(field) => {}
            Some(true) => attributes.push(field.to_string()),
            Some(false) => attributes.push(format!("{field}={{false}}")),
            None => {}
        }
    }
    for field in ARRAY_FIELDS {
        if tag.attrs.has(field) {
            continue;
        }
        if let Some(values) = global.array(field) {
            let values: Vec<String> = values.iter().map(u32::to_string).collect();
            attributes.push(format!("{field}={{[{}]}}", values.join(", ")));
        }
    }
    attributes
}
