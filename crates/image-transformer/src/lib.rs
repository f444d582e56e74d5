//! Build-time rewriting of `react-optimized-image` components.
//!
//! Every `<Img>` and `<Svg>` whose `src` points at a local image is rewritten
//! so the runtime component receives all of its variants up front:
//! - resolving the tag name through imports, `require`, aliases, styled
//!   wrappers and object members, across local modules
//! - merging the tag's attributes with the project's `images.config`
//! - emitting a `rawSrc` attribute with one `require` per variant
//!
//! The output is the input with a small set of text edits applied, so
//! formatting and comments outside the rewritten tags are kept as written.
//!
//! # Example
//!
//! ```
//! use image_transformer::{transform_with_loader, NoopModuleLoader, TransformOptions};
//!
//! let source = r#"
//! import { Svg } from 'react-optimized-image';
//! const icon = <Svg src={require('./icon.svg')} />;
//! "#;
//!
//! let result = transform_with_loader(source, &TransformOptions::default(), &NoopModuleLoader)
//!     .unwrap();
//! assert!(result
//!     .code
//!     .contains("<Svg rawSrc={require('./icon.svg?include')} />"));
//! ```

pub mod analysis;
mod attributes;
mod component;
mod config;
mod error;
mod loader;
mod location;
mod parse;
mod query;
mod resolve;
mod synthesize;
mod transform;

pub use attributes::AttributeReader;
pub use component::{ComponentKind, PACKAGE_NAME, STYLING_PACKAGES};
pub use config::{ConfigError, GlobalConfig, ImageConfig};
pub use error::TransformError;
pub use loader::{FsModuleLoader, ModuleLoader, NoopModuleLoader, MODULE_EXTENSIONS};
pub use location::{LocationShape, ResourceLocation};
pub use parse::{parse_module, syntax_for, ParsedModule, SourceText};
pub use query::{merge_into_path, Query};
pub use resolve::{ResolvedExport, Resolver};
pub use synthesize::{ResourceVariantMap, SizeKey, UrlPolicy, VariantType, MARKER_ATTRIBUTE};
pub use transform::{
    transform, transform_with_loader, RewrittenTag, TransformOptions, TransformResult,
    IMAGE_EXTENSIONS,
};
