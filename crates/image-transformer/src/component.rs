//! Deciding whether a resolved export is one of the tracked components.

use std::fmt;

use serde::Serialize;

use crate::resolve::ResolvedExport;

/// The package whose components are rewritten.
pub const PACKAGE_NAME: &str = "react-optimized-image";

/// Packages whose default export wraps a component without changing its identity.
pub const STYLING_PACKAGES: [&str; 2] = ["styled-components", "@emotion/styled"];

/// Returns true if `specifier` is `package` or a path inside it.
pub fn is_module(specifier: &str, package: &str) -> bool {
    specifier == package
        || specifier
            .strip_prefix(package)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn is_styling_package(specifier: &str) -> bool {
    STYLING_PACKAGES
        .iter()
        .any(|package| is_module(specifier, package))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComponentKind {
    Img,
    Svg,
    None,
}

impl ComponentKind {
    pub fn classify(export: &ResolvedExport) -> Self {
        if !is_module(&export.module, PACKAGE_NAME) {
            return Self::None;
        }
        if export.export != "default" {
            return Self::from_name(&export.export);
        }

        // `react-optimized-image/lib/components/Svg` default-exports Svg.
        match export.module.rsplit_once("/components/") {
            Some((_, component)) => Self::from_name(component),
            None => Self::Img,
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "Img" => Self::Img,
            "Svg" => Self::Svg,
            _ => Self::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Img => "Img",
            Self::Svg => "Svg",
            Self::None => "None",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
