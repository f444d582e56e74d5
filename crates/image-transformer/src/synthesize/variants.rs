use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ImageConfig;
use crate::location::ResourceLocation;
use crate::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantType {
    Fallback,
    Webp,
}

impl VariantType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Webp => "webp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeKey {
    /// No sizes configured: the image at its original width.
    Original,
    Width(u32),
}

impl fmt::Display for SizeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("original"),
            Self::Width(width) => write!(f, "{width}"),
        }
    }
}

/// When the `url` flag is forced onto variants, so the loader returns a
/// locator instead of inlining the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlPolicy {
    /// Fallback variants get `url` when webp is enabled or more than one
    /// size/density combination exists.
    #[default]
    FallbackWhenMultiple,
    /// Every variant gets `url` when more than one size/density combination
    /// exists; fallback variants also get it when webp is enabled.
    EveryBranchWhenMultiple,
    /// `url` is never forced.
    Never,
}

impl UrlPolicy {
    pub fn forces_url(self, variant: VariantType, webp: bool, combinations: usize) -> bool {
        let multiple = combinations > 1;
        match self {
            Self::FallbackWhenMultiple => variant == VariantType::Fallback && (webp || multiple),
            Self::EveryBranchWhenMultiple => {
                multiple || (variant == VariantType::Fallback && webp)
            }
            Self::Never => false,
        }
    }
}

type DensityMap = IndexMap<u32, ResourceLocation>;

/// `variant -> size -> density -> location`, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceVariantMap {
    branches: IndexMap<VariantType, IndexMap<SizeKey, DensityMap>>,
}

impl ResourceVariantMap {
    /// Builds every variant of `location` for `config`.
    ///
    /// Each locator's query is the base query, then `webp`, then a forced
    /// `url`, then `width` (size times density) for numeric sizes.
    pub fn build(
        location: &ResourceLocation,
        config: &ImageConfig,
        base: &Query,
        policy: UrlPolicy,
    ) -> Self {
        let webp = config.webp == Some(true);
        let sizes: Vec<SizeKey> = match config.size_buckets() {
            Some(sizes) => sizes.iter().copied().map(SizeKey::Width).collect(),
            None => vec![SizeKey::Original],
        };
        let densities = config.density_list();
        let combinations = sizes.len() * densities.len();

        let variants: &[VariantType] = if webp {
            &[VariantType::Fallback, VariantType::Webp]
        } else {
            &[VariantType::Fallback]
        };

        let mut branches = IndexMap::new();
        for &variant in variants {
            let mut query = base.clone();
            if variant == VariantType::Webp {
                query.insert_flag("webp");
            }
            if policy.forces_url(variant, webp, combinations) {
                query.insert_flag("url");
            }

            let mut by_size = IndexMap::new();
            for &size in &sizes {
                let mut by_density = DensityMap::new();
                for &density in densities {
                    let mut query = query.clone();
                    if let SizeKey::Width(width) = size {
                        query.insert("width", (u64::from(width) * u64::from(density)).to_string());
                    }
                    by_density.insert(density, location.with_query(&query));
                }
                by_size.insert(size, by_density);
            }
            branches.insert(variant, by_size);
        }

        Self { branches }
    }

    pub fn locator_count(&self) -> usize {
        self.branches
            .values()
            .flat_map(IndexMap::values)
            .map(IndexMap::len)
            .sum()
    }

    /// Renders the map as an object literal expression.
    pub fn render(&self) -> String {
        let branches: Vec<String> = self
            .branches
            .iter()
            .map(|(variant, sizes)| {
                let sizes: Vec<String> = sizes
                    .iter()
                    .map(|(size, densities)| {
                        let densities: Vec<String> = densities
                            .iter()
                            .map(|(density, location)| {
                                format!("{density}: {}", location.render_require())
                            })
                            .collect();
                        format!("{size}: {{ {} }}", densities.join(", "))
                    })
                    .collect();
                format!("{}: {{ {} }}", variant.as_str(), sizes.join(", "))
            })
            .collect();
        format!("{{ {} }}", branches.join(", "))
    }
}
