//! Loading other modules of the project for cross-file resolution.

use std::fs;
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;

use crate::analysis::ModuleAnalysis;
use crate::parse::parse_module;

/// Extensions tried, in order, when a relative specifier has none.
pub const MODULE_EXTENSIONS: [&str; 6] = ["js", "jsx", "ts", "tsx", "mjs", "cjs"];

/// Returns true for `./x` and `../x` specifiers.
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Provides analysed modules for relative imports.
pub trait ModuleLoader: Send + Sync {
    /// Loads the module `specifier` imported from a file in `importer_dir`.
    fn load(&self, importer_dir: &Utf8Path, specifier: &str) -> Option<Arc<ModuleAnalysis>>;
}

/// A loader that never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopModuleLoader;

impl ModuleLoader for NoopModuleLoader {
    fn load(&self, _importer_dir: &Utf8Path, _specifier: &str) -> Option<Arc<ModuleAnalysis>> {
        None
    }
}

/// Reads modules from disk and caches their analysis by resolved path.
///
/// Misses are cached too, so a missing or unparsable file is only tried once.
#[derive(Debug, Default)]
pub struct FsModuleLoader {
    cache: Mutex<FxHashMap<Utf8PathBuf, Option<Arc<ModuleAnalysis>>>>,
}

impl FsModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a relative specifier to an existing file.
    pub fn resolve_path(importer_dir: &Utf8Path, specifier: &str) -> Option<Utf8PathBuf> {
        let base = importer_dir.join(specifier);
        if base.is_file() {
            return Some(base);
        }
        for ext in MODULE_EXTENSIONS {
            let candidate = Utf8PathBuf::from(format!("{base}.{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        MODULE_EXTENSIONS
            .iter()
            .map(|ext| base.join(format!("index.{ext}")))
            .find(|candidate| candidate.is_file())
    }

    fn analyse(path: &Utf8Path) -> Option<Arc<ModuleAnalysis>> {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(%path, error = %err, "failed to read module");
                return None;
            }
        };
        match parse_module(&source, Some(path)) {
            Ok(parsed) => Some(Arc::new(ModuleAnalysis::build(
                &parsed,
                Some(path.to_owned()),
            ))),
            Err(err) => {
                tracing::debug!(%path, error = %err, "skipping unparsable module");
                None
            }
        }
    }
}

impl ModuleLoader for FsModuleLoader {
    fn load(&self, importer_dir: &Utf8Path, specifier: &str) -> Option<Arc<ModuleAnalysis>> {
        if !is_relative(specifier) {
            return None;
        }
        let Some(path) = Self::resolve_path(importer_dir, specifier) else {
            tracing::debug!(%importer_dir, specifier, "module not found");
            return None;
        };

        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&path) {
                return hit.clone();
            }
        }

        // Parse outside the lock.
        let analysis = Self::analyse(&path);
        if let Ok(mut cache) = self.cache.lock() {
            cache.entry(path).or_insert_with(|| analysis.clone());
        }
        analysis
    }
}
