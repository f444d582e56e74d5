//! Main orchestration logic.

use crate::cli::{Args, OutputFormat};
use crate::output::{Formatter, RunSummary};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image_transformer::{
    transform_with_loader, ConfigError, FsModuleLoader, GlobalConfig, TransformError,
    TransformOptions, TransformResult, MODULE_EXTENSIONS,
};
use miette::Diagnostic;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Driver errors.
#[derive(Debug, Error, Diagnostic)]
pub enum DriverError {
    /// Invalid glob pattern.
    #[error("invalid glob pattern `{pattern}`: {source}")]
    #[diagnostic(code(optimized_image::cli::glob))]
    InvalidGlob {
        pattern: String,
        source: globset::Error,
    },

    /// The image configuration could not be loaded.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// The working directory is not usable.
    #[error("cannot resolve the current directory: {0}")]
    #[diagnostic(code(optimized_image::cli::current_dir))]
    CurrentDir(String),

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    #[diagnostic(code(optimized_image::cli::read))]
    Read { path: Utf8PathBuf, source: io::Error },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    #[diagnostic(code(optimized_image::cli::write))]
    Write { path: Utf8PathBuf, source: io::Error },
}

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    Transformed(TransformResult),
    Failed(TransformError),
    Io(DriverError),
}

/// The result for one file, ready for output.
#[derive(Debug)]
pub struct FileReport {
    /// Path relative to the workspace when possible.
    pub path: Utf8PathBuf,
    pub source: String,
    pub outcome: FileOutcome,
}

/// Transforms every matching file and prints the results.
pub fn run(args: &Args) -> Result<RunSummary, DriverError> {
    let cwd = std::env::current_dir()
        .map_err(|e| DriverError::CurrentDir(e.to_string()))
        .and_then(|dir| {
            Utf8PathBuf::try_from(dir).map_err(|e| DriverError::CurrentDir(e.to_string()))
        })?;
    let workspace = absolute(&cwd, &args.workspace);

    let config = match &args.config {
        Some(path) => GlobalConfig::load_file(&absolute(&cwd, path))?,
        None => GlobalConfig::load(&workspace)?,
    };
    debug!(types = config.types.len(), "loaded image configuration");

    let ignore_set = build_ignore_set(&args.ignore)?;
    let roots: Vec<Utf8PathBuf> = if args.paths.is_empty() {
        vec![workspace.clone()]
    } else {
        args.paths.iter().map(|path| absolute(&cwd, path)).collect()
    };
    let files = discover(&workspace, &roots, &ignore_set);
    debug!(files = files.len(), "discovered source files");

    let base_options = TransformOptions {
        filename: None,
        config: Arc::new(config),
        url_policy: args.url_policy.into(),
    };
    let out_dir = args.out_dir.as_ref().map(|dir| absolute(&cwd, dir));
    let loader = FsModuleLoader::new();

    // Process files in parallel; results keep discovery order.
    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|file| process_file(file, &workspace, args, out_dir.as_deref(), &base_options, &loader))
        .collect();

    let formatter = Formatter::new(args.output);
    let mut summary = RunSummary::default();
    for report in &reports {
        summary.record(report);

        let text = formatter.format(report);
        if !text.is_empty() {
            print!("{text}");
        }
        if args.stdout {
            if let FileOutcome::Transformed(result) = &report.outcome {
                if reports.len() > 1 {
                    println!("==> {} <==", report.path);
                }
                print!("{}", result.code);
            }
        }
    }

    if args.output == OutputFormat::Json {
        eprintln!("{}", summary.format());
    } else {
        println!("{}", summary.format());
    }
    Ok(summary)
}

fn process_file(
    file: &Utf8Path,
    workspace: &Utf8Path,
    args: &Args,
    out_dir: Option<&Utf8Path>,
    base_options: &TransformOptions,
    loader: &FsModuleLoader,
) -> FileReport {
    let path = file.strip_prefix(workspace).unwrap_or(file).to_owned();
    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(source) => {
            return FileReport {
                path,
                source: String::new(),
                outcome: FileOutcome::Io(DriverError::Read {
                    path: file.to_owned(),
                    source,
                }),
            };
        }
    };

    let options = TransformOptions {
        filename: Some(file.to_owned()),
        ..base_options.clone()
    };
    let outcome = match transform_with_loader(&source, &options, loader) {
        Ok(result) => match persist(file, &path, &result, args.write, out_dir) {
            Ok(()) => FileOutcome::Transformed(result),
            Err(err) => FileOutcome::Io(err),
        },
        Err(err) => {
            debug!(%file, error = %err, "transform failed");
            FileOutcome::Failed(err)
        }
    };
    FileReport {
        path,
        source,
        outcome,
    }
}

/// Writes the result in place and/or under `out_dir`.
fn persist(
    file: &Utf8Path,
    relative: &Utf8Path,
    result: &TransformResult,
    write: bool,
    out_dir: Option<&Utf8Path>,
) -> Result<(), DriverError> {
    if write && result.changed() {
        write_file(file, &result.code)?;
    }
    if let Some(out_dir) = out_dir {
        let target = out_dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| DriverError::Write {
                path: parent.to_owned(),
                source,
            })?;
        }
        write_file(&target, &result.code)?;
    }
    Ok(())
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<(), DriverError> {
    fs::write(path, contents).map_err(|source| DriverError::Write {
        path: path.to_owned(),
        source,
    })
}

fn absolute(cwd: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_relative() {
        cwd.join(path)
    } else {
        path.to_owned()
    }
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, DriverError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| DriverError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| DriverError::InvalidGlob {
        pattern: patterns.join(", "),
        source,
    })
}

/// `node_modules` and hidden directories are never entered.
fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name == "node_modules" || name.starts_with('.'))
}

fn has_module_extension(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext))
}

/// Finds source files under `roots`, sorted and deduplicated.
fn discover(workspace: &Utf8Path, roots: &[Utf8PathBuf], ignore_set: &GlobSet) -> Vec<Utf8PathBuf> {
    let mut files = Vec::new();
    for root in roots {
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| !is_skipped_dir(entry));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(path) = Utf8PathBuf::try_from(entry.into_path()) else {
                warn!("skipping non UTF-8 path");
                continue;
            };
            if !has_module_extension(&path) {
                continue;
            }
            let relative = path.strip_prefix(workspace).unwrap_or(path.as_path());
            if ignore_set.is_match(relative.as_str()) {
                continue;
            }
            files.push(path);
        }
    }
    files.sort();
    files.dedup();
    files
}
