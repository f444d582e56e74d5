//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueEnum};
use image_transformer::UrlPolicy;

/// Rewrites react-optimized-image `Img` and `Svg` tags with their image variants.
#[derive(Debug, Parser)]
#[command(name = "optimized-image")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Files or directories to transform (defaults to the workspace)
    pub paths: Vec<Utf8PathBuf>,

    /// Project root; images.config is looked up here
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Path to images.config.json or images.config.js
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Write transformed files here, mirroring their workspace-relative paths
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Rewrite changed files in place
    #[arg(long)]
    pub write: bool,

    /// Print the transformed code of every file
    #[arg(long)]
    pub stdout: bool,

    /// Glob patterns to ignore, relative to the workspace
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// When fallback variants are forced to return a URL
    #[arg(long = "url-policy", value_enum, default_value = "fallback-when-multiple")]
    pub url_policy: UrlPolicyArg,

    /// Exit with status 1 when a file fails to transform
    #[arg(long = "fail-on-error", default_value_t = true, action = ArgAction::Set)]
    pub fail_on_error: bool,

    /// Log resolution details to stderr
    #[arg(long, short)]
    pub verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per rewritten tag, errors as reports (default)
    #[default]
    Human,
    /// One JSON object per file
    Json,
}

/// Url forcing policy.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum UrlPolicyArg {
    /// Only fallback variants, when there is more than one variant (default)
    #[default]
    FallbackWhenMultiple,
    /// Every variant, when there is more than one size or density
    EveryBranchWhenMultiple,
    /// Never
    Never,
}

impl From<UrlPolicyArg> for UrlPolicy {
    fn from(arg: UrlPolicyArg) -> Self {
        match arg {
            UrlPolicyArg::FallbackWhenMultiple => UrlPolicy::FallbackWhenMultiple,
            UrlPolicyArg::EveryBranchWhenMultiple => UrlPolicy::EveryBranchWhenMultiple,
            UrlPolicyArg::Never => UrlPolicy::Never,
        }
    }
}
