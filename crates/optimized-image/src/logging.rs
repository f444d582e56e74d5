//! Diagnostic logging to stderr.
//!
//! Nothing is installed unless `OPTIMIZED_IMAGE_LOG` or `RUST_LOG` is set, or
//! `--verbose` is passed. `OPTIMIZED_IMAGE_LOG` takes precedence and uses the
//! `RUST_LOG` syntax, e.g. `image_transformer::resolve=trace`.

use std::env;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "OPTIMIZED_IMAGE_LOG";

/// Filter used by `--verbose` when no environment filter is set.
const VERBOSE_FILTER: &str = "image_transformer=debug,optimized_image=debug";

/// Installs the global subscriber when logging was requested.
pub fn init(verbose: bool) {
    let Some(filter) = build_filter(
        env::var(LOG_ENV).ok(),
        env::var("RUST_LOG").ok(),
        verbose,
    ) else {
        return;
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(err) = installed {
        eprintln!("failed to initialise logging: {err}");
    }
}

fn build_filter(
    own: Option<String>,
    rust_log: Option<String>,
    verbose: bool,
) -> Option<EnvFilter> {
    match (own, rust_log) {
        (Some(directives), _) | (None, Some(directives)) => {
            Some(EnvFilter::builder().parse_lossy(directives))
        }
        (None, None) if verbose => Some(EnvFilter::new(VERBOSE_FILTER)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        assert!(build_filter(None, None, false).is_none());
    }

    #[test]
    fn test_verbose_filter() {
        let filter = build_filter(None, None, true).unwrap();
        assert!(filter.to_string().contains("image_transformer=debug"));
    }

    #[test]
    fn test_own_variable_wins() {
        let filter = build_filter(Some("trace".into()), Some("warn".into()), false).unwrap();
        assert_eq!(filter.to_string(), "trace");

        let filter = build_filter(None, Some("warn".into()), true).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }
}
