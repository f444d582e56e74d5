//! optimized-image: rewrites react-optimized-image components ahead of bundling.

mod cli;
mod logging;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::Result;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let summary = orchestrator::run(&args)?;
    if summary.error_count > 0 && args.fail_on_error {
        std::process::exit(1);
    }
    Ok(())
}
