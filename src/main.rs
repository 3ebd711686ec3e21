//! Kodegen Bundler Helm - deterministic Helm bundles for operator components.
//!
//! This binary reads a recipe and writes one bundle directory per component
//! with proper error handling and a per-component summary.

use kodegen_bundler_helm::cli::{self, Args};
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    // RUST_LOG wins; --verbose only changes the default filter
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    // Run CLI and get exit code
    let exit_code = match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
