use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use sharepoint_loader::cli::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides; default keeps our own info-level summaries visible
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,sharepoint_loader=info")),
        )
        .init();

    match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("[Cli] {} ({})", e, e.kind());
            ExitCode::from(2)
        }
    }
}
