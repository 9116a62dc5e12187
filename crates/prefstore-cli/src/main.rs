//! Prefstore CLI
//!
//! Reads and edits the JSON document of one storage scope from the shell.
//!
//! ```bash
//! prefstore set sidebar '{"width":320}'
//! prefstore --cluster minikube dump
//! ```

mod args;
mod router;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let manager = router::build_manager(&cli)?;
    manager.initialize().await;

    let output = router::execute(&manager, &cli.command).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
