//! Main entry point for the lockbox CLI.

use clap::Parser;
use lockbox::cli::{run, Cli};

#[tokio::main]
async fn main() {
    lockbox_common::logging::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
