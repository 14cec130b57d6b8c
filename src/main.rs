mod cli;
mod model;
mod orchestrator;
mod personas;
mod service;
mod session;
mod text_summary;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_json = args.json;

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 for scripted JSON usage
            if is_json {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
