#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]

use clap::Parser;
use clashforge::cli::{Args, Command};
use clashforge::generator::{Importer, Rebuilder, Settings};
use tracing::Level;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    let is_verbose = args.verbose;
    tracing_subscriber::fmt()
        .with_max_level(if is_verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = match &args.config {
        Some(location) => {
            tracing::info!("Loading settings from: {}", location);
            Settings::load(location).await?
        }
        None => Settings::default(),
    };

    match args.command {
        Command::Rebuild { input, output } => {
            Rebuilder::new(settings)
                .rebuild_to_file(input.as_deref(), output.as_deref())
                .await?;
            tracing::info!("Rebuild complete!");
        }
        Command::Import { input, output } => {
            let written = Importer::new(settings)
                .import_to_file(input.as_deref(), output.as_deref())
                .await?;
            if written.is_some() {
                tracing::info!("Import complete!");
            }
        }
    }

    Ok(())
}
