mod client;
mod commands;
mod config;
mod credentials;
mod dashboard;
mod engine;
mod error;
mod logger;
mod project;
mod prompt;
mod runner;
mod wizard;
mod writer;
use crate::commands::Commands;
use crate::logger::Logger;
use crate::runner::{Runnable, Runner};
use crate::writer::Writer;
use clap::Parser;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Derive a runner from the command and run it
async fn run(command: impl Runnable, writer: &Writer) -> bool {
    let result = command.runner(writer).run().await;

    if let Err(error) = &result {
        log::error!("Command failed: {}", error.message());
        let output = format!("\n{}\n{error}\n", console::style("Error").red().bold());

        if writer.error(&output).is_err() {
            log::error!("Failed to display the error: {error}");
        }
    }

    result.is_ok()
}

#[tokio::main]
async fn main() {
    Logger::init();
    let writer = Writer::stdio();

    // Match all commands here, in one place
    let is_success = match Cli::parse().command {
        Commands::Setup(cmd) => run(cmd, &writer).await,
    };

    if !is_success {
        std::process::exit(1);
    }
}
