mod deploy;
mod message;
mod progress;
mod runner;
use crate::runner::{Runnable, Runner};
use crate::writer::Writer;
use runner::SetupRunner;
use std::path::PathBuf;

#[derive(clap::Args, Clone)]
pub struct SetupCommand {
    /// Service directory, defaults to the current one
    #[arg(long)]
    service_dir: Option<PathBuf>,

    /// Configuration file name inside the service directory
    #[arg(short, long, default_value = "serverless.yml")]
    config: String,

    /// Stage used for the linked provider lookup
    #[arg(short, long)]
    stage: Option<String>,

    /// Region used for the linked provider lookup
    #[arg(short, long)]
    region: Option<String>,

    /// Comma separated steps the surrounding setup already executed, e.g. awsCredentials
    #[arg(long, value_delimiter = ',')]
    executed: Vec<String>,

    /// Deploy without asking for confirmation
    #[arg(short, long)]
    yes: bool,
}

impl Runnable for SetupCommand {
    fn runner(&self, writer: &Writer) -> impl Runner {
        SetupRunner {
            command: self.clone(),
            writer: writer.clone(),
        }
    }
}
