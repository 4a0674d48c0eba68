use super::deploy::DeployStep;
use super::SetupCommand;
use crate::config::build_config;
use crate::credentials::AmbientCredentials;
use crate::engine::command::CommandEngineFactory;
use crate::error::Error;
use crate::project::{ProjectConfiguration, SetupOptions};
use crate::prompt::{AutoConfirm, Prompt, TerminalPrompt};
use crate::runner::Runner;
use crate::wizard::{History, Wizard};
use crate::writer::Writer;
use std::io::{stdout, IsTerminal};
use std::sync::Arc;

pub(crate) struct SetupRunner {
    pub(crate) command: SetupCommand,
    pub(crate) writer: Writer,
}

impl Runner for SetupRunner {
    /// Run the remaining setup steps for the service
    async fn run(&mut self) -> Result<(), Error> {
        let dir = match &self.command.service_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| {
                self.error(
                    Some("Failed to determine current directory"),
                    Some("Please verify you have proper file system permissions."),
                    Some(Box::new(e)),
                )
            })?,
        };

        // No configuration file, no service to set up
        if !dir.join(&self.command.config).is_file() {
            self.writer.text(&format!(
                "{} {} {}\n",
                console::style("No service found").yellow().bold(),
                console::style("in").dim(),
                console::style(dir.to_string_lossy()).bold()
            ))?;

            return Ok(());
        }

        let configuration = ProjectConfiguration::from_path(&dir, &self.command.config)?;
        let config = build_config()?;

        let prompt: Arc<dyn Prompt> = if self.command.yes {
            Arc::new(AutoConfirm)
        } else {
            Arc::new(TerminalPrompt)
        };

        let step = DeployStep {
            credentials: Arc::new(AmbientCredentials::new()?),
            prompt,
            engines: Arc::new(CommandEngineFactory),
            writer: self.writer.clone(),
            cli_name: config.cli_name.clone(),
            is_terminal: stdout().is_terminal(),
        };

        let options = SetupOptions {
            stage: self.command.stage.clone(),
            region: self.command.region.clone(),
        };

        let history: History = self.command.executed.iter().collect();

        Wizard::new(history)
            .with_step(step)
            .run(&configuration, &self.command.config, Some(&dir), &options)
            .await?;

        Ok(())
    }
}
