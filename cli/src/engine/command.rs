use super::{Engine, EngineFactory, EngineOptions, Event, PluginManager};
use crate::config::build_config;
use crate::dashboard::DashboardPlugin;
use crate::error::Error;
use async_trait::async_trait;
use eyre::{eyre, OptionExt, WrapErr};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Drives the framework executable as a child process
///
/// Each configured command becomes one `<cli> <command>` invocation in the
/// service directory. The child output goes through the engine writer and is
/// dispatched line by line to the plugins.
pub(crate) struct CommandEngine {
    options: EngineOptions,
    cli_name: String,
    frontend_base: String,
    plugins: PluginManager,
}

impl CommandEngine {
    pub(crate) fn new(options: EngineOptions) -> eyre::Result<Self> {
        let config = build_config()?;
        Ok(Self::with_cli(options, &config.cli_name, &config.frontend_base))
    }

    fn with_cli(options: EngineOptions, cli_name: &str, frontend_base: &str) -> Self {
        Self {
            options,
            cli_name: cli_name.to_string(),
            frontend_base: frontend_base.to_string(),
            plugins: PluginManager::default(),
        }
    }

    fn command(&self, name: &str) -> Command {
        let mut command = Command::new(&self.cli_name);
        command.arg(name);

        if self.options.is_configuration_resolved {
            command
                .arg("--config")
                .arg(&self.options.configuration_filename);
        }

        for (key, value) in &self.options.options {
            command.arg(format!("--{key}")).arg(value);
        }

        if self.options.is_telemetry_reported_externally {
            command.env("SLS_TELEMETRY_DISABLED", "1");
        }

        command
            .current_dir(&self.options.service_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        command
    }

    /// Forward one raw output line, bytes that are not UTF-8 are replaced
    fn output(&self, line: &[u8]) -> eyre::Result<()> {
        let decoded = String::from_utf8_lossy(line);
        let line = decoded.strip_suffix('\r').unwrap_or(&decoded);
        self.options.writer.text(&format!("{line}\n"))?;
        self.plugins.emit(&Event::Output(line));
        Ok(())
    }

    async fn execute(&self, name: &str) -> eyre::Result<()> {
        log::info!("Running `{} {name}`", self.cli_name);
        self.plugins.emit(&Event::Started { command: name });

        let mut child = self
            .command(name)
            .spawn()
            .inspect_err(|e| log::error!("Failed to spawn {}: {e:?}", self.cli_name))
            .wrap_err(Error::new(
                &format!("Failed to start `{} {name}`", self.cli_name),
                Some(&format!(
                    "Make sure `{}` is installed and available in PATH.",
                    self.cli_name
                )),
            ))?;

        let mut stdout = BufReader::new(child.stdout.take().ok_or_eyre("Failed to capture stdout")?)
            .split(b'\n');

        let mut stderr = BufReader::new(child.stderr.take().ok_or_eyre("Failed to capture stderr")?)
            .split(b'\n');

        let (mut is_stdout_done, mut is_stderr_done) = (false, false);

        while !(is_stdout_done && is_stderr_done) {
            tokio::select! {
                line = stdout.next_segment(), if !is_stdout_done => match line.wrap_err("Failed to read stdout")? {
                    Some(line) => self.output(&line)?,
                    None => is_stdout_done = true,
                },
                line = stderr.next_segment(), if !is_stderr_done => match line.wrap_err("Failed to read stderr")? {
                    Some(line) => self.output(&line)?,
                    None => is_stderr_done = true,
                },
            }
        }

        let status = child
            .wait()
            .await
            .wrap_err("Command failed to complete")?;

        if !status.success() {
            log::error!("`{} {name}` exited with {status}", self.cli_name);
            return Err(eyre!("`{} {name}` failed ({status})", self.cli_name));
        }

        self.plugins.emit(&Event::Finished { command: name });
        Ok(())
    }
}

#[async_trait]
impl Engine for CommandEngine {
    async fn init(&mut self) -> eyre::Result<()> {
        if !self.options.service_dir.is_dir() {
            return Err(Error::new(
                &format!(
                    "Service directory {} does not exist",
                    self.options.service_dir.display()
                ),
                None,
            )
            .into());
        }

        log::debug!(
            "Engine flags: resolved config {}, external commands {}, external telemetry {}",
            self.options.is_configuration_resolved,
            self.options.has_resolved_commands_externally,
            self.options.is_telemetry_reported_externally,
        );

        let configuration = &self.options.configuration;

        if let Some(org) = configuration.org() {
            let options = Default::default();

            self.plugins.register_dashboard(DashboardPlugin {
                frontend_base: self.frontend_base.clone(),
                org: org.to_string(),
                app: configuration.app().to_string(),
                service: configuration.service_name().to_string(),
                stage: configuration.stage(&options),
                region: configuration.region(&options),
            });
        }

        self.plugins.load();
        log::debug!("Engine loaded {} plugins", self.plugins.plugins().len());
        Ok(())
    }

    async fn run(&mut self) -> eyre::Result<()> {
        if !self.plugins.is_loaded() {
            return Err(eyre!("Engine must be initialized before running"));
        }

        for name in &self.options.commands {
            self.execute(name).await?;
        }

        Ok(())
    }

    fn plugin_manager(&self) -> &PluginManager {
        &self.plugins
    }

    fn plugin_manager_mut(&mut self) -> &mut PluginManager {
        &mut self.plugins
    }
}

pub(crate) struct CommandEngineFactory;

impl EngineFactory for CommandEngineFactory {
    fn create(&self, options: EngineOptions) -> eyre::Result<Box<dyn Engine>> {
        Ok(Box::new(CommandEngine::new(options)?))
    }
}
