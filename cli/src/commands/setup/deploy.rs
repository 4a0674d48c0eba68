use super::message::StatusMessage;
use super::progress::DeployProgress;
use crate::config::PROVIDER;
use crate::credentials::CredentialSource;
use crate::dashboard::{self, DashboardPlugin};
use crate::engine::{Engine, EngineFactory, EngineOptions};
use crate::error::Error;
use crate::project::{ProjectConfiguration, SetupOptions};
use crate::prompt::Prompt;
use crate::wizard::{History, Step, StepContext};
use crate::writer::Writer;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// The step that sets up the cloud credentials, runs before this one when it runs at all
pub(crate) const AWS_CREDENTIALS_STEP: &str = "awsCredentials";

pub(crate) const DEPLOY_STEP: &str = "deploy";

/// How the deploy step ended
#[derive(Debug, Clone)]
pub(crate) enum DeployOutcome {
    Declined {
        service_name: String,
        is_configured_with_dashboard: bool,
    },
    Completed {
        service_name: String,
        is_configured_with_dashboard: bool,
        dashboard_plugin: Option<Arc<DashboardPlugin>>,
    },
}

/// Offers the first deployment of the freshly scaffolded service
pub(crate) struct DeployStep {
    pub(crate) credentials: Arc<dyn CredentialSource>,
    pub(crate) prompt: Arc<dyn Prompt>,
    pub(crate) engines: Arc<dyn EngineFactory>,
    pub(crate) writer: Writer,
    pub(crate) cli_name: String,

    /// Progress may use transient terminal lines
    pub(crate) is_terminal: bool,
}

impl DeployStep {
    /// Decide whether deploying can be offered at all
    ///
    /// Only reads the session, the single side effect is the linked provider
    /// query, whose failure is returned as is.
    pub(crate) async fn is_applicable(
        &self,
        configuration: &ProjectConfiguration,
        service_dir: Option<&Path>,
        history: &History,
        options: &SetupOptions,
    ) -> eyre::Result<bool> {
        if service_dir.is_none() {
            return Ok(false);
        }

        if configuration.provider_name() != Some(PROVIDER) {
            return Ok(false);
        }

        // The credentials step did not run, so the credentials were already there
        if !history.has(AWS_CREDENTIALS_STEP) {
            return Ok(true);
        }

        if configuration.org().is_some()
            && self.credentials.is_authenticated()
            && self
                .credentials
                .has_linked_provider(configuration, options)
                .await?
        {
            log::debug!("Org has a linked provider");
            return Ok(true);
        }

        Ok(self.credentials.has_local_credentials().await)
    }

    /// Ask for confirmation and deploy through the engine
    ///
    /// An engine failure is reported to the progress renderer and returned unchanged.
    pub(crate) async fn deploy(
        &self,
        configuration: &ProjectConfiguration,
        configuration_filename: &str,
        service_dir: &Path,
    ) -> eyre::Result<DeployOutcome> {
        let service_name = configuration.service_name().to_string();
        let is_configured_with_dashboard = configuration.is_configured_with_dashboard();

        if !self
            .prompt
            .confirm("Do you want to deploy your project?", "shouldDeploy")
            .await?
        {
            let outcome = DeployOutcome::Declined {
                service_name,
                is_configured_with_dashboard,
            };

            self.print(&outcome)?;
            return Ok(outcome);
        }

        let mut engine = self.engines.create(EngineOptions {
            configuration: configuration.clone(),
            service_dir: service_dir.to_path_buf(),
            configuration_filename: configuration_filename.to_string(),
            is_configuration_resolved: true,
            has_resolved_commands_externally: true,
            is_telemetry_reported_externally: true,
            commands: vec![DEPLOY_STEP.to_string()],
            options: HashMap::new(),
            writer: self.writer.clone(),
        })?;

        let mut progress = None;

        if let Err(error) = self
            .drive(engine.as_mut(), &service_name, &mut progress)
            .await
        {
            match progress {
                Some(progress) => progress.handle_error(),

                // Failed before the renderer was registered, nothing else will report it
                None => {
                    if let Err(e) = self.writer.error(&format!(
                        "\n{} `{service_name}` could not be deployed\n",
                        console::style("Error").red().bold()
                    )) {
                        log::error!("Failed to report the deployment error: {e}");
                    }
                }
            }

            return Err(error);
        }

        let outcome = DeployOutcome::Completed {
            service_name,
            is_configured_with_dashboard,
            dashboard_plugin: engine.plugin_manager().dashboard_plugin.clone(),
        };

        self.print(&outcome)?;
        Ok(outcome)
    }

    /// Init and run the engine with its output intercepted
    ///
    /// The progress renderer is registered after `init` (the engine plugins are
    /// loaded by then) and before `run`. The interception is released when this
    /// returns, whatever the result.
    async fn drive(
        &self,
        engine: &mut dyn Engine,
        service_name: &str,
        progress: &mut Option<Arc<DeployProgress>>,
    ) -> eyre::Result<()> {
        let interception = self.writer.intercept()?;
        engine.init().await?;

        let plugin = engine
            .plugin_manager_mut()
            .add_plugin(DeployProgress::new(service_name, self.is_terminal))?;

        plugin.set_original_writer(interception.original());
        *progress = Some(plugin);
        engine.run().await
    }

    fn print(&self, outcome: &DeployOutcome) -> Result<(), Error> {
        let message = match outcome {
            DeployOutcome::Declined {
                service_name,
                is_configured_with_dashboard,
            } => StatusMessage {
                cli_name: &self.cli_name,
                service_name,
                has_been_deployed: false,
                is_configured_with_dashboard: *is_configured_with_dashboard,
                dashboard_url: None,
            },
            DeployOutcome::Completed {
                service_name,
                is_configured_with_dashboard,
                dashboard_plugin,
            } => StatusMessage {
                cli_name: &self.cli_name,
                service_name,
                has_been_deployed: true,
                is_configured_with_dashboard: *is_configured_with_dashboard,
                dashboard_url: dashboard_plugin
                    .as_deref()
                    .map(dashboard::interact_url),
            },
        };

        self.writer.text(&message.render())
    }
}

#[async_trait]
impl Step for DeployStep {
    fn name(&self) -> &'static str {
        DEPLOY_STEP
    }

    async fn is_applicable(&self, context: &StepContext<'_>) -> eyre::Result<bool> {
        DeployStep::is_applicable(
            self,
            context.configuration,
            context.service_dir,
            context.history,
            context.options,
        )
        .await
    }

    async fn run(&self, context: &StepContext<'_>) -> eyre::Result<()> {
        let service_dir = context.service_dir.ok_or_else(|| {
            Error::new(
                "Service directory is not resolved",
                Some("Run the setup from the project directory."),
            )
        })?;

        let outcome = self
            .deploy(context.configuration, context.configuration_filename, service_dir)
            .await?;

        log::info!("Deploy step finished: {outcome:?}");
        Ok(())
    }
}
