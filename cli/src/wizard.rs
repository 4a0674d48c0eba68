use crate::project::{ProjectConfiguration, SetupOptions};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

/// Steps already executed in this setup session
///
/// Append-only, only the wizard records steps.
#[derive(Debug, Default, Clone)]
pub(crate) struct History(HashSet<String>);

impl History {
    pub(crate) fn has(&self, step: &str) -> bool {
        self.0.contains(step)
    }

    pub(crate) fn record(&mut self, step: &str) {
        self.0.insert(step.to_string());
    }
}

impl<S: Into<String>> FromIterator<S> for History {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        History(iter.into_iter().map(Into::into).collect())
    }
}

/// Read-only view of the session handed to every step
pub(crate) struct StepContext<'a> {
    pub(crate) configuration: &'a ProjectConfiguration,
    pub(crate) configuration_filename: &'a str,
    pub(crate) service_dir: Option<&'a Path>,
    pub(crate) history: &'a History,
    pub(crate) options: &'a SetupOptions,
}

/// One stage of the interactive setup
#[async_trait]
pub(crate) trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the step should run in the current session
    async fn is_applicable(&self, context: &StepContext<'_>) -> eyre::Result<bool>;

    async fn run(&self, context: &StepContext<'_>) -> eyre::Result<()>;
}

/// Runs the steps strictly one after another
pub(crate) struct Wizard {
    steps: Vec<Box<dyn Step>>,
    history: History,
}

impl Wizard {
    pub(crate) fn new(history: History) -> Self {
        Self {
            steps: Vec::new(),
            history,
        }
    }

    pub(crate) fn with_step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Evaluate and run every applicable step
    ///
    /// A failed evaluation aborts the whole setup, the step is neither run nor skipped.
    pub(crate) async fn run(
        &mut self,
        configuration: &ProjectConfiguration,
        configuration_filename: &str,
        service_dir: Option<&Path>,
        options: &SetupOptions,
    ) -> eyre::Result<&History> {
        for step in &self.steps {
            let context = StepContext {
                configuration,
                configuration_filename,
                service_dir,
                history: &self.history,
                options,
            };

            if !step.is_applicable(&context).await? {
                log::info!("Skipping step {}", step.name());
                continue;
            }

            log::info!("Running step {}", step.name());
            step.run(&context).await?;
            self.history.record(step.name());
        }

        Ok(&self.history)
    }
}
