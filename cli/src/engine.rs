pub(crate) mod command;
use crate::dashboard::DashboardPlugin;
use crate::error::Error;
use crate::project::ProjectConfiguration;
use crate::writer::Writer;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Lifecycle notifications dispatched to the registered plugins
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event<'a> {
    Started { command: &'a str },
    Output(&'a str),
    Finished { command: &'a str },
}

pub(crate) trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_event(&self, _event: &Event) {}
}

/// Plugins of a single engine instance
///
/// The engine registers its own plugins while initializing and then marks the
/// manager as loaded. External plugins are accepted only after that.
#[derive(Default)]
pub(crate) struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
    is_loaded: bool,

    /// Named handle on the dashboard integration, set when the project has an org
    pub(crate) dashboard_plugin: Option<Arc<DashboardPlugin>>,
}

impl PluginManager {
    /// Register one of the engine's own plugins
    pub(crate) fn register<P: Plugin + 'static>(&mut self, plugin: P) -> Arc<P> {
        let plugin = Arc::new(plugin);
        log::debug!("Registered plugin: {}", plugin.name());
        self.plugins.push(plugin.clone());
        plugin
    }

    pub(crate) fn register_dashboard(&mut self, plugin: DashboardPlugin) {
        self.dashboard_plugin = Some(self.register(plugin));
    }

    /// Engine plugins are in place
    pub(crate) fn load(&mut self) {
        self.is_loaded = true;
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    /// Add an external plugin and return the handle on the registered instance
    pub(crate) fn add_plugin<P: Plugin + 'static>(&mut self, plugin: P) -> Result<Arc<P>, Error> {
        if !self.is_loaded {
            log::error!("Plugin {} added before the engine init", plugin.name());

            return Err(Error::new(
                "Engine is not initialized",
                Some("Plugins can only be added after the engine has loaded its own."),
            ));
        }

        Ok(self.register(plugin))
    }

    pub(crate) fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub(crate) fn emit(&self, event: &Event) {
        for plugin in &self.plugins {
            plugin.on_event(event);
        }
    }
}

/// Everything an engine needs to run commands for an already resolved service
pub(crate) struct EngineOptions {
    pub(crate) configuration: ProjectConfiguration,
    pub(crate) service_dir: PathBuf,
    pub(crate) configuration_filename: String,

    /// Do not resolve the configuration again
    pub(crate) is_configuration_resolved: bool,

    /// Commands are already parsed, do not read them from argv
    pub(crate) has_resolved_commands_externally: bool,

    /// The caller reports telemetry, the engine should not
    pub(crate) is_telemetry_reported_externally: bool,

    pub(crate) commands: Vec<String>,
    pub(crate) options: HashMap<String, String>,

    /// Primary output, engine writes go here
    pub(crate) writer: Writer,
}

/// The deployment orchestration engine
#[async_trait]
pub(crate) trait Engine: Send {
    /// Load the engine plugins, must be called once before `run`
    async fn init(&mut self) -> eyre::Result<()>;

    /// Execute the configured commands
    async fn run(&mut self) -> eyre::Result<()>;

    fn plugin_manager(&self) -> &PluginManager;

    fn plugin_manager_mut(&mut self) -> &mut PluginManager;
}

pub(crate) trait EngineFactory: Send + Sync {
    fn create(&self, options: EngineOptions) -> eyre::Result<Box<dyn Engine>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Plugin for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn on_event(&self, event: &Event) {
            self.events.lock().unwrap().push(format!("{event:?}"));
        }
    }

    #[test]
    fn refuses_plugins_before_load() {
        let mut manager = PluginManager::default();
        assert!(manager.add_plugin(Recorder::default()).is_err());
        assert!(manager.plugins().is_empty());

        manager.load();
        assert!(manager.add_plugin(Recorder::default()).is_ok());
        assert_eq!(manager.plugins().len(), 1);
    }

    #[test]
    fn returns_the_registered_instance() {
        let mut manager = PluginManager::default();
        manager.load();
        let recorder = manager.add_plugin(Recorder::default()).unwrap();
        manager.emit(&Event::Output("hello"));

        assert_eq!(
            recorder.events.lock().unwrap().as_slice(),
            [r#"Output("hello")"#]
        );
    }
}
