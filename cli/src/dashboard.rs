use crate::engine::{Event, Plugin};

/// The engine's handle on the dashboard integration of a service instance
#[derive(Debug, Clone)]
pub(crate) struct DashboardPlugin {
    pub(crate) frontend_base: String,
    pub(crate) org: String,
    pub(crate) app: String,
    pub(crate) service: String,
    pub(crate) stage: String,
    pub(crate) region: String,
}

impl Plugin for DashboardPlugin {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    fn on_event(&self, event: &Event) {
        if let Event::Finished { command } = event {
            log::info!(
                "Finished `{command}` for {}/{}/{}",
                self.org,
                self.app,
                self.service
            );
        }
    }
}

/// Deep link to the interact view of the deployed service instance
pub(crate) fn interact_url(plugin: &DashboardPlugin) -> String {
    format!(
        "{}/{}/apps/{}/{}/{}/{}/interact",
        plugin.frontend_base.trim_end_matches('/'),
        plugin.org,
        plugin.app,
        plugin.service,
        plugin.stage,
        plugin.region,
    )
}
