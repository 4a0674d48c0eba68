use crate::error::Error;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

const DEFAULT_STAGE: &str = "dev";
const DEFAULT_REGION: &str = "us-east-1";

/// Options passed to the setup on the command line
#[derive(Debug, Clone, Default)]
pub(crate) struct SetupOptions {
    pub(crate) stage: Option<String>,
    pub(crate) region: Option<String>,
}

/// The service name, either `service: foo` or the legacy `service: { name: foo }`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum Service {
    Name(String),
    Object { name: String },
}

/// Either a flat `provider: aws` or a `provider: { name: aws, ... }` table
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum Provider {
    Name(String),
    Settings(ProviderSettings),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub(crate) struct ProviderSettings {
    pub(crate) name: Option<String>,
    pub(crate) stage: Option<String>,
    pub(crate) region: Option<String>,

    /// Provider specific settings, not interpreted here
    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}

/// Resolved project descriptor, as scaffolded in the service directory
#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct ProjectConfiguration {
    pub(crate) service: Service,
    pub(crate) provider: Option<Provider>,
    pub(crate) org: Option<String>,
    pub(crate) app: Option<String>,

    #[serde(flatten)]
    pub(crate) other: Map<String, Value>,
}

impl ProjectConfiguration {
    /// Read the configuration file from the service directory
    ///
    /// YAML is the default format, `.json` files are parsed as JSON.
    pub(crate) fn from_path(service_dir: &Path, filename: &str) -> eyre::Result<Self> {
        let path = service_dir.join(filename);

        let content = std::fs::read_to_string(&path)
            .inspect_err(|e| log::error!("Can't read {}: {e:?}", path.display()))
            .wrap_err(Error::new(
                &format!("Failed to read {}", path.display()),
                Some("Make sure the service directory contains the configuration file."),
            ))?;

        let error = || {
            Error::new(
                &format!("Failed to parse {filename}"),
                Some("Check the configuration syntax and try again."),
            )
        };

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .inspect_err(|e| log::error!("{e:?}"))
                .wrap_err_with(error),
            Some("yml" | "yaml") => serde_saphyr::from_str(&content)
                .inspect_err(|e| log::error!("{e:?}"))
                .wrap_err_with(error),
            _ => Err(Error::new(
                &format!("Unsupported configuration format: {filename}"),
                Some("Use serverless.yml, serverless.yaml or serverless.json."),
            )
            .into()),
        }
    }

    pub(crate) fn service_name(&self) -> &str {
        match &self.service {
            Service::Name(name) => name,
            Service::Object { name } => name,
        }
    }

    /// Provider name in either of the supported shapes
    pub(crate) fn provider_name(&self) -> Option<&str> {
        match self.provider.as_ref()? {
            Provider::Name(name) => Some(name),
            Provider::Settings(settings) => settings.name.as_deref(),
        }
    }

    /// Organization the project is linked to in the dashboard, empty values are ignored
    pub(crate) fn org(&self) -> Option<&str> {
        self.org.as_deref().filter(|org| !org.is_empty())
    }

    pub(crate) fn is_configured_with_dashboard(&self) -> bool {
        self.org().is_some()
    }

    /// App name in the dashboard, defaults to the service name
    pub(crate) fn app(&self) -> &str {
        self.app
            .as_deref()
            .filter(|app| !app.is_empty())
            .unwrap_or_else(|| self.service_name())
    }

    /// CLI option, then the provider settings, then the framework default
    pub(crate) fn stage(&self, options: &SetupOptions) -> String {
        options
            .stage
            .clone()
            .or_else(|| self.settings().and_then(|s| s.stage.clone()))
            .unwrap_or_else(|| DEFAULT_STAGE.into())
    }

    pub(crate) fn region(&self, options: &SetupOptions) -> String {
        options
            .region
            .clone()
            .or_else(|| self.settings().and_then(|s| s.region.clone()))
            .unwrap_or_else(|| DEFAULT_REGION.into())
    }

    fn settings(&self) -> Option<&ProviderSettings> {
        match self.provider.as_ref()? {
            Provider::Settings(settings) => Some(settings),
            Provider::Name(_) => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn configuration(yaml: &str) -> ProjectConfiguration {
    serde_saphyr::from_str(yaml).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flat_provider() {
        let config = configuration("service: api\nprovider: aws\n");
        assert_eq!(config.service_name(), "api");
        assert_eq!(config.provider_name(), Some("aws"));
        assert!(!config.is_configured_with_dashboard());
    }

    #[test]
    fn reads_nested_provider() {
        let config = configuration(
            "service: api\norg: acme\nprovider:\n  name: aws\n  runtime: nodejs18.x\n  region: eu-west-1\n",
        );

        assert_eq!(config.provider_name(), Some("aws"));
        assert_eq!(config.org(), Some("acme"));
        assert_eq!(config.region(&SetupOptions::default()), "eu-west-1");
        assert_eq!(config.stage(&SetupOptions::default()), "dev");
        assert_eq!(config.app(), "api");
    }

    #[test]
    fn options_take_precedence() {
        let config = configuration("service: api\nprovider:\n  name: aws\n  stage: prod\n");

        let options = SetupOptions {
            stage: Some("qa".into()),
            region: None,
        };

        assert_eq!(config.stage(&options), "qa");
        assert_eq!(config.region(&options), "us-east-1");
    }

    #[test]
    fn empty_org_is_not_a_dashboard_link() {
        let config = configuration("service: api\norg: ''\nprovider: aws\n");
        assert!(!config.is_configured_with_dashboard());
    }

    #[test]
    fn reads_legacy_service_object() {
        let config = configuration("service:\n  name: legacy\nprovider: aws\n");
        assert_eq!(config.service_name(), "legacy");
    }

    #[test]
    fn loads_json_from_service_dir() {
        let dir = tempfile::tempdir().unwrap();

        std::fs::write(
            dir.path().join("serverless.json"),
            r#"{"service": "api", "provider": {"name": "aws"}}"#,
        )
        .unwrap();

        let config = ProjectConfiguration::from_path(dir.path(), "serverless.json").unwrap();
        assert_eq!(config.provider_name(), Some("aws"));
    }

    #[test]
    fn rejects_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("serverless.ts"), "export default {}").unwrap();
        assert!(ProjectConfiguration::from_path(dir.path(), "serverless.ts").is_err());
    }
}
