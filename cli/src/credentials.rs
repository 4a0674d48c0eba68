use crate::client::Client;
use crate::config::{build_config, PROVIDER};
use crate::error::Error;
use crate::project::{ProjectConfiguration, SetupOptions};
use async_trait::async_trait;
use aws_config::profile::profile_file::ProfileFiles;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the setup learns whether deploying can authenticate against the cloud
///
/// Every call reads the current state, nothing is cached between calls.
#[async_trait]
pub(crate) trait CredentialSource: Send + Sync {
    /// Ambient local cloud credentials are discoverable
    async fn has_local_credentials(&self) -> bool;

    /// The session is logged in to the dashboard
    fn is_authenticated(&self) -> bool;

    /// The project org has a cloud provider linked to this service instance
    async fn has_linked_provider(
        &self,
        configuration: &ProjectConfiguration,
        options: &SetupOptions,
    ) -> eyre::Result<bool>;
}

/// Stored dashboard session
#[derive(Deserialize, Serialize, Debug)]
pub(crate) struct Session {
    pub(crate) email: String,
    pub(crate) token: String,
    pub(crate) expires_at: DateTime<Utc>,
}

impl Session {
    /// Read the session file, a missing or malformed file means no session
    fn from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path)
            .inspect_err(|e| log::debug!("No session at {}: {e:?}", path.display()))
            .ok()?;

        serde_json::from_str(&content)
            .inspect_err(|e| log::error!("Could not parse session file: {e:?}"))
            .ok()
    }

    /// Token is present and not expired
    pub(crate) fn is_valid(&self) -> bool {
        !self.token.is_empty() && self.expires_at.timestamp() > Utc::now().timestamp()
    }
}

#[derive(Deserialize, Debug)]
struct LinkedProvider {
    #[serde(rename = "providerName")]
    provider_name: String,
}

#[derive(Deserialize, Debug)]
struct LinkedProvidersResponse {
    result: Vec<LinkedProvider>,
}

impl LinkedProvidersResponse {
    fn has_provider(&self, name: &str) -> bool {
        self.result
            .iter()
            .any(|provider| provider.provider_name == name)
    }
}

type Env = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Credentials found by the AWS default provider chain and the dashboard session
pub(crate) struct AmbientCredentials {
    api_base: String,
    session_path: PathBuf,
    access_key_env: &'static str,
    env: Env,

    /// Replaces the default ~/.aws/config and ~/.aws/credentials lookup
    aws_profile_files: Option<ProfileFiles>,
}

impl AmbientCredentials {
    pub(crate) fn new() -> eyre::Result<Self> {
        let config = build_config()?;

        Ok(Self {
            api_base: config.api_base.clone(),
            session_path: config.credentials_path.clone(),
            access_key_env: config.credentials_env,
            env: Box::new(|name: &str| std::env::var(name).ok()),
            aws_profile_files: None,
        })
    }

    fn var(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|value| !value.trim().is_empty())
    }

    /// Access key from the env, or the token of an unexpired stored session
    fn access_token(&self) -> Option<String> {
        self.var(self.access_key_env).or_else(|| {
            Session::from_path(&self.session_path)
                .filter(Session::is_valid)
                .map(|session| {
                    log::debug!("Using dashboard session of {}", session.email);
                    session.token
                })
        })
    }
}

#[async_trait]
impl CredentialSource for AmbientCredentials {
    async fn has_local_credentials(&self) -> bool {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(files) = &self.aws_profile_files {
            loader = loader.profile_files(files.clone());
        }

        let Some(provider) = loader.load().await.credentials_provider() else {
            log::debug!("No AWS credentials provider configured");
            return false;
        };

        match provider.provide_credentials().await {
            Ok(_) => {
                log::debug!("Found AWS credentials");
                true
            }
            Err(e) => {
                log::debug!("AWS credentials are not available: {e:?}");
                false
            }
        }
    }

    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    async fn has_linked_provider(
        &self,
        configuration: &ProjectConfiguration,
        options: &SetupOptions,
    ) -> eyre::Result<bool> {
        let Some(org) = configuration.org() else {
            return Ok(false);
        };

        let token = self.access_token().ok_or_else(|| {
            Error::new(
                "Login required",
                Some("Log in to the dashboard to check the linked providers."),
            )
        })?;

        let stage = configuration.stage(options);
        let region = configuration.region(options);

        let response: LinkedProvidersResponse = Client::new(&self.api_base, &token)
            .get(
                &format!("/core/orgs/{org}/providers/instance"),
                &[
                    ("app", configuration.app()),
                    ("service", configuration.service_name()),
                    ("stage", stage.as_str()),
                    ("region", region.as_str()),
                ],
            )
            .await?;

        Ok(response.has_provider(PROVIDER))
    }
}
