use eyre::WrapErr;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const API_BASE: &str = "https://api.serverless.com";
const FRONTEND_BASE: &str = "https://app.serverless.com";
const CLI_NAME: &str = "serverless";

/// The only cloud provider the deploy step knows how to authenticate against
pub(crate) const PROVIDER: &str = "aws";

#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Dashboard backend, used for the linked provider lookups
    pub(crate) api_base: String,

    /// Dashboard web app, used to build the links shown to the user
    pub(crate) frontend_base: String,

    /// Stored dashboard session
    pub(crate) credentials_path: PathBuf,

    /// Env var holding an access key, takes precedence over the stored session
    pub(crate) credentials_env: &'static str,

    /// The framework executable driving the deployments
    pub(crate) cli_name: String,
}

/// Overrides read from ~/.serverless-setup/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    api_base: Option<String>,
    frontend_base: Option<String>,
    cli_name: Option<String>,
}

impl ConfigFile {
    fn from_path(path: &Path) -> eyre::Result<Self> {
        if let Ok(toml_string) = std::fs::read_to_string(path) {
            toml::from_str(&toml_string)
                .wrap_err(format!("Failed to parse {}", path.display()))
        } else {
            // Just use the defaults if the file is not found
            Ok(ConfigFile::default())
        }
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Global configuration, resolved once per process
///
/// Compiled-in defaults, then the config file, then env vars.
pub(crate) fn build_config() -> eyre::Result<&'static Config> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let home = std::env::var("HOME").wrap_err("Can not read HOME env var")?;
    let config = resolve(&PathBuf::from(home), |name| std::env::var(name).ok())?;
    Ok(CONFIG.get_or_init(|| config))
}

fn resolve(home: &Path, env: impl Fn(&str) -> Option<String>) -> eyre::Result<Config> {
    let dir = home.join(".serverless-setup");
    let file = ConfigFile::from_path(&dir.join("config.toml"))?;

    let pick = |env_name: &str, from_file: Option<String>, default: &str| {
        env(env_name)
            .filter(|value| !value.is_empty())
            .or(from_file)
            .unwrap_or_else(|| default.to_string())
    };

    Ok(Config {
        api_base: pick("SERVERLESS_SETUP_API_URL", file.api_base, API_BASE),
        frontend_base: pick(
            "SERVERLESS_SETUP_FRONTEND_URL",
            file.frontend_base,
            FRONTEND_BASE,
        ),
        credentials_path: dir.join(".credentials"),
        credentials_env: "SERVERLESS_ACCESS_KEY",
        cli_name: pick("SERVERLESS_SETUP_CLI", file.cli_name, CLI_NAME),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_defaults_without_file_and_env() {
        let home = tempfile::tempdir().unwrap();
        let config = resolve(home.path(), |_| None).unwrap();
        assert_eq!(config.api_base, API_BASE);
        assert_eq!(config.cli_name, "serverless");
        assert_eq!(
            config.credentials_path,
            home.path().join(".serverless-setup/.credentials")
        );
    }

    #[test]
    fn env_overrides_file() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(home.path().join(".serverless-setup")).unwrap();

        std::fs::write(
            home.path().join(".serverless-setup/config.toml"),
            "api_base = \"https://file.example\"\ncli_name = \"sls\"\n",
        )
        .unwrap();

        let config = resolve(home.path(), |name| {
            (name == "SERVERLESS_SETUP_API_URL").then(|| "https://env.example".to_string())
        })
        .unwrap();

        assert_eq!(config.api_base, "https://env.example");
        assert_eq!(config.cli_name, "sls");
        assert_eq!(config.frontend_base, FRONTEND_BASE);
    }

    #[test]
    fn rejects_malformed_file() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(home.path().join(".serverless-setup")).unwrap();
        std::fs::write(home.path().join(".serverless-setup/config.toml"), "api_base = [").unwrap();
        assert!(resolve(home.path(), |_| None).is_err());
    }
}
