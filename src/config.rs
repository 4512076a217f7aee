use std::path::PathBuf;

use crate::cli::{Cli, Command, LogLevel};

/// Application configuration, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub log_level: LogLevel,
}

impl Config {
    /// Validate and resolve CLI arguments.
    ///
    /// Only `collect` talks to the upstream API, so the API key is
    /// required there and optional everywhere else.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        if matches!(cli.command, Command::Collect(_)) && cli.api_key.is_none() {
            anyhow::bail!(
                "An API key is required to collect. Pass --api-key or set HAM_API_KEY."
            );
        }

        Ok(Self {
            db_path: expand_tilde(&cli.db_path),
            api_key: cli.api_key.clone(),
            api_base_url: cli.api_base_url.clone(),
            log_level: cli.log_level,
        })
    }
}

/// Expand ~ to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CollectArgs, StatusArgs};

    fn cli(command: Command, api_key: Option<&str>) -> Cli {
        Cli {
            db_path: "~/.artifact-atlas/artifacts.db".to_string(),
            api_key: api_key.map(str::to_string),
            api_base_url: crate::api::DEFAULT_BASE_URL.to_string(),
            log_level: LogLevel::Info,
            command,
        }
    }

    fn collect_command() -> Command {
        Command::Collect(CollectArgs {
            classification: "Coins".to_string(),
            max_records: 100,
            page_size: 10,
        })
    }

    #[test]
    fn test_collect_requires_api_key() {
        let result = Config::from_cli(&cli(collect_command(), None));
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_with_api_key_resolves() {
        let config = Config::from_cli(&cli(collect_command(), Some("key"))).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_status_without_api_key_resolves() {
        let command = Command::Status(StatusArgs { runs: false });
        let config = Config::from_cli(&cli(command, None)).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_expand_tilde_resolves_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x/y.db"), home.join("x/y.db"));
        }
    }

    #[test]
    fn test_expand_tilde_passes_absolute_paths_through() {
        assert_eq!(expand_tilde("/tmp/a.db"), PathBuf::from("/tmp/a.db"));
    }
}
