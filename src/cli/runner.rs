//! CLI runner - executes commands

use crate::api::{GraphClient, InstagramApi};
use crate::catalog::Catalog;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::SourceConfig;
use crate::engine::SyncEngine;
use crate::error::{Error, Result, ResultExt};
use crate::retry::RetryPolicy;
use crate::schema;
use crate::state::{State, StateManager};
use crate::streams::StreamContext;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{error, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Read {
                catalog,
                state_output,
            } => self.read(catalog.as_deref(), state_output.as_deref()).await,
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<SourceConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return SourceConfig::from_json(json_str);
        }

        match &self.cli.config {
            Some(path) => SourceConfig::from_file(path),
            None => Err(Error::config(
                "No configuration given (use --config or --config-json)",
            )),
        }
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Load the catalog, or discover one when none was given
    fn load_catalog(&self, path: Option<&Path>) -> Result<Catalog> {
        match path {
            Some(path) => Catalog::from_file(path)
                .with_context(|| format!("Failed to load catalog {}", path.display())),
            None => schema::discover(),
        }
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let client = GraphClient::new(&config)?;
        let retry = RetryPolicy::new(config.retry.clone());
        let state = State::new();
        let ctx = StreamContext::new(&client as &dyn InstagramApi, &retry, &state);

        match ctx.accounts().await {
            Ok(accounts) => {
                info!(accounts = accounts.len(), "Connection check succeeded");
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": format!("Found {} business account(s)", accounts.len())
                    }
                }));
                Ok(())
            }
            Err(e) => {
                error!("Connection check failed: {e}");
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
                Err(e)
            }
        }
    }

    /// Discover streams
    fn discover(&self) -> Result<()> {
        let catalog = schema::discover()?;
        self.output_message(&serde_json::to_value(&catalog)?);
        Ok(())
    }

    /// Read streams
    async fn read(&self, catalog: Option<&Path>, state_output: Option<&Path>) -> Result<()> {
        let config = self.load_config()?;
        let state = self.load_state()?;
        let catalog = self.load_catalog(catalog)?;
        let client = GraphClient::new(&config)?;

        let mut engine = SyncEngine::from_config(&config, Box::new(client), state);
        engine
            .run(&catalog, |line| {
                self.output_message(&line);
                Ok(())
            })
            .await?;

        if let Some(path) = state_output {
            engine.state().save_to_file(path).await?;
            info!(path = %path.display(), "State written");
        }

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn runner(args: &[&str]) -> Runner {
        let mut argv = vec!["source-instagram"];
        argv.extend_from_slice(args);
        Runner::new(Cli::parse_from(argv))
    }

    #[test]
    fn test_inline_config_takes_precedence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"access_token": "from-file"}"#).unwrap();

        let r = runner(&[
            "--config",
            path.to_str().unwrap(),
            "--config-json",
            r#"{"access_token": "inline"}"#,
            "discover",
        ]);
        assert_eq!(r.load_config().unwrap().access_token, "inline");

        let r = runner(&["--config", path.to_str().unwrap(), "discover"]);
        assert_eq!(r.load_config().unwrap().access_token, "from-file");
    }

    #[test]
    fn test_missing_config() {
        let r = runner(&["check"]);
        assert!(matches!(r.load_config(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_state() {
        let r = runner(&[
            "--state-json",
            r#"{"bookmarks": {"user_insights": {"date": "2023-01-10"}}}"#,
            "read",
        ]);
        let state = r.load_state().unwrap();
        assert_eq!(state.get_bookmark("user_insights", "date"), Some("2023-01-10"));

        let r = runner(&["read"]);
        assert!(r.load_state().unwrap().state().bookmarks.is_empty());
    }

    #[test]
    fn test_catalog_defaults_to_discovery() {
        let r = runner(&["read"]);
        let catalog = r.load_catalog(None).unwrap();
        assert_eq!(catalog.streams.len(), 7);

        let missing = Path::new("/nonexistent/catalog.json");
        let err = r.load_catalog(Some(missing)).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/catalog.json"));
    }

    #[test]
    fn test_read_arguments() {
        let r = runner(&["read", "--catalog", "catalog.json", "--state-output", "out.json"]);
        let Commands::Read {
            catalog,
            state_output,
        } = &r.cli.command
        else {
            panic!("expected read");
        };
        assert_eq!(catalog.as_deref(), Some(Path::new("catalog.json")));
        assert_eq!(state_output.as_deref(), Some(Path::new("out.json")));
        assert_eq!(r.cli.command.name(), "read");
        assert_eq!(runner(&["check"]).cli.command.name(), "check");
    }
}
