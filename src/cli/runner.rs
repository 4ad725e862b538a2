//! CLI runner - executes discovery or a sync

use crate::catalog::{discover, Catalog};
use crate::cli::commands::Cli;
use crate::config::TapConfig;
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::output::JsonLinesWriter;
use crate::state::StateManager;
use std::io::Write;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected mode
    pub async fn run(&self) -> Result<()> {
        let config = TapConfig::from_file(&self.cli.config)?;

        if self.cli.discover {
            let catalog = discover(&config.datasources)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "{}", catalog.to_json_pretty()?)?;
            return Ok(());
        }

        let catalog = self.load_catalog(&config)?;
        let state = self.load_state()?;
        self.sync(config, catalog, state).await
    }

    /// Catalog from the command line, or discovered from the config
    pub(crate) fn load_catalog(&self, config: &TapConfig) -> Result<Catalog> {
        if self.cli.properties.is_some() {
            warn!("--properties is deprecated, use --catalog");
        }
        match self.cli.catalog_path() {
            Some(path) => Catalog::from_file(path),
            None => {
                info!("No catalog given, discovering from config datasources");
                discover(&config.datasources)
            }
        }
    }

    /// State from `--state`, persisted to `--state-output` when given
    pub(crate) fn load_state(&self) -> Result<StateManager> {
        let state = match &self.cli.state {
            Some(path) => StateManager::from_file(path)?,
            None => StateManager::in_memory(),
        };
        Ok(match &self.cli.state_output {
            Some(path) => state.with_output(path),
            None => state,
        })
    }

    async fn sync(&self, config: TapConfig, catalog: Catalog, state: StateManager) -> Result<()> {
        let mut engine = SyncEngine::new(config, catalog, state)?;
        let stdout = std::io::stdout();
        let mut writer = JsonLinesWriter::new(stdout.lock());
        engine.run(&mut writer).await?;
        Ok(())
    }
}
