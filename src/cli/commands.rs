//! CLI arguments

use clap::Parser;
use std::path::PathBuf;

/// Singer tap for the Solarvista API
#[derive(Parser, Debug)]
#[command(name = "tap-solarvista")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// State file (JSON)
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Catalog file (JSON)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Catalog file (JSON), older name for --catalog
    #[arg(short, long, conflicts_with = "catalog")]
    pub properties: Option<PathBuf>,

    /// Print the catalog of available streams and exit
    #[arg(short, long)]
    pub discover: bool,

    /// Also persist bookmarks to this file after every checkpoint
    #[arg(long)]
    pub state_output: Option<PathBuf>,
}

impl Cli {
    /// Catalog path from `--catalog` or `--properties`
    pub fn catalog_path(&self) -> Option<&PathBuf> {
        self.catalog.as_ref().or(self.properties.as_ref())
    }
}
