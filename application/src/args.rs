//! Command line [`Args`] of the server.

use clap::Parser;

/// Server of the stay marketplace.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    ///
    /// Missing file is not an error: defaults and `CONF.*` environment
    /// variables are used instead.
    #[arg(short, long, env = "CONF_PATH", default_value = "config.toml")]
    pub config: String,

    /// Applies the database migrations and exits without serving.
    #[arg(long)]
    pub migrate_only: bool,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}
