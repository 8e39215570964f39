//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;

use clap::Parser;

use crate::config::Config;

use super::commands::Commands;

#[derive(Parser)]
#[command(name = "costwise")]
#[command(about = "Model pricing resolution and usage cost tracking", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Serve cached pricing only, never fetch
    #[arg(short = 'O', long, global = true)]
    pub(crate) offline: bool,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Enable debug output (show resolution details)
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    /// Disable colored table output
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Compensation factor applied to every computed cost
    #[arg(long, global = true, value_name = "FACTOR")]
    pub(crate) compensation: Option<f64>,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        if !self.offline && config.offline {
            self.offline = true;
        }
        if !self.debug && config.debug {
            self.debug = true;
        }
        if self.compensation.is_none() {
            self.compensation = config.compensation;
        }
        self
    }

    pub(crate) fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
