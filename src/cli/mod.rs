mod args;
mod commands;

pub(crate) use args::Cli;
pub(crate) use commands::{Commands, run_price, run_report, run_resolve};
