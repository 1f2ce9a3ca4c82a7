use clap::Parser;
use oa_log::LogLevel;

mod cli;
mod commands;
mod config;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = config::OperatorConfig::load(cli.config.as_deref())?;

    let mut log = config.log_config();
    log.apply_env();
    if cli.verbose {
        log.level = LogLevel::Debug;
    }
    oa_log::install(&log)?;

    commands::run_command(cli, &config)
}
