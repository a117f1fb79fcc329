use crate::cli::parser::Cli;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

/// Handle the `init` command
///
/// Writes a default configuration file, unless one is already there.
/// With `--test` and no `--config` nothing is written.
pub fn handle(cli: &Cli) -> AppResult<()> {
    let target = cli.config.clone().unwrap_or_else(Config::config_file);

    if cli.test && cli.config.is_none() {
        info(format!("Test mode: config file not written ({})", target.display()));
        return Ok(());
    }

    let (path, created) = Config::init(Some(&target))?;

    if created {
        success(format!("Config file: {}", path.display()));
        info("Set `server_url` and `token` (or `token_file`) before the first run.");
    } else {
        info(format!("Config file already exists: {}", path.display()));
    }

    Ok(())
}
