use crate::cli::parser::{Cli, Commands};
use crate::config::{Config, migrate};
use crate::errors::AppResult;
use crate::ui::messages::{error, info, success, warning};
use std::path::Path;
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
        migrate: run_migrate,
        edit_config,
        editor,
    } = &cli.command
    {
        // Path del file di configurazione
        let path = cli.config.clone().unwrap_or_else(Config::config_file);

        // ---- PRINT CONFIG ----
        if *print_config {
            let mut shown = cfg.clone();
            if shown.token.is_some() {
                shown.token = Some("***".into());
            }
            println!("📄 Current configuration ({}):\n", path.display());
            println!("{}", serde_yaml::to_string(&shown)?);
        }

        // ---- CHECK ----
        if *check {
            if !path.exists() {
                warning(format!("No configuration file at {}", path.display()));
            } else {
                let missing = migrate::missing_keys(&path)?;
                if missing.is_empty() {
                    success("Configuration file is complete.");
                } else {
                    warning(format!("Missing keys: {}", missing.join(", ")));
                    info("Run `rattendance config --migrate` to add them with defaults.");
                }
            }
        }

        // ---- MIGRATE ----
        if *run_migrate {
            if !path.exists() {
                warning(format!("No configuration file at {}", path.display()));
            } else {
                let added = migrate::migrate_missing_keys(&path)?;
                if added.is_empty() {
                    info("Nothing to migrate.");
                } else {
                    success(format!("Added keys: {}", added.join(", ")));
                }
            }
        }

        // ---- EDIT CONFIG ----
        if *edit_config {
            edit(&path, editor.clone());
        }
    }

    Ok(())
}

fn edit(path: &Path, requested: Option<String>) {
    // Default editor basato sulla piattaforma
    let default_editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    let editor_to_use = requested.unwrap_or_else(|| default_editor.clone());

    if matches!(Command::new(&editor_to_use).arg(path).status(), Ok(s) if s.success()) {
        success(format!("Configuration file edited using '{editor_to_use}'"));
        return;
    }

    warning(format!(
        "Editor '{editor_to_use}' not available, falling back to '{default_editor}'"
    ));

    if matches!(Command::new(&default_editor).arg(path).status(), Ok(s) if s.success()) {
        success(format!(
            "Configuration file edited using fallback '{default_editor}'"
        ));
    } else {
        error(format!(
            "Failed to edit configuration file using fallback '{default_editor}'"
        ));
    }
}
