use crate::export::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface definition for rAttendance
/// Live attendance dashboard: summaries, live updates and exports
#[derive(Parser)]
#[command(
    name = "rattendance",
    version = env!("CARGO_PKG_VERSION"),
    about = "Live attendance dashboard: summaries, push/poll live updates and exports",
    long_about = None
)]
pub struct Cli {
    /// Use this configuration file instead of the default one
    #[arg(global = true, long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the server base URL from the configuration
    #[arg(global = true, long = "server", value_name = "URL")]
    pub server: Option<String>,

    /// Run in test mode (no config file writes outside --config)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init,

    /// Manage the configuration file (view, check, migrate or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their default values")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Fetch the records of a scope once and print the summary
    Summary {
        #[arg(long, value_name = "SCOPE", help = "Session / batch identifier")]
        scope: Option<String>,

        /// Date range.
        ///
        /// Supported formats:
        /// - YYYY, YYYY-MM, YYYY-MM-DD
        /// - ranges (start:end) in the same format, e.g. 2025-06-01:2025-06-10
        /// - all → no date filter
        #[arg(long, value_name = "RANGE")]
        range: Option<String>,
    },

    /// Keep the summary of a scope up to date until Ctrl-C
    Watch {
        #[arg(long, value_name = "SCOPE", help = "Session / batch identifier")]
        scope: Option<String>,

        #[arg(
            long,
            value_name = "RANGE",
            help = "Filter by year/month/day or a custom range"
        )]
        range: Option<String>,
    },

    /// Ask the server for an export and save it
    Export {
        #[arg(long, value_name = "SCOPE", help = "Session / batch identifier")]
        scope: Option<String>,

        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(
            long,
            value_name = "RANGE",
            help = "Filter export by year/month/day or a custom range"
        )]
        range: Option<String>,

        #[arg(long, value_name = "DIR", help = "Target directory (default: export_dir)")]
        dir: Option<PathBuf>,

        #[arg(long, short = 'f', help = "Overwrite a file with the same name")]
        force: bool,
    },

    /// Write the current records and summary of a scope to a local file
    Snapshot {
        #[arg(long, value_name = "SCOPE", help = "Session / batch identifier")]
        scope: Option<String>,

        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: PathBuf,

        #[arg(
            long,
            value_name = "RANGE",
            help = "Filter by year/month/day or a custom range"
        )]
        range: Option<String>,

        #[arg(long, short = 'f', help = "Overwrite output file without confirmation")]
        force: bool,
    },
}
