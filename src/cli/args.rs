//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Organisation chart manager: reporting-line tree, secondary managers, and line layout
#[derive(Parser, Debug)]
#[command(name = "orgchart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Config file (default: $XDG_CONFIG_HOME/orgchart/orgchart.toml)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Data file (overrides config)
    #[arg(short = 'f', long, global = true, value_hint = ValueHint::FilePath)]
    pub data_file: Option<PathBuf>,

    /// Owner the records are scoped to (overrides config)
    #[arg(short, long, global = true)]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Employees are referenced by id, unique id prefix, or unique name.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add an employee
    Add {
        /// Display name
        name: String,
        /// Role or position
        title: String,
        /// Primary manager (omit for a director)
        #[arg(short, long, conflicts_with = "director")]
        manager: Option<String>,
        /// Attach at top level
        #[arg(long)]
        director: bool,
    },

    /// Change name and title
    Rename {
        employee: String,
        name: String,
        title: String,
    },

    /// Re-parent below a new primary manager
    Move {
        employee: String,
        /// New primary manager
        #[arg(long = "to")]
        manager: String,
    },

    /// Remove an employee without reports
    Remove { employee: String },

    /// Add a reporting line: employee also reports to manager
    Link { manager: String, employee: String },

    /// Remove a reporting line
    Unlink { manager: String, employee: String },

    /// Delete all employees and reporting lines
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the organisation as a tree
    Tree,

    /// List employees with their managers
    List,

    /// Print routed secondary reporting lines
    Lines,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print config template
    Init,
}
