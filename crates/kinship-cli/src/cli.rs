//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use kinship_domain::Gender;
use std::path::PathBuf;

/// Kinship CLI - Manage a family relationship network stored in SQLite.
#[derive(Debug, Parser)]
#[command(name = "kinship")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "KINSHIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overrides the configuration
    #[arg(long, global = true, env = "KINSHIP_DB")]
    pub db: Option<PathBuf>,

    /// Compose stored chains only, without the in-process graph
    #[arg(long, global = true)]
    pub no_graph: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage people in the directory
    Person(PersonArgs),

    /// Apply for a relation with another person
    Apply(ApplyArgs),

    /// Accept an application addressed to you
    Accept(DecideArgs),

    /// Reject an application addressed to you
    Reject(RejectArgs),

    /// Confirm an inferred relation you own
    Confirm(EdgeArgs),

    /// Reject an inferred relation you own
    Dismiss(EdgeArgs),

    /// Remove a relation and everything inferred between the pair
    Remove(RemoveArgs),

    /// List a person's relations
    Relations(RelationsArgs),

    /// List applications waiting for a person
    Applications(PersonRef),

    /// Show whether two people are related
    Status(StatusArgs),

    /// Show everyone connected to a person
    Network(PersonRef),

    /// Resolve a chain to its term and reverse
    Resolve(ResolveArgs),

    /// Rebuild every inferred relation in a person's network
    Reinfer(PersonRef),

    /// Run the repair worker
    Janitor(JanitorArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for person management.
#[derive(Debug, Parser)]
pub struct PersonArgs {
    #[command(subcommand)]
    pub action: PersonAction,
}

/// Person management actions.
#[derive(Debug, Subcommand)]
pub enum PersonAction {
    /// Create or update a person
    Add {
        /// Person id
        id: i64,
        /// Gender
        #[arg(short, long, value_enum, default_value = "unknown")]
        gender: GenderArg,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Deactivate a person
    Deactivate {
        /// Person id
        id: i64,
    },
}

/// A single person.
#[derive(Debug, Parser)]
pub struct PersonRef {
    /// Person id
    pub person: i64,
}

/// Arguments for the apply command.
#[derive(Debug, Parser)]
pub struct ApplyArgs {
    /// Person applying
    pub applicant: i64,

    /// Person asked
    pub target: i64,

    /// How the applicant reaches the target: a JSON array or comma-separated tokens (e.g. 父,母)
    pub chain: String,

    /// Note for the target
    #[arg(short, long)]
    pub note: Option<String>,
}

/// Arguments for accepting an application.
#[derive(Debug, Parser)]
pub struct DecideArgs {
    /// Person deciding (the target)
    pub person: i64,

    /// Application id
    pub apply_id: i64,

    /// Return without waiting for propagation to finish
    #[arg(long)]
    pub no_wait: bool,
}

/// Arguments for rejecting an application.
#[derive(Debug, Parser)]
pub struct RejectArgs {
    /// Person deciding (the target)
    pub person: i64,

    /// Application id
    pub apply_id: i64,

    /// Reason shown to the applicant
    #[arg(short, long)]
    pub reason: Option<String>,
}

/// Arguments addressing one edge.
#[derive(Debug, Parser)]
pub struct EdgeArgs {
    /// Owner of the edge
    pub person: i64,

    /// Edge id
    pub edge_id: i64,
}

/// Arguments for the remove command.
#[derive(Debug, Parser)]
pub struct RemoveArgs {
    /// Owner of the edge
    pub person: i64,

    /// Edge id
    pub edge_id: i64,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the relations command.
#[derive(Debug, Parser)]
pub struct RelationsArgs {
    /// Person id
    pub person: i64,

    /// Show inferred relations waiting for a decision instead
    #[arg(short, long)]
    pub pending: bool,
}

/// Arguments for the status command.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// First person
    pub a: i64,

    /// Second person
    pub b: i64,
}

/// Arguments for the resolve command.
#[derive(Debug, Parser)]
pub struct ResolveArgs {
    /// Chain as a JSON array or comma-separated tokens
    pub chain: String,

    /// Gender of the person the chain starts from
    #[arg(long, value_enum, default_value = "unknown")]
    pub from: GenderArg,

    /// Gender of the person the chain reaches
    #[arg(long, value_enum, default_value = "unknown")]
    pub to: GenderArg,
}

/// Arguments for the janitor command.
#[derive(Debug, Parser)]
pub struct JanitorArgs {
    /// Run this many sweeps and exit instead of running until Ctrl+C
    #[arg(short = 'n', long)]
    pub cycles: Option<usize>,

    /// Interval between sweeps in seconds, overrides the configuration
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Log repairs without writing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write the effective configuration to the configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Gender argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum GenderArg {
    /// Male
    Male,
    /// Female
    Female,
    /// Not recorded
    Unknown,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<GenderArg> for Gender {
    fn from(gender: GenderArg) -> Self {
        match gender {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
            GenderArg::Unknown => Gender::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_command() {
        let cli = Cli::parse_from(["kinship", "apply", "3", "2", "父", "--note", "hi"]);
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.applicant, 3);
                assert_eq!(args.target, 2);
                assert_eq!(args.chain, "父");
                assert_eq!(args.note.as_deref(), Some("hi"));
            }
            _ => panic!("Expected Apply command"),
        }
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::parse_from(["kinship", "network", "7", "--db", "family.db", "--no-graph", "-f", "json"]);
        assert_eq!(cli.db, Some(PathBuf::from("family.db")));
        assert!(cli.no_graph);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(matches!(cli.command, Command::Network(PersonRef { person: 7 })));
    }

    #[test]
    fn test_person_add() {
        let cli = Cli::parse_from(["kinship", "person", "add", "1", "--gender", "female", "--name", "Grandma"]);
        match cli.command {
            Command::Person(PersonArgs {
                action: PersonAction::Add { id, gender, name },
            }) => {
                assert_eq!(id, 1);
                assert_eq!(Gender::from(gender), Gender::Female);
                assert_eq!(name.as_deref(), Some("Grandma"));
            }
            _ => panic!("Expected person add"),
        }
    }

    #[test]
    fn test_janitor_cycles() {
        let cli = Cli::parse_from(["kinship", "janitor", "-n", "2", "--dry-run"]);
        match cli.command {
            Command::Janitor(args) => {
                assert_eq!(args.cycles, Some(2));
                assert!(args.dry_run);
            }
            _ => panic!("Expected Janitor command"),
        }
    }
}
