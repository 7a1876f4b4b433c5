//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dnr_core::ConfigName;

/// dnr - Keep declarative filtering rules in step with configuration data
#[derive(Parser, Debug)]
#[command(name = "dnr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding dnr.toml and the state files
    #[arg(long, global = true, env = "DNR_STATE_DIR", default_value = ".")]
    pub state_dir: PathBuf,

    /// Engine configuration file (defaults to <state-dir>/dnr.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Deliver an update notification for a configuration
    ///
    /// Examples:
    ///   dnr converge tds                 # tag is the dataset's SHA-256
    ///   dnr converge tds --etag 'W/"42"'
    Converge {
        /// Configuration name (tds or config)
        name: ConfigName,

        /// Version tag to converge to
        #[arg(long)]
        etag: Option<String>,
    },

    /// Check installed rules against version records
    Check {
        /// Only check this configuration
        name: Option<ConfigName>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show version tags and rule counts per configuration
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print a configuration's installed rules as JSON
    Rules {
        /// Configuration name (tds or config)
        name: ConfigName,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_converge_with_etag() {
        let cli = Cli::try_parse_from(["dnr", "converge", "tds", "--etag", "v1"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Converge {
                name: ConfigName::Tds,
                etag: Some("v1".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_check_without_name() {
        let cli = Cli::try_parse_from(["dnr", "check", "--json"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Check {
                name: None,
                json: true
            })
        );
    }

    #[test]
    fn test_unknown_configuration_is_rejected() {
        let err = Cli::try_parse_from(["dnr", "rules", "surrogates"]).unwrap_err();
        assert!(err.to_string().contains("Unknown configuration"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["dnr", "status", "--state-dir", "/tmp/state", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.state_dir, PathBuf::from("/tmp/state"));
    }
}
