//! CLI argument definitions using clap
//!
//! - prefstore get <key>            # Print one stored value
//! - prefstore set <key> <json>     # Store a value
//! - prefstore reset <key>          # Remove a value
//! - prefstore dump                 # Print the whole scope document
//! - prefstore path                 # Print the scope file location

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "prefstore")]
#[command(about = "Inspect and edit prefstore scope files")]
#[command(version)]
pub struct Cli {
    /// Storage directory (defaults to the platform data dir)
    #[arg(long, env = "PREFSTORE_STORAGE_DIR")]
    pub dir: Option<PathBuf>,

    /// Cluster id; omit for the global app scope
    #[arg(long)]
    pub cluster: Option<String>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the value stored under a key (null when absent)
    Get {
        key: String,
    },

    /// Store a JSON value under a key
    Set {
        key: String,
        /// Value as JSON, e.g. '{"sortBy":"name"}' or '320'
        value: String,
    },

    /// Remove the value stored under a key
    Reset {
        key: String,
    },

    /// Print the whole scope document
    Dump,

    /// Print the scope file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_with_cluster() {
        let cli = Cli::parse_from([
            "prefstore",
            "--cluster",
            "minikube",
            "set",
            "width",
            "320",
        ]);
        assert_eq!(cli.cluster.as_deref(), Some("minikube"));
        assert!(matches!(
            cli.command,
            Commands::Set { ref key, ref value } if key == "width" && value == "320"
        ));
    }

    #[test]
    fn test_parse_verbose_dump() {
        let cli = Cli::parse_from(["prefstore", "-v", "dump"]);
        assert!(cli.verbose);
        assert!(cli.cluster.is_none());
        assert!(matches!(cli.command, Commands::Dump));
    }
}
