//! CLI argument definitions for the sockrpc client.

use clap::{Parser, Subcommand};

/// Command-line client for the sockrpc daemon.
#[derive(Parser, Debug)]
#[command(name = "sockrpc", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Procedures exposed by the daemon, plus a raw `call` escape hatch.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Rounds a number down to the nearest integer.
    Floor {
        #[arg(allow_negative_numbers = true)]
        x: f64,
    },
    /// Computes the real n-th root of an integer.
    Nroot {
        #[arg(allow_negative_numbers = true)]
        x: i64,
        #[arg(allow_negative_numbers = true)]
        n: f64,
    },
    /// Reverses a string.
    Reverse { text: String },
    /// Checks whether two strings are case-insensitive anagrams.
    ValidAnagram { left: String, right: String },
    /// Sorts items. Items that parse as JSON are sent as JSON values,
    /// anything else as a string.
    Sort {
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        items: Vec<String>,
    },
    /// Sends an arbitrary request.
    Call {
        /// Method name.
        method: String,
        /// Positional parameters as a JSON array.
        #[arg(long, default_value = "[]")]
        params: String,
        /// Parameter type tags as a JSON array.
        #[arg(long)]
        param_types: Option<String>,
    },
}
