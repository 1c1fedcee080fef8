//! CLI entrypoint for the sockrpc client.
//!
//! The binary delegates to [`sockrpc_cli::run`], which loads configuration,
//! parses the command, calls the daemon, and prints the result.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    sockrpc_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
