//! Command-line client and client library for the sockrpc daemon.
//!
//! [`RpcClient`] sends one request per connection to the daemon socket and
//! returns the decoded result. The `sockrpc` binary wraps it: leading
//! configuration flags (for example `--socket-path`) are resolved through
//! `sockrpc_config`, the remaining tokens select a procedure, and the result
//! is printed to stdout as JSON. Daemon-reported errors go to stderr and the
//! process exits with status 1.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use sockrpc_types::TypeTag;

mod cli;
mod client;
mod config;
mod errors;
#[cfg(test)]
mod test_support;
mod transport;

use cli::{Cli, CliCommand};
pub use client::RpcClient;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;
pub use errors::ClientError;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) if !error.use_stderr() => {
            let _ = write!(io.stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => return report(io, &AppError::CliUsage(error)),
    };

    let outcome = loader
        .load(&split.config_arguments)
        .and_then(|config| execute(cli.command, &RpcClient::from_config(&config)))
        .and_then(|results| writeln!(io.stdout, "{results}").map_err(AppError::WriteOutput));

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report(io, &error),
    }
}

fn report<W: Write, E: Write>(io: &mut IoStreams<'_, W, E>, error: &AppError) -> ExitCode {
    let _ = writeln!(io.stderr, "{error}");
    ExitCode::FAILURE
}

fn execute(command: CliCommand, client: &RpcClient) -> Result<Value, AppError> {
    let results = match command {
        CliCommand::Floor { x } => Value::from(client.floor(x)?),
        CliCommand::Nroot { x, n } => Value::from(client.nroot(x, n)?),
        CliCommand::Reverse { text } => Value::from(client.reverse(&text)?),
        CliCommand::ValidAnagram { left, right } => {
            Value::from(client.valid_anagram(&left, &right)?)
        }
        CliCommand::Sort { items } => {
            let items = items.iter().map(String::as_str).map(parse_item).collect();
            Value::Array(client.sort(items)?)
        }
        CliCommand::Call {
            method,
            params,
            param_types,
        } => {
            let params = parse_array("--params", &params)?;
            let param_types = match param_types {
                Some(raw) => parse_array("--param-types", &raw)?
                    .into_iter()
                    .map(TypeTag::from)
                    .collect(),
                None => Vec::new(),
            };
            client.call(&method, params, param_types)?
        }
    };
    Ok(results)
}

/// Interprets a sort item as JSON when it parses, otherwise as a string.
fn parse_item(item: &str) -> Value {
    serde_json::from_str(item).unwrap_or_else(|_| Value::String(item.to_owned()))
}

fn parse_array(flag: &'static str, raw: &str) -> Result<Vec<Value>, AppError> {
    match serde_json::from_str(raw).map_err(|source| AppError::InvalidJson { flag, source })? {
        Value::Array(values) => Ok(values),
        _ => Err(AppError::NotAnArray { flag }),
    }
}
