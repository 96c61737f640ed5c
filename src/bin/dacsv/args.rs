use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use sql_data_access::{ParameterBinding, SqlType};
use tracing::Level;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run SQL through a single managed connection and print CSV")]
pub(crate) struct Args {
    /// Property file with url, user and password (defaults to $DATA_ACCESS_PROPERTIES)
    #[arg(long)]
    pub(crate) properties: Option<PathBuf>,
    /// Also append log records to this file
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "info")]
    pub(crate) log_level: LogLevel,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Print connection details
    Info,
    /// Run a read and print the rows as CSV
    Query(Statement),
    /// Run a write, print whether any row changed, then commit
    Execute {
        #[command(flatten)]
        statement: Statement,
        /// Roll back instead of committing
        #[arg(long)]
        rollback: bool,
    },
}

#[derive(ClapArgs, Debug)]
pub(crate) struct Statement {
    pub(crate) sql: String,
    /// Positional parameter as TYPE=VALUE; a bare TYPE binds NULL
    #[arg(short = 'p', long = "param", value_parser = parse_binding)]
    pub(crate) params: Vec<ParameterBinding>,
}

pub(crate) fn parse_binding(raw: &str) -> Result<ParameterBinding, String> {
    let (tag, value) = match raw.split_once('=') {
        Some((tag, value)) => (tag, Some(value)),
        None => (raw, None),
    };
    let sql_type = SqlType::from_str(tag.trim(), true)?;
    Ok(ParameterBinding::from_option(value, sql_type))
}
