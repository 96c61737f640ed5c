mod args;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use sql_data_access::prelude::*;
use tracing::Level;

use crate::args::{Args, Command, Statement};
use crate::logging::{LogWriter, RecordFormat};

fn main() -> ExitCode {
    let args = Args::parse();
    let writer = match LogWriter::new(args.log_file.as_deref()) {
        Ok(writer) => writer,
        Err(err) => {
            eprintln!("failed to open log file: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(Level::from(args.log_level))
        .event_format(RecordFormat)
        .init();

    let source = args
        .properties
        .clone()
        .map_or_else(ConfigSource::from_env, ConfigSource::File);
    let manager = ConnectionManager::new(source);

    match run(&manager, args.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(kind = ?err.kind(), "{err}");
            if let Err(rollback_err) = manager.rollback() {
                tracing::warn!("rollback after failure also failed: {rollback_err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(manager: &ConnectionManager, command: Command) -> Result<String, DataAccessError> {
    manager.acquire()?;
    match command {
        Command::Info => manager.describe(),
        Command::Query(statement) => {
            let table = prepare(manager, statement)?.query()?;
            Ok(table.map(|t| t.to_string()).unwrap_or_default())
        }
        Command::Execute {
            statement,
            rollback,
        } => {
            let changed = prepare(manager, statement)?.execute()?;
            if rollback {
                manager.rollback()?;
            } else {
                manager.commit()?;
            }
            tracing::info!(changed, rollback, "statement executed");
            Ok(changed.to_string())
        }
    }
}

fn prepare(
    manager: &ConnectionManager,
    statement: Statement,
) -> Result<PreparedExecution, DataAccessError> {
    manager
        .prepare(&statement.sql, statement.params)?
        .ok_or_else(|| DataAccessError::ConnectionError("not connected".to_string()))
}
