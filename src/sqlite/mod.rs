// SQLite driver, built on rusqlite.
//
// - config: opening the connection and describing it
// - params: binding typed parameters to rusqlite values
// - query: materializing rows into a `ResultTable`
// - executor: prepare/query/execute and transaction control

pub(crate) mod config;
pub(crate) mod executor;
pub(crate) mod params;
pub(crate) mod query;
