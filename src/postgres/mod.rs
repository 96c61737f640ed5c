// PostgreSQL driver, built on tokio-postgres.
//
// The public API is blocking, so each session owns a current-thread tokio runtime
// and drives the client with `block_on`.
//
// - config: connecting and the session type
// - params: binding typed parameters as `ToSql` values
// - query: materializing rows into a `ResultTable`
// - executor: prepare/query/execute and transaction control

pub(crate) mod config;
pub(crate) mod executor;
pub(crate) mod params;
pub(crate) mod query;

pub(crate) use config::PgSession;
