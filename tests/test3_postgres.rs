#![cfg(feature = "test-utils")]
use postgresql_embedded::PostgreSQL;
use sql_data_access::prelude::*;

/// Throwaway server for one test run; stopped on drop.
struct EmbeddedPostgres {
    runtime: tokio::runtime::Runtime,
    postgresql: PostgreSQL,
    url: String,
    user: String,
    password: String,
}

impl EmbeddedPostgres {
    fn start(db_name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let mut postgresql = PostgreSQL::default();
        runtime.block_on(async {
            postgresql.setup().await?;
            postgresql.start().await?;
            postgresql.create_database(db_name).await
        })?;

        let settings = postgresql.settings();
        let url = format!("postgres://{}:{}/{db_name}", settings.host, settings.port);
        let user = settings.username.clone();
        let password = settings.password.clone();
        Ok(Self {
            runtime,
            postgresql,
            url,
            user,
            password,
        })
    }

    fn manager(&self) -> ConnectionManager {
        ConnectionManager::new(
            ConnectionOptions::builder(self.url.as_str())
                .user(self.user.as_str())
                .password(self.password.as_str())
                .into_properties(),
        )
    }
}

impl Drop for EmbeddedPostgres {
    fn drop(&mut self) {
        let _ = self.runtime.block_on(self.postgresql.stop());
    }
}

fn query_csv(manager: &ConnectionManager, sql: &str) -> Result<String, Box<dyn std::error::Error>> {
    let table = manager
        .prepare_sql(sql)?
        .ok_or("not connected")?
        .query()?
        .ok_or("statement released")?;
    Ok(table.to_string())
}

fn insert_commit_and_query(manager: &ConnectionManager) -> Result<(), Box<dyn std::error::Error>> {
    manager.acquire()?.execute_batch(
        "CREATE TABLE M_PERSON (
            PERSON_ID SERIAL PRIMARY KEY,
            PERSON_NAME VARCHAR(64) NOT NULL,
            AGE SMALLINT,
            NICKNAME VARCHAR(64)
        )",
    )?;
    assert!(manager.commit()?);

    let insert = manager
        .prepare(
            "INSERT INTO M_PERSON (PERSON_NAME, AGE, NICKNAME) VALUES ($1, $2, $3)",
            vec![
                ParameterBinding::new("Alice", SqlType::VarChar),
                ParameterBinding::new(24, SqlType::SmallInt),
                ParameterBinding::null(SqlType::VarChar),
            ],
        )?
        .ok_or("not connected")?;
    assert!(insert.insert()?);
    assert!(manager.commit()?);

    let select = manager
        .prepare(
            "SELECT PERSON_NAME, AGE FROM M_PERSON WHERE AGE > $1",
            vec![ParameterBinding::new(20, SqlType::SmallInt)],
        )?
        .ok_or("not connected")?;
    let table = select.query()?.ok_or("statement released")?;
    assert_eq!(table.column_count(), 2);
    assert_eq!(table.to_string(), "\"Alice\",\"24\"");

    assert_eq!(
        query_csv(manager, "SELECT NICKNAME IS NULL, NICKNAME FROM M_PERSON")?,
        "\"t\",\"\""
    );
    Ok(())
}

fn failed_statement_keeps_earlier_work(
    manager: &ConnectionManager,
) -> Result<(), Box<dyn std::error::Error>> {
    manager
        .acquire()?
        .execute_batch("CREATE TABLE ledger (id INTEGER PRIMARY KEY)")?;
    assert!(manager.commit()?);

    let insert = |id: i64| -> Result<bool, DataAccessError> {
        manager
            .prepare(
                "INSERT INTO ledger (id) VALUES ($1)",
                vec![ParameterBinding::new(id, SqlType::Integer)],
            )?
            .map_or(Ok(false), |stmt| stmt.insert())
    };

    assert!(insert(1)?);
    let err = insert(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Statement);
    assert!(err.to_string().contains("duplicate key"), "{err}");

    let bad = manager.prepare_sql("SELEC id FROM ledger").unwrap_err();
    assert_eq!(bad.kind(), ErrorKind::Statement);

    assert!(insert(2)?);
    assert!(manager.commit()?);
    assert_eq!(query_csv(manager, "SELECT count(*) FROM ledger")?, "\"2\"");
    Ok(())
}

fn every_column_type_renders_as_text(
    manager: &ConnectionManager,
) -> Result<(), Box<dyn std::error::Error>> {
    let csv = query_csv(
        manager,
        "SELECT 1.5::numeric AS price,
                '-0.050'::numeric AS delta,
                '00010203-0405-0607-0809-0a0b0c0d0e0f'::uuid AS id,
                interval '1 day 02:00:00' AS span,
                '10.0.0.1'::inet AS host,
                '10.0.0.0/24'::cidr AS net,
                'debit'::text AS kind,
                NULL::numeric AS missing",
    )?;
    assert_eq!(
        csv,
        "\"1.5\",\"-0.050\",\"00010203-0405-0607-0809-0a0b0c0d0e0f\",\"1 day 02:00:00\",\
         \"10.0.0.1\",\"10.0.0.0/24\",\"debit\",\"\""
    );
    Ok(())
}

fn describe_hides_password(
    manager: &ConnectionManager,
    pg: &EmbeddedPostgres,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = manager.describe()?;
    assert!(text.contains(&format!("DB Server URL: {}", pg.url)));
    assert!(text.contains("DB Server Product: PostgreSQL "));
    assert!(text.contains("DB Server Driver: tokio-postgres 0.7"));
    assert!(!text.contains(&pg.password));
    Ok(())
}

fn password_in_url_is_not_kept(pg: &EmbeddedPostgres) -> Result<(), Box<dyn std::error::Error>> {
    let url = pg.url.replacen(
        "postgres://",
        &format!("postgres://{}:{}@", pg.user, pg.password),
        1,
    );
    let manager = ConnectionManager::new(ConnectionOptions::builder(url).into_properties());

    let conn = manager.acquire()?;
    assert!(!conn.url().contains(&pg.password));
    assert!(conn.url().contains(&format!("{}@", pg.user)));
    assert!(!manager.describe()?.contains(&pg.password));
    Ok(())
}

// One embedded server per file; scenarios run in sequence against it.
#[test]
fn postgres_data_access_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let pg = EmbeddedPostgres::start("data_access_test")?;
    let manager = pg.manager();

    insert_commit_and_query(&manager)?;
    failed_statement_keeps_earlier_work(&manager)?;
    every_column_type_renders_as_text(&manager)?;
    describe_hides_password(&manager, &pg)?;
    password_in_url_is_not_kept(&pg)?;

    assert_eq!(manager.connections_opened(), 1);
    assert_eq!(manager.acquire()?.open_statements(), 0);
    Ok(())
}
