#![cfg(feature = "sqlite")]
use sql_data_access::prelude::*;

fn memory_manager() -> Result<ConnectionManager, DataAccessError> {
    let manager = ConnectionManager::new(
        ConnectionOptions::builder("sqlite::memory:").into_properties(),
    );
    manager.acquire()?.execute_batch(
        "CREATE TABLE M_PERSON (
            PERSON_ID INTEGER PRIMARY KEY,
            PERSON_NAME VARCHAR(64) NOT NULL,
            NICKNAME VARCHAR(64)
        );
        INSERT INTO M_PERSON (PERSON_ID, PERSON_NAME) VALUES (1, 'Alice');",
    )?;
    manager.commit()?;
    Ok(manager)
}

#[test]
fn release_is_idempotent_and_drop_releases() -> Result<(), Box<dyn std::error::Error>> {
    let manager = memory_manager()?;
    let conn = manager.acquire()?;

    let mut stmt = manager
        .prepare_sql("SELECT PERSON_NAME FROM M_PERSON")?
        .ok_or("not connected")?;
    assert_eq!(conn.open_statements(), 1);
    stmt.release();
    stmt.release();
    assert_eq!(conn.open_statements(), 0);
    assert!(!stmt.is_prepared());
    assert!(stmt.query()?.is_none());
    assert!(!stmt.execute()?);

    {
        let _held = manager.prepare_sql("SELECT 1")?;
        let _other = manager.prepare_sql("SELECT 2")?;
        assert_eq!(conn.open_statements(), 2);
    }
    assert_eq!(conn.open_statements(), 0);
    Ok(())
}

#[test]
fn reprepare_releases_previous_statement() -> Result<(), Box<dyn std::error::Error>> {
    let manager = memory_manager()?;
    let conn = manager.acquire()?;
    let mut stmt = manager
        .prepare_sql("SELECT PERSON_NAME FROM M_PERSON")?
        .ok_or("not connected")?;

    stmt.reprepare(
        "SELECT PERSON_ID FROM M_PERSON WHERE PERSON_NAME = ?",
        vec![ParameterBinding::new("Alice", SqlType::VarChar)],
    )?;
    assert_eq!(conn.open_statements(), 1);
    assert_eq!(stmt.parameter_count(), 1);
    let table = stmt.query()?.ok_or("statement released")?;
    assert_eq!(table.to_string(), "\"1\"");
    Ok(())
}

#[test]
fn statement_errors_leave_connection_usable() -> Result<(), Box<dyn std::error::Error>> {
    let manager = memory_manager()?;
    let conn = manager.acquire()?;

    let err = manager.prepare_sql("SELECT * FROM NO_SUCH_TABLE").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Statement);
    assert_eq!(conn.open_statements(), 0);

    let insert = manager
        .prepare(
            "INSERT INTO M_PERSON (PERSON_ID, PERSON_NAME) VALUES (?, ?)",
            vec![
                ParameterBinding::new(2, SqlType::Integer),
                ParameterBinding::new("Bob", SqlType::VarChar),
            ],
        )?
        .ok_or("not connected")?;
    assert!(insert.execute()?);

    let violating = manager
        .prepare(
            "INSERT INTO M_PERSON (PERSON_ID, PERSON_NAME) VALUES (?, ?)",
            vec![
                ParameterBinding::new(3, SqlType::Integer),
                ParameterBinding::null(SqlType::VarChar),
            ],
        )?
        .ok_or("not connected")?;
    assert_eq!(violating.execute().unwrap_err().kind(), ErrorKind::Statement);

    assert!(manager.commit()?);
    let count = manager
        .prepare_sql("SELECT COUNT(*) FROM M_PERSON")?
        .ok_or("not connected")?
        .query()?
        .ok_or("statement released")?;
    assert_eq!(count.row(1).and_then(|r| r.get(1)), Some("2"));
    Ok(())
}

#[test]
fn null_binding_stores_sql_null() -> Result<(), Box<dyn std::error::Error>> {
    let manager = memory_manager()?;
    let update = manager
        .prepare(
            "UPDATE M_PERSON SET NICKNAME = ? WHERE PERSON_ID = ?",
            vec![
                ParameterBinding::null(SqlType::VarChar),
                ParameterBinding::new(1, SqlType::Integer),
            ],
        )?
        .ok_or("not connected")?;
    assert!(update.update()?);

    let table = manager
        .prepare_sql("SELECT NICKNAME, NICKNAME IS NULL FROM M_PERSON WHERE PERSON_ID = 1")?
        .ok_or("not connected")?
        .query()?
        .ok_or("statement released")?;
    let row = table.row(1).ok_or("no row")?;
    assert_eq!(row.get(1), None);
    assert_eq!(row.get(2), Some("1"));
    assert_eq!(table.to_string(), "\"\",\"1\"");
    Ok(())
}

#[test]
fn update_and_delete_report_affected_rows() -> Result<(), Box<dyn std::error::Error>> {
    let manager = memory_manager()?;
    let rename = manager
        .prepare(
            "UPDATE M_PERSON SET PERSON_NAME = ? WHERE PERSON_ID = ?",
            vec![
                ParameterBinding::new("Alicia", SqlType::VarChar),
                ParameterBinding::new(99, SqlType::Integer),
            ],
        )?
        .ok_or("not connected")?;
    assert!(!rename.update()?);

    let delete = manager
        .prepare(
            "DELETE FROM M_PERSON WHERE PERSON_ID = ?",
            vec![ParameterBinding::new(1, SqlType::Integer)],
        )?
        .ok_or("not connected")?;
    assert!(delete.delete()?);
    assert!(!delete.delete()?);
    Ok(())
}

#[test]
fn binding_errors_are_parameter_errors() -> Result<(), Box<dyn std::error::Error>> {
    let manager = memory_manager()?;

    let too_many = manager.prepare(
        "SELECT PERSON_NAME FROM M_PERSON WHERE PERSON_ID = ?",
        vec![
            ParameterBinding::new(1, SqlType::Integer),
            ParameterBinding::new(2, SqlType::Integer),
        ],
    );
    assert!(matches!(too_many, Err(DataAccessError::ParameterError(_))));

    let out_of_range = manager.prepare(
        "SELECT PERSON_NAME FROM M_PERSON WHERE PERSON_ID = ?",
        vec![ParameterBinding::new(70_000, SqlType::SmallInt)],
    );
    assert!(matches!(out_of_range, Err(DataAccessError::ParameterError(_))));

    let unbound = manager
        .prepare_sql("SELECT PERSON_NAME FROM M_PERSON WHERE PERSON_ID = ?")?
        .ok_or("not connected")?;
    assert!(matches!(unbound.query(), Err(DataAccessError::ParameterError(_))));

    assert_eq!(manager.acquire()?.open_statements(), 1);
    Ok(())
}

#[test]
fn late_bind_replaces_slot() -> Result<(), Box<dyn std::error::Error>> {
    let manager = memory_manager()?;
    let mut stmt = manager
        .prepare_sql("SELECT PERSON_NAME FROM M_PERSON WHERE PERSON_ID = ?")?
        .ok_or("not connected")?;
    assert!(stmt.bind(1, ParameterBinding::new("1", SqlType::Integer))?);
    assert_eq!(stmt.query()?.ok_or("released")?.to_string(), "\"Alice\"");
    assert!(stmt.bind(0, ParameterBinding::new(1, SqlType::Integer)).is_err());

    stmt.release();
    assert!(!stmt.bind(1, ParameterBinding::new(1, SqlType::Integer))?);
    Ok(())
}
