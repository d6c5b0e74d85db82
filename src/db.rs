use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;

use crate::error::{Result, VoiceRemindersError};

pub type SqliteAsyncConn = SyncConnectionWrapper<SqliteConnection>;

const BUSY_TIMEOUT_MS: u32 = 5000;

pub fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VoiceRemindersError::StoreUnavailable(format!(
                    "failed to create database directory {}: {e}",
                    parent.to_string_lossy()
                ))
            })?;
        }
    }
    Ok(())
}

/// Opens a blocking connection for migrations and switches the file to WAL once.
pub fn open_connection_sync(database_url: &str) -> Result<SqliteConnection> {
    let mut conn =
        SqliteConnection::establish(database_url).map_err(VoiceRemindersError::store)?;
    conn.batch_execute(&format!(
        "PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}; PRAGMA journal_mode = WAL;"
    ))
    .map_err(VoiceRemindersError::store)?;
    Ok(conn)
}

/// Pooled connections each carry their own busy timeout so concurrent writers wait
/// on SQLite's lock instead of failing with `database is locked`.
pub async fn tune_connection_async(conn: &mut SqliteAsyncConn) -> Result<()> {
    diesel_async::RunQueryDsl::execute(
        diesel::sql_query(format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}")),
        conn,
    )
    .await
    .map_err(VoiceRemindersError::store)?;
    Ok(())
}
