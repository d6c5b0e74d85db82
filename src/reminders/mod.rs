use chrono::{SecondsFormat, Utc};
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::RunQueryDsl;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde::{Deserialize, Serialize};

use crate::db::SqliteAsyncConn;
use crate::error::{Result, VoiceRemindersError};

mod schema;
use schema::reminders;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

type SqlitePool = Pool<SqliteAsyncConn>;
type SqlitePooledConn<'a> = PooledConnection<'a, SqliteAsyncConn>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = reminders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Reminder {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    pub remind_time: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = reminders)]
struct NewReminder<'a> {
    text: &'a str,
    created_at: &'a str,
    remind_time: Option<&'a str>,
}

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    id: i64,
}

/// Handle to the reminders table. One instance is created at startup and shared by all
/// request handlers; rows are only ever touched through it.
pub struct ReminderStore {
    pool: SqlitePool,
}

impl ReminderStore {
    pub async fn new(sqlite_path: impl AsRef<str>) -> Result<Self> {
        let sqlite_path = sqlite_path.as_ref();
        crate::db::ensure_parent_dir(sqlite_path)?;
        run_migrations(sqlite_path).await?;

        let manager = AsyncDieselConnectionManager::<SqliteAsyncConn>::new(sqlite_path);
        let pool: SqlitePool = Pool::builder()
            .build(manager)
            .await
            .map_err(VoiceRemindersError::store)?;
        tracing::debug!(sqlite_path, "Reminder store ready");
        Ok(Self { pool })
    }

    pub async fn insert(
        &self,
        text: &str,
        created_at: &str,
        remind_time: Option<&str>,
    ) -> Result<i64> {
        let mut conn = self.conn().await?;
        let new = NewReminder {
            text,
            created_at,
            remind_time,
        };

        diesel::insert_into(reminders::table)
            .values(&new)
            .execute(&mut conn)
            .await
            .map_err(VoiceRemindersError::store)?;

        // Same pooled connection, so this is the rowid of the insert above.
        let row: LastInsertRowId = diesel::sql_query("SELECT last_insert_rowid() AS id")
            .get_result(&mut conn)
            .await
            .map_err(VoiceRemindersError::store)?;
        Ok(row.id)
    }

    pub async fn list_all(&self) -> Result<Vec<Reminder>> {
        let mut conn = self.conn().await?;
        reminders::table
            .select(Reminder::as_select())
            .order(reminders::id.desc())
            .load(&mut conn)
            .await
            .map_err(VoiceRemindersError::store)
    }

    /// Returns whether a row was removed. A missing id is not an error.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(reminders::table.filter(reminders::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(VoiceRemindersError::store)?;
        Ok(deleted > 0)
    }

    async fn conn(&self) -> Result<SqlitePooledConn<'_>> {
        let mut conn = self.pool.get().await.map_err(VoiceRemindersError::store)?;
        crate::db::tune_connection_async(&mut conn).await?;
        Ok(conn)
    }
}

/// Empty or whitespace-only values are treated as "no remind time".
pub fn normalize_remind_time(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

pub fn now_created_at() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

async fn run_migrations(database_url: &str) -> Result<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = crate::db::open_connection_sync(&database_url)?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(VoiceRemindersError::store)?;
        Ok::<_, VoiceRemindersError>(())
    })
    .await
    .map_err(|e| VoiceRemindersError::Runtime(e.to_string()))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_remind_time, now_created_at, ReminderStore};

    async fn temp_store(dir: &tempfile::TempDir) -> ReminderStore {
        let db_path = dir.path().join("reminders.db");
        let db_path = db_path.to_string_lossy().to_string();
        ReminderStore::new(&db_path).await.expect("store")
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = temp_store(&dir).await;

        let mut ids = Vec::new();
        for text in ["Take medicine", "Call Asha", "Water plants"] {
            let id = store
                .insert(text, &now_created_at(), None)
                .await
                .expect("insert");
            ids.push(id);
        }
        assert_eq!(ids, vec![1, 2, 3]);

        let listed: Vec<i64> = store
            .list_all()
            .await
            .expect("list")
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(listed, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn delete_removes_only_matching_row() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = temp_store(&dir).await;

        let first = store
            .insert("first", "2026-10-19T08:00:00.000000Z", Some("08:30"))
            .await
            .expect("insert first");
        let second = store
            .insert("second", "2026-10-19T08:01:00.000000Z", None)
            .await
            .expect("insert second");

        assert!(store.delete(first).await.expect("delete"));
        let remaining = store.list_all().await.expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second);
        assert_eq!(remaining[0].text, "second");
        assert_eq!(remaining[0].remind_time, None);

        assert!(!store.delete(9999).await.expect("delete missing"));
        assert_eq!(store.list_all().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = temp_store(&dir).await;

        let first = store.insert("a", &now_created_at(), None).await.unwrap();
        let second = store.insert("b", &now_created_at(), None).await.unwrap();
        store.delete(second).await.unwrap();
        let third = store.insert("c", &now_created_at(), None).await.unwrap();

        assert!(third > second);
        assert!(second > first);
    }

    #[tokio::test]
    async fn reopening_existing_database_keeps_rows() {
        let dir = tempfile::tempdir().expect("temp dir");
        {
            let store = temp_store(&dir).await;
            store
                .insert("persisted", &now_created_at(), Some("tomorrow"))
                .await
                .expect("insert");
        }

        let store = temp_store(&dir).await;
        let rows = store.list_all().await.expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].remind_time.as_deref(), Some("tomorrow"));
    }

    #[test]
    fn blank_remind_time_is_absent() {
        assert_eq!(normalize_remind_time(Some("  ".to_string())), None);
        assert_eq!(normalize_remind_time(None), None);
        assert_eq!(
            normalize_remind_time(Some("17:00".to_string())),
            Some("17:00".to_string())
        );
    }

    #[test]
    fn created_at_is_utc_rfc3339() {
        let stamp = now_created_at();
        assert!(stamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
