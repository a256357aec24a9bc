//! Database configuration module for `salesbook`.
//!
//! This module handles `SQLite` connection, table creation and the startup schema
//! migration using `SeaORM`. Tables and their secondary indexes are generated from the
//! entity definitions with `Schema::create_table_from_entity` and
//! `Schema::create_index_from_entity`, so the schema always matches the Rust structs.
//! Every statement is issued with `IF NOT EXISTS`, which makes startup idempotent on a
//! file-backed database.

use crate::entities::{
    AppSetting, DailySummary, PinSetting, Preference, Transaction, app_setting,
};
use crate::errors::{Error, Result};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, Set,
    TransactionTrait,
    sea_query::{IndexCreateStatement, TableCreateStatement},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Default database location, created on first use.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/salesbook.sqlite?mode=rwc";

/// Schema version produced by [`create_tables`] plus every step of [`run_migrations`].
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Opens the database at `database_url`.
///
/// Any failure to open is reported as [`Error::StorageUnavailable`]; the caller decides
/// whether to retry later.
#[instrument]
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Opening database connection");
    Database::connect(database_url)
        .await
        .map_err(|e| Error::StorageUnavailable {
            message: format!("Failed to open database at {database_url}: {e}"),
        })
}

/// File path of a file-backed `SQLite` URL, or `None` for in-memory and other URLs.
#[must_use]
pub fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Creates the directory a file-backed database lives in.
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let Some(parent) = sqlite_file_path(database_url)
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
    else {
        return Ok(());
    };
    std::fs::create_dir_all(&parent).map_err(|e| Error::StorageUnavailable {
        message: format!("Failed to create database directory {}: {e}", parent.display()),
    })
}

/// Opens the database, ensures every table exists and brings the schema up to date.
pub async fn init_store(database_url: &str) -> Result<DatabaseConnection> {
    ensure_parent_dir(database_url)?;
    let db = connect(database_url).await?;
    create_tables(&db).await?;
    run_migrations(&db).await?;
    info!("Store ready");
    Ok(db)
}

/// Creates all tables and secondary indexes from the entity definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables: Vec<TableCreateStatement> = vec![
        schema.create_table_from_entity(Transaction),
        schema.create_table_from_entity(DailySummary),
        schema.create_table_from_entity(Preference),
        schema.create_table_from_entity(PinSetting),
        schema.create_table_from_entity(AppSetting),
    ];
    for table in &mut tables {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    // Secondary indexes on transactions: datetime, date_key and kind
    let mut indexes: Vec<IndexCreateStatement> = schema.create_index_from_entity(Transaction);
    for index in &mut indexes {
        index.if_not_exists();
        db.execute(builder.build(&*index)).await?;
    }

    debug!("Tables ensured");
    Ok(())
}

/// Brings the `settings` row to [`CURRENT_SCHEMA_VERSION`].
///
/// A fresh store gets a row stamped with the current version. An older store is
/// upgraded one version at a time inside a single database transaction. A store
/// written by a newer binary is refused.
#[instrument(skip(db))]
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    let txn = db.begin().await?;

    let existing = AppSetting::find_by_id(app_setting::APP_ID.to_string())
        .one(&txn)
        .await?;

    let Some(settings) = existing else {
        app_setting::ActiveModel {
            id: Set(app_setting::APP_ID.to_string()),
            version: Set(env!("CARGO_PKG_VERSION").to_string()),
            schema_version: Set(CURRENT_SCHEMA_VERSION),
            first_launch: Set(true),
            onboarding_completed: Set(false),
            last_backup: Set(None),
            data_export_format: Set("json".to_string()),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        info!(version = CURRENT_SCHEMA_VERSION, "Initialized fresh store");
        return Ok(());
    };

    if settings.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(Error::Migration {
            message: format!(
                "store schema version {} is newer than supported version {CURRENT_SCHEMA_VERSION}",
                settings.schema_version
            ),
        });
    }

    let mut version = settings.schema_version;
    while version < CURRENT_SCHEMA_VERSION {
        migrate_step(&txn, version).await?;
        version += 1;
        info!(version, "Applied schema migration");
    }

    let mut active: app_setting::ActiveModel = settings.into();
    active.schema_version = Set(version);
    active.version = Set(env!("CARGO_PKG_VERSION").to_string());
    active.update(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Upgrades the schema from `from` to `from + 1`.
async fn migrate_step<C>(db: &C, from: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    match from {
        // Version 2 requires every transaction row to carry its date_key. Rows with
        // an empty key take the date part of their datetime.
        1 => {
            let backend = db.get_database_backend();
            db.execute(sea_orm::Statement::from_string(
                backend,
                "UPDATE transactions SET date_key = substr(datetime, 1, 10) WHERE date_key = ''",
            ))
            .await?;
            Ok(())
        }
        other => {
            warn!(from = other, "No migration defined");
            Err(Error::Migration {
                message: format!("no migration from schema version {other}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{DailySummaryModel, TransactionModel};
    use sea_orm::QuerySelect;

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path(DEFAULT_DATABASE_URL),
            Some(PathBuf::from("data/salesbook.sqlite"))
        );
        assert_eq!(
            sqlite_file_path("sqlite:books.db"),
            Some(PathBuf::from("books.db"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;
        let _: Vec<DailySummaryModel> = DailySummary::find().limit(1).all(&db).await?;
        Preference::find().limit(1).all(&db).await?;
        PinSetting::find().limit(1).all(&db).await?;
        AppSetting::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_fresh_store_gets_current_version() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        run_migrations(&db).await?;

        let settings = AppSetting::find_by_id(app_setting::APP_ID.to_string())
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(settings.schema_version, CURRENT_SCHEMA_VERSION);
        assert!(settings.first_launch);
        assert!(!settings.onboarding_completed);

        // Second run is a no-op
        run_migrations(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_step_to_v2_fills_empty_date_keys() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        run_migrations(&db).await?;

        let settings = AppSetting::find_by_id(app_setting::APP_ID.to_string())
            .one(&db)
            .await?
            .unwrap();
        let mut active: app_setting::ActiveModel = settings.into();
        active.schema_version = Set(1);
        active.update(&db).await?;

        let when = chrono::DateTime::parse_from_rfc3339("2025-02-03T10:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        crate::entities::transaction::ActiveModel {
            id: Set("unkeyed".to_string()),
            amount: Set(5.0),
            datetime: Set(when),
            date_key: Set(String::new()),
            kind: Set("sale".to_string()),
            customer: Set(None),
            category: Set(None),
            notes: Set(None),
            vendor: Set(None),
            description: Set(None),
            payment_method: Set(None),
        }
        .insert(&db)
        .await?;

        run_migrations(&db).await?;

        let row = Transaction::find_by_id("unkeyed".to_string())
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(row.date_key, "2025-02-03");
        let settings = AppSetting::find_by_id(app_setting::APP_ID.to_string())
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(settings.schema_version, CURRENT_SCHEMA_VERSION);
        Ok(())
    }

    #[tokio::test]
    async fn test_newer_schema_is_refused() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        run_migrations(&db).await?;

        let settings = AppSetting::find_by_id(app_setting::APP_ID.to_string())
            .one(&db)
            .await?
            .unwrap();
        let mut active: app_setting::ActiveModel = settings.into();
        active.schema_version = Set(CURRENT_SCHEMA_VERSION + 1);
        active.update(&db).await?;

        let result = run_migrations(&db).await;
        assert!(matches!(result, Err(Error::Migration { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_database_is_storage_unavailable() {
        let result = connect("sqlite:///nonexistent-dir/nested/salesbook.sqlite").await;
        assert!(matches!(result, Err(Error::StorageUnavailable { .. })));
    }
}
