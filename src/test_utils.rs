//! Shared test utilities for `salesbook`.
//!
//! This module provides helpers for setting up test databases, building
//! transactions at fixed instants, and capturing notifications.

use crate::{
    errors::Result,
    models::{NewTransaction, TransactionDetails},
    notify::{Notifier, Severity},
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Creates an in-memory `SQLite` database with all tables created and migrated.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    crate::config::database::run_migrations(&db).await?;
    Ok(db)
}

/// Installs a test-friendly subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// `year-month-day hour:00:00` UTC.
///
/// # Panics
/// Panics on an impossible date; test inputs are literals.
#[allow(clippy::unwrap_used)]
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// A sale to `customer` with no category or notes.
pub fn sale_for(customer: &str, amount: f64, when: DateTime<Utc>) -> NewTransaction {
    NewTransaction {
        amount,
        datetime: when,
        details: TransactionDetails::Sale {
            customer: Some(customer.to_string()),
            category: None,
            notes: None,
        },
    }
}

/// Notifier that keeps every notification for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(Severity, String, String)>>,
}

impl RecordingNotifier {
    /// Drains the recorded `(severity, message, title)` triples.
    #[allow(clippy::unwrap_used)]
    pub fn take(&self) -> Vec<(Severity, String, String)> {
        std::mem::take(&mut *self.seen.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    #[allow(clippy::unwrap_used)]
    fn notify(&self, severity: Severity, message: &str, title: &str) {
        self.seen
            .lock()
            .unwrap()
            .push((severity, message.to_string(), title.to_string()));
    }
}
