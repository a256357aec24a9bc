//! Whole-store export and import.
//!
//! A snapshot is a JSON document holding every transaction, summary and preferences
//! row plus an export timestamp and a format version. Import replaces the three tables
//! inside one database transaction, so readers see either the old state or the new
//! one. Summaries are derived data and are rebuilt from the imported transactions.

use crate::{
    core::{
        summary::{apply_to_summary, get_all_summaries, parse_date_key},
        transaction::{get_transactions, to_active_model, validate_payload},
    },
    entities::{
        DailySummary, Preference, Transaction as TransactionEntity, daily_summary, preference,
    },
    errors::{Error, Result},
    models::{self, Transaction},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, IntoActiveModel, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

/// Format version written into every export.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// A complete copy of the bookkeeping data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub summaries: Vec<daily_summary::Model>,
    #[serde(default)]
    pub preferences: Vec<preference::Model>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

/// Reads the whole store into a [`Snapshot`].
pub async fn snapshot(db: &DatabaseConnection) -> Result<Snapshot> {
    Ok(Snapshot {
        transactions: get_transactions(db, None).await?,
        summaries: get_all_summaries(db).await?,
        preferences: Preference::find().all(db).await?,
        export_date: Utc::now(),
        version: SNAPSHOT_VERSION.to_string(),
    })
}

/// Serializes the whole store as pretty-printed JSON.
#[instrument(skip(db))]
pub async fn export_all(db: &DatabaseConnection) -> Result<String> {
    let snapshot = snapshot(db).await?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    info!(
        transactions = snapshot.transactions.len(),
        summaries = snapshot.summaries.len(),
        "Exported data"
    );
    Ok(json)
}

/// Replaces transactions, summaries and preferences with the contents of `json`.
///
/// Each transaction's `date_key` is recomputed from its `datetime`, and the daily
/// summaries are rebuilt from the imported transactions rather than copied, so every
/// summary matches the log it describes. Days the snapshot lists without any
/// transaction are kept as all-zero rows.
///
/// # Errors
/// Returns [`Error::Import`] if `json` is not a snapshot, a transaction has a
/// non-positive amount or a blank expense category, or any write fails. The store is
/// left exactly as it was.
#[instrument(skip(db, json), fields(bytes = json.len()))]
pub async fn import_all(db: &DatabaseConnection, json: &str) -> Result<()> {
    let snapshot: Snapshot = serde_json::from_str(json).map_err(|e| Error::Import {
        message: format!("malformed snapshot: {e}"),
    })?;

    if snapshot.version != SNAPSHOT_VERSION {
        warn!(version = %snapshot.version, "Importing snapshot with unexpected version");
    }

    replace_all(db, &snapshot).await.map_err(|e| match e {
        Error::Import { .. } => e,
        other => Error::Import {
            message: other.to_string(),
        },
    })?;

    info!(
        transactions = snapshot.transactions.len(),
        preferences = snapshot.preferences.len(),
        "Imported data"
    );
    Ok(())
}

fn validate_snapshot(snapshot: &Snapshot) -> Result<()> {
    for tx in &snapshot.transactions {
        validate_payload(tx.amount, &tx.details).map_err(|e| Error::Import {
            message: format!("transaction {}: {e}", tx.id),
        })?;
    }
    Ok(())
}

async fn replace_all(db: &DatabaseConnection, snapshot: &Snapshot) -> Result<()> {
    validate_snapshot(snapshot)?;

    // Dropping the transaction on an early return rolls everything back
    let txn = db.begin().await?;

    TransactionEntity::delete_many().exec(&txn).await?;
    DailySummary::delete_many().exec(&txn).await?;
    Preference::delete_many().exec(&txn).await?;

    // Oldest first, so rebuilt totals accumulate in recording order
    let mut transactions = snapshot.transactions.clone();
    transactions.sort_by(|a, b| a.datetime.cmp(&b.datetime).then_with(|| a.id.cmp(&b.id)));

    let mut days = BTreeSet::new();
    for mut tx in transactions {
        tx.date_key = models::date_key(tx.datetime);
        TransactionEntity::insert(to_active_model(&tx))
            .exec(&txn)
            .await?;
        apply_to_summary(&txn, &tx.date_key, tx.kind(), tx.amount, 1).await?;
        days.insert(tx.date_key);
    }

    for summary in &snapshot.summaries {
        if days.contains(&summary.date_key) {
            continue;
        }
        let date = parse_date_key(&summary.date_key)?;
        DailySummary::insert(daily_summary::Model::empty(date).into_active_model())
            .exec(&txn)
            .await?;
        days.insert(summary.date_key.clone());
    }
    debug!(days = days.len(), "Summaries rebuilt");

    for row in &snapshot.preferences {
        Preference::insert(row.clone().into_active_model())
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::preferences::{get_user_preferences, save_user_preferences};
    use crate::core::summary::get_daily_summary;
    use crate::core::transaction::add_transaction;
    use crate::models::{NewTransaction, TransactionKind, UserPreferences};
    use crate::test_utils::*;

    async fn seed(db: &DatabaseConnection) -> Result<()> {
        add_transaction(db, sale_for("Kwame", 120.0, at(2025, 7, 1, 9))).await?;
        add_transaction(db, NewTransaction::expense(45.0, at(2025, 7, 1, 15), "Supplies"))
            .await?;
        add_transaction(db, NewTransaction::sale(80.0, at(2025, 7, 2, 11))).await?;
        let prefs = UserPreferences {
            currency: "NGN".to_string(),
            ..UserPreferences::default()
        };
        save_user_preferences(db, &prefs).await
    }

    #[tokio::test]
    async fn test_round_trip() -> Result<()> {
        let source = setup_test_db().await?;
        seed(&source).await?;
        let before = snapshot(&source).await?;
        let json = export_all(&source).await?;

        let target = setup_test_db().await?;
        add_transaction(&target, NewTransaction::sale(999.0, at(2020, 1, 1, 0))).await?;
        import_all(&target, &json).await?;

        let after = snapshot(&target).await?;
        assert_eq!(after.transactions, before.transactions);
        assert_eq!(after.summaries, before.summaries);
        assert_eq!(after.preferences, before.preferences);
        assert_eq!(get_daily_summary(&target, "2020-01-01").await?.transaction_count, 0);
        assert_eq!(get_user_preferences(&target).await?.currency, "NGN");
        Ok(())
    }

    #[tokio::test]
    async fn test_export_shape() -> Result<()> {
        let db = setup_test_db().await?;
        seed(&db).await?;

        let json = export_all(&db).await?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value["version"], "1.0");
        assert!(value["exportDate"].is_string());
        assert_eq!(value["transactions"].as_array().unwrap().len(), 3);
        assert_eq!(value["summaries"].as_array().unwrap().len(), 2);
        assert_eq!(value["preferences"].as_array().unwrap().len(), 1);

        let sale = &value["transactions"][0];
        assert_eq!(sale["type"], "sale");
        assert_eq!(sale["dateKey"], "2025-07-02");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_arrays_are_empty() -> Result<()> {
        let db = setup_test_db().await?;
        seed(&db).await?;

        import_all(&db, r#"{"exportDate":"2025-07-03T00:00:00Z","version":"1.0"}"#).await?;

        let after = snapshot(&db).await?;
        assert!(after.transactions.is_empty());
        assert!(after.summaries.is_empty());
        assert!(after.preferences.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        seed(&db).await?;

        let result = import_all(&db, "{ not json").await;
        assert!(matches!(result, Err(Error::Import { .. })));
        assert_eq!(snapshot(&db).await?.transactions.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_import_leaves_prior_state() -> Result<()> {
        let db = setup_test_db().await?;
        seed(&db).await?;
        let before = snapshot(&db).await?;

        // Two rows with the same id violate the primary key halfway through
        let mut broken = before.clone();
        broken.transactions.push(broken.transactions[0].clone());
        let json = serde_json::to_string(&broken)?;

        let result = import_all(&db, &json).await;
        assert!(matches!(result, Err(Error::Import { .. })));

        let after = snapshot(&db).await?;
        assert_eq!(after.transactions, before.transactions);
        assert_eq!(after.summaries, before.summaries);
        assert_eq!(after.preferences, before.preferences);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_recomputes_date_key() -> Result<()> {
        let db = setup_test_db().await?;
        let json = r#"{
            "transactions": [{
                "id": "legacy-1",
                "amount": 30.0,
                "datetime": "2025-03-09T18:30:00Z",
                "dateKey": "2025-03-10",
                "type": "expense",
                "category": "Rent",
                "paymentMethod": "cash"
            }],
            "exportDate": "2025-03-11T00:00:00Z",
            "version": "1.0"
        }"#;

        import_all(&db, json).await?;
        let stored = get_transactions(&db, Some("2025-03-09")).await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "legacy-1");
        Ok(())
    }

    #[tokio::test]
    async fn test_import_rebuilds_summaries_from_transactions() -> Result<()> {
        let db = setup_test_db().await?;
        // The expense is keyed and summarized under the wrong day, the sale has no
        // summary at all, and 2025-03-01 is listed with totals but no transactions
        let json = r#"{
            "transactions": [
                {
                    "id": "exp-1",
                    "amount": 30.0,
                    "datetime": "2025-03-09T18:30:00Z",
                    "dateKey": "2025-03-10",
                    "type": "expense",
                    "category": "Rent",
                    "paymentMethod": "cash"
                },
                {
                    "id": "sale-1",
                    "amount": 75.5,
                    "datetime": "2025-03-09T08:00:00Z",
                    "dateKey": "2025-03-09",
                    "type": "sale"
                }
            ],
            "summaries": [
                {
                    "dateKey": "2025-03-10",
                    "date": "2025-03-10",
                    "totalSales": 0.0,
                    "totalExpenses": 30.0,
                    "netProfit": -30.0,
                    "transactionCount": 1
                },
                {
                    "dateKey": "2025-03-01",
                    "date": "2025-03-01",
                    "totalSales": 500.0,
                    "totalExpenses": 0.0,
                    "netProfit": 500.0,
                    "transactionCount": 4
                }
            ],
            "exportDate": "2025-03-11T00:00:00Z",
            "version": "1.0"
        }"#;

        import_all(&db, json).await?;

        let ninth = get_daily_summary(&db, "2025-03-09").await?;
        assert_eq!(ninth.transaction_count, 2);
        assert_eq!(ninth.total_sales, 75.5);
        assert_eq!(ninth.total_expenses, 30.0);
        assert_eq!(ninth.net_profit, 45.5);

        let tenth = get_daily_summary(&db, "2025-03-10").await?;
        assert_eq!(tenth.transaction_count, 0);
        assert_eq!(tenth.total_expenses, 0.0);

        let first = get_daily_summary(&db, "2025-03-01").await?;
        assert_eq!(first.transaction_count, 0);
        assert_eq!(first.total_sales, 0.0);

        // Every stored summary agrees with the transactions filed under its key
        for summary in get_all_summaries(&db).await? {
            let day = get_transactions(&db, Some(&summary.date_key)).await?;
            let sum_of = |kind: TransactionKind| -> f64 {
                day.iter()
                    .filter(|t| t.kind() == kind)
                    .map(|t| t.amount)
                    .sum()
            };
            assert_eq!(summary.total_sales, sum_of(TransactionKind::Sale));
            assert_eq!(summary.total_expenses, sum_of(TransactionKind::Expense));
            assert_eq!(summary.transaction_count, i64::try_from(day.len()).unwrap());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_transactions() -> Result<()> {
        let db = setup_test_db().await?;
        seed(&db).await?;
        let before = snapshot(&db).await?;

        let mut negative = before.clone();
        negative.transactions[0].amount = -10.0;
        let result = import_all(&db, &serde_json::to_string(&negative)?).await;
        assert!(matches!(result, Err(Error::Import { .. })));

        let blank_category = r#"{
            "transactions": [{
                "id": "exp-blank",
                "amount": 12.0,
                "datetime": "2025-03-09T10:00:00Z",
                "dateKey": "2025-03-09",
                "type": "expense",
                "category": " ",
                "paymentMethod": "cash"
            }],
            "exportDate": "2025-03-11T00:00:00Z",
            "version": "1.0"
        }"#;
        let result = import_all(&db, blank_category).await;
        assert!(matches!(result, Err(Error::Import { .. })));

        let after = snapshot(&db).await?;
        assert_eq!(after.transactions, before.transactions);
        assert_eq!(after.summaries, before.summaries);
        Ok(())
    }
}
