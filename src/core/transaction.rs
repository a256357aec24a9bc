//! Transaction business logic - Handles the transaction log.
//!
//! This module provides functions for recording, retrieving and deleting sales and
//! expenses. Every write also updates the daily summary for the transaction's
//! `date_key` inside the same database transaction, so a transaction is never visible
//! without its summary reflecting it, and vice versa. Payloads are validated before
//! any database work starts.

use crate::{
    core::summary::apply_to_summary,
    entities::{Transaction as TransactionEntity, transaction},
    errors::{Error, Result},
    models::{self, NewTransaction, PaymentMethod, Transaction, TransactionDetails},
};
use chrono::{Days, NaiveDate, NaiveTime};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Checks a payload before it reaches the store.
///
/// # Errors
/// Returns [`Error::Validation`] when the amount is not a finite positive number or an
/// expense has a blank category.
pub fn validate_new_transaction(data: &NewTransaction) -> Result<()> {
    validate_payload(data.amount, &data.details)
}

/// Amount and variant checks shared by new and imported transactions.
pub(crate) fn validate_payload(amount: f64, details: &TransactionDetails) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::validation(format!(
            "amount must be a positive number, got {amount}"
        )));
    }

    if let TransactionDetails::Expense { category, .. } = details {
        if category.trim().is_empty() {
            return Err(Error::validation("expense category is required"));
        }
    }

    Ok(())
}

/// Records a new sale or expense and returns its id.
///
/// The store assigns a fresh UUID and derives the `date_key` from `datetime`. The
/// insert and the daily summary update run in one database transaction: if either
/// fails, neither is visible.
#[instrument(skip(db, data), fields(kind = %data.kind(), amount = data.amount))]
pub async fn add_transaction(db: &DatabaseConnection, data: NewTransaction) -> Result<String> {
    validate_new_transaction(&data)?;

    let id = Uuid::new_v4().to_string();
    let date_key = models::date_key(data.datetime);
    let kind = data.kind();
    let amount = data.amount;

    let row = to_active_model(&Transaction {
        id: id.clone(),
        amount: data.amount,
        datetime: data.datetime,
        date_key: date_key.clone(),
        details: data.details,
    });

    // Use a transaction to ensure atomicity
    let txn = db.begin().await?;

    row.insert(&txn).await?;
    apply_to_summary(&txn, &date_key, kind, amount, 1).await?;

    // Commit the transaction
    txn.commit().await?;

    info!(%id, %date_key, "Transaction recorded");
    Ok(id)
}

/// Retrieves transactions, newest first.
///
/// With `date_key` set, only transactions on that calendar day are returned.
pub async fn get_transactions<C>(db: &C, date_key: Option<&str>) -> Result<Vec<Transaction>>
where
    C: ConnectionTrait,
{
    let mut query = TransactionEntity::find();
    if let Some(key) = date_key {
        query = query.filter(transaction::Column::DateKey.eq(key));
    }

    let rows = query
        .order_by_desc(transaction::Column::Datetime)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;

    rows.into_iter().map(from_model).collect()
}

/// Retrieves transactions whose calendar day lies in `start..=end`, newest first.
///
/// Both bounds are whole UTC days: everything on `end` is included.
pub async fn get_transactions_by_date_range(
    db: &DatabaseConnection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Transaction>> {
    if end < start {
        return Err(Error::validation(format!(
            "range end {end} is before range start {start}"
        )));
    }

    let lower = start.and_time(NaiveTime::MIN).and_utc();
    let upper = end
        .checked_add_days(Days::new(1))
        .ok_or_else(|| Error::validation(format!("range end {end} is out of bounds")))?
        .and_time(NaiveTime::MIN)
        .and_utc();

    let rows = TransactionEntity::find()
        .filter(transaction::Column::Datetime.gte(lower))
        .filter(transaction::Column::Datetime.lt(upper))
        .order_by_desc(transaction::Column::Datetime)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;

    debug!(count = rows.len(), %start, %end, "Loaded transactions in range");
    rows.into_iter().map(from_model).collect()
}

/// Retrieves a specific transaction by its id, returning `None` if it does not exist.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: &str,
) -> Result<Option<Transaction>> {
    TransactionEntity::find_by_id(transaction_id.to_string())
        .one(db)
        .await?
        .map(from_model)
        .transpose()
}

/// Deletes a transaction and reverses its effect on the daily summary.
///
/// Both writes share one database transaction.
#[instrument(skip(db))]
pub async fn delete_transaction(db: &DatabaseConnection, transaction_id: &str) -> Result<()> {
    let txn = db.begin().await?;

    let row = TransactionEntity::find_by_id(transaction_id.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Transaction",
            key: transaction_id.to_string(),
        })?;

    let stored = from_model(row.clone())?;
    row.delete(&txn).await?;
    apply_to_summary(&txn, &stored.date_key, stored.kind(), -stored.amount, -1).await?;

    txn.commit().await?;
    info!(id = transaction_id, "Transaction deleted");
    Ok(())
}

/// Flattens a domain transaction into a row ready for insert.
pub(crate) fn to_active_model(tx: &Transaction) -> transaction::ActiveModel {
    let (customer, category, notes, vendor, description, payment_method) = match &tx.details {
        TransactionDetails::Sale {
            customer,
            category,
            notes,
        } => (
            customer.clone(),
            category.clone(),
            notes.clone(),
            None,
            None,
            None,
        ),
        TransactionDetails::Expense {
            category,
            vendor,
            description,
            payment_method,
        } => (
            None,
            Some(category.clone()),
            None,
            vendor.clone(),
            description.clone(),
            Some(payment_method.as_str().to_string()),
        ),
    };

    transaction::ActiveModel {
        id: Set(tx.id.clone()),
        amount: Set(tx.amount),
        datetime: Set(tx.datetime),
        date_key: Set(tx.date_key.clone()),
        kind: Set(tx.kind().as_str().to_string()),
        customer: Set(customer),
        category: Set(category),
        notes: Set(notes),
        vendor: Set(vendor),
        description: Set(description),
        payment_method: Set(payment_method),
    }
}

/// Rebuilds the domain transaction from a row, rejecting rows with an unknown kind.
pub(crate) fn from_model(row: transaction::Model) -> Result<Transaction> {
    let details = match row.kind.as_str() {
        "sale" => TransactionDetails::Sale {
            customer: row.customer,
            category: row.category,
            notes: row.notes,
        },
        "expense" => TransactionDetails::Expense {
            category: row.category.unwrap_or_default(),
            vendor: row.vendor,
            description: row.description,
            payment_method: row
                .payment_method
                .as_deref()
                .map(str::parse::<PaymentMethod>)
                .transpose()
                .map_err(|message| Error::Database(DbErr::Custom(message)))?
                .unwrap_or_default(),
        },
        other => {
            return Err(Error::Database(DbErr::Custom(format!(
                "transaction {} has unknown kind `{other}`",
                row.id
            ))));
        }
    };

    Ok(Transaction {
        id: row.id,
        amount: row.amount,
        datetime: row.datetime,
        date_key: row.date_key,
        details,
    })
}
