//! Daily summary maintenance.
//!
//! One summary row exists per calendar day that has seen a transaction. The row is
//! only ever written by [`apply_to_summary`], which callers run on the same database
//! transaction as the transaction insert or delete it reflects. Both writes commit
//! together or not at all, so for every `date_key`:
//!
//! * `total_sales` is the sum of sale amounts with that key,
//! * `total_expenses` is the sum of expense amounts with that key,
//! * `net_profit` is `total_sales - total_expenses`,
//! * `transaction_count` is the number of transactions with that key.

use crate::{
    entities::{DailySummary, daily_summary},
    errors::{Error, Result},
    models::{DATE_KEY_FORMAT, TransactionKind},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use tracing::{debug, instrument};

/// Parses a `YYYY-MM-DD` key.
///
/// # Errors
/// Returns [`Error::Validation`] for anything that is not a calendar date.
pub fn parse_date_key(date_key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_key, DATE_KEY_FORMAT)
        .map_err(|e| Error::validation(format!("invalid date key `{date_key}`: {e}")))
}

/// Adds `amount_delta` to the sales or expense total of the summary for `date_key`
/// and `count_delta` to its transaction count, creating the row if needed.
///
/// Pass the open database transaction of the caller as `db`; the summary write then
/// shares its fate with the transaction row it accounts for. Use negative deltas to
/// reverse a transaction.
#[instrument(skip(db))]
pub async fn apply_to_summary<C>(
    db: &C,
    date_key: &str,
    kind: TransactionKind,
    amount_delta: f64,
    count_delta: i64,
) -> Result<daily_summary::Model>
where
    C: ConnectionTrait,
{
    let existing = DailySummary::find_by_id(date_key.to_string()).one(db).await?;
    let is_new = existing.is_none();
    let mut summary = match existing {
        Some(summary) => summary,
        None => daily_summary::Model::empty(parse_date_key(date_key)?),
    };

    match kind {
        TransactionKind::Sale => summary.total_sales += amount_delta,
        TransactionKind::Expense => summary.total_expenses += amount_delta,
    }
    summary.net_profit = summary.total_sales - summary.total_expenses;
    summary.transaction_count += count_delta;

    let active = daily_summary::ActiveModel {
        date_key: Set(summary.date_key.clone()),
        date: Set(summary.date),
        total_sales: Set(summary.total_sales),
        total_expenses: Set(summary.total_expenses),
        net_profit: Set(summary.net_profit),
        transaction_count: Set(summary.transaction_count),
    };

    let written = if is_new {
        active.insert(db).await?
    } else {
        active.update(db).await?
    };
    debug!(
        count = written.transaction_count,
        net_profit = written.net_profit,
        "Summary updated"
    );
    Ok(written)
}

/// Returns the summary for `date_key`, or an all-zero summary if the day has no
/// transactions yet.
pub async fn get_daily_summary(
    db: &DatabaseConnection,
    date_key: &str,
) -> Result<daily_summary::Model> {
    let date = parse_date_key(date_key)?;
    let found = DailySummary::find_by_id(date_key.to_string()).one(db).await?;
    Ok(found.unwrap_or_else(|| daily_summary::Model::empty(date)))
}

/// Returns up to `limit` stored summaries, most recent day first.
pub async fn get_recent_summaries(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<daily_summary::Model>> {
    DailySummary::find()
        .order_by_desc(daily_summary::Column::DateKey)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns every stored summary in ascending date order.
pub async fn get_all_summaries<C>(db: &C) -> Result<Vec<daily_summary::Model>>
where
    C: ConnectionTrait,
{
    DailySummary::find()
        .order_by_asc(daily_summary::Column::DateKey)
        .all(db)
        .await
        .map_err(Into::into)
}
