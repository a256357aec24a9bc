//! Daily summary entity - Incrementally maintained totals for one calendar day.
//!
//! Rows are written only inside the database transaction that inserts or deletes the
//! matching transaction rows, so the totals always agree with the transaction log.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily summary database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "summaries")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// `YYYY-MM-DD` bucket key
    #[sea_orm(primary_key, auto_increment = false)]
    pub date_key: String,
    /// Calendar date named by `date_key`
    pub date: Date,
    /// Sum of sale amounts for the day
    pub total_sales: f64,
    /// Sum of expense amounts for the day
    pub total_expenses: f64,
    /// `total_sales - total_expenses`
    pub net_profit: f64,
    /// Number of transactions for the day
    pub transaction_count: i64,
}

impl Model {
    /// All-zero summary for `date`.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date_key: date.format(crate::models::DATE_KEY_FORMAT).to_string(),
            date,
            total_sales: 0.0,
            total_expenses: 0.0,
            net_profit: 0.0,
            transaction_count: 0,
        }
    }
}

/// `DailySummary` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
