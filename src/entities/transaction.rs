//! Transaction entity - One row per recorded sale or expense.
//!
//! The row is the flattened form of [`crate::models::Transaction`]: `kind` holds the
//! discriminant and the variant fields are nullable columns. `date_key` is the UTC
//! calendar date of `datetime` and names the daily summary the row belongs to.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Store-assigned identifier (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Positive amount
    pub amount: f64,
    /// When the transaction happened
    #[sea_orm(indexed)]
    pub datetime: DateTimeUtc,
    /// `YYYY-MM-DD` bucket key
    #[sea_orm(indexed)]
    pub date_key: String,
    /// `"sale"` or `"expense"`
    #[sea_orm(indexed)]
    pub kind: String,
    /// Sale only
    pub customer: Option<String>,
    /// Optional for sales, required for expenses
    pub category: Option<String>,
    /// Sale only
    pub notes: Option<String>,
    /// Expense only
    pub vendor: Option<String>,
    /// Expense only
    pub description: Option<String>,
    /// Expense only
    pub payment_method: Option<String>,
}

/// `Transaction` has no relationships; summaries are keyed by `date_key` only.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
