//! PIN setting entity - The single credential record guarding the app.
//!
//! At most one row exists, under [`SINGLETON_ID`]. It is replaced wholesale on every
//! verification attempt and on PIN change.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Primary key of the only PIN row.
pub const SINGLETON_ID: i32 = 1;

/// PIN settings database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pin_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    /// Four-digit credential
    pub pin: String,
    pub is_enabled: bool,
    pub created_at: DateTimeUtc,
    pub last_modified: DateTimeUtc,
    /// Consecutive failed verifications since the last success or PIN change
    pub failed_attempts: i32,
    pub last_attempt: Option<DateTimeUtc>,
    pub is_locked: bool,
    /// Set whenever `is_locked` is true
    pub lock_until: Option<DateTimeUtc>,
}

/// `PinSetting` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
