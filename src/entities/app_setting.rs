//! App setting entity - Application metadata, including the schema version the
//! startup migration reads and bumps.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key of the only settings row.
pub const APP_ID: &str = "app";

/// App settings database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Crate version that last opened the store
    pub version: String,
    /// Schema version the tables conform to
    pub schema_version: i32,
    pub first_launch: bool,
    pub onboarding_completed: bool,
    pub last_backup: Option<DateTimeUtc>,
    /// `"json"` or `"csv"`
    pub data_export_format: String,
}

/// `AppSetting` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
