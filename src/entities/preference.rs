//! Preference entity - The user settings blob, stored under the fixed id `"default"`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key of the only preferences row.
pub const DEFAULT_ID: &str = "default";

/// Preferences database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "preferences")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// `"dark"` or `"light"`
    pub theme: String,
    /// Currency code shown next to amounts (e.g. `"GHS"`)
    pub currency: String,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    /// JSON array of category names
    pub default_categories: Json,
    pub notification_enabled: bool,
}

/// `Preference` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
