//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the persisted tables of the bookkeeping store.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod app_setting;
pub mod daily_summary;
pub mod pin_setting;
pub mod preference;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use app_setting::{Column as AppSettingColumn, Entity as AppSetting, Model as AppSettingModel};
pub use daily_summary::{
    Column as DailySummaryColumn, Entity as DailySummary, Model as DailySummaryModel,
};
pub use pin_setting::{Column as PinSettingColumn, Entity as PinSetting, Model as PinSettingModel};
pub use preference::{Column as PreferenceColumn, Entity as Preference, Model as PreferenceModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
