//! User preferences - a single settings row under the key `"default"`.

use crate::{
    entities::{Preference, preference},
    errors::{Error, Result},
    models::UserPreferences,
};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use tracing::debug;

/// Returns the stored preferences, or the defaults when none were saved yet.
pub async fn get_user_preferences(db: &DatabaseConnection) -> Result<UserPreferences> {
    let row = Preference::find_by_id(preference::DEFAULT_ID.to_string())
        .one(db)
        .await?;
    row.map_or_else(|| Ok(UserPreferences::default()), from_model)
}

/// Replaces the stored preferences.
pub async fn save_user_preferences(
    db: &DatabaseConnection,
    prefs: &UserPreferences,
) -> Result<()> {
    Preference::insert(to_active_model(preference::DEFAULT_ID, prefs)?)
        .on_conflict(
            OnConflict::column(preference::Column::Id)
                .update_columns([
                    preference::Column::Theme,
                    preference::Column::Currency,
                    preference::Column::BusinessName,
                    preference::Column::BusinessType,
                    preference::Column::DefaultCategories,
                    preference::Column::NotificationEnabled,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;
    debug!(currency = %prefs.currency, "Preferences saved");
    Ok(())
}

pub(crate) fn to_active_model(
    id: &str,
    prefs: &UserPreferences,
) -> Result<preference::ActiveModel> {
    Ok(preference::ActiveModel {
        id: Set(id.to_string()),
        theme: Set(prefs.theme.as_str().to_string()),
        currency: Set(prefs.currency.clone()),
        business_name: Set(prefs.business_name.clone()),
        business_type: Set(prefs.business_type.clone()),
        default_categories: Set(serde_json::to_value(&prefs.default_categories)?),
        notification_enabled: Set(prefs.notification_enabled),
    })
}

fn from_model(row: preference::Model) -> Result<UserPreferences> {
    Ok(UserPreferences {
        theme: row
            .theme
            .parse()
            .map_err(|message| Error::Database(DbErr::Custom(message)))?,
        currency: row.currency,
        business_name: row.business_name,
        business_type: row.business_type,
        default_categories: serde_json::from_value(row.default_categories)?,
        notification_enabled: row.notification_enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_defaults_when_absent() -> Result<()> {
        let db = setup_test_db().await?;

        let prefs = get_user_preferences(&db).await?;
        assert_eq!(prefs, UserPreferences::default());
        assert_eq!(prefs.currency, "GHS");
        assert_eq!(prefs.theme, Theme::Light);
        assert!(prefs.notification_enabled);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_replace() -> Result<()> {
        let db = setup_test_db().await?;

        let mut prefs = UserPreferences {
            theme: Theme::Dark,
            currency: "NGN".to_string(),
            business_name: Some("Ama's Kiosk".to_string()),
            business_type: Some("Retail".to_string()),
            default_categories: vec!["Retail Sales".to_string(), "Supplies".to_string()],
            notification_enabled: false,
        };
        save_user_preferences(&db, &prefs).await?;
        assert_eq!(get_user_preferences(&db).await?, prefs);

        prefs.currency = "USD".to_string();
        prefs.default_categories.clear();
        save_user_preferences(&db, &prefs).await?;
        assert_eq!(get_user_preferences(&db).await?, prefs);

        // Still a single row
        assert_eq!(Preference::find().count(&db).await?, 1);
        Ok(())
    }
}
