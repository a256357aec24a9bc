use chrono::{Datelike, Utc};
use dotenvy::dotenv;
use salesbook::{
    config::{self, database},
    core::{
        analytics::{self, DashboardPeriod},
        pin, preferences, report,
    },
    errors::Result,
    notify::{Notifier, TracingNotifier},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Open the store and bring the schema up to date
    let db = database::init_store(&app_config.database_url)
        .await
        .inspect(|_| info!("Store opened at {}", app_config.database_url))
        .inspect_err(|e| error!("Failed to open store: {}", e))?;

    // 5. Make sure a PIN record exists
    let now = Utc::now();
    let notifier = TracingNotifier;
    let record = pin::ensure_pin_record(&db, &app_config.security, now).await?;
    if pin::is_default_pin(&record.pin) {
        notifier.warning("You are still using a default PIN. Change it in Settings.");
    }
    if let Some(minutes) = pin::lock_status(&db, now).await? {
        warn!(minutes, "PIN entry is locked");
    }

    // 6. Dashboard for today
    let transactions = analytics::load_transactions_or_empty(&db, &notifier).await;
    let dashboard = analytics::dashboard(&transactions, now);
    let stats = analytics::quick_stats(&dashboard, DashboardPeriod::Today);
    info!(
        sales = dashboard.today.sales,
        expenses = dashboard.today.expenses,
        profit = dashboard.today.profit,
        count = stats.transaction_count,
        margin = stats.profit_margin,
        "Today"
    );

    // 7. This month's shareable report
    let currency = preferences::get_user_preferences(&db)
        .await
        .map(|prefs| prefs.currency)
        .unwrap_or(app_config.currency);
    let monthly = report::monthly_report(&transactions, now.year(), now.month())?;
    println!("{}", monthly.share_text(&currency));

    Ok(())
}
