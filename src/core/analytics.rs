//! Read-side aggregation over the transaction log.
//!
//! Nothing here is cached or persisted. Every view is recomputed from a transaction
//! list fetched fresh from the store; the functions in this module are pure over that
//! list and an explicit `now`, so the same inputs always give the same answer.
//!
//! Two windowing policies coexist and must not be confused:
//!
//! * dashboard windows are rolling: "week" is everything at or after `now - 7 days`,
//!   "month" everything at or after `now - 30 days`;
//! * [`Window::CalendarMonth`] covers the whole UTC days of one calendar month and is
//!   what the monthly report uses.

use crate::{
    core::transaction::get_transactions,
    models::{self, Transaction, TransactionDetails, TransactionKind},
    notify::{Notifier, Severity},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use sea_orm::DatabaseConnection;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// A time range transactions are filtered by before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The UTC calendar day of `now`
    Today,
    /// The UTC calendar day before `now`
    Yesterday,
    /// At or after `now - 7 days`
    LastSevenDays,
    /// At or after `now - 30 days`
    LastThirtyDays,
    /// Between two instants, both inclusive
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Every UTC day of one calendar month
    CalendarMonth { year: i32, month: u32 },
    /// No filtering
    All,
}

impl Window {
    /// Whether a transaction at `datetime` falls inside this window as seen at `now`.
    #[must_use]
    pub fn contains(&self, datetime: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match *self {
            Self::Today => datetime.date_naive() == now.date_naive(),
            Self::Yesterday => now
                .date_naive()
                .pred_opt()
                .is_some_and(|day| datetime.date_naive() == day),
            Self::LastSevenDays => datetime >= now - Duration::days(7),
            Self::LastThirtyDays => datetime >= now - Duration::days(30),
            Self::Custom { start, end } => start <= datetime && datetime <= end,
            Self::CalendarMonth { year, month } => {
                datetime.year() == year && datetime.month() == month
            }
            Self::All => true,
        }
    }
}

/// Sales, expenses and profit over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodTotals {
    pub sales: f64,
    pub expenses: f64,
    pub profit: f64,
    pub count: usize,
}

impl PeriodTotals {
    /// Totals every transaction yielded by `transactions`.
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut totals = Self::default();
        for tx in transactions {
            match tx.kind() {
                TransactionKind::Sale => totals.sales += tx.amount,
                TransactionKind::Expense => totals.expenses += tx.amount,
            }
            totals.count += 1;
        }
        totals.profit = totals.sales - totals.expenses;
        totals
    }

    /// Expenses as a whole percentage of sales.
    #[must_use]
    pub fn expense_ratio(&self) -> i64 {
        expense_ratio(self.sales, self.expenses)
    }

    /// Profit as a whole percentage of sales.
    #[must_use]
    pub fn profit_margin(&self) -> i64 {
        profit_margin(self.sales, self.profit)
    }
}

/// Which dashboard period a view is computed for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DashboardPeriod {
    #[default]
    Today,
    Week,
    Month,
}

/// Rolling totals shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dashboard {
    pub today: PeriodTotals,
    pub week: PeriodTotals,
    pub month: PeriodTotals,
}

impl Dashboard {
    #[must_use]
    pub const fn period(&self, period: DashboardPeriod) -> &PeriodTotals {
        match period {
            DashboardPeriod::Today => &self.today,
            DashboardPeriod::Week => &self.week,
            DashboardPeriod::Month => &self.month,
        }
    }
}

/// Transactions inside `window`, in their original order.
#[must_use]
pub fn filter_window(
    transactions: &[Transaction],
    window: Window,
    now: DateTime<Utc>,
) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|tx| window.contains(tx.datetime, now))
        .collect()
}

/// Totals for the transactions inside `window`.
#[must_use]
pub fn period_totals(
    transactions: &[Transaction],
    window: Window,
    now: DateTime<Utc>,
) -> PeriodTotals {
    PeriodTotals::from_transactions(
        transactions
            .iter()
            .filter(|tx| window.contains(tx.datetime, now)),
    )
}

/// Today, last-7-days and last-30-days totals.
#[must_use]
pub fn dashboard(transactions: &[Transaction], now: DateTime<Utc>) -> Dashboard {
    Dashboard {
        today: period_totals(transactions, Window::Today, now),
        week: period_totals(transactions, Window::LastSevenDays, now),
        month: period_totals(transactions, Window::LastThirtyDays, now),
    }
}

/// Full English weekday name.
#[must_use]
pub const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Groups by `key` and sums sale amounts per group.
///
/// Every transaction creates its group, so a group with only expenses is present
/// with a zero sum.
fn sum_sales_by<'a, I, F>(transactions: I, key: F) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a Transaction>,
    F: Fn(&Transaction) -> String,
{
    let mut groups = BTreeMap::new();
    for tx in transactions {
        let sum = groups.entry(key(tx)).or_insert(0.0);
        if tx.is_sale() {
            *sum += tx.amount;
        }
    }
    groups
}

/// Sale totals per weekday name (UTC).
pub fn sales_by_weekday<'a, I>(transactions: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    sum_sales_by(transactions, |tx| {
        weekday_name(tx.datetime.weekday()).to_string()
    })
}

/// Sale totals per category; a missing category counts as `"Uncategorized"`.
pub fn sales_by_category<'a, I>(transactions: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    sum_sales_by(transactions, |tx| tx.category_or_default().to_string())
}

/// Sale totals per `date_key`.
pub fn sales_by_day<'a, I>(transactions: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    sum_sales_by(transactions, |tx| models::date_key(tx.datetime))
}

/// The group with the largest sum, if any sum is above zero.
///
/// Groups are visited in key order and only a strictly larger sum replaces the
/// leader, so ties go to the alphabetically smallest key.
#[must_use]
pub fn best_group(groups: &BTreeMap<String, f64>) -> Option<(&str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for (key, &sum) in groups {
        if sum > best.map_or(0.0, |(_, max)| max) {
            best = Some((key.as_str(), sum));
        }
    }
    best
}

/// The group with the smallest sum above zero. Ties go to the smallest key.
#[must_use]
pub fn worst_group(groups: &BTreeMap<String, f64>) -> Option<(&str, f64)> {
    let mut worst: Option<(&str, f64)> = None;
    for (key, &sum) in groups {
        if sum > 0.0 && worst.is_none_or(|(_, min)| sum < min) {
            worst = Some((key.as_str(), sum));
        }
    }
    worst
}

/// Rounds to the nearest integer with halves going up, as `Math.round` does.
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// [`round_half_up`] as an integer.
#[must_use]
pub fn round_to_int(value: f64) -> i64 {
    // Money totals and percentages are far inside the i64 range
    #[allow(clippy::cast_possible_truncation)]
    let rounded = round_half_up(value) as i64;
    rounded
}

/// `part / whole` as a whole percentage, or 0 when `whole` is zero.
#[must_use]
pub fn percent_of(part: f64, whole: f64) -> i64 {
    if whole == 0.0 {
        return 0;
    }
    round_to_int(part / whole * 100.0)
}

/// Expenses as a whole percentage of sales; 0 when there are no sales.
#[must_use]
pub fn expense_ratio(sales: f64, expenses: f64) -> i64 {
    percent_of(expenses, sales)
}

/// Profit as a whole percentage of sales; 0 when there are no sales.
#[must_use]
pub fn profit_margin(sales: f64, profit: f64) -> i64 {
    percent_of(profit, sales)
}

/// Percentage change of profit, rounded to one decimal.
///
/// A previous profit of zero reports 100 when the current profit is positive and 0
/// otherwise.
#[must_use]
pub fn profit_growth(current: f64, previous: f64) -> f64 {
    if previous == 0.0 || previous.is_nan() {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    let growth = (current - previous) / previous * 100.0;
    round_half_up(growth * 10.0) / 10.0
}

/// "Today", "Yesterday" or the weekday name of a `date_key`.
#[must_use]
pub fn day_label(date_key: &str, now: DateTime<Utc>) -> String {
    let Ok(date) = NaiveDate::parse_from_str(date_key, models::DATE_KEY_FORMAT) else {
        return date_key.to_string();
    };
    let today = now.date_naive();
    if date == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_string()
    } else {
        weekday_name(date.weekday()).to_string()
    }
}

/// Best sales day on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct BestDay {
    pub date_key: String,
    pub label: String,
    pub amount: f64,
}

/// Top sales category on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct TopCategory {
    pub name: String,
    pub amount: f64,
    /// Share of the last 30 days' sales, in whole percent
    pub share: i64,
}

/// Highlights computed over the whole log.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    pub best_day: Option<BestDay>,
    pub top_category: Option<TopCategory>,
    pub expense_ratio: i64,
}

/// Computes the dashboard highlights.
///
/// Best day and top category rank the whole log; the expense ratio uses the selected
/// dashboard period.
#[must_use]
pub fn performance_metrics(
    transactions: &[Transaction],
    dashboard: &Dashboard,
    period: DashboardPeriod,
    now: DateTime<Utc>,
) -> PerformanceMetrics {
    let days = sales_by_day(transactions);
    let best_day = best_group(&days).map(|(key, amount)| BestDay {
        date_key: key.to_string(),
        label: day_label(key, now),
        amount,
    });

    let categories = sales_by_category(transactions);
    let top_category = best_group(&categories).map(|(name, amount)| TopCategory {
        name: name.to_string(),
        amount,
        share: percent_of(amount, dashboard.month.sales),
    });

    PerformanceMetrics {
        best_day,
        top_category,
        expense_ratio: dashboard.period(period).expense_ratio(),
    }
}

/// Headline numbers for the selected dashboard period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickStats {
    /// Last 30 days' sales spread over 30 days, rounded
    pub avg_daily_sales: i64,
    pub transaction_count: usize,
    pub expense_ratio: i64,
    pub profit_margin: i64,
}

#[must_use]
pub fn quick_stats(dashboard: &Dashboard, period: DashboardPeriod) -> QuickStats {
    let selected = dashboard.period(period);
    let avg_daily_sales = if dashboard.month.count > 0 {
        round_to_int(dashboard.month.sales / 30.0)
    } else {
        0
    };
    QuickStats {
        avg_daily_sales,
        transaction_count: selected.count,
        expense_ratio: selected.expense_ratio(),
        profit_margin: selected.profit_margin(),
    }
}

/// One line of the recent activity feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: String,
    pub kind: TransactionKind,
    pub amount: f64,
    /// Customer or vendor, falling back to "Sale" / "Expense"
    pub description: String,
    pub time_ago: String,
}

/// Coarse age of `datetime` relative to `now`.
#[must_use]
pub fn time_ago(datetime: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - datetime;
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

/// The `limit` newest transactions as activity entries.
#[must_use]
pub fn recent_activity(
    transactions: &[Transaction],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<Activity> {
    let mut newest: Vec<&Transaction> = transactions.iter().collect();
    newest.sort_by(|a, b| b.datetime.cmp(&a.datetime));

    newest
        .into_iter()
        .take(limit)
        .map(|tx| {
            let description = match &tx.details {
                TransactionDetails::Sale { customer, .. } => {
                    customer.clone().unwrap_or_else(|| "Sale".to_string())
                }
                TransactionDetails::Expense { vendor, .. } => {
                    vendor.clone().unwrap_or_else(|| "Expense".to_string())
                }
            };
            Activity {
                id: tx.id.clone(),
                kind: tx.kind(),
                amount: tx.amount,
                description,
                time_ago: time_ago(tx.datetime, now),
            }
        })
        .collect()
}

/// Case-insensitive search over customer, vendor, description, category and amount.
///
/// An empty query matches everything.
#[must_use]
pub fn search_transactions<'a>(
    transactions: &'a [Transaction],
    query: &str,
) -> Vec<&'a Transaction> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return transactions.iter().collect();
    }
    let hit = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(&needle));

    transactions
        .iter()
        .filter(|tx| {
            let (customer, vendor, description) = match &tx.details {
                TransactionDetails::Sale { customer, .. } => (customer.as_deref(), None, None),
                TransactionDetails::Expense {
                    vendor,
                    description,
                    ..
                } => (None, vendor.as_deref(), description.as_deref()),
            };
            hit(customer)
                || hit(vendor)
                || hit(description)
                || hit(tx.details.category())
                || tx.amount.to_string().contains(&needle)
        })
        .collect()
}

/// Fetches every transaction, degrading to an empty list if the read fails.
///
/// A failure is logged and reported through `notifier` as a "Data Error"; it never
/// reaches the caller.
pub async fn load_transactions_or_empty(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
) -> Vec<Transaction> {
    match get_transactions(db, None).await {
        Ok(transactions) => {
            debug!(count = transactions.len(), "Loaded transactions");
            transactions
        }
        Err(e) => {
            error!(error = %e, "Failed to load transactions");
            notifier.notify(
                Severity::Error,
                "Failed to load transactions. Showing empty data.",
                "Data Error",
            );
            Vec::new()
        }
    }
}

/// Fetches the log and computes the dashboard totals.
pub async fn load_dashboard(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Dashboard {
    let transactions = load_transactions_or_empty(db, notifier).await;
    dashboard(&transactions, now)
}
