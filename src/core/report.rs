//! Monthly report generation.
//!
//! A report covers one calendar month (whole UTC days) and compares it with the
//! calendar month before it; January compares with December of the previous year.
//! Reports are computed from the transaction log on demand and rendered to plain text
//! for sharing.

use crate::{
    core::{
        analytics::{
            PeriodTotals, Window, best_group, expense_ratio, profit_growth, round_to_int,
            sales_by_category, sales_by_weekday, worst_group,
        },
        transaction::get_transactions,
    },
    errors::{Error, Result},
    models::Transaction,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

/// Shown in place of a ranking with no positive entry.
pub const NOT_AVAILABLE: &str = "N/A";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Represents one calendar month's performance.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub year: i32,
    /// 1-based month number
    pub month: u32,
    pub sales: f64,
    pub expenses: f64,
    pub profit: f64,
    pub transaction_count: usize,
    /// Profit of the previous calendar month
    pub previous_month_profit: f64,
    pub previous_month_sales: f64,
    pub previous_transaction_count: usize,
    /// Weekday with the highest sales
    pub best_day: Option<String>,
    /// Weekday with the lowest non-zero sales
    pub worst_day: Option<String>,
    /// Sales category with the highest sales
    pub top_category: Option<String>,
}

impl MonthlyReport {
    /// "June 2025"
    #[must_use]
    pub fn month_name(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }

    /// Profit change against the previous month, in percent with one decimal.
    #[must_use]
    pub fn profit_growth(&self) -> f64 {
        profit_growth(self.profit, self.previous_month_profit)
    }

    /// Expenses as a whole percentage of sales.
    #[must_use]
    pub fn sales_to_expense_ratio(&self) -> i64 {
        expense_ratio(self.sales, self.expenses)
    }

    /// Profit spread over a 30-day month, rounded.
    #[must_use]
    pub fn average_daily_profit(&self) -> i64 {
        round_to_int(self.profit / 30.0)
    }

    /// Sales difference against the previous month.
    #[must_use]
    pub fn sales_increase(&self) -> f64 {
        self.sales - self.previous_month_sales
    }

    /// Transaction count difference against the previous month.
    #[must_use]
    pub fn transaction_growth(&self) -> i64 {
        let current = i64::try_from(self.transaction_count).unwrap_or(i64::MAX);
        let previous = i64::try_from(self.previous_transaction_count).unwrap_or(i64::MAX);
        current - previous
    }

    /// Renders the plain-text report users copy and share.
    #[must_use]
    pub fn share_text(&self, currency: &str) -> String {
        let or_na =
            |value: &Option<String>| value.as_deref().unwrap_or(NOT_AVAILABLE).to_string();
        [
            format!("Monthly Report - {}", self.month_name()),
            format!("Profit: {}", format_currency(self.profit, currency)),
            format!("Sales: {}", format_currency(self.sales, currency)),
            format!("Expenses: {}", format_currency(self.expenses, currency)),
            format!("Growth: {}%", self.profit_growth()),
            format!("Transactions: {}", self.transaction_count),
            format!("Best Day: {}", or_na(&self.best_day)),
            format!("Top Category: {}", or_na(&self.top_category)),
        ]
        .join("\n")
    }
}

/// English name of a 1-based month number; empty if out of range.
#[must_use]
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or_default()
}

/// The calendar month before `year`/`month`.
#[must_use]
pub const fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Formats an amount with thousands separators and at most two decimals.
///
/// Formats like "GHS 1,234.5" or "GHS 0".
#[must_use]
pub fn format_currency(amount: f64, currency: &str) -> String {
    format!("{currency} {}", format_number(amount))
}

/// Groups the integer part in threes and drops trailing zero decimals.
#[must_use]
pub fn format_number(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}

/// Builds the report for `year`/`month` from the full transaction log.
///
/// # Errors
/// Returns [`Error::Validation`] if `month` is not in `1..=12`.
pub fn monthly_report(
    transactions: &[Transaction],
    year: i32,
    month: u32,
) -> Result<MonthlyReport> {
    if !(1..=12).contains(&month) {
        return Err(Error::validation(format!("month must be 1-12, got {month}")));
    }

    let in_month = |y: i32, m: u32| {
        let window = Window::CalendarMonth { year: y, month: m };
        // Calendar windows do not depend on the current time
        let anchor = DateTime::<Utc>::MIN_UTC;
        transactions
            .iter()
            .filter(move |tx| window.contains(tx.datetime, anchor))
    };

    let current = PeriodTotals::from_transactions(in_month(year, month));
    let (prev_year, prev_month) = previous_month(year, month);
    let previous = PeriodTotals::from_transactions(in_month(prev_year, prev_month));

    let weekdays = sales_by_weekday(in_month(year, month));
    let categories = sales_by_category(in_month(year, month));

    Ok(MonthlyReport {
        year,
        month,
        sales: current.sales,
        expenses: current.expenses,
        profit: current.profit,
        transaction_count: current.count,
        previous_month_profit: previous.profit,
        previous_month_sales: previous.sales,
        previous_transaction_count: previous.count,
        best_day: best_group(&weekdays).map(|(day, _)| day.to_string()),
        worst_day: worst_group(&weekdays).map(|(day, _)| day.to_string()),
        top_category: best_group(&categories).map(|(name, _)| name.to_string()),
    })
}

/// Reports for every month of `year`, January first.
#[must_use]
pub fn yearly_reports(transactions: &[Transaction], year: i32) -> Vec<MonthlyReport> {
    (1..=12)
        .filter_map(|month| monthly_report(transactions, year, month).ok())
        .collect()
}

/// Fetches the log and builds the report for `year`/`month`.
#[instrument(skip(db))]
pub async fn generate_monthly_report(
    db: &DatabaseConnection,
    year: i32,
    month: u32,
) -> Result<MonthlyReport> {
    let transactions = get_transactions(db, None).await?;
    let report = monthly_report(&transactions, year, month)?;
    info!(
        month = %report.month_name(),
        profit = report.profit,
        count = report.transaction_count,
        "Monthly report generated"
    );
    Ok(report)
}
