//! Domain types shared by the store, the aggregation engine and callers.
//!
//! A transaction is either a sale or an expense. The variant-specific fields live in
//! [`TransactionDetails`] so callers match on the kind instead of probing optional
//! fields. The serialized shape (`type` tag, camelCase fields, `dateKey`) is the one
//! used by the export snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Format of a summary bucket key.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Category reported for transactions that carry none.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Sale categories offered by the app.
pub const SALE_CATEGORIES: [&str; 7] = [
    "Retail Sales",
    "Wholesale",
    "Services",
    "Online Sales",
    "Cash Sales",
    "Credit Sales",
    "Other",
];

/// Expense categories offered by the app.
pub const EXPENSE_CATEGORIES: [&str; 9] = [
    "Supplies",
    "Transportation",
    "Utilities",
    "Rent",
    "Staff",
    "Marketing",
    "Maintenance",
    "Food & Drinks",
    "Other",
];

/// Returns the UTC calendar date of `datetime` as a `YYYY-MM-DD` key.
#[must_use]
pub fn date_key(datetime: DateTime<Utc>) -> String {
    datetime.format(DATE_KEY_FORMAT).to_string()
}

/// Discriminant of a transaction as stored in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money in
    Sale,
    /// Money out
    Expense,
}

impl TransactionKind {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(Self::Sale),
            "expense" => Ok(Self::Expense),
            other => Err(format!("unknown transaction kind `{other}`")),
        }
    }
}

/// How an expense was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "mobile money")]
    MobileMoney,
    #[serde(rename = "bank transfer")]
    BankTransfer,
    #[serde(rename = "credit card")]
    CreditCard,
    #[serde(rename = "other")]
    Other,
}

impl PaymentMethod {
    /// Storage representation, identical to the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::MobileMoney => "mobile money",
            Self::BankTransfer => "bank transfer",
            Self::CreditCard => "credit card",
            Self::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "mobile money" => Ok(Self::MobileMoney),
            "bank transfer" => Ok(Self::BankTransfer),
            "credit card" => Ok(Self::CreditCard),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown payment method `{other}`")),
        }
    }
}

/// Variant-specific fields of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionDetails {
    /// A sale; every descriptive field is optional.
    #[serde(rename_all = "camelCase")]
    Sale {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        customer: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    /// An expense; the category is mandatory.
    #[serde(rename_all = "camelCase")]
    Expense {
        category: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vendor: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default)]
        payment_method: PaymentMethod,
    },
}

impl TransactionDetails {
    /// Discriminant of this variant
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        match self {
            Self::Sale { .. } => TransactionKind::Sale,
            Self::Expense { .. } => TransactionKind::Expense,
        }
    }

    /// Category if one was recorded
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Sale { category, .. } => category.as_deref(),
            Self::Expense { category, .. } => Some(category.as_str()),
        }
    }

    /// Counterparty: the customer of a sale or the vendor of an expense.
    #[must_use]
    pub fn counterparty(&self) -> Option<&str> {
        match self {
            Self::Sale { customer, .. } => customer.as_deref(),
            Self::Expense { vendor, .. } => vendor.as_deref(),
        }
    }
}

/// Payload accepted by the store; the id and date key are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Positive amount
    pub amount: f64,
    /// When the transaction happened, supplied by the caller
    pub datetime: DateTime<Utc>,
    /// Sale or expense fields
    pub details: TransactionDetails,
}

impl NewTransaction {
    /// Builds a sale with no optional fields set.
    #[must_use]
    pub const fn sale(amount: f64, datetime: DateTime<Utc>) -> Self {
        Self {
            amount,
            datetime,
            details: TransactionDetails::Sale {
                customer: None,
                category: None,
                notes: None,
            },
        }
    }

    /// Builds a cash expense in `category`.
    #[must_use]
    pub fn expense(amount: f64, datetime: DateTime<Utc>, category: impl Into<String>) -> Self {
        Self {
            amount,
            datetime,
            details: TransactionDetails::Expense {
                category: category.into(),
                vendor: None,
                description: None,
                payment_method: PaymentMethod::Cash,
            },
        }
    }

    /// Discriminant of the payload
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        self.details.kind()
    }
}

/// A stored transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Store-assigned identifier, never reused
    pub id: String,
    pub amount: f64,
    pub datetime: DateTime<Utc>,
    /// UTC calendar date of `datetime`; recomputed on import when absent or stale
    #[serde(default)]
    pub date_key: String,
    #[serde(flatten)]
    pub details: TransactionDetails,
}

impl Transaction {
    /// Discriminant of the stored transaction
    #[must_use]
    pub const fn kind(&self) -> TransactionKind {
        self.details.kind()
    }

    /// Whether this is a sale
    #[must_use]
    pub const fn is_sale(&self) -> bool {
        matches!(self.details, TransactionDetails::Sale { .. })
    }

    /// Category, falling back to [`UNCATEGORIZED`].
    #[must_use]
    pub fn category_or_default(&self) -> &str {
        self.details.category().unwrap_or(UNCATEGORIZED)
    }
}

/// Colour scheme of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(format!("unknown theme `{other}`")),
        }
    }
}

/// User settings blob, stored under the fixed key `"default"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub theme: Theme,
    pub currency: String,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub default_categories: Vec<String>,
    pub notification_enabled: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            currency: "GHS".to_string(),
            business_name: None,
            business_type: None,
            default_categories: Vec::new(),
            notification_enabled: true,
        }
    }
}
