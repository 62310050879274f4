use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_FILE: &str = "expenses.csv";
pub const DEFAULT_CATEGORIES: [&str; 5] = ["Food", "Transport", "Utilities", "Entertainment", "Other"];

/// Column names of the backing file, in storage order.
pub const HEADER: [&str; 4] = ["Date", "Amount", "Category", "Description"];
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where the records live and which categories exist. Handed to the store
/// and the collector when they are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub path: PathBuf,
    pub categories: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_FILE),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// One logged expense. The field order is the column order of the file.
///
/// `date` is kept as the text that was stored: records read back from a
/// hand-edited file don't have to carry a parseable timestamp to be summed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Expense {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Description")]
    pub description: String,
}

impl Expense {
    pub fn new(date: NaiveDateTime, amount: Decimal, category: &str, description: &str) -> Self {
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            amount,
            category: category.to_string(),
            description: description.to_string(),
        }
    }
}

/// Parses a decimal amount the way it may be typed or stored: surrounding
/// whitespace is ignored and scientific notation is accepted.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Rejected console input. The messages are shown as-is before re-prompting.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid input. Please enter a number.")]
    NotANumber,
    #[error("Amount must be positive.")]
    NotPositive,
    #[error("Invalid choice. Please select a number from the list.")]
    OutOfRange,
}

/// Why a stored row could not be turned back into an `Expense`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RowError {
    #[error("expected 4 fields, found {0}")]
    FieldCount(usize),
    #[error("amount {0:?} is not a number")]
    BadAmount(String),
    #[error("amount {0} overflows the running total")]
    Overflow(Decimal),
}

/// Failures of the backing file itself.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
