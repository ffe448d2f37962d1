use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, WalletId};

pub type TransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = UnknownTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(UnknownTransactionType(s.to_string())),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTransactionType(pub String);

impl fmt::Display for UnknownTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown transaction type '{}' (expected income or expense)",
            self.0
        )
    }
}

impl std::error::Error for UnknownTransactionType {}

/// Fixed spending categories. `Other` covers anything unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Food,
    Shopping,
    Transport,
    Entertainment,
    Bills,
    Health,
    SmokeDrink,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Shopping,
        Category::Transport,
        Category::Entertainment,
        Category::Bills,
        Category::Health,
        Category::SmokeDrink,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Shopping => "shopping",
            Category::Transport => "transport",
            Category::Entertainment => "entertainment",
            Category::Bills => "bills",
            Category::Health => "health",
            Category::SmokeDrink => "smoke-drink",
            Category::Other => "other",
        }
    }

    /// Human-readable label shown in lists and analytics.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Food => "Food & Dining",
            Category::Shopping => "Shopping",
            Category::Transport => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills & Utilities",
            Category::Health => "Health & Medical",
            Category::SmokeDrink => "Smoke/Drink",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        write!(
            f,
            "unknown category '{}' (expected one of: {})",
            self.0,
            names.join(", ")
        )
    }
}

impl std::error::Error for UnknownCategory {}

/// A single income or expense attributed to a wallet.
///
/// `amount` is a magnitude; its direction comes from `transaction_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Cents,
    #[serde(default)]
    pub category: Category,
    pub date: NaiveDate,
    /// Local time of day as entered ("HH:MM"). Only used for display and as
    /// a secondary sort key.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Transaction {
    pub fn new(
        wallet_id: WalletId,
        transaction_type: TransactionType,
        amount: Cents,
        category: Category,
        date: NaiveDate,
        time: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            transaction_type,
            amount,
            category,
            date,
            time,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Amount with the sign implied by the transaction type.
    pub fn signed_amount(&self) -> Cents {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => self.amount.saturating_neg(),
        }
    }

    /// Combined date and time used for ordering. An unparsable time sorts as
    /// the start of its day.
    pub fn occurred_at(&self) -> NaiveDateTime {
        let time = parse_time_of_day(&self.time).unwrap_or(NaiveTime::MIN);
        self.date.and_time(time)
    }

    /// The comment if there is one, otherwise the category name.
    pub fn label(&self) -> &str {
        match self.comment.as_deref().map(str::trim) {
            Some(comment) if !comment.is_empty() => comment,
            _ => self.category.display_name(),
        }
    }
}

/// Parse "HH:MM" or "HH:MM:SS".
pub fn parse_time_of_day(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .ok()
}
