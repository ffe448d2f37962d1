use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use super::{Category, Cents, Transaction, TransactionType, Wallet, WalletId};

/// How many transactions the "recent" view shows by default.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Read-only view over wallets and transactions. Every figure is computed
/// from scratch on each call; nothing is cached between calls.
#[derive(Debug, Clone, Copy)]
pub struct Ledger<'a> {
    wallets: &'a [Wallet],
    transactions: &'a [Transaction],
}

/// Net change of the current month relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum MonthChange {
    /// Both months netted to zero.
    None,
    /// Previous month netted to zero, so the current net is reported as is.
    Absolute(Cents),
    /// `(current - previous) / |previous| * 100`, sign preserved.
    Percentage(f64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeTotals {
    pub income: Cents,
    pub expense: Cents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: Cents,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletSummary<'a> {
    pub wallet: &'a Wallet,
    pub balance: Cents,
    pub month_change: Cents,
}

impl<'a> Ledger<'a> {
    pub fn new(wallets: &'a [Wallet], transactions: &'a [Transaction]) -> Self {
        Self {
            wallets,
            transactions,
        }
    }

    pub fn wallets(&self) -> &'a [Wallet] {
        self.wallets
    }

    pub fn transactions(&self) -> &'a [Transaction] {
        self.transactions
    }

    fn find_wallet(&self, wallet_id: WalletId) -> Option<&'a Wallet> {
        self.wallets.iter().find(|w| w.id == wallet_id)
    }

    fn for_wallet(&self, wallet_id: WalletId) -> impl Iterator<Item = &'a Transaction> {
        self.transactions
            .iter()
            .filter(move |t| t.wallet_id == wallet_id)
    }

    /// Initial balance plus income minus expenses. A missing wallet has a
    /// balance of zero, even if orphaned transactions still point at it.
    pub fn wallet_balance(&self, wallet_id: WalletId) -> Cents {
        let Some(wallet) = self.find_wallet(wallet_id) else {
            return 0;
        };

        self.for_wallet(wallet_id)
            .fold(wallet.initial_balance, |balance, t| {
                balance.saturating_add(t.signed_amount())
            })
    }

    /// Net change of a wallet from the first day of `today`'s month up to and
    /// including `today`.
    pub fn wallet_month_change(&self, wallet_id: WalletId, today: NaiveDate) -> Cents {
        if self.find_wallet(wallet_id).is_none() {
            return 0;
        }

        let start = first_of_month(today);
        net(self
            .for_wallet(wallet_id)
            .filter(|t| t.date >= start && t.date <= today))
    }

    pub fn total_balance(&self) -> Cents {
        self.wallets
            .iter()
            .map(|w| self.wallet_balance(w.id))
            .fold(0, Cents::saturating_add)
    }

    /// Compare month-to-date net against the whole previous calendar month.
    /// Covers every transaction, including orphaned ones.
    pub fn month_over_month_change(&self, today: NaiveDate) -> MonthChange {
        let current_start = first_of_month(today);
        let previous_start = first_of_month(current_start - Duration::days(1));

        let current = net(self
            .transactions
            .iter()
            .filter(|t| t.date >= current_start && t.date <= today));
        let previous = net(self
            .transactions
            .iter()
            .filter(|t| t.date >= previous_start && t.date < current_start));

        if previous == 0 {
            if current == 0 {
                MonthChange::None
            } else {
                MonthChange::Absolute(current)
            }
        } else {
            let percentage =
                (current as f64 - previous as f64) / previous.unsigned_abs() as f64 * 100.0;
            MonthChange::Percentage(percentage)
        }
    }

    /// All transactions, newest first by date then time. Ties keep their
    /// collection order.
    pub fn sorted_transactions(&self) -> Vec<&'a Transaction> {
        let mut sorted: Vec<&Transaction> = self.transactions.iter().collect();
        sorted.sort_by_key(|t| std::cmp::Reverse(t.occurred_at()));
        sorted
    }

    pub fn recent_transactions(&self, limit: usize) -> Vec<&'a Transaction> {
        let mut sorted = self.sorted_transactions();
        sorted.truncate(limit);
        sorted
    }

    pub fn totals_by_type(&self) -> TypeTotals {
        self.transactions
            .iter()
            .fold(TypeTotals::default(), |mut totals, t| {
                match t.transaction_type {
                    TransactionType::Income => {
                        totals.income = totals.income.saturating_add(t.amount)
                    }
                    TransactionType::Expense => {
                        totals.expense = totals.expense.saturating_add(t.amount)
                    }
                }
                totals
            })
    }

    /// Share of income left after expenses, as a percentage. Zero when there
    /// is no income at all.
    pub fn savings_rate(&self) -> f64 {
        let totals = self.totals_by_type();
        if totals.income > 0 {
            (totals.income as f64 - totals.expense as f64) / totals.income as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Summed expenses per category, in order of first appearance.
    pub fn expenses_by_category(&self) -> Vec<CategoryTotal> {
        let mut totals: Vec<CategoryTotal> = Vec::new();
        for t in self
            .transactions
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Expense)
        {
            match totals.iter_mut().find(|c| c.category == t.category) {
                Some(entry) => entry.amount = entry.amount.saturating_add(t.amount),
                None => totals.push(CategoryTotal {
                    category: t.category,
                    amount: t.amount,
                }),
            }
        }
        totals
    }

    /// Expense category with the largest total. On a tie the category seen
    /// first wins.
    pub fn top_category(&self) -> Option<CategoryTotal> {
        self.expenses_by_category()
            .into_iter()
            .fold(None, |top, candidate| match top {
                Some(current) if current.amount >= candidate.amount => Some(current),
                _ if candidate.amount > 0 => Some(candidate),
                _ => top,
            })
    }

    /// Balance and month change for every wallet, in collection order.
    pub fn wallet_summaries(&self, today: NaiveDate) -> Vec<WalletSummary<'a>> {
        self.wallets
            .iter()
            .map(|wallet| WalletSummary {
                wallet,
                balance: self.wallet_balance(wallet.id),
                month_change: self.wallet_month_change(wallet.id, today),
            })
            .collect()
    }
}

fn net<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> Cents {
    transactions
        .map(Transaction::signed_amount)
        .fold(0, Cents::saturating_add)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}
