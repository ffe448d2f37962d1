use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{CategoryTotal, Cents, Ledger, MonthChange, Transaction, WalletSummary};

/// Everything shown on the home screen: total balance, how it moved since
/// last month, each wallet and the latest transactions.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard<'a> {
    pub as_of: NaiveDate,
    pub total_balance: Cents,
    pub month_change: MonthChange,
    pub wallets: Vec<WalletSummary<'a>>,
    pub recent_transactions: Vec<&'a Transaction>,
}

impl<'a> Dashboard<'a> {
    pub fn build(ledger: &Ledger<'a>, today: NaiveDate, recent_limit: usize) -> Self {
        Self {
            as_of: today,
            total_balance: ledger.total_balance(),
            month_change: ledger.month_over_month_change(today),
            wallets: ledger.wallet_summaries(today),
            recent_transactions: ledger.recent_transactions(recent_limit),
        }
    }
}

/// All-time income and spending figures.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub total_income: Cents,
    pub total_spending: Cents,
    pub net: Cents,
    pub savings_rate: f64,
    pub top_category: Option<CategoryTotal>,
    pub spending_by_category: Vec<CategorySpending>,
    pub wallet_count: usize,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySpending {
    pub category: String,
    pub total: Cents,
    pub percentage: f64,
}

impl AnalyticsReport {
    pub fn build(ledger: &Ledger<'_>) -> Self {
        let totals = ledger.totals_by_type();

        let spending_by_category = ledger
            .expenses_by_category()
            .into_iter()
            .map(|c| CategorySpending {
                category: c.category.display_name().to_string(),
                total: c.amount,
                percentage: if totals.expense > 0 {
                    c.amount as f64 / totals.expense as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            total_income: totals.income,
            total_spending: totals.expense,
            net: totals.income - totals.expense,
            savings_rate: ledger.savings_rate(),
            top_category: ledger.top_category(),
            spending_by_category,
            wallet_count: ledger.wallets().len(),
            transaction_count: ledger.transactions().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, TransactionType, Wallet, WalletType};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_analytics_report() {
        let wallet = Wallet::new("Bank".into(), WalletType::Bank, 0);
        let transactions = vec![
            Transaction::new(
                wallet.id,
                TransactionType::Income,
                40000,
                Category::Other,
                date("2024-03-01"),
                "09:00".into(),
            ),
            Transaction::new(
                wallet.id,
                TransactionType::Expense,
                7500,
                Category::Food,
                date("2024-03-02"),
                "13:00".into(),
            ),
            Transaction::new(
                wallet.id,
                TransactionType::Expense,
                2500,
                Category::Transport,
                date("2024-03-03"),
                "08:15".into(),
            ),
        ];
        let wallets = vec![wallet];
        let ledger = Ledger::new(&wallets, &transactions);

        let report = AnalyticsReport::build(&ledger);

        assert_eq!(report.total_income, 40000);
        assert_eq!(report.total_spending, 10000);
        assert_eq!(report.net, 30000);
        assert_eq!(report.savings_rate, 75.0);
        assert_eq!(report.top_category.map(|c| c.category), Some(Category::Food));
        assert_eq!(report.spending_by_category.len(), 2);
        assert_eq!(report.spending_by_category[0].category, "Food & Dining");
        assert_eq!(report.spending_by_category[0].percentage, 75.0);
        assert_eq!(report.spending_by_category[1].percentage, 25.0);
        assert_eq!(report.wallet_count, 1);
        assert_eq!(report.transaction_count, 3);
    }

    #[test]
    fn test_dashboard_for_empty_ledger() {
        let ledger = Ledger::new(&[], &[]);
        let dashboard = Dashboard::build(&ledger, date("2024-03-15"), 5);

        assert_eq!(dashboard.total_balance, 0);
        assert_eq!(dashboard.month_change, MonthChange::None);
        assert!(dashboard.wallets.is_empty());
        assert!(dashboard.recent_transactions.is_empty());
    }
}
