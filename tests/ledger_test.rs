mod common;

use anyhow::Result;
use common::{expense, income, parse_date, test_store};
use pocketbook::application::{AnalyticsReport, Dashboard, TransactionPatch};
use pocketbook::domain::{Category, CategoryTotal, MonthChange, WalletType};

#[tokio::test]
async fn test_month_over_month_absolute_when_last_month_empty() -> Result<()> {
    let (mut store, _temp) = test_store().await?;
    let a = store
        .create_wallet("A".into(), WalletType::Cash, 0)
        .await?;
    store
        .create_transaction(income(a.id, 50000, "2024-06-03"))
        .await?;

    let change = store
        .ledger()
        .month_over_month_change(parse_date("2024-06-20"));

    assert_eq!(change, MonthChange::Absolute(50000));
    Ok(())
}

#[tokio::test]
async fn test_month_over_month_percentage_uses_previous_magnitude() -> Result<()> {
    let (mut store, _temp) = test_store().await?;
    let a = store
        .create_wallet("A".into(), WalletType::Bank, 0)
        .await?;
    // May nets -2000, June so far nets -1000
    store
        .create_transaction(expense(a.id, 2000, Category::Bills, "2024-05-31"))
        .await?;
    store
        .create_transaction(expense(a.id, 1000, Category::Food, "2024-06-01"))
        .await?;

    let change = store
        .ledger()
        .month_over_month_change(parse_date("2024-06-20"));

    // (-1000 - -2000) / 2000 * 100
    assert_eq!(change, MonthChange::Percentage(50.0));
    Ok(())
}

#[tokio::test]
async fn test_month_over_month_none_when_both_months_cancel_out() -> Result<()> {
    let (mut store, _temp) = test_store().await?;
    let a = store
        .create_wallet("A".into(), WalletType::Cash, 0)
        .await?;
    store
        .create_transaction(income(a.id, 700, "2024-06-02"))
        .await?;
    store
        .create_transaction(expense(a.id, 700, Category::Food, "2024-06-03"))
        .await?;

    let change = store
        .ledger()
        .month_over_month_change(parse_date("2024-06-20"));

    assert_eq!(change, MonthChange::None);
    Ok(())
}

#[tokio::test]
async fn test_balance_independent_of_edit_history() -> Result<()> {
    // Same final transaction set reached through two different histories
    let (mut direct, _t1) = test_store().await?;
    let w1 = direct
        .create_wallet("W".into(), WalletType::Savings, 3000)
        .await?;
    direct
        .create_transaction(income(w1.id, 1500, "2024-01-10"))
        .await?;
    direct
        .create_transaction(expense(w1.id, 400, Category::Food, "2024-01-11"))
        .await?;

    let (mut winding, _t2) = test_store().await?;
    let w2 = winding
        .create_wallet("W".into(), WalletType::Savings, 3000)
        .await?;
    let scratch = winding
        .create_transaction(expense(w2.id, 9999, Category::Shopping, "2024-01-01"))
        .await?;
    let wrong = winding
        .create_transaction(expense(w2.id, 1500, Category::Other, "2024-01-10"))
        .await?;
    winding
        .create_transaction(expense(w2.id, 400, Category::Food, "2024-01-11"))
        .await?;
    winding.delete_transaction(scratch.id).await?;
    winding
        .update_transaction(
            wrong.id,
            TransactionPatch {
                transaction_type: Some(pocketbook::domain::TransactionType::Income),
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(direct.ledger().wallet_balance(w1.id), 4100);
    assert_eq!(winding.ledger().wallet_balance(w2.id), 4100);
    Ok(())
}

#[tokio::test]
async fn test_savings_rate_and_top_category() -> Result<()> {
    let (mut store, _temp) = test_store().await?;
    let a = store
        .create_wallet("A".into(), WalletType::Cash, 0)
        .await?;

    store
        .create_transaction(expense(a.id, 3000, Category::SmokeDrink, "2024-06-01"))
        .await?;
    assert_eq!(store.ledger().savings_rate(), 0.0);
    assert_eq!(
        store.ledger().top_category(),
        Some(CategoryTotal {
            category: Category::SmokeDrink,
            amount: 3000
        })
    );

    store
        .create_transaction(income(a.id, 12000, "2024-06-02"))
        .await?;
    store
        .create_transaction(expense(a.id, 3000, Category::Food, "2024-06-03"))
        .await?;

    let ledger = store.ledger();
    assert_eq!(ledger.savings_rate(), 50.0);
    // tie between smoke-drink and food: first seen wins
    assert_eq!(
        ledger.top_category().map(|c| c.category),
        Some(Category::SmokeDrink)
    );
    Ok(())
}

#[tokio::test]
async fn test_recent_transactions_order() -> Result<()> {
    let (mut store, _temp) = test_store().await?;
    let a = store
        .create_wallet("A".into(), WalletType::Card, 0)
        .await?;

    for (day, time) in [
        ("2024-06-01", "08:00"),
        ("2024-06-03", "07:00"),
        ("2024-06-03", "22:00"),
        ("2024-06-02", "12:00"),
        ("2024-05-30", "12:00"),
        ("2024-06-04", "00:30"),
    ] {
        let mut new = expense(a.id, 100, Category::Transport, day);
        new.time = time.into();
        store.create_transaction(new).await?;
    }

    let ledger = store.ledger();
    let recent: Vec<String> = ledger
        .recent_transactions(5)
        .iter()
        .map(|t| format!("{} {}", t.date, t.time))
        .collect();

    assert_eq!(
        recent,
        vec![
            "2024-06-04 00:30",
            "2024-06-03 22:00",
            "2024-06-03 07:00",
            "2024-06-02 12:00",
            "2024-06-01 08:00",
        ]
    );
    assert_eq!(ledger.sorted_transactions().len(), 6);
    Ok(())
}

#[tokio::test]
async fn test_dashboard_and_analytics_from_store() -> Result<()> {
    let (mut store, _temp) = test_store().await?;
    let cash = store
        .create_wallet("Cash".into(), WalletType::Cash, 100000)
        .await?;
    let bank = store
        .create_wallet("Bank".into(), WalletType::Bank, 0)
        .await?;
    store
        .create_transaction(expense(cash.id, 20000, Category::Food, "2024-06-05"))
        .await?;
    store
        .create_transaction(income(bank.id, 80000, "2024-06-01"))
        .await?;

    let ledger = store.ledger();
    let dashboard = Dashboard::build(&ledger, parse_date("2024-06-10"), 5);

    assert_eq!(dashboard.total_balance, 160000);
    assert_eq!(dashboard.month_change, MonthChange::Absolute(60000));
    assert_eq!(dashboard.wallets.len(), 2);
    assert_eq!(dashboard.wallets[0].balance, 80000);
    assert_eq!(dashboard.wallets[0].month_change, -20000);
    assert_eq!(dashboard.recent_transactions[0].wallet_id, cash.id);

    let json = serde_json::to_value(&dashboard)?;
    assert_eq!(json["month_change"]["kind"], "absolute");
    assert_eq!(json["wallets"][1]["wallet"]["name"], "Bank");

    let report = AnalyticsReport::build(&ledger);
    assert_eq!(report.total_income, 80000);
    assert_eq!(report.total_spending, 20000);
    assert_eq!(report.savings_rate, 75.0);
    assert_eq!(report.wallet_count, 2);
    Ok(())
}
