// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use pocketbook::application::{NewTransaction, Store};
use pocketbook::domain::{Category, Cents, TransactionType, WalletId};
use pocketbook::storage::SqliteKv;
use tempfile::TempDir;

/// Helper to create a test store backed by a temporary database
pub async fn test_store() -> Result<(Store<SqliteKv>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let kv = SqliteKv::init(&database_url(temp_dir.path(), "rwc")).await?;
    Ok((Store::load(kv).await, temp_dir))
}

/// Load a fresh store from the database inside `temp_dir`
pub async fn reopen(temp_dir: &TempDir) -> Result<Store<SqliteKv>> {
    let kv = SqliteKv::connect(&database_url(temp_dir.path(), "rw")).await?;
    Ok(Store::load(kv).await)
}

/// Raw key-value access to the database inside `temp_dir`
pub async fn raw_kv(temp_dir: &TempDir) -> Result<SqliteKv> {
    SqliteKv::connect(&database_url(temp_dir.path(), "rw")).await
}

fn database_url(dir: &Path, mode: &str) -> String {
    format!("sqlite:{}?mode={}", dir.join("test.db").display(), mode)
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn expense(wallet_id: WalletId, amount: Cents, category: Category, date: &str) -> NewTransaction {
    NewTransaction {
        wallet_id,
        transaction_type: TransactionType::Expense,
        amount,
        category,
        date: parse_date(date),
        time: "12:00".into(),
        comment: None,
    }
}

pub fn income(wallet_id: WalletId, amount: Cents, date: &str) -> NewTransaction {
    NewTransaction {
        wallet_id,
        transaction_type: TransactionType::Income,
        amount,
        category: Category::Other,
        date: parse_date(date),
        time: "09:00".into(),
        comment: None,
    }
}
