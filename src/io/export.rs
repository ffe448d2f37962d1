use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Ledger, Transaction, Wallet, WalletId};

/// Full copy of both collections, for backups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub wallets: Vec<Wallet>,
    pub transactions: Vec<Transaction>,
}

/// Exporter for writing ledger data as CSV or JSON
pub struct Exporter<'a> {
    ledger: Ledger<'a>,
}

impl<'a> Exporter<'a> {
    pub fn new(ledger: Ledger<'a>) -> Self {
        Self { ledger }
    }

    /// Export transactions to CSV, newest first. Transactions whose wallet no
    /// longer exists are written with an empty wallet name.
    pub fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let wallet_names: HashMap<WalletId, &str> = self
            .ledger
            .wallets()
            .iter()
            .map(|w| (w.id, w.name.as_str()))
            .collect();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "date",
            "time",
            "wallet",
            "type",
            "category",
            "amount",
            "comment",
        ])?;

        let mut count = 0;
        for transaction in self.ledger.sorted_transactions() {
            let wallet_name = wallet_names
                .get(&transaction.wallet_id)
                .copied()
                .unwrap_or_default();

            csv_writer.write_record([
                transaction.id.to_string().as_str(),
                transaction.date.format("%Y-%m-%d").to_string().as_str(),
                transaction.time.as_str(),
                wallet_name,
                transaction.transaction_type.as_str(),
                transaction.category.as_str(),
                transaction.amount.to_string().as_str(),
                transaction.comment.as_deref().unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export wallets with their derived balances to CSV.
    pub fn export_wallets_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "name", "type", "initial_balance", "balance"])?;

        let mut count = 0;
        for wallet in self.ledger.wallets() {
            csv_writer.write_record([
                wallet.id.to_string().as_str(),
                wallet.name.as_str(),
                wallet.wallet_type.as_str(),
                wallet.initial_balance.to_string().as_str(),
                self.ledger.wallet_balance(wallet.id).to_string().as_str(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export both collections as a pretty-printed JSON snapshot.
    pub fn export_snapshot_json<W: Write>(&self, mut writer: W) -> Result<Snapshot> {
        let snapshot = Snapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            wallets: self.ledger.wallets().to_vec(),
            transactions: self.ledger.transactions().to_vec(),
        };

        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.flush()?;

        Ok(snapshot)
    }
}
