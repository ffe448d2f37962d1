use std::collections::HashSet;

use anyhow::Context;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::domain::{
    Category, Cents, Ledger, Transaction, TransactionId, TransactionType, Wallet, WalletId,
    WalletType, within_limit,
};
use crate::storage::{KeyValueStore, TRANSACTIONS_KEY, WALLETS_KEY};

use super::AppError;

/// Owns the wallet and transaction collections and writes them through to
/// the key-value backend after every change.
///
/// A mutation only takes effect in memory once the backend accepted the new
/// state, so a failed write leaves both sides as they were.
///
/// This is the primary interface for any client (CLI, exporters, tests).
/// Derived figures (balances, analytics) come from [`Store::ledger`].
pub struct Store<K> {
    kv: K,
    wallets: Vec<Wallet>,
    transactions: Vec<Transaction>,
}

/// Input for recording a new transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub wallet_id: WalletId,
    pub transaction_type: TransactionType,
    pub amount: Cents,
    pub category: Category,
    pub date: NaiveDate,
    pub time: String,
    pub comment: Option<String>,
}

/// Fields to overwrite on an existing transaction. `None` leaves the field
/// untouched; `comment: Some(None)` clears the comment.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub wallet_id: Option<WalletId>,
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<Cents>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub comment: Option<Option<String>>,
}

/// Result of deleting a wallet
#[derive(Debug, Clone)]
pub struct WalletRemoval {
    pub wallet: Wallet,
    pub removed_transactions: Vec<Transaction>,
}

impl<K: KeyValueStore> Store<K> {
    /// Load both collections from `kv`. Missing or unreadable data yields an
    /// empty collection instead of an error. Records repeating an earlier id
    /// or carrying an amount outside the accepted range are dropped.
    pub async fn load(kv: K) -> Self {
        let wallets: Vec<Wallet> = load_collection(&kv, WALLETS_KEY).await;
        let wallets = retain_valid(wallets, WALLETS_KEY, |w| w.id, |w| {
            within_limit(w.initial_balance)
        });

        let transactions: Vec<Transaction> = load_collection(&kv, TRANSACTIONS_KEY).await;
        let transactions = retain_valid(transactions, TRANSACTIONS_KEY, |t| t.id, |t| {
            t.amount >= 0 && within_limit(t.amount)
        });

        tracing::debug!(
            wallets = wallets.len(),
            transactions = transactions.len(),
            "loaded store"
        );

        Self {
            kv,
            wallets,
            transactions,
        }
    }

    /// Write both collections to the backend.
    pub async fn save(&self) -> Result<(), AppError> {
        self.write(&self.wallets, &self.transactions).await
    }

    /// Write both collections in a single batch so the backend never holds
    /// wallets and transactions from different states.
    async fn write(
        &self,
        wallets: &[Wallet],
        transactions: &[Transaction],
    ) -> Result<(), AppError> {
        let wallets = serde_json::to_string(wallets).context("Failed to serialize wallets")?;
        let transactions =
            serde_json::to_string(transactions).context("Failed to serialize transactions")?;

        self.kv
            .set_many(&[
                (WALLETS_KEY, wallets.as_str()),
                (TRANSACTIONS_KEY, transactions.as_str()),
            ])
            .await?;
        Ok(())
    }

    async fn commit_wallets(&mut self, wallets: Vec<Wallet>) -> Result<(), AppError> {
        self.write(&wallets, &self.transactions).await?;
        self.wallets = wallets;
        Ok(())
    }

    async fn commit_transactions(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(), AppError> {
        self.write(&self.wallets, &transactions).await?;
        self.transactions = transactions;
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn wallet(&self, id: WalletId) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.id == id)
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.wallets, &self.transactions)
    }

    // ========================
    // Wallet operations
    // ========================

    pub async fn create_wallet(
        &mut self,
        name: String,
        wallet_type: WalletType,
        initial_balance: Cents,
    ) -> Result<Wallet, AppError> {
        ensure_balance(initial_balance)?;

        let wallet = Wallet::new(name, wallet_type, initial_balance);
        let mut wallets = self.wallets.clone();
        wallets.push(wallet.clone());
        self.commit_wallets(wallets).await?;

        tracing::debug!(id = %wallet.id, name = %wallet.name, "created wallet");
        Ok(wallet)
    }

    /// Overwrite name, type and initial balance. Changing the initial balance
    /// shifts every derived balance of this wallet, past ones included.
    /// Returns `None` without writing anything if the wallet does not exist.
    pub async fn update_wallet(
        &mut self,
        id: WalletId,
        name: String,
        wallet_type: WalletType,
        initial_balance: Cents,
    ) -> Result<Option<Wallet>, AppError> {
        let Some(position) = self.wallets.iter().position(|w| w.id == id) else {
            tracing::debug!(%id, "update of unknown wallet ignored");
            return Ok(None);
        };
        ensure_balance(initial_balance)?;

        let mut wallets = self.wallets.clone();
        let wallet = &mut wallets[position];
        wallet.name = name;
        wallet.wallet_type = wallet_type;
        wallet.initial_balance = initial_balance;
        let updated = wallet.clone();

        self.commit_wallets(wallets).await?;
        tracing::debug!(%id, "updated wallet");
        Ok(Some(updated))
    }

    /// Delete a wallet together with every transaction recorded against it.
    /// Both collections are written in the same batch.
    pub async fn delete_wallet(&mut self, id: WalletId) -> Result<Option<WalletRemoval>, AppError> {
        let Some(position) = self.wallets.iter().position(|w| w.id == id) else {
            tracing::debug!(%id, "delete of unknown wallet ignored");
            return Ok(None);
        };

        let mut wallets = self.wallets.clone();
        let wallet = wallets.remove(position);
        let (removed_transactions, kept): (Vec<Transaction>, Vec<Transaction>) = self
            .transactions
            .iter()
            .cloned()
            .partition(|t| t.wallet_id == id);

        self.write(&wallets, &kept).await?;
        self.wallets = wallets;
        self.transactions = kept;

        tracing::debug!(
            %id,
            removed_transactions = removed_transactions.len(),
            "deleted wallet"
        );

        Ok(Some(WalletRemoval {
            wallet,
            removed_transactions,
        }))
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a transaction. Rejected before anything is written if the
    /// wallet does not exist or the amount is negative or out of range.
    pub async fn create_transaction(
        &mut self,
        new: NewTransaction,
    ) -> Result<Transaction, AppError> {
        self.ensure_wallet(new.wallet_id)?;
        ensure_amount(new.amount)?;

        let mut transaction = Transaction::new(
            new.wallet_id,
            new.transaction_type,
            new.amount,
            new.category,
            new.date,
            new.time,
        );
        transaction.comment = new.comment;

        let mut transactions = self.transactions.clone();
        transactions.push(transaction.clone());
        self.commit_transactions(transactions).await?;

        tracing::debug!(
            id = %transaction.id,
            wallet_id = %transaction.wallet_id,
            amount = transaction.signed_amount(),
            "recorded transaction"
        );
        Ok(transaction)
    }

    /// Merge `patch` into an existing transaction. Returns `None` without
    /// writing anything if the transaction does not exist.
    pub async fn update_transaction(
        &mut self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Option<Transaction>, AppError> {
        let Some(position) = self.transactions.iter().position(|t| t.id == id) else {
            tracing::debug!(%id, "update of unknown transaction ignored");
            return Ok(None);
        };

        if let Some(wallet_id) = patch.wallet_id {
            self.ensure_wallet(wallet_id)?;
        }
        if let Some(amount) = patch.amount {
            ensure_amount(amount)?;
        }

        let mut transactions = self.transactions.clone();
        let transaction = &mut transactions[position];
        if let Some(wallet_id) = patch.wallet_id {
            transaction.wallet_id = wallet_id;
        }
        if let Some(transaction_type) = patch.transaction_type {
            transaction.transaction_type = transaction_type;
        }
        if let Some(amount) = patch.amount {
            transaction.amount = amount;
        }
        if let Some(category) = patch.category {
            transaction.category = category;
        }
        if let Some(date) = patch.date {
            transaction.date = date;
        }
        if let Some(time) = patch.time {
            transaction.time = time;
        }
        if let Some(comment) = patch.comment {
            transaction.comment = comment;
        }
        let updated = transaction.clone();

        self.commit_transactions(transactions).await?;
        tracing::debug!(%id, "updated transaction");
        Ok(Some(updated))
    }

    pub async fn delete_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, AppError> {
        let Some(position) = self.transactions.iter().position(|t| t.id == id) else {
            tracing::debug!(%id, "delete of unknown transaction ignored");
            return Ok(None);
        };

        let mut transactions = self.transactions.clone();
        let removed = transactions.remove(position);
        self.commit_transactions(transactions).await?;

        tracing::debug!(%id, "deleted transaction");
        Ok(Some(removed))
    }

    fn ensure_wallet(&self, id: WalletId) -> Result<(), AppError> {
        if self.wallet(id).is_none() {
            return Err(AppError::WalletNotFound(id));
        }
        Ok(())
    }
}

fn ensure_amount(amount: Cents) -> Result<(), AppError> {
    if amount < 0 {
        return Err(AppError::NegativeAmount(amount));
    }
    ensure_balance(amount)
}

fn ensure_balance(cents: Cents) -> Result<(), AppError> {
    if !within_limit(cents) {
        return Err(AppError::AmountOutOfRange(cents));
    }
    Ok(())
}

async fn load_collection<K, T>(kv: &K, key: &str) -> Vec<T>
where
    K: KeyValueStore,
    T: DeserializeOwned,
{
    match kv.get(key).await {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(key, "discarding malformed stored data: {err}");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::warn!(key, "failed to read stored data: {err:#}");
            Vec::new()
        }
    }
}

/// Keep the first record per id that also passes `valid`.
fn retain_valid<T>(
    records: Vec<T>,
    key: &str,
    id: impl Fn(&T) -> Uuid,
    valid: impl Fn(&T) -> bool,
) -> Vec<T> {
    let total = records.len();
    let mut seen = HashSet::new();
    let kept: Vec<T> = records
        .into_iter()
        .filter(|record| valid(record) && seen.insert(id(record)))
        .collect();

    if kept.len() < total {
        tracing::warn!(
            key,
            dropped = total - kept.len(),
            "discarding invalid stored records"
        );
    }
    kept
}
