use thiserror::Error;

use crate::domain::{Cents, MAX_CENTS, WalletId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("Invalid amount: {0} (amounts must not be negative)")]
    NegativeAmount(Cents),

    #[error("Amount out of range: {0} (limit is {max} cents)", max = MAX_CENTS)]
    AmountOutOfRange(Cents),

    #[error("Storage error: {0}")]
    Persistence(#[from] anyhow::Error),
}
