use thiserror::Error;

use crate::domain::{format_cents, Cents};
use crate::storage::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Entry is missing a field: {0}")]
    MissingField(&'static str),

    #[error("Entry amount cannot be zero")]
    ZeroAmount,

    #[error("Account requires a name and a last name")]
    MissingAccountFields,

    #[error("Insufficient balance in account {owner}: balance {}, required {}", format_cents(*.balance), format_cents(*.required))]
    InsufficientBalance {
        owner: String,
        balance: Cents,
        required: Cents,
    },

    /// A write failed after entries were already consumed; compensation was scheduled.
    #[error("Debit operation unsuccessful for account {owner}: {reason}")]
    FailedDebitOperation { owner: String, reason: String },

    #[error("Negative balance for account {owner}: {}", format_cents(*.balance))]
    NegativeBalance { owner: String, balance: Cents },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EntryNotFound(id) => AppError::EntryNotFound(id),
            StoreError::MissingField(field) => AppError::MissingField(field),
            StoreError::ZeroAmount => AppError::ZeroAmount,
            StoreError::NegativeBalance { owner, balance } => {
                AppError::NegativeBalance { owner, balance }
            }
            StoreError::BalanceOverflow { owner } => {
                AppError::InvalidAmount(format!("Credit would overflow the balance of account {owner}"))
            }
            StoreError::AccountNotFound(id) => AppError::AccountNotFound(id),
            StoreError::MissingAccountFields => AppError::MissingAccountFields,
            StoreError::Unavailable(reason) => AppError::Storage(reason),
        }
    }
}
