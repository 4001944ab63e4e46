use thiserror::Error;

use crate::domain::Cents;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Entry is missing a field: {0}")]
    MissingField(&'static str),

    #[error("Entry amount cannot be zero")]
    ZeroAmount,

    #[error("Negative balance for {owner}: {balance}")]
    NegativeBalance { owner: String, balance: Cents },

    #[error("Balance of {owner} would overflow")]
    BalanceOverflow { owner: String },

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account requires a name and a last name")]
    MissingAccountFields,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
