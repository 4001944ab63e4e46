use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::{Account, Cents, Clock, Entry, EntryId, NewEntry, SystemClock};
use crate::storage::{
    AccountDirectory, EntryStore, InMemoryAccountDirectory, InMemoryEntryStore, StoreError,
};

use super::{AppError, OwnerGuard, OwnerLocks, RetryError, RetryExecutor, RetryHandle, RetryPolicy};

/// Finished rollback tasks kept around before they start being pruned.
const MAX_TRACKED_ROLLBACKS: usize = 256;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (HTTP, CLI, tests).
pub struct LedgerService {
    entries: Arc<dyn EntryStore>,
    accounts: Arc<dyn AccountDirectory>,
    clock: Arc<dyn Clock>,
    retry: RetryExecutor,
    locks: OwnerLocks,
    rollbacks: Mutex<Vec<PendingRollback>>,
}

/// Entries touched by one run of the debit algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitOutcome {
    /// Entries marked consumed, in FIFO order
    pub consumed: Vec<EntryId>,
    /// Change returned to the owner when the last consumed entry overcovered the debt
    pub remainder: Option<EntryId>,
}

/// Result of a withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    /// Consumed marker recording the withdrawal itself
    pub settlement: EntryId,
    pub consumed: Vec<EntryId>,
    pub remainder: Option<EntryId>,
}

/// Result of a payment between two accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// New live entry owned by the receiver
    pub credit: EntryId,
    pub consumed: Vec<EntryId>,
    pub remainder: Option<EntryId>,
}

/// Outcome of a compensating rollback that ran in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub owner: String,
    /// Entries whose consumed flag was reset
    pub restored: Vec<EntryId>,
    /// Remainder entry that was retired
    pub retired: Option<EntryId>,
    /// Number of attempts on success
    pub result: Result<u32, RetryError>,
}

struct PendingRollback {
    owner: String,
    restored: Vec<EntryId>,
    retired: Option<EntryId>,
    handle: RetryHandle,
}

impl LedgerService {
    /// Create a ledger service on top of the given stores.
    pub fn new(entries: Arc<dyn EntryStore>, accounts: Arc<dyn AccountDirectory>) -> Self {
        Self {
            entries,
            accounts,
            clock: Arc::new(SystemClock),
            retry: RetryExecutor::default(),
            locks: OwnerLocks::new(),
            rollbacks: Mutex::new(Vec::new()),
        }
    }

    /// A service backed by fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryEntryStore::new()),
            Arc::new(InMemoryAccountDirectory::new()),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryExecutor::new(policy);
        self
    }

    // ========================
    // Account operations
    // ========================

    pub async fn create_account(&self, name: &str, last_name: &str) -> Result<Account, AppError> {
        let id = self.accounts.create(name, last_name).await?;
        let account = self.accounts.find_one(&id).await?;
        info!(account_id = %account.id, holder = %account.full_name(), "Account created");
        Ok(account)
    }

    pub async fn get_account(&self, id: &str) -> Result<Account, AppError> {
        Ok(self.accounts.find_one(id).await?)
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.accounts.find_all().await?)
    }

    // ========================
    // Entry operations
    // ========================

    /// Credit `owner` with a new live entry of `amount`.
    pub async fn deposit(&self, owner: &str, amount: Cents) -> Result<EntryId, AppError> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Deposit amount must be positive".to_string(),
            ));
        }
        self.accounts.find_one(owner).await?;

        // The store rejects a credit that would overflow the balance.
        let _guard = self.locks.acquire(owner).await;
        let id = self
            .entries
            .create(NewEntry::own(owner, amount, self.clock.now()))
            .await?;

        info!(owner, amount, entry_id = %id, "Deposit recorded");
        Ok(id)
    }

    /// Withdraw from `owner`. `amount` is the negative magnitude to remove:
    /// pass -1000 to withdraw 1000.
    pub async fn withdraw(&self, owner: &str, amount: Cents) -> Result<Withdrawal, AppError> {
        let magnitude = validate_debit_amount(amount)?;
        self.accounts.find_one(owner).await?;

        let mut guard = Some(self.locks.acquire(owner).await);
        let outcome = self.debit(owner, owner, magnitude, &mut guard).await?;

        let settlement = NewEntry::settlement(owner, amount, self.clock.now());
        match self.entries.create(settlement).await {
            Ok(settlement) => {
                info!(owner, amount, entry_id = %settlement, "Withdrawal recorded");
                Ok(Withdrawal {
                    settlement,
                    consumed: outcome.consumed,
                    remainder: outcome.remainder,
                })
            }
            Err(err) => Err(self
                .abort_debit(owner, outcome.consumed, outcome.remainder, guard.take(), err)
                .await),
        }
    }

    /// Move value from `sender` to `receiver`. `amount` follows the withdraw
    /// convention (negative magnitude); the receiver is credited `-amount`.
    ///
    /// Both owners are locked: the receiver's balance must have room for the
    /// credit before the sender is debited.
    pub async fn pay(&self, sender: &str, receiver: &str, amount: Cents) -> Result<Payment, AppError> {
        let magnitude = validate_debit_amount(amount)?;
        self.accounts.find_one(sender).await?;
        self.accounts.find_one(receiver).await?;

        let (sender_guard, _receiver_guard) = self.locks.acquire_pair(sender, receiver).await;
        if sender != receiver {
            let receiver_balance = self.entries.get_balance(receiver).await?;
            if receiver_balance.checked_add(magnitude).is_none() {
                return Err(AppError::InvalidAmount(format!(
                    "Credit would overflow the balance of account {receiver}"
                )));
            }
        }

        let mut guard = Some(sender_guard);
        let outcome = self.debit(sender, receiver, magnitude, &mut guard).await?;

        let credit = NewEntry::credit(receiver, sender, receiver, magnitude, self.clock.now());
        match self.entries.create(credit).await {
            Ok(credit) => {
                info!(sender, receiver, amount = magnitude, entry_id = %credit, "Payment recorded");
                Ok(Payment {
                    credit,
                    consumed: outcome.consumed,
                    remainder: outcome.remainder,
                })
            }
            Err(err) => Err(self
                .abort_debit(sender, outcome.consumed, outcome.remainder, guard.take(), err)
                .await),
        }
    }

    /// Current balance of `owner`: the sum of its unconsumed entries.
    pub async fn balance(&self, owner: &str) -> Result<Cents, AppError> {
        self.accounts.find_one(owner).await?;
        Ok(self.entries.get_balance(owner).await?)
    }

    /// Every entry ever recorded for `owner`, oldest first.
    pub async fn entries(&self, owner: &str) -> Result<Vec<Entry>, AppError> {
        self.accounts.find_one(owner).await?;
        Ok(self.entries.history(owner).await?)
    }

    pub async fn get_entry(&self, id: &str) -> Result<Entry, AppError> {
        Ok(self.entries.find_one(id).await?)
    }

    /// Wait for every rollback scheduled so far and collect what happened.
    pub async fn wait_for_rollbacks(&self) -> Vec<RollbackReport> {
        let pending = std::mem::take(&mut *self.rollbacks.lock().await);

        let mut reports = Vec::with_capacity(pending.len());
        for rollback in pending {
            reports.push(RollbackReport {
                owner: rollback.owner,
                restored: rollback.restored,
                retired: rollback.retired,
                result: rollback.handle.wait().await,
            });
        }
        reports
    }

    // ========================
    // Debit algorithm
    // ========================

    /// Consume the owner's live entries oldest first until `magnitude` is covered.
    ///
    /// The caller must hold the owner's lock in `guard`. If a write fails
    /// midway, the guard moves into the compensating task so the owner stays
    /// serialized until the consumed flags are restored.
    async fn debit(
        &self,
        owner: &str,
        receiver: &str,
        magnitude: Cents,
        guard: &mut Option<OwnerGuard>,
    ) -> Result<DebitOutcome, AppError> {
        let mut remaining = magnitude;

        let balance = self.entries.get_balance(owner).await?;
        if balance < remaining {
            warn!(owner, balance, required = remaining, "Insufficient balance");
            return Err(AppError::InsufficientBalance {
                owner: owner.to_string(),
                balance,
                required: remaining,
            });
        }

        let live = self.entries.find_all_by_owner(owner).await?;
        let mut consumed: Vec<EntryId> = Vec::new();

        for entry in live {
            if let Err(err) = self.entries.mark_consumed(&entry.id).await {
                return Err(self.abort_debit(owner, consumed, None, guard.take(), err).await);
            }
            consumed.push(entry.id);

            let delta = entry.amount - remaining;
            match delta.cmp(&0) {
                Ordering::Equal => {
                    return Ok(DebitOutcome {
                        consumed,
                        remainder: None,
                    });
                }
                Ordering::Less => remaining -= entry.amount,
                Ordering::Greater => {
                    let change = NewEntry::credit(owner, owner, receiver, delta, self.clock.now());
                    return match self.entries.create(change).await {
                        Ok(remainder) => Ok(DebitOutcome {
                            consumed,
                            remainder: Some(remainder),
                        }),
                        Err(err) => {
                            Err(self.abort_debit(owner, consumed, None, guard.take(), err).await)
                        }
                    };
                }
            }
        }

        // Only reachable if the balance pre-check was wrong about the live entries.
        error!(owner, remaining, "Live entries ran out before the debit was covered");
        self.schedule_rollback(owner, consumed, None, guard.take()).await;
        Err(AppError::NegativeBalance {
            owner: owner.to_string(),
            balance: -remaining,
        })
    }

    async fn abort_debit(
        &self,
        owner: &str,
        consumed: Vec<EntryId>,
        remainder: Option<EntryId>,
        guard: Option<OwnerGuard>,
        cause: StoreError,
    ) -> AppError {
        error!(owner, error = %cause, "Debit operation failed, scheduling rollback");
        self.schedule_rollback(owner, consumed, remainder, guard).await;
        AppError::FailedDebitOperation {
            owner: owner.to_string(),
            reason: cause.to_string(),
        }
    }

    /// Restore `restored` to live and retire `retired` on a background task.
    async fn schedule_rollback(
        &self,
        owner: &str,
        restored: Vec<EntryId>,
        retired: Option<EntryId>,
        guard: Option<OwnerGuard>,
    ) {
        if restored.is_empty() && retired.is_none() {
            return;
        }

        let store = self.entries.clone();
        let task_restored = restored.clone();
        let task_retired = retired.clone();
        let handle = self
            .retry
            .spawn("rollback of consumed entries", guard, move || {
                let store = store.clone();
                let restored = task_restored.clone();
                let retired = task_retired.clone();
                async move {
                    store.rollback_consumed(&restored).await?;
                    if let Some(id) = retired {
                        store.mark_consumed(&id).await?;
                    }
                    Ok::<(), StoreError>(())
                }
            });

        let mut rollbacks = self.rollbacks.lock().await;
        if rollbacks.len() >= MAX_TRACKED_ROLLBACKS {
            rollbacks.retain(|r| !r.handle.is_finished());
        }
        rollbacks.push(PendingRollback {
            owner: owner.to_string(),
            restored,
            retired,
            handle,
        });
    }
}

/// Check a withdraw/pay amount and return the positive magnitude it stands for.
fn validate_debit_amount(amount: Cents) -> Result<Cents, AppError> {
    if amount >= 0 {
        return Err(AppError::InvalidAmount(
            "Debit amount must be negative".to_string(),
        ));
    }
    amount
        .checked_neg()
        .ok_or_else(|| AppError::InvalidAmount("Debit amount is out of range".to_string()))
}
