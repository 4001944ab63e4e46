// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use paybook::application::{LedgerService, RetryPolicy};
use paybook::domain::{Cents, Entry, EntryId, FixedClock, NewEntry, SequenceIdGenerator};
use paybook::storage::{EntryStore, InMemoryAccountDirectory, InMemoryEntryStore, StoreError};

/// Entry store that can be told to fail specific calls.
pub struct FlakyEntryStore {
    inner: InMemoryEntryStore,
    creates: AtomicUsize,
    fail_create_at: AtomicUsize,
    marks: AtomicUsize,
    fail_mark_at: AtomicUsize,
    failing_rollbacks: AtomicUsize,
    rollback_calls: AtomicUsize,
    balance_surplus: AtomicI64,
}

impl FlakyEntryStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryEntryStore::with_id_generator(Arc::new(SequenceIdGenerator::new("e"))),
            creates: AtomicUsize::new(0),
            fail_create_at: AtomicUsize::new(0),
            marks: AtomicUsize::new(0),
            fail_mark_at: AtomicUsize::new(0),
            failing_rollbacks: AtomicUsize::new(0),
            rollback_calls: AtomicUsize::new(0),
            balance_surplus: AtomicI64::new(0),
        }
    }

    /// Fail the n-th `create` call from now on (1 = the next one).
    pub fn fail_nth_create(&self, n: usize) {
        let base = self.creates.load(Ordering::SeqCst);
        self.fail_create_at.store(base + n, Ordering::SeqCst);
    }

    /// Fail the n-th `mark_consumed` call from now on (1 = the next one).
    pub fn fail_nth_mark(&self, n: usize) {
        let base = self.marks.load(Ordering::SeqCst);
        self.fail_mark_at.store(base + n, Ordering::SeqCst);
    }

    /// Make the next `count` rollback calls fail.
    pub fn fail_rollbacks(&self, count: usize) {
        self.failing_rollbacks.store(count, Ordering::SeqCst);
    }

    /// Make `get_balance` report `surplus` more than the live entries hold.
    pub fn overstate_balance(&self, surplus: Cents) {
        self.balance_surplus.store(surplus, Ordering::SeqCst);
    }

    pub fn rollback_calls(&self) -> usize {
        self.rollback_calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

fn unavailable(op: &str) -> StoreError {
    StoreError::Unavailable(format!("injected {} failure", op))
}

#[async_trait]
impl EntryStore for FlakyEntryStore {
    async fn find_all_by_owner(&self, owner: &str) -> Result<Vec<Entry>, StoreError> {
        self.inner.find_all_by_owner(owner).await
    }

    async fn history(&self, owner: &str) -> Result<Vec<Entry>, StoreError> {
        self.inner.history(owner).await
    }

    async fn find_one(&self, id: &str) -> Result<Entry, StoreError> {
        self.inner.find_one(id).await
    }

    async fn create(&self, entry: NewEntry) -> Result<EntryId, StoreError> {
        let call = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_create_at.load(Ordering::SeqCst) {
            return Err(unavailable("create"));
        }
        self.inner.create(entry).await
    }

    async fn mark_consumed(&self, id: &str) -> Result<(), StoreError> {
        let call = self.marks.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_mark_at.load(Ordering::SeqCst) {
            return Err(unavailable("mark_consumed"));
        }
        self.inner.mark_consumed(id).await
    }

    async fn rollback_consumed(&self, ids: &[EntryId]) -> Result<(), StoreError> {
        self.rollback_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_rollbacks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(unavailable("rollback"));
        }
        self.inner.rollback_consumed(ids).await
    }

    async fn get_balance(&self, owner: &str) -> Result<Cents, StoreError> {
        let surplus = self.balance_surplus.load(Ordering::SeqCst);
        Ok(self.inner.get_balance(owner).await? + surplus)
    }
}

/// A service wired to a fault-injecting store and a manual clock.
pub struct TestLedger {
    pub service: LedgerService,
    pub store: Arc<FlakyEntryStore>,
    pub clock: Arc<FixedClock>,
}

impl TestLedger {
    pub fn new() -> Self {
        Self::with_retry_policy(RetryPolicy::immediate(5))
    }

    pub fn with_retry_policy(policy: RetryPolicy) -> Self {
        let store = Arc::new(FlakyEntryStore::new());
        let clock = Arc::new(FixedClock::new(parse_date("2024-01-01")));
        let accounts = Arc::new(InMemoryAccountDirectory::with_id_generator(Arc::new(
            SequenceIdGenerator::new("acc"),
        )));

        let service = LedgerService::new(store.clone(), accounts)
            .with_clock(clock.clone())
            .with_retry_policy(policy);

        Self {
            service,
            store,
            clock,
        }
    }

    /// Create an account and return its id.
    pub async fn account(&self, name: &str) -> Result<String> {
        Ok(self.service.create_account(name, "Tester").await?.id)
    }

    /// Deposit each amount one second apart, oldest first. Returns the entry ids.
    pub async fn fund(&self, owner: &str, amounts: &[Cents]) -> Result<Vec<EntryId>> {
        let mut ids = Vec::with_capacity(amounts.len());
        for &amount in amounts {
            self.clock.advance(Duration::seconds(1));
            ids.push(self.service.deposit(owner, amount).await?);
        }
        self.clock.advance(Duration::seconds(1));
        Ok(ids)
    }

    /// Sum of the owner's unconsumed entries, computed from the raw history.
    pub async fn live_sum(&self, owner: &str) -> Result<Cents> {
        Ok(self
            .service
            .entries(owner)
            .await?
            .iter()
            .filter(|e| !e.consumed)
            .map(|e| e.amount)
            .sum())
    }
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}
