use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    fifo_order, unconsumed_balance, Cents, Entry, EntryId, IdGenerator, NewEntry, UuidGenerator,
};

use super::StoreError;

/// Storage for ledger entries.
///
/// The debit algorithm relies on `find_all_by_owner` returning only live
/// entries, oldest first, with ties kept in insertion order.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Unconsumed entries of `owner`, ascending by `created_at`.
    async fn find_all_by_owner(&self, owner: &str) -> Result<Vec<Entry>, StoreError>;

    /// Every entry of `owner`, consumed or not, in the same order.
    async fn history(&self, owner: &str) -> Result<Vec<Entry>, StoreError>;

    async fn find_one(&self, id: &str) -> Result<Entry, StoreError>;

    /// Store a new entry and return its generated id.
    ///
    /// A live entry that would push the owner's balance past `Cents::MAX`
    /// is rejected with `BalanceOverflow`.
    async fn create(&self, entry: NewEntry) -> Result<EntryId, StoreError>;

    async fn mark_consumed(&self, id: &str) -> Result<(), StoreError>;

    /// Reset the consumed flag of every listed entry. Compensation only.
    async fn rollback_consumed(&self, ids: &[EntryId]) -> Result<(), StoreError>;

    /// Sum of the owner's unconsumed entries.
    async fn get_balance(&self, owner: &str) -> Result<Cents, StoreError>;
}

/// Check the fields every stored entry must carry.
pub fn validate_new_entry(entry: &NewEntry) -> Result<(), StoreError> {
    if entry.sender.is_empty() {
        return Err(StoreError::MissingField("sender"));
    }
    if entry.receiver.is_empty() {
        return Err(StoreError::MissingField("receiver"));
    }
    if entry.owner.is_empty() {
        return Err(StoreError::MissingField("owner"));
    }
    if entry.amount == 0 {
        return Err(StoreError::ZeroAmount);
    }
    Ok(())
}

#[derive(Default)]
struct EntryLog {
    /// Insertion order
    entries: Vec<Entry>,
    index: HashMap<EntryId, usize>,
}

impl EntryLog {
    fn get(&self, id: &str) -> Result<&Entry, StoreError> {
        self.index
            .get(id)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| StoreError::EntryNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Entry, StoreError> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.entries[i]),
            None => Err(StoreError::EntryNotFound(id.to_string())),
        }
    }

    fn owned_by<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries.iter().filter(move |e| e.owner == owner)
    }

    fn balance_of(&self, owner: &str) -> Result<Cents, StoreError> {
        unconsumed_balance(owner, self.owned_by(owner)).ok_or_else(|| StoreError::BalanceOverflow {
            owner: owner.to_string(),
        })
    }
}

/// Process-local entry store. Nothing survives a restart.
pub struct InMemoryEntryStore {
    log: RwLock<EntryLog>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            log: RwLock::new(EntryLog::default()),
            ids,
        }
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn find_all_by_owner(&self, owner: &str) -> Result<Vec<Entry>, StoreError> {
        let log = self.log.read().await;
        let mut entries: Vec<Entry> = log.owned_by(owner).filter(|e| e.is_live()).cloned().collect();
        fifo_order(&mut entries);
        Ok(entries)
    }

    async fn history(&self, owner: &str) -> Result<Vec<Entry>, StoreError> {
        let log = self.log.read().await;
        let mut entries: Vec<Entry> = log.owned_by(owner).cloned().collect();
        fifo_order(&mut entries);
        Ok(entries)
    }

    async fn find_one(&self, id: &str) -> Result<Entry, StoreError> {
        self.log.read().await.get(id).cloned()
    }

    async fn create(&self, entry: NewEntry) -> Result<EntryId, StoreError> {
        validate_new_entry(&entry)?;

        let mut log = self.log.write().await;
        if !entry.consumed {
            log.balance_of(&entry.owner)?
                .checked_add(entry.amount)
                .ok_or_else(|| StoreError::BalanceOverflow {
                    owner: entry.owner.clone(),
                })?;
        }

        let id = self.ids.next(&|candidate| log.index.contains_key(candidate));

        let position = log.entries.len();
        log.entries.push(entry.with_id(id.clone()));
        log.index.insert(id.clone(), position);

        Ok(id)
    }

    async fn mark_consumed(&self, id: &str) -> Result<(), StoreError> {
        let mut log = self.log.write().await;
        log.get_mut(id)?.consumed = true;
        Ok(())
    }

    async fn rollback_consumed(&self, ids: &[EntryId]) -> Result<(), StoreError> {
        let mut log = self.log.write().await;

        // All-or-nothing: a missing id leaves every flag untouched.
        for id in ids {
            log.get(id)?;
        }
        for id in ids {
            log.get_mut(id)?.consumed = false;
        }
        Ok(())
    }

    async fn get_balance(&self, owner: &str) -> Result<Cents, StoreError> {
        let balance = self.log.read().await.balance_of(owner)?;

        if balance < 0 {
            return Err(StoreError::NegativeBalance {
                owner: owner.to_string(),
                balance,
            });
        }
        Ok(balance)
    }
}
