use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Account, AccountId, IdGenerator, UuidGenerator};

use super::StoreError;

/// Lookup of account holders.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_one(&self, id: &str) -> Result<Account, StoreError>;

    async fn find_all(&self) -> Result<Vec<Account>, StoreError>;

    async fn create(&self, name: &str, last_name: &str) -> Result<AccountId, StoreError>;
}

pub struct InMemoryAccountDirectory {
    accounts: RwLock<HashMap<AccountId, Account>>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            ids,
        }
    }
}

impl Default for InMemoryAccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_one(&self, id: &str) -> Result<Account, StoreError> {
        self.accounts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::AccountNotFound(id.to_string()))
    }

    /// All accounts, sorted by name then last name.
    async fn find_all(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self.accounts.read().await.values().cloned().collect();
        accounts.sort_by(|a, b| (&a.name, &a.last_name, &a.id).cmp(&(&b.name, &b.last_name, &b.id)));
        Ok(accounts)
    }

    async fn create(&self, name: &str, last_name: &str) -> Result<AccountId, StoreError> {
        let (name, last_name) = (name.trim(), last_name.trim());
        if name.is_empty() || last_name.is_empty() {
            return Err(StoreError::MissingAccountFields);
        }

        let mut accounts = self.accounts.write().await;
        let id = self.ids.next(&|candidate| accounts.contains_key(candidate));
        accounts.insert(id.clone(), Account::new(id.clone(), name, last_name));

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SequenceIdGenerator;

    fn directory() -> InMemoryAccountDirectory {
        InMemoryAccountDirectory::with_id_generator(Arc::new(SequenceIdGenerator::new("acc")))
    }

    #[tokio::test]
    async fn test_create_and_find_account() {
        let accounts = directory();
        let id = accounts.create("Ada", "Lovelace").await.unwrap();

        let account = accounts.find_one(&id).await.unwrap();
        assert_eq!(account, Account::new("acc-1", "Ada", "Lovelace"));
    }

    #[tokio::test]
    async fn test_create_requires_both_names() {
        let accounts = directory();

        assert_eq!(accounts.create("", "Lovelace").await, Err(StoreError::MissingAccountFields));
        assert_eq!(accounts.create("Ada", "  ").await, Err(StoreError::MissingAccountFields));
        assert!(accounts.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_one_unknown_account() {
        let accounts = directory();
        assert_eq!(
            accounts.find_one("0001").await,
            Err(StoreError::AccountNotFound("0001".into()))
        );
    }

    #[tokio::test]
    async fn test_find_all_sorted_by_name() {
        let accounts = directory();
        accounts.create("Grace", "Hopper").await.unwrap();
        accounts.create("Ada", "Lovelace").await.unwrap();

        let names: Vec<_> = accounts
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, ["Ada", "Grace"]);
    }
}
