use serde::{Deserialize, Serialize};

pub type AccountId = String;

/// An account holder. The ledger only cares that the id exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "account-id")]
    pub id: AccountId,
    pub name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
}

impl Account {
    pub fn new(id: impl Into<AccountId>, name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            last_name: last_name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }
}
