use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

pub type EntryId = String;

/// A ledger line item recording a signed value movement.
///
/// Entries are append-only. The only field that ever changes after creation
/// is `consumed`, which the debit algorithm flips to `true` once the entry's
/// value has been allocated toward a withdrawal or payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    /// Account whose balance this entry contributes to
    pub owner: AccountId,
    pub sender: AccountId,
    pub receiver: AccountId,
    /// FIFO ordering key
    pub created_at: DateTime<Utc>,
    /// Positive for credits, negative for settlement markers
    pub amount: Cents,
    pub consumed: bool,
}

/// An entry that has not been stored yet and therefore has no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub owner: AccountId,
    pub sender: AccountId,
    pub receiver: AccountId,
    pub created_at: DateTime<Utc>,
    pub amount: Cents,
    pub consumed: bool,
}

impl NewEntry {
    /// A live entry owned by `owner`, moved from `sender` to `receiver`.
    pub fn credit(
        owner: impl Into<AccountId>,
        sender: impl Into<AccountId>,
        receiver: impl Into<AccountId>,
        amount: Cents,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner: owner.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            created_at,
            amount,
            consumed: false,
        }
    }

    /// A self-directed entry, as recorded for deposits.
    pub fn own(owner: impl Into<AccountId>, amount: Cents, created_at: DateTime<Utc>) -> Self {
        let owner = owner.into();
        Self::credit(owner.clone(), owner.clone(), owner, amount, created_at)
    }

    /// An already-consumed marker recording a withdrawal. Never counts toward a balance.
    pub fn settlement(owner: impl Into<AccountId>, amount: Cents, created_at: DateTime<Utc>) -> Self {
        Self {
            consumed: true,
            ..Self::own(owner, amount, created_at)
        }
    }

    pub fn with_id(self, id: EntryId) -> Entry {
        Entry {
            id,
            owner: self.owner,
            sender: self.sender,
            receiver: self.receiver,
            created_at: self.created_at,
            amount: self.amount,
            consumed: self.consumed,
        }
    }
}

impl From<&Entry> for NewEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            owner: entry.owner.clone(),
            sender: entry.sender.clone(),
            receiver: entry.receiver.clone(),
            created_at: entry.created_at,
            amount: entry.amount,
            consumed: entry.consumed,
        }
    }
}

impl Entry {
    /// True if this entry still counts toward its owner's balance.
    pub fn is_live(&self) -> bool {
        !self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_entry_is_self_directed() {
        let now = Utc::now();
        let entry = NewEntry::own("acc-1", 500, now);

        assert_eq!(entry.owner, "acc-1");
        assert_eq!(entry.sender, "acc-1");
        assert_eq!(entry.receiver, "acc-1");
        assert_eq!(entry.amount, 500);
        assert!(!entry.consumed);
    }

    #[test]
    fn test_settlement_is_consumed() {
        let entry = NewEntry::settlement("acc-1", -1000, Utc::now());
        assert!(entry.consumed);
        assert_eq!(entry.amount, -1000);
    }

    #[test]
    fn test_with_id_keeps_fields() {
        let new = NewEntry::credit("bob", "alice", "bob", 250, Utc::now());
        let entry = new.clone().with_id("e-1".into());

        assert_eq!(entry.id, "e-1");
        assert!(entry.is_live());
        assert_eq!(NewEntry::from(&entry), new);
    }

    #[test]
    fn test_entry_json_uses_camel_case() {
        let entry = NewEntry::own("acc-1", 10, Utc::now()).with_id("e-1".into());
        let json = serde_json::to_value(&entry).unwrap();

        assert!(json.get("createdAt").is_some());
        assert_eq!(json["consumed"], false);
    }
}
