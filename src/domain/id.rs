use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Produces identifiers that do not collide with any already in use.
///
/// `taken` reports whether a candidate id is already assigned; implementations
/// keep generating until it returns `false`.
pub trait IdGenerator: Send + Sync {
    fn next(&self, taken: &dyn Fn(&str) -> bool) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next(&self, taken: &dyn Fn(&str) -> bool) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !taken(&id) {
                return id;
            }
        }
    }
}

/// Predictable ids of the form `{prefix}-{n}`, starting at 1.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next(&self, taken: &dyn Fn(&str) -> bool) -> String {
        loop {
            let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
            let id = format!("{}-{}", self.prefix, n);
            if !taken(&id) {
                return id;
            }
        }
    }
}
