use super::{Cents, Entry};

/// Compute the balance of an owner from a list of entries.
/// Balance = sum of the amounts of the owner's unconsumed entries.
///
/// Returns `None` when the sum does not fit in `Cents`.
pub fn unconsumed_balance<'a>(
    owner: &str,
    entries: impl IntoIterator<Item = &'a Entry>,
) -> Option<Cents> {
    let total: i128 = entries
        .into_iter()
        .filter(|e| e.owner == owner && e.is_live())
        .map(|e| i128::from(e.amount))
        .sum();
    Cents::try_from(total).ok()
}

/// Sort entries oldest first. The sort is stable, so entries sharing a
/// timestamp keep the order they were given in (insertion order).
pub fn fifo_order(entries: &mut [Entry]) {
    entries.sort_by_key(|e| e.created_at);
}
