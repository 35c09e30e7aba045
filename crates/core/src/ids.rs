use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic `PREFIX-NNN` identifier source.
///
/// The counter is seeded past the highest numeric suffix already present in a collection, so
/// deleting a record never causes its identifier to be handed out again.
#[derive(Debug)]
pub struct IdSequence {
    prefix: &'static str,
    next: AtomicU64,
}

impl IdSequence {
    pub const QUOTATION: &'static str = "QT";
    pub const ORDER: &'static str = "ORD";
    pub const PAYMENT: &'static str = "PAY";
    pub const SAVED_METHOD: &'static str = "SPM";

    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: AtomicU64::new(1) }
    }

    pub fn seeded<'a, I>(prefix: &'static str, existing: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sequence = Self::new(prefix);
        sequence.observe_all(existing);
        sequence
    }

    pub fn next_id(&self) -> String {
        let value = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{value:03}", self.prefix)
    }

    /// Moves the counter past `id` when it carries this sequence's prefix.
    pub fn observe(&self, id: &str) {
        if let Some(value) = self.suffix_of(id) {
            self.next.fetch_max(value.saturating_add(1), Ordering::SeqCst);
        }
    }

    pub fn observe_all<'a, I>(&self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for id in ids {
            self.observe(id);
        }
    }

    fn suffix_of(&self, id: &str) -> Option<u64> {
        let rest = id.strip_prefix(self.prefix)?.strip_prefix('-')?;
        rest.parse::<u64>().ok()
    }
}
