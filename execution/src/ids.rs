use std::sync::atomic::{AtomicU64, Ordering};

/// Source of escrow identifiers. Ids must be unique and never reused.
pub trait IdGenerator: Send + Sync {
    fn next(&self) -> u64;
}

/// Monotonic counter starting at 1.
#[derive(Debug)]
pub struct Sequential(AtomicU64);

impl Sequential {
    pub fn starting_at(first: u64) -> Self {
        Self(AtomicU64::new(first))
    }
}

impl Default for Sequential {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for Sequential {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_is_monotonic() {
        let ids = Sequential::default();
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);

        let ids = Sequential::starting_at(100);
        assert_eq!(ids.next(), 100);
    }
}
