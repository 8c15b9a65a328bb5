//! Last-lookup cache for address to field resolution

/// Remembers the most recent `(address, field index)` lookup
///
/// A lookup for any address hits when the cached index is still in range
/// and the caller's revalidation check passes, so a run of addresses inside
/// one field resolves from the cache. The owner must call
/// [`FieldCache::invalidate`] on every structural change to the field list.
#[derive(Debug, Clone, Default)]
pub struct FieldCache {
    last: Option<(u16, usize)>,
    hits: u64,
    misses: u64,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached index, if it still holds for `address`
    pub fn lookup(
        &mut self,
        address: u16,
        count: usize,
        still_valid: impl Fn(usize) -> bool,
    ) -> Option<usize> {
        match self.last {
            Some((_, index)) if index < count && still_valid(index) => {
                self.hits += 1;
                self.last = Some((address, index));
                Some(index)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn store(&mut self, address: u16, index: usize) {
        self.last = Some((address, index));
    }

    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn last_address(&self) -> Option<u16> {
        self.last.map(|(address, _)| address)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss_accounting() {
        let mut cache = FieldCache::new();
        assert_eq!(cache.lookup(10, 3, |_| true), None);

        cache.store(10, 1);
        assert_eq!(cache.lookup(10, 3, |_| true), Some(1));
        // Neighbouring address in the same field
        assert_eq!(cache.lookup(11, 3, |i| i == 1), Some(1));
        assert_eq!(cache.last_address(), Some(11));
        assert_eq!(cache.lookup(40, 3, |_| false), None);

        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 2);
        assert!((cache.hit_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stale_entries_miss() {
        let mut cache = FieldCache::new();
        cache.store(10, 4);
        // Index beyond the current field count
        assert_eq!(cache.lookup(10, 2, |_| true), None);
        // Revalidation rejects it
        cache.store(10, 0);
        assert_eq!(cache.lookup(10, 2, |_| false), None);
    }

    #[test]
    fn test_invalidate() {
        let mut cache = FieldCache::new();
        cache.store(5, 0);
        cache.invalidate();
        assert_eq!(cache.last_address(), None);
        assert_eq!(cache.lookup(5, 1, |_| true), None);
    }
}
