//! LSN generation.

use std::sync::atomic::{AtomicU64, Ordering};

use keva_common::types::Lsn;

/// Process-lifetime counter handing out strictly increasing LSNs.
///
/// Owned by [`Storage`](crate::Storage) and seeded from the highest LSN
/// recovered from the WAL, so every new LSN is strictly greater than anything
/// already durable. The one exception: at `u64::MAX` the counter wraps to
/// zero before the next increment, a discontinuity a node will not reach in
/// practice but which keeps the counter from sticking at the ceiling.
#[derive(Debug)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    /// Creates a generator that will hand out LSNs greater than `previous`.
    #[must_use]
    pub fn new(previous: Lsn) -> Self {
        Self {
            counter: AtomicU64::new(previous.as_u64()),
        }
    }

    /// Returns the next LSN.
    ///
    /// Safe under concurrency: no two callers ever observe the same value.
    pub fn next(&self) -> Lsn {
        let _ = self
            .counter
            .compare_exchange(u64::MAX, 0, Ordering::AcqRel, Ordering::Relaxed);
        Lsn::new(self.counter.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_starts_after_seed() {
        let generator = IdGenerator::new(Lsn::new(41));
        assert_eq!(generator.next(), Lsn::new(42));
        assert_eq!(generator.next(), Lsn::new(43));
    }

    #[test]
    fn test_wraparound_at_ceiling() {
        let generator = IdGenerator::new(Lsn::MAX);
        assert_eq!(generator.next(), Lsn::new(1));
        assert_eq!(generator.next(), Lsn::new(2));
    }

    #[test]
    fn test_concurrent_ids_are_distinct() {
        let generator = Arc::new(IdGenerator::new(Lsn::INVALID));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..1000).map(|_| generator.next()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for lsn in handle.join().unwrap() {
                assert!(seen.insert(lsn), "duplicate LSN {lsn}");
            }
        }

        assert_eq!(seen.len(), 8000);
        assert_eq!(generator.next(), Lsn::new(8001));
    }

    #[test]
    fn test_single_thread_strictly_increasing() {
        let generator = IdGenerator::new(Lsn::INVALID);
        let mut previous = Lsn::INVALID;
        for _ in 0..100 {
            let next = generator.next();
            assert!(next > previous);
            previous = next;
        }
    }
}
