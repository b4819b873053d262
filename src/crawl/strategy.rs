//! Identifier selection.
//!
//! A strategy lazily yields the next identifier to fetch, consulting the
//! store so that already-ingested identifiers are skipped without a request.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::repository::{ReportStore, StoreError};

/// Which identifiers a session visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Sequential,
    Random,
    Single(i64),
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
            Self::Single(_) => "single",
        }
    }
}

enum Cursor {
    Sequential { next: i64, bound: i64 },
    Random { bound: i64, rng: StdRng },
    Single { id: i64, done: bool },
}

/// Stateful identifier sequence for one session.
pub struct IdStrategy {
    cursor: Cursor,
    skipped: u64,
}

impl IdStrategy {
    /// 1..=bound in order.
    pub fn sequential(bound: i64) -> Self {
        Self::from_cursor(Cursor::Sequential { next: 1, bound })
    }

    /// Uniform samples from 1..=bound.
    pub fn random(bound: i64) -> Self {
        Self::from_cursor(Cursor::Random {
            bound,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Random strategy with a reproducible sample order.
    pub fn random_seeded(bound: i64, seed: u64) -> Self {
        Self::from_cursor(Cursor::Random {
            bound,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Exactly one identifier, yielded even if already stored.
    pub fn single(id: i64) -> Self {
        Self::from_cursor(Cursor::Single { id, done: false })
    }

    pub fn for_kind(kind: StrategyKind, bound: i64) -> Self {
        match kind {
            StrategyKind::Sequential => Self::sequential(bound),
            StrategyKind::Random => Self::random(bound),
            StrategyKind::Single(id) => Self::single(id),
        }
    }

    fn from_cursor(cursor: Cursor) -> Self {
        Self { cursor, skipped: 0 }
    }

    /// Identifiers passed over because they were already stored.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Next identifier to fetch, or `None` once the strategy is exhausted.
    pub async fn next<S>(&mut self, store: &S) -> Result<Option<i64>, StoreError>
    where
        S: ReportStore + ?Sized,
    {
        match &mut self.cursor {
            Cursor::Sequential { next, bound } => {
                while *next <= *bound {
                    let id = *next;
                    *next += 1;
                    if store.exists(id).await? {
                        info!("Report {} already in database, skipping", id);
                        self.skipped += 1;
                        continue;
                    }
                    return Ok(Some(id));
                }
                Ok(None)
            }
            Cursor::Random { bound, rng } => {
                if *bound < 1 {
                    return Ok(None);
                }
                loop {
                    // Row count stands in for coverage. Rows above the bound
                    // (from discovery) can end this early.
                    if store.row_count().await? >= *bound {
                        info!("Row count reached upper bound {}, random crawl done", bound);
                        return Ok(None);
                    }
                    let id = rng.random_range(1..=*bound);
                    if store.exists(id).await? {
                        debug!("Report {} already in database, resampling", id);
                        self.skipped += 1;
                        continue;
                    }
                    return Ok(Some(id));
                }
            }
            Cursor::Single { id, done } => {
                if *done {
                    return Ok(None);
                }
                *done = true;
                Ok(Some(*id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Report, Unavailable};
    use crate::repository::memory::MemoryStore;
    use std::collections::HashSet;

    async fn drain(strategy: &mut IdStrategy, store: &MemoryStore) -> Vec<i64> {
        let mut ids = Vec::new();
        while let Some(id) = strategy.next(store).await.unwrap() {
            store
                .write(&Report::placeholder(id, Unavailable::NotFound))
                .await
                .unwrap();
            ids.push(id);
        }
        ids
    }

    #[tokio::test]
    async fn test_sequential_skips_stored_ids() {
        let store = MemoryStore::with_bound(6, false);
        store.seed([2, 5]).await;

        let mut strategy = IdStrategy::sequential(6);
        assert_eq!(drain(&mut strategy, &store).await, vec![1, 3, 4, 6]);
        assert_eq!(strategy.skipped(), 2);
    }

    #[tokio::test]
    async fn test_sequential_empty_bound() {
        let store = MemoryStore::with_bound(0, false);
        let mut strategy = IdStrategy::sequential(0);
        assert_eq!(strategy.next(&store).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_random_covers_range_without_repeats() {
        let store = MemoryStore::with_bound(20, false);
        store.seed([1, 7, 20]).await;

        let mut strategy = IdStrategy::random_seeded(20, 42);
        let ids = drain(&mut strategy, &store).await;

        let unique: HashSet<i64> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(ids.len(), 17);
        assert!(!unique.contains(&1) && !unique.contains(&7) && !unique.contains(&20));
        assert!(ids.iter().all(|id| (1..=20).contains(id)));
    }

    #[tokio::test]
    async fn test_random_stops_when_row_count_reaches_bound() {
        let store = MemoryStore::with_bound(3, false);
        store.seed([1, 2, 3]).await;

        let mut strategy = IdStrategy::random_seeded(3, 7);
        assert_eq!(strategy.next(&store).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_single_yields_once_without_dedup() {
        let store = MemoryStore::with_bound(10, false);
        store.seed([4]).await;

        let mut strategy = IdStrategy::single(4);
        assert_eq!(strategy.next(&store).await.unwrap(), Some(4));
        assert_eq!(strategy.next(&store).await.unwrap(), None);
    }
}
