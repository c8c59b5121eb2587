//! Concurrency budget shared by every probe of a run.
//!
//! A slot is held for one HTTP attempt. Backoff sleeps happen without a slot
//! so a throttled target does not starve the others.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Bounded count of in-flight API calls.
#[derive(Debug)]
pub struct ConcurrencyBudget {
    max_total: usize,
    in_use: AtomicUsize,
    peak: AtomicUsize,
    released: Notify,
}

/// A reserved slot; released on drop.
#[derive(Debug)]
pub struct BudgetSlot<'a> {
    budget: &'a ConcurrencyBudget,
}

impl ConcurrencyBudget {
    /// Create a budget with the given maximum in-flight calls (at least 1).
    pub fn new(max_total: usize) -> Self {
        Self {
            max_total: max_total.max(1),
            in_use: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            released: Notify::new(),
        }
    }

    pub fn max_total(&self) -> usize {
        self.max_total
    }

    /// Number of slots currently reserved.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    /// Available slots (max_total - in_use).
    pub fn available(&self) -> usize {
        self.max_total.saturating_sub(self.in_use())
    }

    /// Highest `in_use` observed since creation.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Take a slot if one is free.
    pub fn try_acquire(&self) -> Option<BudgetSlot<'_>> {
        let mut current = self.in_use.load(Ordering::Relaxed);
        loop {
            if current >= self.max_total {
                return None;
            }
            match self.in_use.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.peak.fetch_max(current + 1, Ordering::Relaxed);
                    return Some(BudgetSlot { budget: self });
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Wait until a slot is free and take it.
    pub async fn acquire(&self) -> BudgetSlot<'_> {
        loop {
            // Register interest before checking so a release in between is not lost.
            let notified = self.released.notified();
            if let Some(slot) = self.try_acquire() {
                return slot;
            }
            notified.await;
        }
    }

    fn release(&self) {
        self.in_use.fetch_sub(1, Ordering::AcqRel);
        self.released.notify_one();
    }
}

impl Drop for BudgetSlot<'_> {
    fn drop(&mut self) {
        self.budget.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn budget_reserve_and_release() {
        let budget = ConcurrencyBudget::new(2);
        assert_eq!(budget.available(), 2);
        let a = budget.try_acquire().unwrap();
        let b = budget.try_acquire().unwrap();
        assert_eq!(budget.in_use(), 2);
        assert!(budget.try_acquire().is_none());
        drop(a);
        assert_eq!(budget.available(), 1);
        drop(b);
        assert_eq!(budget.in_use(), 0);
        assert_eq!(budget.peak(), 2);
    }

    #[test]
    fn zero_is_clamped_to_one() {
        let budget = ConcurrencyBudget::new(0);
        assert_eq!(budget.max_total(), 1);
        assert!(budget.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_never_exceed_max() {
        let budget = Arc::new(ConcurrencyBudget::new(3));
        let mut set = tokio::task::JoinSet::new();
        for _ in 0..12 {
            let budget = Arc::clone(&budget);
            set.spawn(async move {
                let _slot = budget.acquire().await;
                assert!(budget.in_use() <= 3);
                tokio::time::sleep(Duration::from_millis(50)).await;
            });
        }
        while let Some(res) = set.join_next().await {
            res.unwrap();
        }
        assert_eq!(budget.in_use(), 0);
        assert_eq!(budget.peak(), 3);
    }
}
