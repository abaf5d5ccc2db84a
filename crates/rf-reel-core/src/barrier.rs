//! Reel completion barrier

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Countdown barrier: one arrival per reel, waiters released at zero
#[derive(Debug)]
pub struct SpinBarrier {
    remaining: AtomicUsize,
    notify: Notify,
}

impl SpinBarrier {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            notify: Notify::new(),
        }
    }

    /// Record one arrival and return how many are still outstanding.
    /// Extra arrivals are ignored.
    pub fn arrive(&self) -> usize {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => {
                self.notify.notify_waiters();
                0
            }
            Ok(n) => n - 1,
            Err(_) => 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_clear(&self) -> bool {
        self.remaining() == 0
    }

    /// Wait until every participant has arrived
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent final arrival is not missed
            notified.as_mut().enable();
            if self.is_clear() {
                return;
            }
            notified.await;
        }
    }
}

/// Arrives at the barrier when dropped, including on abort or panic
#[derive(Debug)]
pub struct CompletionGuard {
    barrier: Arc<SpinBarrier>,
    reel: usize,
}

impl CompletionGuard {
    pub fn new(barrier: Arc<SpinBarrier>, reel: usize) -> Self {
        Self { barrier, reel }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let left = self.barrier.arrive();
        log::debug!("Reel {} complete, {} outstanding", self.reel, left);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    #[test]
    fn test_arrive_counts_down_and_saturates() {
        let barrier = SpinBarrier::new(2);
        assert_eq!(barrier.arrive(), 1);
        assert!(!barrier.is_clear());
        assert_eq!(barrier.arrive(), 0);
        assert!(barrier.is_clear());
        assert_eq!(barrier.arrive(), 0);
        assert_eq!(barrier.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_releases_after_last_arrival() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for round in 0..50 {
            let barrier = Arc::new(SpinBarrier::new(5));
            let arrived = Arc::new(AtomicUsize::new(0));
            let delays: Vec<u64> = (0..5).map(|_| rng.random_range(0..200)).collect();

            for (i, &ms) in delays.iter().enumerate() {
                let guard = CompletionGuard::new(Arc::clone(&barrier), i);
                let arrived = Arc::clone(&arrived);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    arrived.fetch_add(1, Ordering::SeqCst);
                    drop(guard);
                });
            }

            let start = tokio::time::Instant::now();
            barrier.wait().await;
            let slowest = delays.iter().copied().max().unwrap_or(0);
            assert_eq!(arrived.load(Ordering::SeqCst), 5, "round {round}: {delays:?}");
            assert!(barrier.is_clear());
            assert!(start.elapsed() >= Duration::from_millis(slowest), "round {round}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_task_still_arrives() {
        let barrier = Arc::new(SpinBarrier::new(1));
        let guard = CompletionGuard::new(Arc::clone(&barrier), 0);
        let handle = tokio::spawn(async move {
            let _guard = guard;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        handle.abort();
        let _ = handle.await;

        tokio::time::timeout(Duration::from_secs(1), barrier.wait())
            .await
            .expect("barrier cleared by aborted task");
    }

    #[tokio::test]
    async fn test_zero_count_is_already_clear() {
        SpinBarrier::new(0).wait().await;
    }
}
