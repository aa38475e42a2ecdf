//! Thread-safe handle for a policy that several callers drive together.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use bandit_core::{BanditResult, PolicySnapshot};
use parking_lot::{Mutex, MutexGuard};
use rand::rngs::StdRng;
use rand::Rng;

use crate::policy::AdaptiveBanditPolicy;

/// Cloneable handle over one [`AdaptiveBanditPolicy`]. Every clone sees the
/// same state; each call holds the lock for its whole duration.
pub struct SharedPolicy<A, R = StdRng> {
    inner: Arc<Mutex<AdaptiveBanditPolicy<A, R>>>,
}

impl<A, R> Clone for SharedPolicy<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> SharedPolicy<A, R>
where
    A: Clone + Eq + Hash + Debug,
    R: Rng,
{
    pub fn new(policy: AdaptiveBanditPolicy<A, R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(policy)),
        }
    }

    pub fn select_arm(&self) -> A {
        self.inner.lock().select_arm()
    }

    pub fn record_feedback(&self, arm: &A, reward: f64) -> BanditResult<()> {
        self.inner.lock().record_feedback(arm, reward)
    }

    /// Select an arm, obtain its reward from `pull`, and record it, all under
    /// one lock acquisition so no other caller can interleave.
    pub fn round<F>(&self, pull: F) -> BanditResult<(A, f64)>
    where
        F: FnOnce(&A) -> f64,
    {
        let mut policy = self.inner.lock();
        let arm = policy.select_arm();
        let reward = pull(&arm);
        policy.record_feedback(&arm, reward)?;
        Ok((arm, reward))
    }

    pub fn epsilon(&self) -> f64 {
        self.inner.lock().epsilon()
    }

    pub fn snapshot(&self) -> PolicySnapshot<A> {
        self.inner.lock().snapshot()
    }

    /// Exclusive access for callers that need a longer critical section.
    pub fn lock(&self) -> MutexGuard<'_, AdaptiveBanditPolicy<A, R>> {
        self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandit_core::PolicyConfig;
    use std::thread;

    fn make_shared(arms: &[&'static str]) -> SharedPolicy<&'static str> {
        let policy =
            AdaptiveBanditPolicy::with_config(arms.iter().copied(), &PolicyConfig::seeded(11))
                .unwrap();
        SharedPolicy::new(policy)
    }

    #[test]
    fn test_clones_share_state() {
        let shared = make_shared(&["a", "b"]);
        let other = shared.clone();

        let arm = shared.select_arm();
        other.record_feedback(&arm, 10.0).unwrap();

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.total_pulls, 1);
        assert_eq!(snapshot.arms[0].pull_count, 1);
    }

    #[test]
    fn test_round_records_reward() {
        let shared = make_shared(&["a", "b", "c"]);
        let (arm, reward) = shared.round(|arm| if *arm == "a" { 3.0 } else { 0.0 }).unwrap();
        assert_eq!(arm, "a");
        assert_eq!(reward, 3.0);
        assert_eq!(shared.lock().cumulative_reward(&"a"), Some(3.0));
    }

    #[test]
    fn test_concurrent_rounds_keep_bookkeeping_consistent() {
        let shared = make_shared(&["a", "b", "c", "d"]);
        let workers = 8;
        let rounds_per_worker = 250;

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..rounds_per_worker {
                        shared.round(|_| 1.0).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.total_pulls, (workers * rounds_per_worker) as u64);
        let reward_total: f64 = snapshot.arms.iter().map(|s| s.cumulative_reward).sum();
        assert_eq!(reward_total, (workers * rounds_per_worker) as f64);
        assert!(shared.epsilon() >= 0.0 && shared.epsilon() <= 1.0);
    }
}
