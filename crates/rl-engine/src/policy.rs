//! Adaptive epsilon-greedy bandit. Q-values follow a temporal-difference
//! update and epsilon follows the magnitude of each update; exploration
//! samples a softmax over normalized Q-values.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use bandit_core::config::check_unit_interval;
use bandit_core::{
    ArmStats, BanditError, BanditPolicy, BanditResult, Decision, PolicyConfig, PolicySnapshot,
    SelectionMode,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::normalize::try_normalize;

#[derive(Debug, Clone)]
pub struct AdaptiveBanditPolicy<A, R = StdRng> {
    id: Uuid,
    arms: Vec<A>,
    index: HashMap<A, usize>,
    pull_counts: Vec<u64>,
    cumulative_rewards: Vec<f64>,
    q_values: Vec<f64>,
    epsilon: f64,
    discount: f64,
    learning_rate: f64,
    softmax_temperature: f64,
    sigma: f64,
    /// 1 / number of arms.
    sensitivity: f64,
    rng: R,
}

impl<A> AdaptiveBanditPolicy<A, StdRng>
where
    A: Clone + Eq + Hash + Debug,
{
    pub fn new(arms: impl IntoIterator<Item = A>) -> BanditResult<Self> {
        Self::with_config(arms, &PolicyConfig::default())
    }

    pub fn with_epsilon(
        arms: impl IntoIterator<Item = A>,
        initial_epsilon: f64,
    ) -> BanditResult<Self> {
        let config = PolicyConfig {
            initial_epsilon,
            ..PolicyConfig::default()
        };
        Self::with_config(arms, &config)
    }

    /// Build from configuration. The random source is seeded from
    /// `config.seed` when present, otherwise from OS entropy.
    pub fn with_config(
        arms: impl IntoIterator<Item = A>,
        config: &PolicyConfig,
    ) -> BanditResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(arms, config, rng)
    }
}

impl<A, R> AdaptiveBanditPolicy<A, R>
where
    A: Clone + Eq + Hash + Debug,
    R: Rng,
{
    /// Build with an explicitly injected random source.
    pub fn with_rng(
        arms: impl IntoIterator<Item = A>,
        config: &PolicyConfig,
        rng: R,
    ) -> BanditResult<Self> {
        config.validate()?;

        let arms: Vec<A> = arms.into_iter().collect();
        if arms.is_empty() {
            return Err(BanditError::InvalidConfiguration(
                "arm set must not be empty".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(arms.len());
        for (i, arm) in arms.iter().enumerate() {
            if index.insert(arm.clone(), i).is_some() {
                return Err(BanditError::InvalidConfiguration(format!(
                    "duplicate arm identifier {arm:?}"
                )));
            }
        }

        let n = arms.len();
        let id = Uuid::new_v4();
        info!(
            policy_id = %id,
            arms = n,
            epsilon = config.initial_epsilon,
            "adaptive bandit policy created"
        );

        Ok(Self {
            id,
            arms,
            index,
            pull_counts: vec![0; n],
            cumulative_rewards: vec![0.0; n],
            q_values: vec![0.0; n],
            epsilon: config.initial_epsilon,
            discount: config.discount,
            learning_rate: config.learning_rate,
            softmax_temperature: config.softmax_temperature,
            sigma: config.sigma,
            sensitivity: 1.0 / n as f64,
            rng,
        })
    }

    pub fn select_arm(&mut self) -> A {
        self.decide().arm
    }

    /// Select an arm and report which branch of the procedure chose it.
    ///
    /// 1. Cold start: the first arm that has never received feedback.
    /// 2. With probability `epsilon`, sample from the softmax distribution.
    /// 3. Otherwise the arm with the highest Q-value.
    pub fn decide(&mut self) -> Decision<A> {
        let (index, mode) = if let Some(index) = self.cold_start_index() {
            (index, SelectionMode::ColdStart)
        } else if self.rng.gen::<f64>() < self.epsilon {
            (self.explore_index(), SelectionMode::Explore)
        } else {
            (self.exploit_index(), SelectionMode::Exploit)
        };

        debug!(policy_id = %self.id, index, ?mode, "arm selected");

        Decision {
            arm: self.arms[index].clone(),
            index,
            mode,
        }
    }

    /// Apply a reward observed for `arm`. Unknown arms and non-finite
    /// rewards are rejected without touching any state.
    pub fn record_feedback(&mut self, arm: &A, reward: f64) -> BanditResult<()> {
        let Some(&index) = self.index.get(arm) else {
            warn!(policy_id = %self.id, arm = ?arm, "feedback for unknown arm");
            return Err(BanditError::UnknownArm(format!("{arm:?}")));
        };
        if !reward.is_finite() {
            warn!(policy_id = %self.id, reward, "non-finite reward rejected");
            return Err(BanditError::InvalidReward(reward));
        }

        self.cumulative_rewards[index] += reward;
        self.pull_counts[index] += 1;

        // Max is over the Q-values before this update, arm's own included.
        let max_q = self.max_q_value();
        let delta = reward + self.discount * max_q - self.q_values[index];
        let step = self.learning_rate * delta;
        self.q_values[index] += step;

        let v = (-step.abs() / self.sigma).exp();
        let f = (1.0 - v) / (1.0 + v);
        self.epsilon = self.sensitivity * f + (1.0 - self.sensitivity) * self.epsilon;

        debug!(
            policy_id = %self.id,
            index,
            reward,
            delta,
            q_value = self.q_values[index],
            epsilon = self.epsilon,
            "feedback recorded"
        );
        Ok(())
    }

    /// Softmax distribution the explore branch samples from.
    pub fn exploration_probabilities(&self) -> Vec<f64> {
        let normalized = match try_normalize(&self.q_values, -1.0, 1.0) {
            Ok(normalized) => normalized,
            Err(err) => {
                debug!(policy_id = %self.id, error = %err, "exploring uniformly");
                // Midpoint of [-1, 1].
                vec![0.0; self.q_values.len()]
            }
        };

        // Shift by the max so a small temperature cannot overflow exp().
        let max = normalized.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = normalized
            .iter()
            .map(|v| ((v - max) / self.softmax_temperature).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / total).collect()
    }

    fn cold_start_index(&self) -> Option<usize> {
        self.pull_counts.iter().position(|&count| count == 0)
    }

    fn explore_index(&mut self) -> usize {
        let probabilities = self.exploration_probabilities();
        let draw: f64 = self.rng.gen();
        let mut cumulative = 0.0;
        for (i, p) in probabilities.iter().enumerate() {
            cumulative += p;
            if draw < cumulative {
                return i;
            }
        }
        // Rounding can leave the cumulative sum a hair under 1.
        probabilities.len() - 1
    }

    fn exploit_index(&self) -> usize {
        let mut best = 0;
        for (i, &q) in self.q_values.iter().enumerate().skip(1) {
            if q > self.q_values[best] {
                best = i;
            }
        }
        best
    }

    fn max_q_value(&self) -> f64 {
        self.q_values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl<A, R> AdaptiveBanditPolicy<A, R>
where
    A: Clone + Eq + Hash + Debug,
{
    pub fn policy_id(&self) -> Uuid {
        self.id
    }

    pub fn arms(&self) -> &[A] {
        &self.arms
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Override the current exploration rate. Later feedback keeps adapting
    /// it from this value.
    pub fn set_epsilon(&mut self, epsilon: f64) -> BanditResult<()> {
        check_unit_interval("epsilon", epsilon)?;
        debug!(policy_id = %self.id, from = self.epsilon, to = epsilon, "epsilon overridden");
        self.epsilon = epsilon;
        Ok(())
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn q_values(&self) -> &[f64] {
        &self.q_values
    }

    pub fn pull_count(&self, arm: &A) -> Option<u64> {
        self.index.get(arm).map(|&i| self.pull_counts[i])
    }

    pub fn cumulative_reward(&self, arm: &A) -> Option<f64> {
        self.index.get(arm).map(|&i| self.cumulative_rewards[i])
    }

    pub fn q_value(&self, arm: &A) -> Option<f64> {
        self.index.get(arm).map(|&i| self.q_values[i])
    }

    /// Mean observed reward, `None` for unknown or never-pulled arms.
    pub fn mean_reward(&self, arm: &A) -> Option<f64> {
        let &i = self.index.get(arm)?;
        Self::mean(self.cumulative_rewards[i], self.pull_counts[i])
    }

    pub fn total_pulls(&self) -> u64 {
        self.pull_counts.iter().sum()
    }

    pub fn snapshot(&self) -> PolicySnapshot<A> {
        let arms = self
            .arms
            .iter()
            .enumerate()
            .map(|(i, arm)| ArmStats {
                arm: arm.clone(),
                index: i,
                pull_count: self.pull_counts[i],
                cumulative_reward: self.cumulative_rewards[i],
                mean_reward: Self::mean(self.cumulative_rewards[i], self.pull_counts[i]),
                q_value: self.q_values[i],
            })
            .collect();

        PolicySnapshot {
            policy_id: self.id,
            epsilon: self.epsilon,
            total_pulls: self.total_pulls(),
            arms,
            taken_at: Utc::now(),
        }
    }

    fn mean(sum: f64, count: u64) -> Option<f64> {
        if count > 0 {
            Some(sum / count as f64)
        } else {
            None
        }
    }
}

impl<A, R> BanditPolicy for AdaptiveBanditPolicy<A, R>
where
    A: Clone + Eq + Hash + Debug,
    R: Rng,
{
    type Arm = A;

    fn select_arm(&mut self) -> A {
        AdaptiveBanditPolicy::select_arm(self)
    }

    fn record_feedback(&mut self, arm: &A, reward: f64) -> BanditResult<()> {
        AdaptiveBanditPolicy::record_feedback(self, arm, reward)
    }
}
