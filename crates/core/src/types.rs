use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BanditResult;

/// Two-operation contract shared by every bandit policy a harness can drive.
pub trait BanditPolicy {
    type Arm;

    /// Choose the next arm to pull.
    fn select_arm(&mut self) -> Self::Arm;

    /// Report the reward observed after pulling `arm`.
    fn record_feedback(&mut self, arm: &Self::Arm, reward: f64) -> BanditResult<()>;
}

/// Which branch of the decision procedure produced an arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    ColdStart,
    Explore,
    Exploit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision<A> {
    pub arm: A,
    pub index: usize,
    pub mode: SelectionMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmStats<A> {
    pub arm: A,
    pub index: usize,
    pub pull_count: u64,
    pub cumulative_reward: f64,
    /// `None` until the arm has received feedback.
    pub mean_reward: Option<f64>,
    pub q_value: f64,
}

/// Point-in-time copy of a policy's bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot<A> {
    pub policy_id: Uuid,
    pub epsilon: f64,
    pub total_pulls: u64,
    pub arms: Vec<ArmStats<A>>,
    pub taken_at: DateTime<Utc>,
}

impl<A: Serialize> PolicySnapshot<A> {
    pub fn to_json(&self) -> BanditResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<A> PolicySnapshot<A> {
    /// Arm with the highest Q-value, first occurrence on ties.
    pub fn leader(&self) -> Option<&ArmStats<A>> {
        let mut best: Option<&ArmStats<A>> = None;
        for stats in &self.arms {
            match best {
                Some(b) if stats.q_value <= b.q_value => {}
                _ => best = Some(stats),
            }
        }
        best
    }
}
