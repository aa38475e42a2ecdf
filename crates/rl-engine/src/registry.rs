//! Registry of independent policies, one per experiment.

use bandit_core::{BanditError, BanditResult, Decision, PolicyConfig, PolicySnapshot};
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::policy::AdaptiveBanditPolicy;

pub struct PolicyRegistry {
    policies: DashMap<Uuid, AdaptiveBanditPolicy<String>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self {
            policies: DashMap::new(),
        }
    }

    /// Create a policy over `arms` and return the experiment id it is
    /// registered under.
    pub fn register(&self, arms: Vec<String>, config: &PolicyConfig) -> BanditResult<Uuid> {
        let policy = AdaptiveBanditPolicy::with_config(arms, config)?;
        let id = policy.policy_id();
        info!(experiment_id = %id, arms = policy.len(), "experiment registered");
        self.policies.insert(id, policy);
        Ok(id)
    }

    pub fn select_arm(&self, experiment_id: &Uuid) -> BanditResult<String> {
        Ok(self.decide(experiment_id)?.arm)
    }

    pub fn decide(&self, experiment_id: &Uuid) -> BanditResult<Decision<String>> {
        let mut policy = self
            .policies
            .get_mut(experiment_id)
            .ok_or_else(|| BanditError::UnknownPolicy(*experiment_id))?;
        Ok(policy.decide())
    }

    pub fn record_feedback(
        &self,
        experiment_id: &Uuid,
        arm: &str,
        reward: f64,
    ) -> BanditResult<()> {
        let mut policy = self
            .policies
            .get_mut(experiment_id)
            .ok_or_else(|| BanditError::UnknownPolicy(*experiment_id))?;
        policy.record_feedback(&arm.to_string(), reward)
    }

    pub fn snapshot(&self, experiment_id: &Uuid) -> Option<PolicySnapshot<String>> {
        self.policies.get(experiment_id).map(|p| p.snapshot())
    }

    pub fn snapshots(&self) -> Vec<PolicySnapshot<String>> {
        self.policies.iter().map(|p| p.snapshot()).collect()
    }

    pub fn remove(&self, experiment_id: &Uuid) -> BanditResult<()> {
        self.policies
            .remove(experiment_id)
            .ok_or_else(|| BanditError::UnknownPolicy(*experiment_id))?;
        info!(experiment_id = %experiment_id, "experiment removed");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
