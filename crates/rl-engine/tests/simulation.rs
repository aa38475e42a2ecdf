//! Drives the adaptive policy and a uniform baseline through the shared
//! `BanditPolicy` contract against a seeded reward environment.

use bandit_core::{BanditPolicy, BanditResult, PolicyConfig, SelectionMode};
use bandit_rl_engine::AdaptiveBanditPolicy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Arms with fixed mean rewards plus uniform noise in [-0.5, 0.5).
struct Environment {
    arms: Vec<String>,
    means: Vec<f64>,
    rng: StdRng,
}

impl Environment {
    fn new(means: &[f64], seed: u64) -> Self {
        Self {
            arms: (0..means.len())
                .map(|i| format!("Configuration {}", (b'a' + i as u8) as char))
                .collect(),
            means: means.to_vec(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pull(&mut self, arm: &str) -> f64 {
        let index = self.arms.iter().position(|a| a == arm).unwrap();
        self.means[index] + self.rng.gen::<f64>() - 0.5
    }
}

struct UniformBaseline {
    arms: Vec<String>,
    rng: StdRng,
}

impl BanditPolicy for UniformBaseline {
    type Arm = String;

    fn select_arm(&mut self) -> String {
        let index = self.rng.gen_range(0..self.arms.len());
        self.arms[index].clone()
    }

    fn record_feedback(&mut self, _arm: &String, _reward: f64) -> BanditResult<()> {
        Ok(())
    }
}

fn run_trials<P: BanditPolicy<Arm = String>>(
    policy: &mut P,
    env: &mut Environment,
    rounds: usize,
) -> f64 {
    let mut total = 0.0;
    for _ in 0..rounds {
        let arm = policy.select_arm();
        let reward = env.pull(&arm);
        policy.record_feedback(&arm, reward).unwrap();
        total += reward;
    }
    total
}

#[test]
fn test_adaptive_policy_beats_uniform_baseline() {
    let means = [10.0, 0.0, 0.0, 0.0];
    let rounds = 2_000;

    let mut env = Environment::new(&means, 3);
    let mut adaptive =
        AdaptiveBanditPolicy::with_config(env.arms.clone(), &PolicyConfig::seeded(5)).unwrap();
    let adaptive_total = run_trials(&mut adaptive, &mut env, rounds);

    let mut env = Environment::new(&means, 3);
    let mut baseline = UniformBaseline {
        arms: env.arms.clone(),
        rng: StdRng::seed_from_u64(5),
    };
    let baseline_total = run_trials(&mut baseline, &mut env, rounds);

    assert!(
        adaptive_total > 2.0 * baseline_total,
        "adaptive {adaptive_total} vs baseline {baseline_total}"
    );

    let best = "Configuration a".to_string();
    let snapshot = adaptive.snapshot();
    assert_eq!(snapshot.total_pulls, rounds as u64);
    assert_eq!(snapshot.leader().unwrap().arm, best);
    assert!(adaptive.q_value(&best).unwrap() > 50.0);
    assert!(adaptive.epsilon() < 0.2);

    let recorded: f64 = snapshot.arms.iter().map(|s| s.cumulative_reward).sum();
    assert!((recorded - adaptive_total).abs() < 1e-6);
}

#[test]
fn test_every_arm_tried_before_adapting() {
    let mut env = Environment::new(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 9);
    let mut policy =
        AdaptiveBanditPolicy::with_config(env.arms.clone(), &PolicyConfig::seeded(9)).unwrap();

    for expected in env.arms.clone() {
        let decision = policy.decide();
        assert_eq!(decision.arm, expected);
        assert_eq!(decision.mode, SelectionMode::ColdStart);
        let reward = env.pull(&decision.arm);
        policy.record_feedback(&decision.arm, reward).unwrap();
    }

    for stats in policy.snapshot().arms {
        assert_eq!(stats.pull_count, 1);
    }
    assert_ne!(policy.decide().mode, SelectionMode::ColdStart);
}

#[test]
fn test_greedy_after_warm_up_is_stable() {
    let mut env = Environment::new(&[10.0, 0.0, 0.0], 21);
    let mut policy =
        AdaptiveBanditPolicy::with_config(env.arms.clone(), &PolicyConfig::seeded(21)).unwrap();
    run_trials(&mut policy, &mut env, 300);

    policy.set_epsilon(0.0).unwrap();
    let first = policy.select_arm();
    assert_eq!(first, "Configuration a");
    for _ in 0..100 {
        assert_eq!(policy.select_arm(), first);
    }
}

#[test]
fn test_snapshot_serializes_bookkeeping() {
    let mut env = Environment::new(&[1.0, 2.0], 4);
    let mut policy =
        AdaptiveBanditPolicy::with_config(env.arms.clone(), &PolicyConfig::seeded(4)).unwrap();
    run_trials(&mut policy, &mut env, 10);

    let json = policy.snapshot().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_pulls"], 10);
    assert_eq!(value["arms"].as_array().unwrap().len(), 2);
    assert_eq!(value["arms"][0]["arm"], "Configuration a");
}
