use serde::Deserialize;

use crate::error::{BanditError, BanditResult};

/// Hyperparameters of the adaptive bandit policy. Loaded from environment
/// variables with the prefix `ADAPTIVE_BANDIT__`; every field has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_initial_epsilon")]
    pub initial_epsilon: f64,
    #[serde(default = "default_discount")]
    pub discount: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_softmax_temperature")]
    pub softmax_temperature: f64,
    /// Low values cause high exploration when value estimates shift.
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    /// Seed for the policy's random source. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

// Default functions
fn default_initial_epsilon() -> f64 {
    0.2
}
fn default_discount() -> f64 {
    0.9
}
fn default_learning_rate() -> f64 {
    0.8
}
fn default_softmax_temperature() -> f64 {
    1.0
}
fn default_sigma() -> f64 {
    15.0
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            initial_epsilon: default_initial_epsilon(),
            discount: default_discount(),
            learning_rate: default_learning_rate(),
            softmax_temperature: default_softmax_temperature(),
            sigma: default_sigma(),
            seed: None,
        }
    }
}

impl PolicyConfig {
    /// Load configuration from environment variables and validate it.
    pub fn load() -> BanditResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADAPTIVE_BANDIT")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: Self = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Same defaults with a fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> BanditResult<()> {
        check_unit_interval("initial_epsilon", self.initial_epsilon)?;
        check_unit_interval("discount", self.discount)?;
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0 && self.learning_rate <= 1.0)
        {
            return Err(BanditError::InvalidConfiguration(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        check_positive("softmax_temperature", self.softmax_temperature)?;
        check_positive("sigma", self.sigma)?;
        Ok(())
    }
}

pub fn check_unit_interval(name: &str, value: f64) -> BanditResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BanditError::InvalidConfiguration(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

fn check_positive(name: &str, value: f64) -> BanditResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(BanditError::InvalidConfiguration(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}
