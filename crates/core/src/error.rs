use thiserror::Error;
use uuid::Uuid;

pub type BanditResult<T> = Result<T, BanditError>;

#[derive(Error, Debug)]
pub enum BanditError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown arm: {0}")]
    UnknownArm(String),

    #[error("Degenerate normalization: all values equal, cannot map onto [{lower}, {upper}]")]
    DegenerateNormalization { lower: f64, upper: f64 },

    #[error("Invalid reward: {0} is not a finite number")]
    InvalidReward(f64),

    #[error("Unknown policy: {0}")]
    UnknownPolicy(Uuid),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
