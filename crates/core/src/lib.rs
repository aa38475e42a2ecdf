pub mod config;
pub mod error;
pub mod types;

pub use config::PolicyConfig;
pub use error::{BanditError, BanditResult};
pub use types::{ArmStats, BanditPolicy, Decision, PolicySnapshot, SelectionMode};
