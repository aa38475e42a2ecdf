//! Adaptive multi-armed bandit engine. The policy tracks per-arm values and
//! raises its exploration rate after surprising feedback; wrappers cover
//! sharing one policy across threads and running one per experiment.

pub mod normalize;
pub mod policy;
pub mod registry;
pub mod shared;

pub use normalize::{normalize, try_normalize};
pub use policy::AdaptiveBanditPolicy;
pub use registry::PolicyRegistry;
pub use shared::SharedPolicy;
