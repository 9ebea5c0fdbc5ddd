//! Consent Management
//!
//! 同意記録のライフサイクル（記録・検証・失効）と同意ガード

mod lifecycle;
mod types;

pub use lifecycle::ConsentLifecycle;
pub use types::{ConsentRecord, ConsentType};
