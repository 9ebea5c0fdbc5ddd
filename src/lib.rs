//! # gdpr-rs
//!
//! GDPR/CCPA compliance data lifecycle manager.
//!
//! This crate tracks user consent, processes data subject requests
//! (access, erasure and the other GDPR rights), runs periodic retention
//! cleanup and produces compliance reports. Persistence, notification
//! delivery and scheduling cadence are external collaborators reached
//! through narrow interfaces ([`store::ComplianceStore`],
//! [`notify::Notifier`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gdpr_rs::{ComplianceConfig, ComplianceEngine, Identity};
//! use gdpr_rs::consent::ConsentType;
//! use gdpr_rs::notify::LogNotifier;
//! use gdpr_rs::store::MemoryStore;
//!
//! # async fn example() -> gdpr_rs::Result<()> {
//! let engine = ComplianceEngine::new(
//!     ComplianceConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(LogNotifier::new()),
//! );
//!
//! let identity = Identity::AnonymousSession("abc".to_string());
//! engine
//!     .consents()
//!     .record_consent(identity.clone(), ConsentType::Marketing, true, "203.0.113.10", None)
//!     .await?;
//! assert!(engine.consents().has_valid_consent(&identity, ConsentType::Marketing).await?);
//! # Ok(())
//! # }
//! ```

pub mod breach;
pub mod config;
pub mod consent;
pub mod engine;
pub mod error;
pub mod export;
pub mod logging;
pub mod notify;
pub mod policy;
pub mod report;
pub mod requests;
pub mod scheduler;
pub mod store;
pub mod types;

pub use config::ComplianceConfig;
pub use engine::ComplianceEngine;
pub use error::{Error, Result};
pub use types::Identity;
