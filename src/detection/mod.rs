//! Threat detection.
//!
//! Detection is name based, with an archive content scan as a fallback:
//! - Signature table of known cheat clients
//! - Classifier producing file records

pub mod classifier;
pub mod signature;

pub use classifier::Classifier;
pub use signature::{SignatureTable, ThreatSignature};
