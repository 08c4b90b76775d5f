//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifact`: JSON model/scaler artifacts with Ed25519 verification
//! - `sanitize`: PII filtering for logs

pub mod artifact;
pub mod sanitize;

pub use artifact::ArtifactError;
