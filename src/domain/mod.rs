//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no external service
//! dependencies. All types are serializable.

mod assessment;
mod patient;

pub use assessment::{Assessment, Prediction, Recommendation, RiskTier, Severity};
pub use patient::{DerivedFeatures, FeatureVector, PatientInput, FEATURE_COUNT, FEATURE_NAMES};
