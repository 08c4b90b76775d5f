//! # Cardioscope
//!
//! Cardiovascular disease risk assessment over a pre-trained binary
//! classifier.
//!
//! This crate provides:
//! - A single inference request pipeline: raw patient attributes in,
//!   structured prediction with risk tier and advice out
//! - An HTTP front-end (form + JSON API)
//! - A terminal dashboard front-end
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (patient input, feature vector, assessment)
//! - `ports`: Trait definitions for the model and scaler artifacts
//! - `adapters`: Concrete implementations (JSON artifacts, log sanitization)
//! - `application`: Use cases orchestrating domain and ports
//! - `http` / `tui`: The two front-ends

pub mod adapters;
pub mod application;
pub mod domain;
pub mod http;
pub mod ports;
pub mod tui;

pub use domain::{Assessment, PatientInput, RiskTier};

/// Result type for cardioscope operations
pub type Result<T> = std::result::Result<T, CardioscopeError>;

/// Main error type for cardioscope
#[derive(Debug, thiserror::Error)]
pub enum CardioscopeError {
    #[error("model or scaler unavailable: {0}")]
    ModelUnavailable(String),

    #[error("inference failed: {0}")]
    Inference(#[from] ports::InferenceError),

    #[error("invalid patient input: {0}")]
    Validation(String),

    #[error("artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
