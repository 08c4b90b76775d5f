//! Ports layer: Trait definitions for the external artifacts.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the persisted model/scaler artifacts.

mod model;

pub use model::{Classifier, InferenceError, ModelHandle, ProbabilisticClassifier, Scaler};
