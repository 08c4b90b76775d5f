//! Model and scaler ports.
//!
//! The persisted artifacts are opaque to the application: a scaler exposing
//! a fitted affine transform and a classifier exposing `predict`, optionally
//! with a probability estimate. The probability capability is fixed per
//! artifact, so callers resolve it once at load time via [`ModelHandle`]
//! instead of probing on every request.

/// Numeric or shape failure inside the inference path.
///
/// A dimensionality mismatch is a configuration-consistency violation, not a
/// runtime-recoverable condition: it means the artifacts were fitted on a
/// different schema than the one being served.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("non-finite value produced during {stage}")]
    Numeric { stage: &'static str },
}

/// A fitted binary classifier.
pub trait Classifier: Send + Sync {
    /// Predict the class label in {0, 1} for an already-scaled vector.
    ///
    /// # Errors
    /// Returns `InferenceError` on a shape mismatch or non-finite
    /// intermediate value.
    fn predict(&self, features: &[f64]) -> Result<u8, InferenceError>;
}

/// A classifier that also exposes per-class probability estimates.
pub trait ProbabilisticClassifier: Classifier {
    /// Class probability masses for an already-scaled vector.
    ///
    /// Two-class models return `[p0, p1]`; the caller takes the positive
    /// class at index 1, or index 0 when only one value is emitted.
    ///
    /// # Errors
    /// Returns `InferenceError` on a shape mismatch or non-finite
    /// intermediate value.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError>;
}

/// A fitted per-feature standardization transform.
pub trait Scaler: Send + Sync {
    /// Apply `(x - mean) / std` with parameters fixed at fit time.
    ///
    /// # Errors
    /// Returns `InferenceError::ShapeMismatch` when the vector length does
    /// not match the fitted column count.
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError>;
}

/// A loaded classifier with its probability capability resolved.
pub enum ModelHandle {
    /// Class labels only
    Plain(Box<dyn Classifier>),
    /// Class labels plus probability estimates
    Probabilistic(Box<dyn ProbabilisticClassifier>),
}

impl ModelHandle {
    #[must_use]
    pub fn is_probabilistic(&self) -> bool {
        matches!(self, Self::Probabilistic(_))
    }

    /// Predict the class label, regardless of capability.
    ///
    /// # Errors
    /// Propagates the underlying classifier error.
    pub fn predict(&self, features: &[f64]) -> Result<u8, InferenceError> {
        match self {
            Self::Plain(c) => c.predict(features),
            Self::Probabilistic(c) => c.predict(features),
        }
    }
}
