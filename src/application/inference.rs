//! Inference service: the request pipeline from raw input to assessment.
//!
//! Artifacts are loaded once at startup and read-only afterwards, so a
//! single service instance is safe for concurrent use by any number of
//! requests. A failed load marks the service unavailable instead of leaving
//! a null handle; every subsequent request then fails with a structured
//! `ModelUnavailable` error until the process restarts.

use std::path::Path;

use crate::adapters::artifact::{self, LoadedArtifacts};
use crate::application::advice;
use crate::domain::{Assessment, PatientInput, Prediction, RiskTier};
use crate::ports::{ModelHandle, Scaler};
use crate::{CardioscopeError, Result};

pub struct InferenceService {
    artifacts: Option<LoadedArtifacts>,
}

impl InferenceService {
    /// Load the model/scaler pair from an artifact directory.
    ///
    /// A load failure is terminal for this process's serving capability but
    /// does not abort startup: the service comes up marked unavailable and
    /// every request receives a structured failure.
    #[must_use]
    pub fn load(artifact_dir: &Path) -> Self {
        match artifact::load_artifacts(artifact_dir) {
            Ok(artifacts) => Self {
                artifacts: Some(artifacts),
            },
            Err(e) => {
                tracing::error!("Failed to load artifacts from {:?}: {}", artifact_dir, e);
                Self { artifacts: None }
            }
        }
    }

    /// Build a service from already-loaded parts (composition root, tests).
    #[must_use]
    pub fn from_parts(model: ModelHandle, scaler: Box<dyn Scaler>) -> Self {
        Self {
            artifacts: Some(LoadedArtifacts { model, scaler }),
        }
    }

    /// A service with no artifacts, permanently unavailable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { artifacts: None }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.artifacts.is_some()
    }

    /// Whether the loaded model exposes probability estimates.
    #[must_use]
    pub fn is_probabilistic(&self) -> Option<bool> {
        self.artifacts.as_ref().map(|a| a.model.is_probabilistic())
    }

    /// Run the inference request pipeline.
    ///
    /// Validates the input, assembles the fixed-order feature vector,
    /// applies the fitted scaler, invokes the classifier, and shapes the
    /// result with risk tier and advice.
    ///
    /// # Errors
    /// - `ModelUnavailable` when no artifacts were loaded at startup
    /// - `Validation` when the input violates its documented domains
    /// - `Inference` on a shape or numeric failure
    pub fn assess(&self, input: &PatientInput) -> Result<Assessment> {
        let artifacts = self.artifacts.as_ref().ok_or_else(|| {
            CardioscopeError::ModelUnavailable(
                "no model/scaler was loaded at startup; check artifact directory".to_string(),
            )
        })?;

        input
            .validate()
            .map_err(|errors| CardioscopeError::Validation(errors.join("; ")))?;

        let vector = input.feature_vector();
        let scaled = artifacts.scaler.transform(vector.as_slice())?;

        let predicted_class = artifacts.model.predict(&scaled)?;
        let positive_probability = match &artifacts.model {
            ModelHandle::Probabilistic(model) => {
                let probs = model.predict_proba(&scaled)?;
                // Positive class sits at index 1 of a two-class output; an
                // empty output is a contract violation, not a panic.
                let p = probs.get(1).or_else(|| probs.first()).copied().ok_or(
                    crate::ports::InferenceError::ShapeMismatch {
                        expected: 2,
                        actual: 0,
                    },
                )?;
                Some(p)
            }
            ModelHandle::Plain(_) => None,
        };

        let risk_tier = positive_probability.map(RiskTier::from_probability);
        let prediction = Prediction::new(predicted_class, positive_probability);
        let recommendations = advice::recommendations(input, risk_tier);

        tracing::info!(
            "Assessment complete: class={}, tier={}",
            prediction.predicted_class,
            risk_tier.map_or_else(|| "n/a".to_string(), |t| t.to_string()),
        );

        Ok(Assessment::new(prediction, risk_tier, recommendations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifact::{LinearModel, StandardScaler};
    use crate::domain::FEATURE_COUNT;

    /// Logistic model driven only by systolic BP: z = (ap_hi - 120) / 10.
    fn probabilistic_service() -> InferenceService {
        let mut coef = vec![0.0; FEATURE_COUNT];
        coef[3] = 0.1;
        let model = LinearModel::new(coef, -12.0);
        InferenceService::from_parts(
            ModelHandle::Probabilistic(Box::new(model)),
            Box::new(StandardScaler::identity()),
        )
    }

    fn margin_service() -> InferenceService {
        let mut coef = vec![0.0; FEATURE_COUNT];
        coef[3] = 1.0;
        let model = LinearModel::new(coef, -130.0);
        InferenceService::from_parts(
            ModelHandle::Plain(Box::new(model)),
            Box::new(StandardScaler::identity()),
        )
    }

    #[test]
    fn test_unavailable_service_fails_structurally() {
        let service = InferenceService::unavailable();
        assert!(!service.is_available());
        assert!(service.is_probabilistic().is_none());

        let err = service
            .assess(&PatientInput::default())
            .expect_err("Should fail");
        assert!(matches!(err, CardioscopeError::ModelUnavailable(_)));
    }

    #[test]
    fn test_assessment_with_probability() {
        let service = probabilistic_service();
        assert_eq!(service.is_probabilistic(), Some(true));

        // ap_hi = 120 -> z = 0 -> p = 0.5 -> class 1, MODERATE.
        let input = PatientInput::default();
        let assessment = service.assess(&input).expect("Should assess");

        assert_eq!(assessment.prediction.predicted_class, 1);
        assert_eq!(assessment.prediction.probability_percent, Some(50.0));
        assert_eq!(assessment.risk_tier, Some(RiskTier::Moderate));
        assert!(!assessment.recommendations.is_empty());
    }

    #[test]
    fn test_low_risk_assessment() {
        let service = probabilistic_service();
        let input = PatientInput {
            ap_hi: 90.0,
            ap_lo: 60.0,
            ..Default::default()
        };

        // z = -3 -> p ~ 0.047 -> class 0, LOW.
        let assessment = service.assess(&input).expect("Should assess");
        assert_eq!(assessment.prediction.predicted_class, 0);
        assert_eq!(assessment.risk_tier, Some(RiskTier::Low));
        let pct = assessment.prediction.probability_percent.expect("present");
        assert!((0.0..30.0).contains(&pct));
    }

    #[test]
    fn test_margin_model_yields_no_probability_or_tier() {
        let service = margin_service();
        assert_eq!(service.is_probabilistic(), Some(false));

        let input = PatientInput {
            ap_hi: 150.0,
            ..Default::default()
        };
        let assessment = service.assess(&input).expect("Should assess");

        assert_eq!(assessment.prediction.predicted_class, 1);
        assert!(assessment.prediction.probability_percent.is_none());
        assert!(assessment.risk_tier.is_none());
        // Input-derived advice is still produced.
        assert!(!assessment.recommendations.is_empty());
    }

    #[test]
    fn test_invalid_input_is_rejected_before_inference() {
        let service = probabilistic_service();
        let input = PatientInput {
            ap_hi: 80.0,
            ap_lo: 120.0,
            ..Default::default()
        };

        let err = service.assess(&input).expect_err("Should reject");
        assert!(matches!(err, CardioscopeError::Validation(_)));
    }

    #[test]
    fn test_empty_probability_output_is_an_error_not_a_panic() {
        use crate::ports::{Classifier, InferenceError, ProbabilisticClassifier};

        struct EmptyProba;

        impl Classifier for EmptyProba {
            fn predict(&self, _features: &[f64]) -> std::result::Result<u8, InferenceError> {
                Ok(0)
            }
        }

        impl ProbabilisticClassifier for EmptyProba {
            fn predict_proba(&self, _features: &[f64]) -> std::result::Result<Vec<f64>, InferenceError> {
                Ok(Vec::new())
            }
        }

        let service = InferenceService::from_parts(
            ModelHandle::Probabilistic(Box::new(EmptyProba)),
            Box::new(StandardScaler::identity()),
        );

        let err = service
            .assess(&PatientInput::default())
            .expect_err("Should reject");
        assert!(matches!(
            err,
            CardioscopeError::Inference(InferenceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_probability_percent_rounded_to_one_decimal() {
        let service = probabilistic_service();
        let input = PatientInput {
            ap_hi: 130.0,
            ..Default::default()
        };

        // z = 1 -> p = 0.731058... -> 73.1%.
        let assessment = service.assess(&input).expect("Should assess");
        assert_eq!(assessment.prediction.probability_percent, Some(73.1));
        assert_eq!(assessment.risk_tier, Some(RiskTier::High));
    }
}
