//! Assessment result types.
//!
//! Represents the output of one run of the inference request pipeline.

use serde::{Deserialize, Serialize};

/// Risk tier derived from the predicted probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    /// p < 0.30
    Low,
    /// 0.30 <= p < 0.60
    Moderate,
    /// p >= 0.60
    High,
}

impl RiskTier {
    /// Classify a probability on the 0-1 scale.
    ///
    /// Total for all p in [0, 1]; values outside the range are a caller
    /// contract violation and simply fall into the nearest tier.
    #[must_use]
    pub fn from_probability(p: f64) -> Self {
        if p < 0.30 {
            Self::Low
        } else if p < 0.60 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - No significant indicators",
            Self::Moderate => "Moderate risk - Follow-up recommended",
            Self::High => "High risk - Medical consultation advised",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Severity of a single recommendation, used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Good,
    Info,
    Caution,
    Alert,
}

/// One line of threshold-based advice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub text: String,
}

impl Recommendation {
    #[must_use]
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }
}

/// Raw model output shaped for the response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Prediction {
    /// Binary class label: 0 = no disease, 1 = disease present
    pub predicted_class: u8,

    /// Positive-class probability as a percentage in [0, 100], rounded to
    /// one decimal place. Absent when the model has no probability
    /// capability.
    pub probability_percent: Option<f64>,
}

impl Prediction {
    /// Shape a prediction from the class label and the optional raw
    /// positive-class probability (0-1 scale).
    #[must_use]
    pub fn new(predicted_class: u8, positive_probability: Option<f64>) -> Self {
        Self {
            predicted_class,
            probability_percent: positive_probability.map(|p| (p * 1000.0).round() / 10.0),
        }
    }

    /// Probability back on the 0-1 scale, for gauges.
    #[must_use]
    pub fn probability(&self) -> Option<f64> {
        self.probability_percent.map(|pct| pct / 100.0)
    }
}

/// Complete assessment record for one request. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique identifier
    pub id: String,

    /// The shaped model output
    pub prediction: Prediction,

    /// Risk classification; absent when the model emits no probability
    pub risk_tier: Option<RiskTier>,

    /// Threshold-based advice derived from the inputs and the tier
    pub recommendations: Vec<Recommendation>,

    /// Timestamp of the assessment
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Assessment {
    #[must_use]
    pub fn new(
        prediction: Prediction,
        risk_tier: Option<RiskTier>,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        Self {
            id: uuid_v4(),
            prediction,
            risk_tier,
            recommendations,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Generate a UUID v4 (random) using a CSPRNG.
///
/// Uses ChaCha20Rng seeded from OS entropy so assessment identifiers are not
/// predictable.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
