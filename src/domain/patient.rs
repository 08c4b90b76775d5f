//! Patient input types for cardiovascular risk prediction.
//!
//! The serving schema matches the columns the scaler and classifier were
//! fitted on: 11 raw attributes plus two derived features (BMI and pulse
//! pressure).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of columns in the serving schema.
pub const FEATURE_COUNT: usize = 13;

/// Feature names in fitted column order.
///
/// The scaler and model were fitted on exactly this order. Reordering
/// silently corrupts predictions, so every artifact is aligned against this
/// list at load time.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
    "Age_Year",
    "bmi",
    "pulse_pressure",
];

/// Raw patient attributes for one inference request.
///
/// Immutable once constructed; nothing here is persisted across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    /// 0 = female, 1 = male
    pub gender: u8,

    /// Height in cm (> 0)
    pub height: f64,

    /// Weight in kg (> 0)
    pub weight: f64,

    /// Systolic blood pressure in mmHg
    pub ap_hi: f64,

    /// Diastolic blood pressure in mmHg, expected <= ap_hi
    pub ap_lo: f64,

    /// Cholesterol level: 1 = normal, 2 = above normal, 3 = well above normal
    pub cholesterol: u8,

    /// Glucose level: 1 = normal, 2 = above normal, 3 = well above normal
    pub gluc: u8,

    /// Smoking: 0 = no, 1 = yes
    pub smoke: u8,

    /// Alcohol intake: 0 = no, 1 = yes
    pub alco: u8,

    /// Physically active: 0 = no, 1 = yes
    pub active: u8,

    /// Age in years (> 0)
    pub age_year: f64,
}

impl Default for PatientInput {
    /// Defaults applied when a request field is absent.
    fn default() -> Self {
        Self {
            gender: 0,
            height: 170.0,
            weight: 70.0,
            ap_hi: 120.0,
            ap_lo: 80.0,
            cholesterol: 1,
            gluc: 1,
            smoke: 0,
            alco: 0,
            active: 1,
            age_year: 45.0,
        }
    }
}

/// Features computed from the raw attributes, never user-supplied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DerivedFeatures {
    /// Body-mass index: weight / (height/100)^2
    pub bmi: f64,

    /// Pulse pressure: ap_hi - ap_lo
    pub pulse_pressure: f64,
}

/// Fixed-order feature vector in the fitted column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl PatientInput {
    /// Build an input from form-encoded key-value pairs.
    ///
    /// Absent fields take the documented defaults. The age field is named
    /// `Age_Year` on the wire, matching the fitted column name.
    ///
    /// # Errors
    /// Returns an error naming the field when a supplied value does not parse.
    pub fn from_key_values(values: &HashMap<String, String>) -> Result<Self, String> {
        let defaults = Self::default();

        Ok(Self {
            gender: parse_or(values, "gender", defaults.gender)?,
            height: parse_or(values, "height", defaults.height)?,
            weight: parse_or(values, "weight", defaults.weight)?,
            ap_hi: parse_or(values, "ap_hi", defaults.ap_hi)?,
            ap_lo: parse_or(values, "ap_lo", defaults.ap_lo)?,
            cholesterol: parse_or(values, "cholesterol", defaults.cholesterol)?,
            gluc: parse_or(values, "gluc", defaults.gluc)?,
            smoke: parse_or(values, "smoke", defaults.smoke)?,
            alco: parse_or(values, "alco", defaults.alco)?,
            active: parse_or(values, "active", defaults.active)?,
            age_year: parse_or(values, "Age_Year", defaults.age_year)?,
        })
    }

    /// Compute the derived features.
    ///
    /// Total: height = 0 yields an infinite BMI, which surfaces later in the
    /// pipeline as a numeric-error condition rather than a panic here.
    #[must_use]
    pub fn derived(&self) -> DerivedFeatures {
        let h_m = self.height / 100.0;
        DerivedFeatures {
            bmi: self.weight / (h_m * h_m),
            pulse_pressure: self.ap_hi - self.ap_lo,
        }
    }

    /// Assemble the fixed-order feature vector.
    ///
    /// No range clamping or rejection happens here; out-of-domain values are
    /// propagated to scaling and prediction.
    #[must_use]
    pub fn feature_vector(&self) -> FeatureVector {
        let derived = self.derived();
        FeatureVector([
            f64::from(self.gender),
            self.height,
            self.weight,
            self.ap_hi,
            self.ap_lo,
            f64::from(self.cholesterol),
            f64::from(self.gluc),
            f64::from(self.smoke),
            f64::from(self.alco),
            f64::from(self.active),
            self.age_year,
            derived.bmi,
            derived.pulse_pressure,
        ])
    }

    /// Validate that all attributes are within their documented domains.
    ///
    /// One policy for both front-ends: diastolic above systolic is rejected
    /// here, before any inference runs.
    ///
    /// # Errors
    /// Returns all violations as a vector of messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.gender > 1 {
            errors.push(format!("gender {} must be 0 or 1", self.gender));
        }
        if self.height <= 0.0 {
            errors.push(format!("height {} must be positive", self.height));
        }
        if self.weight <= 0.0 {
            errors.push(format!("weight {} must be positive", self.weight));
        }
        if self.ap_lo > self.ap_hi {
            errors.push(format!(
                "diastolic BP {} must not exceed systolic BP {}",
                self.ap_lo, self.ap_hi
            ));
        }
        if !(1..=3).contains(&self.cholesterol) {
            errors.push(format!(
                "cholesterol {} must be 1, 2 or 3",
                self.cholesterol
            ));
        }
        if !(1..=3).contains(&self.gluc) {
            errors.push(format!("gluc {} must be 1, 2 or 3", self.gluc));
        }
        if self.smoke > 1 {
            errors.push(format!("smoke {} must be 0 or 1", self.smoke));
        }
        if self.alco > 1 {
            errors.push(format!("alco {} must be 0 or 1", self.alco));
        }
        if self.active > 1 {
            errors.push(format!("active {} must be 0 or 1", self.active));
        }
        if self.age_year <= 0.0 {
            errors.push(format!("Age_Year {} must be positive", self.age_year));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    values: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, String> {
    match values.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{key}: invalid value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_feature_vector_order_and_length() {
        let input = PatientInput {
            gender: 1,
            height: 168.0,
            weight: 62.0,
            ap_hi: 110.0,
            ap_lo: 80.0,
            cholesterol: 1,
            gluc: 1,
            smoke: 0,
            alco: 0,
            active: 1,
            age_year: 50.0,
        };

        let vector = input.feature_vector();
        assert_eq!(vector.len(), FEATURE_COUNT);

        let v = vector.as_slice();
        assert!((v[0] - 1.0).abs() < f64::EPSILON); // gender
        assert!((v[1] - 168.0).abs() < f64::EPSILON); // height
        assert!((v[2] - 62.0).abs() < f64::EPSILON); // weight
        assert!((v[3] - 110.0).abs() < f64::EPSILON); // ap_hi
        assert!((v[4] - 80.0).abs() < f64::EPSILON); // ap_lo
        assert!((v[10] - 50.0).abs() < f64::EPSILON); // Age_Year
        assert!((v[12] - 30.0).abs() < f64::EPSILON); // pulse_pressure
    }

    #[test]
    fn test_bmi_formula() {
        let input = PatientInput {
            height: 170.0,
            weight: 70.0,
            ..Default::default()
        };

        let derived = input.derived();
        assert!((derived.bmi - 70.0 / 1.7f64.powi(2)).abs() < 1e-9);
        assert!((derived.bmi - 24.22).abs() < 0.01);
    }

    #[test]
    fn test_pulse_pressure() {
        let input = PatientInput {
            ap_hi: 120.0,
            ap_lo: 80.0,
            ..Default::default()
        };
        assert!((input.derived().pulse_pressure - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_defaults_applied_when_absent() {
        let input = PatientInput::from_key_values(&HashMap::new()).expect("Should build");
        assert_eq!(input.gender, 0);
        assert!((input.height - 170.0).abs() < f64::EPSILON);
        assert!((input.weight - 70.0).abs() < f64::EPSILON);
        assert!((input.ap_hi - 120.0).abs() < f64::EPSILON);
        assert!((input.ap_lo - 80.0).abs() < f64::EPSILON);
        assert_eq!(input.cholesterol, 1);
        assert_eq!(input.active, 1);
        assert!((input.age_year - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_age_field_uses_fitted_column_name() {
        let input =
            PatientInput::from_key_values(&kv(&[("Age_Year", "61.5")])).expect("Should build");
        assert!((input.age_year - 61.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unparseable_field_is_rejected() {
        let err = PatientInput::from_key_values(&kv(&[("height", "tall")]))
            .expect_err("Should reject");
        assert!(err.contains("height"));
    }

    #[test]
    fn test_validate_rejects_reversed_blood_pressure() {
        let input = PatientInput {
            ap_hi: 110.0,
            ap_lo: 130.0,
            ..Default::default()
        };
        let errors = input.validate().expect_err("Should reject");
        assert!(errors.iter().any(|e| e.contains("diastolic")));
    }

    #[test]
    fn test_validate_allows_equal_blood_pressure() {
        let input = PatientInput {
            ap_hi: 100.0,
            ap_lo: 100.0,
            ..Default::default()
        };
        assert!(input.validate().is_ok());
        assert!((input.derived().pulse_pressure).abs() < f64::EPSILON);
    }

    #[test]
    fn test_assembly_is_total_for_out_of_domain_values() {
        // Assembly never rejects; reversed BP and zero height still produce
        // a 13-column vector. Degenerate values surface downstream.
        let input = PatientInput {
            height: 0.0,
            ap_hi: 80.0,
            ap_lo: 120.0,
            ..Default::default()
        };
        let vector = input.feature_vector();
        assert_eq!(vector.len(), FEATURE_COUNT);
        assert!(vector.as_slice()[11].is_infinite()); // bmi
        assert!((vector.as_slice()[12] + 40.0).abs() < f64::EPSILON); // pulse_pressure
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let input = PatientInput {
            gender: 2,
            cholesterol: 5,
            age_year: -1.0,
            ..Default::default()
        };
        let errors = input.validate().expect_err("Should reject");
        assert_eq!(errors.len(), 3);
    }
}
