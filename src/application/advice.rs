//! Threshold-based advice for an assessment.
//!
//! Static, deterministic text keyed off the raw inputs, the derived
//! features, and the risk tier. Educational only; every front-end displays
//! the accompanying disclaimer.

use crate::domain::{PatientInput, Recommendation, RiskTier, Severity};

/// Build the full recommendation list for one assessment.
///
/// The tier summary is skipped when the model emitted no probability; the
/// input-derived advice does not depend on the model at all.
#[must_use]
pub fn recommendations(input: &PatientInput, tier: Option<RiskTier>) -> Vec<Recommendation> {
    let derived = input.derived();
    let mut out = Vec::new();

    if let Some(tier) = tier {
        out.push(tier_summary(tier));
    }
    out.push(bmi_advice(derived.bmi));
    out.push(blood_pressure_advice(input.ap_hi, input.ap_lo));
    out.push(pulse_pressure_advice(derived.pulse_pressure));
    out.push(cholesterol_advice(input.cholesterol));
    out.push(glucose_advice(input.gluc));
    out.extend(lifestyle_advice(input));

    out
}

fn tier_summary(tier: RiskTier) -> Recommendation {
    match tier {
        RiskTier::Low => Recommendation::new(
            Severity::Good,
            "Your risk is low. Continue maintaining a healthy lifestyle.",
        ),
        RiskTier::Moderate => Recommendation::new(
            Severity::Caution,
            "Your risk is moderate. Consider lifestyle improvements and regular check-ups.",
        ),
        RiskTier::High => Recommendation::new(
            Severity::Alert,
            "Your risk is high. Medical consultation is strongly recommended.",
        ),
    }
}

fn bmi_advice(bmi: f64) -> Recommendation {
    if bmi < 18.5 {
        Recommendation::new(
            Severity::Info,
            "Your BMI is low. A balanced calorie-rich diet may be helpful.",
        )
    } else if bmi <= 24.9 {
        Recommendation::new(Severity::Good, "Your BMI is in the healthy range.")
    } else if bmi <= 29.9 {
        Recommendation::new(
            Severity::Caution,
            "Your BMI indicates overweight. Weight reduction may reduce heart risk.",
        )
    } else {
        Recommendation::new(
            Severity::Alert,
            "Your BMI indicates obesity. Weight management is highly recommended.",
        )
    }
}

fn blood_pressure_advice(ap_hi: f64, ap_lo: f64) -> Recommendation {
    if ap_hi >= 140.0 || ap_lo >= 90.0 {
        Recommendation::new(
            Severity::Alert,
            "Your blood pressure is in the hypertension range. Medical advice is recommended.",
        )
    } else if ap_hi >= 130.0 || ap_lo >= 85.0 {
        Recommendation::new(
            Severity::Caution,
            "Your blood pressure is slightly elevated. Monitor regularly.",
        )
    } else {
        Recommendation::new(
            Severity::Good,
            "Your blood pressure is within the normal range.",
        )
    }
}

fn pulse_pressure_advice(pulse_pressure: f64) -> Recommendation {
    if pulse_pressure > 60.0 {
        Recommendation::new(
            Severity::Caution,
            "Pulse pressure is elevated, which may indicate arterial stiffness.",
        )
    } else if pulse_pressure < 30.0 {
        Recommendation::new(
            Severity::Caution,
            "Pulse pressure is low. Discuss with your physician if persistent.",
        )
    } else {
        Recommendation::new(Severity::Good, "Pulse pressure is in a normal range.")
    }
}

fn cholesterol_advice(level: u8) -> Recommendation {
    match level {
        3 => Recommendation::new(
            Severity::Alert,
            "Cholesterol is significantly above normal. Consult a doctor.",
        ),
        2 => Recommendation::new(
            Severity::Caution,
            "Cholesterol is slightly elevated. Dietary changes advised.",
        ),
        _ => Recommendation::new(Severity::Good, "Cholesterol level is normal."),
    }
}

fn glucose_advice(level: u8) -> Recommendation {
    match level {
        3 => Recommendation::new(
            Severity::Alert,
            "Glucose is high. Screening for diabetes is suggested.",
        ),
        2 => Recommendation::new(
            Severity::Caution,
            "Glucose is slightly high. Reduce sugar intake and monitor.",
        ),
        _ => Recommendation::new(Severity::Good, "Glucose level is normal."),
    }
}

fn lifestyle_advice(input: &PatientInput) -> Vec<Recommendation> {
    let mut out = Vec::new();
    if input.smoke == 1 {
        out.push(Recommendation::new(
            Severity::Alert,
            "Smoking increases heart risk. Quitting is strongly recommended.",
        ));
    }
    if input.alco == 1 {
        out.push(Recommendation::new(
            Severity::Caution,
            "Limit alcohol to reduce heart and liver risk.",
        ));
    }
    if input.active == 0 {
        out.push(Recommendation::new(
            Severity::Caution,
            "Increase daily physical activity for cardiovascular benefit.",
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_buckets() {
        assert_eq!(bmi_advice(17.0).severity, Severity::Info);
        assert_eq!(bmi_advice(22.0).severity, Severity::Good);
        assert_eq!(bmi_advice(27.5).severity, Severity::Caution);
        assert_eq!(bmi_advice(31.0).severity, Severity::Alert);
    }

    #[test]
    fn test_blood_pressure_buckets() {
        assert_eq!(blood_pressure_advice(118.0, 78.0).severity, Severity::Good);
        assert_eq!(
            blood_pressure_advice(132.0, 78.0).severity,
            Severity::Caution
        );
        assert_eq!(blood_pressure_advice(118.0, 86.0).severity, Severity::Caution);
        assert_eq!(blood_pressure_advice(145.0, 80.0).severity, Severity::Alert);
        assert_eq!(blood_pressure_advice(120.0, 95.0).severity, Severity::Alert);
    }

    #[test]
    fn test_pulse_pressure_buckets() {
        assert_eq!(pulse_pressure_advice(40.0).severity, Severity::Good);
        assert_eq!(pulse_pressure_advice(65.0).severity, Severity::Caution);
        assert_eq!(pulse_pressure_advice(25.0).severity, Severity::Caution);
    }

    #[test]
    fn test_tier_summary_present_only_with_probability() {
        let input = PatientInput::default();
        let with_tier = recommendations(&input, Some(RiskTier::High));
        let without_tier = recommendations(&input, None);
        assert_eq!(with_tier.len(), without_tier.len() + 1);
        assert_eq!(with_tier[0].severity, Severity::Alert);
    }

    #[test]
    fn test_lifestyle_flags() {
        let input = PatientInput {
            smoke: 1,
            alco: 1,
            active: 0,
            ..Default::default()
        };
        let advice = lifestyle_advice(&input);
        assert_eq!(advice.len(), 3);

        let healthy = PatientInput::default();
        assert!(lifestyle_advice(&healthy).is_empty());
    }
}
