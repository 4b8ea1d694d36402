//! Feature vector assembly.
//!
//! The scaler and model were fitted on 14 columns in a fixed order. Column
//! names are part of the artifact contract and are checked at load time.

use serde::Serialize;

use super::categories::{
    blood_pressure_category, bmi_category, cholesterol_bin, glucose_category,
    BloodPressureCategory, BmiCategory, CholesterolCategory, GlucoseCategory,
};
use super::patient::{InputError, PatientInput};

/// Number of model input columns.
pub const FEATURE_COUNT: usize = 14;

/// Column names in model order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age_years",
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
    "Bmi",
    "blood_pressure_category",
    "BMI_category",
];

/// Category codes derived from one patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCodes {
    /// `None` if the reading matched no blood pressure class
    pub blood_pressure: Option<BloodPressureCategory>,
    pub bmi: BmiCategory,
    pub cholesterol: CholesterolCategory,
    pub glucose: GlucoseCategory,
}

impl CategoryCodes {
    /// Derive all four categories from coerced measurements.
    ///
    /// # Errors
    /// Returns `InputError::CholesterolOutOfRange` when cholesterol falls
    /// outside every bin.
    pub fn derive(input: &PatientInput) -> Result<Self, InputError> {
        let cholesterol = cholesterol_bin(input.cholesterol)
            .ok_or(InputError::CholesterolOutOfRange(input.cholesterol))?;

        Ok(Self {
            blood_pressure: blood_pressure_category(input.ap_hi, input.ap_lo),
            bmi: bmi_category(input.bmi),
            cholesterol,
            glucose: glucose_category(input.gluc),
        })
    }
}

/// Unscaled model input plus the categories that produced it.
///
/// Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFeatures {
    pub categories: CategoryCodes,
    values: [f64; FEATURE_COUNT],
}

impl DerivedFeatures {
    /// Run the categorizers and assemble the 14-column vector.
    ///
    /// A missing blood pressure category is encoded as NaN.
    ///
    /// # Errors
    /// Propagates category derivation failures.
    pub fn derive(input: &PatientInput) -> Result<Self, InputError> {
        let categories = CategoryCodes::derive(input)?;

        let values = [
            input.age_years as f64,
            f64::from(input.gender.code()),
            input.height,
            input.weight,
            input.ap_hi as f64,
            input.ap_lo as f64,
            f64::from(categories.cholesterol.code()),
            f64::from(categories.glucose.code()),
            flag(input.smoke),
            flag(input.alco),
            flag(input.active),
            input.bmi,
            categories
                .blood_pressure
                .map_or(f64::NAN, |c| f64::from(c.code())),
            f64::from(categories.bmi.code()),
        ];

        Ok(Self { categories, values })
    }

    /// Values in model column order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Look up a column by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;

    fn patient() -> PatientInput {
        PatientInput {
            age_years: 50,
            gender: Gender::Male,
            height: 170.0,
            weight: 70.0,
            ap_hi: 130,
            ap_lo: 85,
            cholesterol: 210.0,
            gluc: 95.0,
            smoke: false,
            alco: false,
            active: true,
            bmi: 24.2,
        }
    }

    #[test]
    fn test_reference_patient_categories() {
        let derived = DerivedFeatures::derive(&patient()).expect("Should derive");
        assert_eq!(
            derived.categories.blood_pressure,
            Some(BloodPressureCategory::Stage1)
        );
        assert_eq!(derived.categories.cholesterol.code(), 1);
        assert_eq!(derived.categories.glucose.code(), 1);
        assert_eq!(derived.categories.bmi, BmiCategory::Normal);
    }

    #[test]
    fn test_vector_order() {
        let derived = DerivedFeatures::derive(&patient()).expect("Should derive");
        assert_eq!(
            derived.as_slice(),
            &[50.0, 1.0, 170.0, 70.0, 130.0, 85.0, 1.0, 1.0, 0.0, 0.0, 1.0, 24.2, 2.0, 1.0]
        );
        assert_eq!(derived.get("blood_pressure_category"), Some(2.0));
        assert_eq!(derived.get("Bmi"), Some(24.2));
        assert_eq!(derived.get("unknown"), None);
    }

    #[test]
    fn test_cholesterol_out_of_range_fails() {
        let mut p = patient();
        p.cholesterol = 0.0;
        assert_eq!(
            DerivedFeatures::derive(&p),
            Err(InputError::CholesterolOutOfRange(0.0))
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = DerivedFeatures::derive(&patient()).expect("Should derive");
        let b = DerivedFeatures::derive(&patient()).expect("Should derive");
        assert_eq!(a, b);
    }
}
