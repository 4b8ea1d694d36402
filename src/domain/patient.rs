//! Patient measurements for cardiovascular risk prediction.
//!
//! Requests arrive as loosely typed JSON (numbers may be strings, flags may be
//! any JSON value). [`PatientInput::from_json`] applies the coercion rules the
//! model was trained with and fails on the first field it cannot convert.

use serde::Serialize;
use serde_json::{Map, Value};

/// Error raised when a request payload cannot be turned into a [`PatientInput`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Payload must be a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} is not a valid {expected}: {found}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("Cholesterol {0} mg/dL is outside the binning range (0, inf)")]
    CholesterolOutOfRange(f64),
}

/// Sex as encoded by the training data: only `"male"` maps to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Other,
}

impl Gender {
    /// Numeric encoding used in the feature vector.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Male => 1,
            Self::Other => 0,
        }
    }
}

/// Coerced patient measurements.
///
/// All fields are required. Units follow the training dataset:
/// centimetres, kilograms, mmHg and mg/dL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientInput {
    /// Age in whole years
    pub age_years: i64,

    pub gender: Gender,

    /// Height in cm
    pub height: f64,

    /// Weight in kg
    pub weight: f64,

    /// Systolic blood pressure (mmHg)
    pub ap_hi: i64,

    /// Diastolic blood pressure (mmHg)
    pub ap_lo: i64,

    /// Total cholesterol in mg/dL, before binning
    pub cholesterol: f64,

    /// Fasting glucose in mg/dL, before categorization
    pub gluc: f64,

    pub smoke: bool,
    pub alco: bool,
    pub active: bool,

    /// Pre-computed body-mass index (wire name `Bmi`)
    #[serde(rename = "Bmi")]
    pub bmi: f64,
}

impl PatientInput {
    /// Coerce a JSON payload into typed measurements.
    ///
    /// # Errors
    /// Returns `InputError` naming the first missing or unconvertible field.
    pub fn from_json(payload: &Value) -> Result<Self, InputError> {
        let obj = payload.as_object().ok_or(InputError::NotAnObject)?;

        Ok(Self {
            age_years: coerce_int(obj, "age_years")?,
            gender: coerce_gender(obj, "gender")?,
            height: coerce_float(obj, "height")?,
            weight: coerce_float(obj, "weight")?,
            ap_hi: coerce_int(obj, "ap_hi")?,
            ap_lo: coerce_int(obj, "ap_lo")?,
            cholesterol: coerce_float(obj, "cholesterol")?,
            gluc: coerce_float(obj, "gluc")?,
            smoke: coerce_flag(obj, "smoke")?,
            alco: coerce_flag(obj, "alco")?,
            active: coerce_flag(obj, "active")?,
            bmi: coerce_float(obj, "Bmi")?,
        })
    }
}

/// Body-mass index from height (cm) and weight (kg), rounded to two decimals.
#[must_use]
pub fn derive_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    (bmi * 100.0).round() / 100.0
}

/// Fill in `Bmi` from `height` and `weight` when the payload omits it.
///
/// Leaves the payload untouched when `Bmi` is already present, or when height
/// and weight are themselves unusable (the pipeline then reports the real
/// problem). Returns `true` if a value was inserted.
pub fn fill_missing_bmi(payload: &mut Value) -> bool {
    let Some(obj) = payload.as_object_mut() else {
        return false;
    };
    if obj.contains_key("Bmi") {
        return false;
    }

    let (Ok(height), Ok(weight)) = (coerce_float(obj, "height"), coerce_float(obj, "weight")) else {
        return false;
    };
    if height <= 0.0 {
        return false;
    }

    let bmi = derive_bmi(height, weight);
    match serde_json::Number::from_f64(bmi) {
        Some(n) => {
            obj.insert("Bmi".to_string(), Value::Number(n));
            true
        }
        None => false,
    }
}

fn field<'a>(obj: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, InputError> {
    obj.get(name).ok_or(InputError::MissingField(name))
}

fn invalid(field: &'static str, expected: &'static str, found: &Value) -> InputError {
    InputError::InvalidField {
        field,
        expected,
        found: found.to_string(),
    }
}

fn coerce_int(obj: &Map<String, Value>, name: &'static str) -> Result<i64, InputError> {
    let value = field(obj, name)?;
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                // Truncation toward zero, as int(50.7) == 50.
                Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.trunc() as i64),
                _ => Err(invalid(name, "integer", value)),
            }
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(name, "integer", value)),
        _ => Err(invalid(name, "integer", value)),
    }
}

fn coerce_float(obj: &Map<String, Value>, name: &'static str) -> Result<f64, InputError> {
    let value = field(obj, name)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(invalid(name, "number", value)),
    }
}

fn coerce_flag(obj: &Map<String, Value>, name: &'static str) -> Result<bool, InputError> {
    let value = field(obj, name)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

fn coerce_gender(obj: &Map<String, Value>, name: &'static str) -> Result<Gender, InputError> {
    let value = field(obj, name)?;
    Ok(match value.as_str() {
        Some("male") => Gender::Male,
        _ => Gender::Other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "age_years": 50,
            "gender": "male",
            "height": 170,
            "weight": 70,
            "ap_hi": 130,
            "ap_lo": 85,
            "cholesterol": 210,
            "gluc": 95,
            "smoke": false,
            "alco": false,
            "active": true,
            "Bmi": 24.2
        })
    }

    #[test]
    fn test_from_json_valid() {
        let input = PatientInput::from_json(&sample()).expect("Should coerce");
        assert_eq!(input.age_years, 50);
        assert_eq!(input.gender, Gender::Male);
        assert_eq!(input.ap_hi, 130);
        assert_eq!(input.ap_lo, 85);
        assert!((input.height - 170.0).abs() < f64::EPSILON);
        assert!((input.bmi - 24.2).abs() < f64::EPSILON);
        assert!(!input.smoke);
        assert!(input.active);
    }

    #[test]
    fn test_missing_field() {
        let mut payload = sample();
        payload.as_object_mut().unwrap().remove("ap_lo");
        assert_eq!(
            PatientInput::from_json(&payload),
            Err(InputError::MissingField("ap_lo"))
        );
    }

    #[test]
    fn test_non_numeric_height() {
        let mut payload = sample();
        payload["height"] = json!("tall");
        let err = PatientInput::from_json(&payload).expect_err("must fail");
        assert!(matches!(err, InputError::InvalidField { field: "height", .. }));
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(
            PatientInput::from_json(&json!([1, 2, 3])),
            Err(InputError::NotAnObject)
        );
    }

    #[test]
    fn test_string_numbers_are_coerced() {
        let mut payload = sample();
        payload["age_years"] = json!(" 61 ");
        payload["height"] = json!("165.5");
        payload["ap_hi"] = json!("145");
        let input = PatientInput::from_json(&payload).expect("Should coerce");
        assert_eq!(input.age_years, 61);
        assert_eq!(input.ap_hi, 145);
        assert!((input.height - 165.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_integer_fields_truncate_floats_but_reject_decimal_strings() {
        let mut payload = sample();
        payload["ap_hi"] = json!(129.9);
        assert_eq!(PatientInput::from_json(&payload).unwrap().ap_hi, 129);

        payload["ap_hi"] = json!("129.9");
        assert!(PatientInput::from_json(&payload).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut payload = sample();
        payload["gluc"] = json!("nan");
        assert!(PatientInput::from_json(&payload).is_err());
        payload["gluc"] = json!("inf");
        assert!(PatientInput::from_json(&payload).is_err());
    }

    #[test]
    fn test_flag_truthiness() {
        let mut payload = sample();
        payload["smoke"] = json!(1);
        payload["alco"] = json!("false");
        payload["active"] = json!(null);
        let input = PatientInput::from_json(&payload).expect("Should coerce");
        assert!(input.smoke);
        assert!(input.alco, "non-empty strings are truthy");
        assert!(!input.active);
    }

    #[test]
    fn test_gender_only_exact_male() {
        let mut payload = sample();
        for other in [json!("female"), json!("Male"), json!(1), json!(null)] {
            payload["gender"] = other;
            assert_eq!(
                PatientInput::from_json(&payload).unwrap().gender,
                Gender::Other
            );
        }
    }

    #[test]
    fn test_derive_bmi_rounds_to_two_decimals() {
        assert!((derive_bmi(170.0, 70.0) - 24.22).abs() < 1e-9);
        assert!((derive_bmi(180.0, 90.0) - 27.78).abs() < 1e-9);
    }

    #[test]
    fn test_fill_missing_bmi() {
        let mut payload = sample();
        payload.as_object_mut().unwrap().remove("Bmi");
        assert!(fill_missing_bmi(&mut payload));
        assert_eq!(payload["Bmi"], json!(24.22));

        // Present values are never overwritten.
        let mut payload = sample();
        assert!(!fill_missing_bmi(&mut payload));
        assert_eq!(payload["Bmi"], json!(24.2));
    }

    #[test]
    fn test_fill_missing_bmi_skips_unusable_height() {
        let mut payload = sample();
        payload.as_object_mut().unwrap().remove("Bmi");
        payload["height"] = json!(0);
        assert!(!fill_missing_bmi(&mut payload));
        assert!(payload.get("Bmi").is_none());
    }
}
