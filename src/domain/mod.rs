//! Domain layer: Core business types and logic.
//!
//! Pure computation only: input coercion, clinical categorization, feature
//! assembly, risk bucketing and the message catalog. No I/O beyond reading an
//! optional catalog file.

pub mod catalog;
pub mod categories;
mod features;
mod patient;
mod risk;

pub use catalog::{CatalogError, MessageCatalog, MessageKey};
pub use categories::{
    blood_pressure_category, bmi_category, cholesterol_bin, glucose_category,
    BloodPressureCategory, BmiCategory, CholesterolCategory, GlucoseCategory,
};
pub use features::{CategoryCodes, DerivedFeatures, FEATURE_COUNT, FEATURE_NAMES};
pub use patient::{derive_bmi, fill_missing_bmi, Gender, InputError, PatientInput};
pub use risk::{Prediction, PredictionResponse, Recommendations, RiskCategory};
