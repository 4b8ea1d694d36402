//! Clinical categorizations used both as model features and as keys for
//! recommendation text.
//!
//! Each categorizer reproduces the binning the model was trained with. The
//! cholesterol and glucose schemes are deliberately different functions: the
//! cholesterol bins are right-inclusive cut-points, glucose uses its own
//! closed ranges with a catch-all "unknown" code.

use serde::Serialize;

/// Blood pressure classes (codes 0-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodPressureCategory {
    Normal,
    Elevated,
    Stage1,
    Stage2,
    /// Hypertensive crisis. Never produced by [`blood_pressure_category`]:
    /// stage 2 already claims every reading that would qualify.
    Crisis,
}

impl BloodPressureCategory {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Elevated => 1,
            Self::Stage1 => 2,
            Self::Stage2 => 3,
            Self::Crisis => 4,
        }
    }
}

/// Half-open band `[lo, hi)` over mmHg; `None` means unbounded.
#[derive(Debug, Clone, Copy)]
struct Band {
    lo: Option<i64>,
    hi: Option<i64>,
}

impl Band {
    const fn new(lo: Option<i64>, hi: Option<i64>) -> Self {
        Self { lo, hi }
    }

    fn contains(self, v: i64) -> bool {
        self.lo.map_or(true, |lo| v >= lo) && self.hi.map_or(true, |hi| v < hi)
    }
}

/// One cell of the blood pressure table.
struct BpCell {
    systolic: Band,
    diastolic: Band,
    category: BloodPressureCategory,
}

/// Disjoint systolic x diastolic rectangles covering the whole plane.
///
/// Equivalent to evaluating, in order: normal (<120 and <80), elevated
/// (120-129 and <80), stage 1 (130-139 or 80-89), stage 2 (>=140 or >=90),
/// crisis (>180 or >120). Because stage 2 precedes crisis, crisis has no cell.
const BP_TABLE: [BpCell; 8] = [
    BpCell {
        systolic: Band::new(None, Some(120)),
        diastolic: Band::new(None, Some(80)),
        category: BloodPressureCategory::Normal,
    },
    BpCell {
        systolic: Band::new(Some(120), Some(130)),
        diastolic: Band::new(None, Some(80)),
        category: BloodPressureCategory::Elevated,
    },
    BpCell {
        systolic: Band::new(Some(130), Some(140)),
        diastolic: Band::new(None, None),
        category: BloodPressureCategory::Stage1,
    },
    BpCell {
        systolic: Band::new(None, Some(130)),
        diastolic: Band::new(Some(80), Some(90)),
        category: BloodPressureCategory::Stage1,
    },
    BpCell {
        systolic: Band::new(Some(140), None),
        diastolic: Band::new(Some(80), Some(90)),
        category: BloodPressureCategory::Stage1,
    },
    BpCell {
        systolic: Band::new(None, Some(130)),
        diastolic: Band::new(Some(90), None),
        category: BloodPressureCategory::Stage2,
    },
    BpCell {
        systolic: Band::new(Some(140), None),
        diastolic: Band::new(None, Some(80)),
        category: BloodPressureCategory::Stage2,
    },
    BpCell {
        systolic: Band::new(Some(140), None),
        diastolic: Band::new(Some(90), None),
        category: BloodPressureCategory::Stage2,
    },
];

/// Classify a blood pressure reading.
///
/// Returns `None` when no cell matches. The table covers every integer
/// reading, but callers must still handle the absent case.
#[must_use]
pub fn blood_pressure_category(ap_hi: i64, ap_lo: i64) -> Option<BloodPressureCategory> {
    BP_TABLE
        .iter()
        .find(|cell| cell.systolic.contains(ap_hi) && cell.diastolic.contains(ap_lo))
        .map(|cell| cell.category)
}

/// BMI classes (codes 0-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    ObesityClass1,
    ObesityClass2,
    ObesityClass3,
}

impl BmiCategory {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Underweight => 0,
            Self::Normal => 1,
            Self::Overweight => 2,
            Self::ObesityClass1 => 3,
            Self::ObesityClass2 => 4,
            Self::ObesityClass3 => 5,
        }
    }
}

#[must_use]
pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else if bmi < 35.0 {
        BmiCategory::ObesityClass1
    } else if bmi < 40.0 {
        BmiCategory::ObesityClass2
    } else {
        BmiCategory::ObesityClass3
    }
}

/// Cholesterol bins (codes 0-2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CholesterolCategory {
    Desirable,
    BorderlineHigh,
    High,
}

impl CholesterolCategory {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Desirable => 0,
            Self::BorderlineHigh => 1,
            Self::High => 2,
        }
    }
}

/// Bin total cholesterol with the cut-points `(0, 200] (200, 240] (240, inf)`.
///
/// Right edges are inclusive. Values at or below zero (and NaN) fall outside
/// every bin and yield `None`.
#[must_use]
pub fn cholesterol_bin(mg_dl: f64) -> Option<CholesterolCategory> {
    if mg_dl > 0.0 && mg_dl <= 200.0 {
        Some(CholesterolCategory::Desirable)
    } else if mg_dl > 200.0 && mg_dl <= 240.0 {
        Some(CholesterolCategory::BorderlineHigh)
    } else if mg_dl > 240.0 {
        Some(CholesterolCategory::High)
    } else {
        None
    }
}

/// Glucose classes (codes 0-3); `OutOfRange` is code 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseCategory {
    OutOfRange,
    Normal,
    Prediabetes,
    Diabetes,
}

impl GlucoseCategory {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::OutOfRange => 0,
            Self::Normal => 1,
            Self::Prediabetes => 2,
            Self::Diabetes => 3,
        }
    }
}

/// Categorize fasting glucose: `[70, 100]` normal, `(100, 125]` prediabetes,
/// `>= 126` diabetes, anything else (including the gap between 125 and 126)
/// out of range.
#[must_use]
pub fn glucose_category(mg_dl: f64) -> GlucoseCategory {
    if (70.0..=100.0).contains(&mg_dl) {
        GlucoseCategory::Normal
    } else if mg_dl > 100.0 && mg_dl <= 125.0 {
        GlucoseCategory::Prediabetes
    } else if mg_dl >= 126.0 {
        GlucoseCategory::Diabetes
    } else {
        GlucoseCategory::OutOfRange
    }
}
