//! Message catalog for recommendation text and risk labels.
//!
//! Control flow only ever deals in [`MessageKey`]s. The texts are data: the
//! built-in catalog carries the Portuguese (pt-BR) wording, and a JSON file
//! can replace any subset of it without touching code.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::categories::{
    BloodPressureCategory, BmiCategory, CholesterolCategory, GlucoseCategory,
};
use super::risk::RiskCategory;

/// Errors loading a catalog override.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read message catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid message catalog format: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Unknown message key: {0}")]
    UnknownKey(String),
}

/// Identifier of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKey {
    BpNormal,
    BpElevated,
    BpStage1,
    BpStage2,
    BpCrisis,
    BpUnknown,
    BmiUnderweight,
    BmiNormal,
    BmiOverweight,
    BmiObesity1,
    BmiObesity2,
    BmiObesity3,
    BmiUnknown,
    CholesterolDesirable,
    CholesterolBorderlineHigh,
    CholesterolHigh,
    CholesterolUnknown,
    GlucoseNormal,
    GlucosePrediabetes,
    GlucoseDiabetes,
    GlucoseUnknown,
    RiskVeryLow,
    RiskLow,
    RiskModerate,
    RiskHigh,
    RiskVeryHigh,
}

impl MessageKey {
    pub const ALL: [MessageKey; 26] = [
        Self::BpNormal,
        Self::BpElevated,
        Self::BpStage1,
        Self::BpStage2,
        Self::BpCrisis,
        Self::BpUnknown,
        Self::BmiUnderweight,
        Self::BmiNormal,
        Self::BmiOverweight,
        Self::BmiObesity1,
        Self::BmiObesity2,
        Self::BmiObesity3,
        Self::BmiUnknown,
        Self::CholesterolDesirable,
        Self::CholesterolBorderlineHigh,
        Self::CholesterolHigh,
        Self::CholesterolUnknown,
        Self::GlucoseNormal,
        Self::GlucosePrediabetes,
        Self::GlucoseDiabetes,
        Self::GlucoseUnknown,
        Self::RiskVeryLow,
        Self::RiskLow,
        Self::RiskModerate,
        Self::RiskHigh,
        Self::RiskVeryHigh,
    ];

    /// Stable identifier used in catalog files.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::BpNormal => "bp.normal",
            Self::BpElevated => "bp.elevated",
            Self::BpStage1 => "bp.stage_1",
            Self::BpStage2 => "bp.stage_2",
            Self::BpCrisis => "bp.crisis",
            Self::BpUnknown => "bp.unknown",
            Self::BmiUnderweight => "bmi.underweight",
            Self::BmiNormal => "bmi.normal",
            Self::BmiOverweight => "bmi.overweight",
            Self::BmiObesity1 => "bmi.obesity_1",
            Self::BmiObesity2 => "bmi.obesity_2",
            Self::BmiObesity3 => "bmi.obesity_3",
            Self::BmiUnknown => "bmi.unknown",
            Self::CholesterolDesirable => "cholesterol.desirable",
            Self::CholesterolBorderlineHigh => "cholesterol.borderline_high",
            Self::CholesterolHigh => "cholesterol.high",
            Self::CholesterolUnknown => "cholesterol.unknown",
            Self::GlucoseNormal => "glucose.normal",
            Self::GlucosePrediabetes => "glucose.prediabetes",
            Self::GlucoseDiabetes => "glucose.diabetes",
            Self::GlucoseUnknown => "glucose.unknown",
            Self::RiskVeryLow => "risk.very_low",
            Self::RiskLow => "risk.low",
            Self::RiskModerate => "risk.moderate",
            Self::RiskHigh => "risk.high",
            Self::RiskVeryHigh => "risk.very_high",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }
}

// Code -> key tables. Codes absent from a table resolve to its unknown key.
const BP_TABLE: [(u8, MessageKey); 5] = [
    (0, MessageKey::BpNormal),
    (1, MessageKey::BpElevated),
    (2, MessageKey::BpStage1),
    (3, MessageKey::BpStage2),
    (4, MessageKey::BpCrisis),
];

const BMI_TABLE: [(u8, MessageKey); 6] = [
    (0, MessageKey::BmiUnderweight),
    (1, MessageKey::BmiNormal),
    (2, MessageKey::BmiOverweight),
    (3, MessageKey::BmiObesity1),
    (4, MessageKey::BmiObesity2),
    (5, MessageKey::BmiObesity3),
];

const CHOLESTEROL_TABLE: [(u8, MessageKey); 3] = [
    (0, MessageKey::CholesterolDesirable),
    (1, MessageKey::CholesterolBorderlineHigh),
    (2, MessageKey::CholesterolHigh),
];

// Glucose code 0 means "out of range" and has no entry.
const GLUCOSE_TABLE: [(u8, MessageKey); 3] = [
    (1, MessageKey::GlucoseNormal),
    (2, MessageKey::GlucosePrediabetes),
    (3, MessageKey::GlucoseDiabetes),
];

fn lookup(table: &[(u8, MessageKey)], code: Option<u8>, unknown: MessageKey) -> MessageKey {
    code.and_then(|c| table.iter().find(|(k, _)| *k == c).map(|(_, key)| *key))
        .unwrap_or(unknown)
}

#[must_use]
pub fn bp_message_key(code: Option<u8>) -> MessageKey {
    lookup(&BP_TABLE, code, MessageKey::BpUnknown)
}

#[must_use]
pub fn bmi_message_key(code: Option<u8>) -> MessageKey {
    lookup(&BMI_TABLE, code, MessageKey::BmiUnknown)
}

#[must_use]
pub fn cholesterol_message_key(code: Option<u8>) -> MessageKey {
    lookup(&CHOLESTEROL_TABLE, code, MessageKey::CholesterolUnknown)
}

#[must_use]
pub fn glucose_message_key(code: Option<u8>) -> MessageKey {
    lookup(&GLUCOSE_TABLE, code, MessageKey::GlucoseUnknown)
}

#[must_use]
pub fn risk_message_key(risk: RiskCategory) -> MessageKey {
    match risk {
        RiskCategory::VeryLow => MessageKey::RiskVeryLow,
        RiskCategory::Low => MessageKey::RiskLow,
        RiskCategory::Moderate => MessageKey::RiskModerate,
        RiskCategory::High => MessageKey::RiskHigh,
        RiskCategory::VeryHigh => MessageKey::RiskVeryHigh,
    }
}

fn portuguese_text(key: MessageKey) -> &'static str {
    match key {
        MessageKey::BpNormal => "Sua pressão arterial está normal. Continue com um estilo de vida saudável.",
        MessageKey::BpElevated => "Você está com pré-hipertensão. Considere mudanças no estilo de vida para reduzir a pressão arterial.",
        MessageKey::BpStage1 => "Você está com hipertensão de estágio 1. Consulte um médico para orientação e possíveis medicamentos.",
        MessageKey::BpStage2 => "Você está com hipertensão de estágio 2. É crucial procurar atendimento médico imediatamente.",
        MessageKey::BpCrisis => "Você está com crise hipertensiva. Procure atendimento médico de emergência.",
        MessageKey::BpUnknown => "Categoria de pressão arterial desconhecida.",
        MessageKey::BmiUnderweight => "Você está abaixo do peso. Consulte um nutricionista para orientação.",
        MessageKey::BmiNormal => "Seu peso está normal. Continue mantendo um estilo de vida saudável.",
        MessageKey::BmiOverweight => "Você está com sobrepeso. Considere mudanças na dieta e aumento da atividade física.",
        MessageKey::BmiObesity1 => "Você está com obesidade classe 1. É recomendável procurar orientação médica.",
        MessageKey::BmiObesity2 => "Você está com obesidade classe 2. Procure um médico para um plano de emagrecimento seguro.",
        MessageKey::BmiObesity3 => "Você está com obesidade extrema. Procure atendimento médico especializado.",
        MessageKey::BmiUnknown => "Categoria de IMC desconhecida.",
        MessageKey::CholesterolDesirable => "Seu nível de colesterol está desejável. Mantenha uma dieta equilibrada, com alimentos ricos em fibras e gorduras saudáveis, e pratique exercícios regularmente.",
        MessageKey::CholesterolBorderlineHigh => "Seu nível de colesterol é limítrofe alto. Reduza o consumo de gorduras saturadas e trans, e aumente a ingestão de fibras e alimentos saudáveis. Monitorar os níveis de colesterol é importante.",
        MessageKey::CholesterolHigh => "Seu nível de colesterol é alto. Reduza drasticamente o consumo de gorduras saturadas e trans, e consulte um médico para avaliar a necessidade de tratamento. Pratique exercícios e mantenha uma dieta rica em fibras e alimentos saudáveis.",
        MessageKey::CholesterolUnknown => "Categoria de colesterol desconhecida.",
        MessageKey::GlucoseNormal => "Sua glicose está dentro da faixa normal. Mantenha uma dieta equilibrada com baixo teor de açúcares refinados e pratique exercícios regularmente.",
        MessageKey::GlucosePrediabetes => "Você está com pré-diabete. Reduza o consumo de açúcar, aumente a ingestão de fibras (como frutas e vegetais) e pratique atividades físicas para evitar o desenvolvimento de diabetes.",
        MessageKey::GlucoseDiabetes => "Você está com diabete. Reduza drasticamente o consumo de açúcar e busque orientação médica para iniciar o tratamento adequado. Manter um estilo de vida saudável é essencial para controlar a glicose.",
        MessageKey::GlucoseUnknown => "Categoria de glicose desconhecida.",
        MessageKey::RiskVeryLow => "Muito baixo",
        MessageKey::RiskLow => "Baixo",
        MessageKey::RiskModerate => "Moderado",
        MessageKey::RiskHigh => "Alto",
        MessageKey::RiskVeryHigh => "Muito alto",
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    locale: Option<String>,
    messages: BTreeMap<String, String>,
}

/// Keyed message texts. Every key always resolves to some text.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    locale: String,
    messages: BTreeMap<MessageKey, String>,
}

impl MessageCatalog {
    /// Built-in Portuguese (pt-BR) catalog.
    #[must_use]
    pub fn portuguese() -> Self {
        let messages = MessageKey::ALL
            .into_iter()
            .map(|k| (k, portuguese_text(k).to_string()))
            .collect();
        Self {
            locale: "pt-BR".to_string(),
            messages,
        }
    }

    /// Parse a JSON override and apply it on top of the built-in catalog.
    ///
    /// # Errors
    /// Returns `CatalogError` for malformed JSON or unrecognised keys.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::portuguese();

        for (id, text) in file.messages {
            let key = MessageKey::from_id(&id).ok_or(CatalogError::UnknownKey(id))?;
            catalog.messages.insert(key, text);
        }
        if let Some(locale) = file.locale {
            catalog.locale = locale;
        }

        Ok(catalog)
    }

    /// Load an override file.
    ///
    /// # Errors
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        tracing::info!("Loaded message catalog {:?} (locale={})", path, catalog.locale);
        Ok(catalog)
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    #[must_use]
    pub fn text(&self, key: MessageKey) -> &str {
        self.messages
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| portuguese_text(key))
    }

    /// Recommendation for a blood pressure code (0-4).
    #[must_use]
    pub fn bp_recommendation(&self, code: Option<u8>) -> &str {
        self.text(bp_message_key(code))
    }

    /// Recommendation for a BMI code (0-5).
    #[must_use]
    pub fn bmi_recommendation(&self, code: Option<u8>) -> &str {
        self.text(bmi_message_key(code))
    }

    /// Recommendation for a cholesterol code (0-2).
    #[must_use]
    pub fn cholesterol_recommendation(&self, code: Option<u8>) -> &str {
        self.text(cholesterol_message_key(code))
    }

    /// Recommendation for a glucose code (1-3); code 0 is unknown.
    #[must_use]
    pub fn glucose_recommendation(&self, code: Option<u8>) -> &str {
        self.text(glucose_message_key(code))
    }

    #[must_use]
    pub fn blood_pressure_text(&self, category: Option<BloodPressureCategory>) -> &str {
        self.bp_recommendation(category.map(BloodPressureCategory::code))
    }

    #[must_use]
    pub fn bmi_text(&self, category: BmiCategory) -> &str {
        self.bmi_recommendation(Some(category.code()))
    }

    #[must_use]
    pub fn cholesterol_text(&self, category: CholesterolCategory) -> &str {
        self.cholesterol_recommendation(Some(category.code()))
    }

    #[must_use]
    pub fn glucose_text(&self, category: GlucoseCategory) -> &str {
        self.glucose_recommendation(Some(category.code()))
    }

    #[must_use]
    pub fn risk_label(&self, risk: RiskCategory) -> &str {
        self.text(risk_message_key(risk))
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::portuguese()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ids_round_trip() {
        for key in MessageKey::ALL {
            assert_eq!(MessageKey::from_id(key.id()), Some(key));
        }
        assert_eq!(MessageKey::from_id("bp.nope"), None);
    }

    #[test]
    fn test_recommendations_by_code() {
        let catalog = MessageCatalog::portuguese();
        assert!(catalog.bp_recommendation(Some(0)).contains("normal"));
        assert!(catalog.bp_recommendation(Some(4)).contains("crise hipertensiva"));
        assert!(catalog.bmi_recommendation(Some(5)).contains("obesidade extrema"));
        assert!(catalog.cholesterol_recommendation(Some(1)).contains("limítrofe"));
        assert!(catalog.glucose_recommendation(Some(2)).contains("pré-diabete"));
    }

    #[test]
    fn test_unknown_codes_fall_back() {
        let catalog = MessageCatalog::portuguese();
        assert_eq!(
            catalog.bmi_recommendation(Some(99)),
            "Categoria de IMC desconhecida."
        );
        assert_eq!(
            catalog.bp_recommendation(None),
            "Categoria de pressão arterial desconhecida."
        );
        assert_eq!(
            catalog.cholesterol_recommendation(Some(3)),
            "Categoria de colesterol desconhecida."
        );
        assert_eq!(
            catalog.glucose_recommendation(Some(0)),
            "Categoria de glicose desconhecida."
        );
    }

    #[test]
    fn test_override_replaces_subset() {
        let json = r#"{
            "locale": "en-US",
            "messages": {
                "bp.normal": "Your blood pressure is normal.",
                "risk.very_high": "Very high"
            }
        }"#;
        let catalog = MessageCatalog::from_json_str(json).expect("Should parse");
        assert_eq!(catalog.locale(), "en-US");
        assert_eq!(catalog.bp_recommendation(Some(0)), "Your blood pressure is normal.");
        assert_eq!(catalog.risk_label(RiskCategory::VeryHigh), "Very high");
        // Untouched keys keep the built-in text.
        assert_eq!(catalog.risk_label(RiskCategory::Low), "Baixo");
    }

    #[test]
    fn test_override_rejects_unknown_key() {
        let json = r#"{ "messages": { "bp.normall": "typo" } }"#;
        let err = MessageCatalog::from_json_str(json).expect_err("must fail");
        assert!(matches!(err, CatalogError::UnknownKey(ref k) if k == "bp.normall"));
    }

    #[test]
    fn test_override_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{ "messages": { "glucose.unknown": "?" } }"#)
            .expect("write catalog");
        let catalog = MessageCatalog::from_json_file(&path).expect("Should load");
        assert_eq!(catalog.glucose_recommendation(Some(7)), "?");
        assert_eq!(catalog.locale(), "pt-BR");
    }
}
