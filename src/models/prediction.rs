use serde::Serialize;

/// Binary classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Label {
    LowRisk,
    EarlyStage,
}

impl Label {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::LowRisk => 0,
            Self::EarlyStage => 1,
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.as_u8()
    }
}

const LOW_RISK_MESSAGE: &str = "Individual assessed as low-risk for diabetes";

/// Label plus the message shown to the caller. Built once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionResult {
    pub label: Label,
    pub message: String,
}

impl PredictionResult {
    /// The patient name is substituted literally; only positive results
    /// mention it.
    pub fn for_patient(name: &str, label: Label) -> Self {
        let message = match label {
            Label::EarlyStage => format!("{name} Patient Diagnosed with early-stage diabetes"),
            Label::LowRisk => LOW_RISK_MESSAGE.to_string(),
        };
        Self { label, message }
    }
}
