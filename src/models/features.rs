use serde::Serialize;
use serde_json::Number;

/// Number of symptom/demographic inputs the classifier was trained on.
pub const FEATURE_COUNT: usize = 16;

/// How a raw feature value is written into the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureEncoding {
    /// Stored as submitted.
    Raw,
    /// 1 → "Male", anything else → "Female".
    Gender,
    /// 1 → "Yes", anything else → "No".
    YesNo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureField {
    pub name: &'static str,
    pub encoding: FeatureEncoding,
}

const fn yes_no(name: &'static str) -> FeatureField {
    FeatureField {
        name,
        encoding: FeatureEncoding::YesNo,
    }
}

/// Training order of the classifier inputs. `features[i]` is always
/// `FEATURE_SCHEMA[i]`; model artifacts are checked against this at load.
pub static FEATURE_SCHEMA: [FeatureField; FEATURE_COUNT] = [
    FeatureField {
        name: "Age",
        encoding: FeatureEncoding::Raw,
    },
    FeatureField {
        name: "Gender",
        encoding: FeatureEncoding::Gender,
    },
    yes_no("Polyuria"),
    yes_no("Polydipsia"),
    yes_no("Sudden Weight Loss"),
    yes_no("Weakness"),
    yes_no("Polyphagia"),
    yes_no("Genital Thrush"),
    yes_no("Visual Blurring"),
    yes_no("Itching"),
    yes_no("Irritability"),
    yes_no("Delayed Healing"),
    yes_no("Partial Paresis"),
    yes_no("Muscle Stiffness"),
    yes_no("Alopecia"),
    yes_no("Obesity"),
];

/// Feature names in schema order.
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FEATURE_SCHEMA.iter().map(|f| f.name)
}

/// A value as it lands in the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(Number),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<u8> for FieldValue {
    fn from(n: u8) -> Self {
        Self::Number(Number::from(n))
    }
}

/// Exactly `FEATURE_COUNT` finite numbers in schema order.
///
/// The submitted JSON numbers are kept verbatim so `Age` is persisted
/// exactly as sent (an integer age stays an integer).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    raw: Vec<Number>,
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Returns `None` unless there are exactly `FEATURE_COUNT` finite numbers.
    pub fn from_numbers(raw: Vec<Number>) -> Option<Self> {
        if raw.len() != FEATURE_COUNT {
            return None;
        }
        let mut values = [0.0; FEATURE_COUNT];
        for (slot, n) in values.iter_mut().zip(&raw) {
            let v = n.as_f64().filter(|v| v.is_finite())?;
            *slot = v;
        }
        Some(Self { raw, values })
    }

    pub fn from_f64(values: [f64; FEATURE_COUNT]) -> Option<Self> {
        let raw = values
            .iter()
            .map(|v| Number::from_f64(*v))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { raw, values })
    }

    /// Values as classifier input.
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Decode every feature into its human-readable record form,
    /// paired with the schema name.
    pub fn decoded(&self) -> impl Iterator<Item = (&'static str, FieldValue)> + '_ {
        FEATURE_SCHEMA
            .iter()
            .zip(self.raw.iter().zip(self.values.iter()))
            .map(|(field, (raw, value))| (field.name, decode(field.encoding, raw, *value)))
    }
}

fn decode(encoding: FeatureEncoding, raw: &Number, value: f64) -> FieldValue {
    let is_one = value == 1.0;
    match encoding {
        FeatureEncoding::Raw => FieldValue::Number(raw.clone()),
        FeatureEncoding::Gender => FieldValue::from(if is_one { "Male" } else { "Female" }),
        FeatureEncoding::YesNo => FieldValue::from(if is_one { "Yes" } else { "No" }),
    }
}
