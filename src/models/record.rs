use serde::ser::{Serialize, SerializeMap, Serializer};

use super::features::FieldValue;
use super::prediction::PredictionResult;
use super::request::PredictionRequest;

/// Human-readable audit form of one request and its prediction.
///
/// Fields keep insertion order: identity, prediction, then the decoded
/// features in schema order. Serializes as a flat JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    fields: Vec<(String, FieldValue)>,
}

impl PersistedRecord {
    pub fn build(request: &PredictionRequest, result: &PredictionResult) -> Self {
        let mut fields = vec![
            ("name".to_string(), FieldValue::from(request.name.as_str())),
            ("contact".to_string(), FieldValue::from(request.contact.as_str())),
            ("address".to_string(), FieldValue::from(request.address.as_str())),
            ("prediction".to_string(), FieldValue::from(result.message.as_str())),
            ("prediction_label".to_string(), FieldValue::from(result.label.as_u8())),
        ];
        fields.extend(
            request
                .features
                .decoded()
                .map(|(name, value)| (name.to_string(), value)),
        );
        Self { fields }
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for PersistedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
