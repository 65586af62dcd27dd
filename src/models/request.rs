use serde_json::{Map, Value};

use super::features::FeatureVector;

/// Returned for every malformed submission, whatever the cause.
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input. Ensure correct fields and feature length.";

/// A validated `/predict` submission.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub name: String,
    pub contact: String,
    pub address: String,
    pub features: FeatureVector,
}

/// Submission rejected before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", INVALID_INPUT_MESSAGE)]
pub struct InvalidInput {
    /// Which check failed, for logs only. Never sent to the client.
    pub reason: &'static str,
}

impl InvalidInput {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

impl PredictionRequest {
    /// Parse and validate a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self, InvalidInput> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| InvalidInput::new("body is not JSON"))?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON document.
    ///
    /// `name`, `contact` and `address` must be non-empty strings; `features`
    /// must hold exactly 16 finite numbers. Booleans are not numbers here.
    pub fn from_value(value: Value) -> Result<Self, InvalidInput> {
        let Value::Object(mut obj) = value else {
            return Err(InvalidInput::new("body is not a JSON object"));
        };

        let name = take_text(&mut obj, "name")?;
        let contact = take_text(&mut obj, "contact")?;
        let address = take_text(&mut obj, "address")?;

        let Some(Value::Array(items)) = obj.remove("features") else {
            return Err(InvalidInput::new("features is not a list"));
        };
        let numbers = items
            .into_iter()
            .map(|item| match item {
                Value::Number(n) => Some(n),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| InvalidInput::new("features holds a non-number"))?;
        let features = FeatureVector::from_numbers(numbers)
            .ok_or_else(|| InvalidInput::new("features has wrong length or non-finite value"))?;

        Ok(Self {
            name,
            contact,
            address,
            features,
        })
    }
}

fn take_text(obj: &mut Map<String, Value>, key: &'static str) -> Result<String, InvalidInput> {
    match obj.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        _ => Err(InvalidInput::new(match key {
            "name" => "name missing or empty",
            "contact" => "contact missing or empty",
            _ => "address missing or empty",
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "name": "Asha",
            "contact": "555",
            "address": "X",
            "features": [45, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        })
    }

    fn with(key: &str, value: Value) -> Value {
        let mut v = valid();
        v[key] = value;
        v
    }

    #[test]
    fn accepts_valid_submission() {
        let req = PredictionRequest::from_value(valid()).unwrap();
        assert_eq!(req.name, "Asha");
        assert_eq!(req.contact, "555");
        assert_eq!(req.address, "X");
        assert_eq!(req.features.values()[0], 45.0);
    }

    #[test]
    fn parses_raw_body() {
        let body = serde_json::to_vec(&valid()).unwrap();
        assert!(PredictionRequest::from_body(&body).is_ok());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let req = PredictionRequest::from_value(with("extra", json!("ignored")));
        assert!(req.is_ok());
    }

    #[test]
    fn rejects_missing_or_falsy_identity_fields() {
        for key in ["name", "contact", "address"] {
            let mut v = valid();
            v.as_object_mut().unwrap().remove(key);
            assert!(PredictionRequest::from_value(v).is_err(), "{key} missing");

            for falsy in [json!(""), json!(null), json!(0), json!(false)] {
                let err = PredictionRequest::from_value(with(key, falsy.clone())).unwrap_err();
                assert_eq!(err.to_string(), INVALID_INPUT_MESSAGE, "{key} = {falsy}");
            }
        }
    }

    #[test]
    fn rejects_non_string_identity_fields() {
        assert!(PredictionRequest::from_value(with("contact", json!(5551234))).is_err());
        assert!(PredictionRequest::from_value(with("name", json!(["Asha"]))).is_err());
    }

    #[test]
    fn rejects_wrong_feature_length() {
        let short = json!([45, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(PredictionRequest::from_value(with("features", short)).is_err());

        let long = json!([45, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(PredictionRequest::from_value(with("features", long)).is_err());
    }

    #[test]
    fn rejects_features_that_are_not_a_list() {
        assert!(PredictionRequest::from_value(with("features", json!("45,1,1"))).is_err());
        assert!(PredictionRequest::from_value(with("features", json!({"Age": 45}))).is_err());
        assert!(PredictionRequest::from_value(with("features", json!(null))).is_err());
    }

    #[test]
    fn rejects_non_numeric_feature_elements() {
        let mut features = json!([45, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        features[3] = json!("1");
        assert!(PredictionRequest::from_value(with("features", features.clone())).is_err());

        features[3] = json!(true);
        assert!(PredictionRequest::from_value(with("features", features.clone())).is_err());

        features[3] = json!(null);
        let err = PredictionRequest::from_value(with("features", features)).unwrap_err();
        assert_eq!(err.reason, "features holds a non-number");
    }

    #[test]
    fn rejects_non_object_bodies() {
        assert!(PredictionRequest::from_value(json!([1, 2, 3])).is_err());
        assert!(PredictionRequest::from_body(b"not json").is_err());
        assert!(PredictionRequest::from_body(b"").is_err());
    }
}
