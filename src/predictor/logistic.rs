use serde::Deserialize;

use super::{check_feature_names, fixed, ArtifactError, Predictor, PredictorError};
use crate::models::features::{FeatureVector, FEATURE_COUNT};
use crate::models::prediction::Label;

fn default_threshold() -> f64 {
    0.5
}

/// Standardisation applied before the linear term: `(x - mean) / scale`.
#[derive(Debug, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// On-disk form of a logistic-regression model.
#[derive(Debug, Deserialize)]
pub struct LogisticArtifact {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<ScalerParams>,
    /// Probability above which the positive label is returned.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone)]
struct Scaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

/// Validated logistic-regression classifier.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    coefficients: [f64; FEATURE_COUNT],
    intercept: f64,
    scaler: Option<Scaler>,
    threshold: f64,
}

impl TryFrom<LogisticArtifact> for LogisticModel {
    type Error = ArtifactError;

    fn try_from(artifact: LogisticArtifact) -> Result<Self, Self::Error> {
        check_feature_names(&artifact.feature_names)?;
        let coefficients = fixed("coefficients", artifact.coefficients)?;
        if !artifact.intercept.is_finite() {
            return Err(ArtifactError::Invalid("intercept is not finite".into()));
        }
        if !(artifact.threshold > 0.0 && artifact.threshold < 1.0) {
            return Err(ArtifactError::Invalid(format!(
                "threshold {} outside (0, 1)",
                artifact.threshold
            )));
        }
        let scaler = match artifact.scaler {
            Some(params) => {
                let mean = fixed("scaler.mean", params.mean)?;
                let scale = fixed("scaler.scale", params.scale)?;
                if scale.iter().any(|s| *s == 0.0) {
                    return Err(ArtifactError::Invalid("scaler.scale contains zero".into()));
                }
                Some(Scaler { mean, scale })
            }
            None => None,
        };

        Ok(Self {
            coefficients,
            intercept: artifact.intercept,
            scaler,
            threshold: artifact.threshold,
        })
    }
}

impl LogisticModel {
    /// Probability of the positive class.
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        let z = features
            .values()
            .iter()
            .enumerate()
            .map(|(i, x)| {
                let x = match &self.scaler {
                    Some(s) => (x - s.mean[i]) / s.scale[i],
                    None => *x,
                };
                x * self.coefficients[i]
            })
            .sum::<f64>()
            + self.intercept;
        1.0 / (1.0 + (-z).exp())
    }
}

impl Predictor for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> Result<Label, PredictorError> {
        let p = self.probability(features);
        if !p.is_finite() {
            return Err(PredictorError::NonFiniteScore);
        }
        Ok(if p > self.threshold {
            Label::EarlyStage
        } else {
            Label::LowRisk
        })
    }

    fn describe(&self) -> String {
        format!(
            "logistic_regression(threshold={}, scaled={})",
            self.threshold,
            self.scaler.is_some()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::features::feature_names;

    fn artifact(coefficients: Vec<f64>, intercept: f64) -> LogisticArtifact {
        LogisticArtifact {
            feature_names: feature_names().map(String::from).collect(),
            coefficients,
            intercept,
            scaler: None,
            threshold: 0.5,
        }
    }

    fn polyuria_only() -> LogisticModel {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[2] = 4.0;
        LogisticModel::try_from(artifact(coefficients, -2.0)).unwrap()
    }

    fn vector(polyuria: f64) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[0] = 45.0;
        values[2] = polyuria;
        FeatureVector::from_f64(values).unwrap()
    }

    #[test]
    fn positive_weight_drives_early_stage() {
        let model = polyuria_only();
        assert_eq!(model.predict(&vector(1.0)).unwrap(), Label::EarlyStage);
        assert_eq!(model.predict(&vector(0.0)).unwrap(), Label::LowRisk);
    }

    #[test]
    fn probability_is_sigmoid_of_linear_term() {
        let model = polyuria_only();
        let p = model.probability(&vector(0.5));
        assert!((p - 0.5).abs() < 1e-12, "z = 0 should give 0.5, got {p}");
    }

    #[test]
    fn boundary_is_low_risk() {
        // p == threshold exactly stays negative
        let model = polyuria_only();
        assert_eq!(model.predict(&vector(0.5)).unwrap(), Label::LowRisk);
    }

    #[test]
    fn scaler_is_applied_before_weights() {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[0] = 1.0;
        let mut a = artifact(coefficients, 0.0);
        let mut mean = vec![0.0; FEATURE_COUNT];
        mean[0] = 50.0;
        a.scaler = Some(ScalerParams {
            mean,
            scale: vec![10.0; FEATURE_COUNT],
        });
        let model = LogisticModel::try_from(a).unwrap();

        let mut older = [0.0; FEATURE_COUNT];
        older[0] = 70.0;
        let mut younger = [0.0; FEATURE_COUNT];
        younger[0] = 30.0;
        assert_eq!(
            model.predict(&FeatureVector::from_f64(older).unwrap()).unwrap(),
            Label::EarlyStage
        );
        assert_eq!(
            model.predict(&FeatureVector::from_f64(younger).unwrap()).unwrap(),
            Label::LowRisk
        );
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(LogisticModel::try_from(artifact(vec![0.0; 15], 0.0)).is_err());
        assert!(LogisticModel::try_from(artifact(vec![0.0; FEATURE_COUNT], f64::INFINITY)).is_err());

        let mut a = artifact(vec![0.0; FEATURE_COUNT], 0.0);
        a.threshold = 1.0;
        assert!(LogisticModel::try_from(a).is_err());

        let mut a = artifact(vec![0.0; FEATURE_COUNT], 0.0);
        a.scaler = Some(ScalerParams {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![0.0; FEATURE_COUNT],
        });
        assert!(LogisticModel::try_from(a).is_err());
    }

    #[test]
    fn threshold_defaults_to_half() {
        let json = serde_json::json!({
            "feature_names": feature_names().collect::<Vec<_>>(),
            "coefficients": vec![0.0; FEATURE_COUNT],
            "intercept": 0.0
        });
        let a: LogisticArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(a.threshold, 0.5);
        assert!(a.scaler.is_none());
    }
}
