pub mod features;
pub mod prediction;
pub mod record;
pub mod request;

pub use features::{FeatureVector, FieldValue, FEATURE_COUNT, FEATURE_SCHEMA};
pub use prediction::{Label, PredictionResult};
pub use record::PersistedRecord;
pub use request::{InvalidInput, PredictionRequest, INVALID_INPUT_MESSAGE};
