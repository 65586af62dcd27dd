use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Diabetes Screening";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Collection every prediction record is appended to.
pub const PREDICTIONS_COLLECTION: &str = "diabetes_predictions";

/// Body of the liveness route.
pub const LIVENESS_MESSAGE: &str = "Diabetes Prediction API is Live!";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_MODEL_PATH: &str = "best_diabetes_model.json";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "diabetes_screening_lib=info,tower_http=warn"
}

/// Which `RecordStore` backend the service writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Firestore,
    /// In-process store; records vanish with the process.
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                var: "SCREENING_STORE",
                value: other.to_string(),
            }),
        }
    }
}

/// Firestore connection settings. Credentials are only read when the
/// store is built, so a bad file fails startup rather than config parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirestoreSettings {
    pub credentials_path: Option<PathBuf>,
    pub project_id: Option<String>,
    pub access_token: Option<String>,
    pub emulator_host: Option<String>,
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub model_path: PathBuf,
    pub store: StoreKind,
    pub firestore: FirestoreSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error("Firestore store needs GOOGLE_APPLICATION_CREDENTIALS, FIRESTORE_PROJECT_ID or FIRESTORE_EMULATOR_HOST")]
    MissingFirestoreSource,
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("SCREENING_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                var: "SCREENING_BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let model_path = get("SCREENING_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        let store = match get("SCREENING_STORE") {
            Some(raw) => raw.parse::<StoreKind>()?,
            None => StoreKind::Firestore,
        };

        let firestore = FirestoreSettings {
            credentials_path: get("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            project_id: get("FIRESTORE_PROJECT_ID"),
            access_token: get("FIRESTORE_ACCESS_TOKEN"),
            emulator_host: get("FIRESTORE_EMULATOR_HOST"),
        };

        if store == StoreKind::Firestore
            && firestore.credentials_path.is_none()
            && firestore.project_id.is_none()
            && firestore.emulator_host.is_none()
        {
            return Err(ConfigError::MissingFirestoreSource);
        }

        Ok(Self {
            bind_addr,
            model_path,
            store,
            firestore,
        })
    }
}
