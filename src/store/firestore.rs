//! Firestore REST client: one `createDocument` call per appended record.
//!
//! `POST {base}/projects/{project}/databases/(default)/documents/{collection}`
//! with `{"fields": {...}}`; Firestore assigns the document id.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::credentials::{CredentialsError, ServiceAccount, TokenSource};
use super::{RecordStore, StoreError};
use crate::config::FirestoreSettings;
use crate::models::features::FieldValue;
use crate::models::record::PersistedRecord;

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Store construction failures. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum FirestoreSetupError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error("No Firestore project id: set FIRESTORE_PROJECT_ID or provide a service-account file")]
    MissingProject,
    #[error("No Firestore credentials: set GOOGLE_APPLICATION_CREDENTIALS or FIRESTORE_ACCESS_TOKEN")]
    MissingCredentials,
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Firestore document store over the REST API.
pub struct FirestoreStore {
    base_url: String,
    project_id: String,
    client: reqwest::blocking::Client,
    token: TokenSource,
}

#[derive(Deserialize)]
struct CreatedDocument {
    name: String,
}

impl FirestoreStore {
    pub fn new(
        base_url: &str,
        project_id: &str,
        token: TokenSource,
    ) -> Result<Self, FirestoreSetupError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| FirestoreSetupError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            client,
            token,
        })
    }

    /// Build from startup settings.
    ///
    /// A credentials file, when configured, is always parsed so a malformed
    /// one stops the process even if another token source would win.
    pub fn from_settings(settings: &FirestoreSettings) -> Result<Self, FirestoreSetupError> {
        let account = settings
            .credentials_path
            .as_deref()
            .map(ServiceAccount::from_file)
            .transpose()?;

        let project_id = settings
            .project_id
            .clone()
            .or_else(|| account.as_ref().map(|a| a.project_id.clone()))
            .ok_or(FirestoreSetupError::MissingProject)?;

        let (base_url, token) = if let Some(host) = &settings.emulator_host {
            (format!("http://{}/v1", host.trim_end_matches('/')), TokenSource::Emulator)
        } else if let Some(token) = &settings.access_token {
            (FIRESTORE_API.to_string(), TokenSource::Static(token.clone()))
        } else if let Some(account) = &account {
            (
                FIRESTORE_API.to_string(),
                TokenSource::service_account(account.signer()?),
            )
        } else {
            return Err(FirestoreSetupError::MissingCredentials);
        };

        Self::new(&base_url, &project_id, token)
    }

    /// Collection URL that new documents are POSTed to.
    pub fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, collection
        )
    }
}

/// Firestore typed-value encoding of one field.
fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => json!({ "stringValue": s }),
        FieldValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                // int64 travels as a decimal string
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
    }
}

/// Request body for `createDocument`.
pub fn document_body(record: &PersistedRecord) -> Value {
    let fields: Map<String, Value> = record
        .fields()
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    json!({ "fields": fields })
}

/// Last path segment of a full document resource name.
fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

impl RecordStore for FirestoreStore {
    fn append(&self, collection: &str, record: &PersistedRecord) -> Result<String, StoreError> {
        let bearer = self.token.bearer(&self.client)?;
        let url = self.collection_url(collection);

        let response = self
            .client
            .post(&url)
            .bearer_auth(bearer)
            .json(&document_body(record))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedDocument = response
            .json()
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))?;

        document_id(&created.name)
            .map(str::to_string)
            .ok_or_else(|| StoreError::ResponseParsing(format!("document name {:?}", created.name)))
    }

    fn describe(&self) -> String {
        format!(
            "firestore(project={}, auth={})",
            self.project_id,
            self.token.kind()
        )
    }
}
