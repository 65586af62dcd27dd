//! Service-account credentials and bearer tokens for the document store.
//!
//! Token sources, in order of precedence when the store is built:
//! 1. Emulator: fixed `owner` token, no network exchange
//! 2. Static token from the environment
//! 3. Service-account key → signed JWT → OAuth2 access token
//!
//! Exchanged tokens are reused until one minute before they expire.

use std::path::Path;
use std::sync::Mutex;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use serde::{Deserialize, Serialize};

use super::StoreError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;
const EMULATOR_TOKEN: &str = "owner";

/// Malformed or unusable credentials. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("Cannot read credentials file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed credentials file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Credentials type must be \"service_account\", found {0:?}")]
    WrongType(String),
    #[error("Credentials field {0} is empty")]
    EmptyField(&'static str),
    #[error("Private key is not a PEM-encoded PKCS#8 RSA key: {0}")]
    PrivateKey(String),
    #[error("Failed to sign token request")]
    Signing,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file this service needs.
#[derive(Deserialize)]
pub struct ServiceAccount {
    #[serde(rename = "type")]
    pub account_type: String,
    pub project_id: String,
    pub client_email: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    pub fn from_file(path: &Path) -> Result<Self, CredentialsError> {
        let bytes = std::fs::read(path).map_err(|source| CredentialsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&bytes)
    }

    /// Parse and validate. The private key is decoded here so a bad key
    /// fails startup instead of the first request.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CredentialsError> {
        let account: Self = serde_json::from_slice(bytes)?;
        if account.account_type != "service_account" {
            return Err(CredentialsError::WrongType(account.account_type));
        }
        for (field, value) in [
            ("project_id", &account.project_id),
            ("client_email", &account.client_email),
            ("private_key", &account.private_key),
            ("token_uri", &account.token_uri),
        ] {
            if value.trim().is_empty() {
                return Err(CredentialsError::EmptyField(field));
            }
        }
        decode_private_key(&account.private_key)?;
        Ok(account)
    }

    pub fn signer(&self) -> Result<TokenSigner, CredentialsError> {
        Ok(TokenSigner {
            key: decode_private_key(&self.private_key)?,
            client_email: self.client_email.clone(),
            key_id: self.private_key_id.clone(),
            token_uri: self.token_uri.clone(),
            rng: SystemRandom::new(),
        })
    }
}

/// Only unencrypted PKCS#8 `PRIVATE KEY` blocks (the Google key file
/// format) decode; PKCS#1 `RSA PRIVATE KEY` armor fails in `from_pkcs8`.
fn decode_private_key(pem: &str) -> Result<RsaKeyPair, CredentialsError> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();
    let der = STANDARD
        .decode(body)
        .map_err(|e| CredentialsError::PrivateKey(e.to_string()))?;
    RsaKeyPair::from_pkcs8(&der).map_err(|e| CredentialsError::PrivateKey(e.to_string()))
}

#[derive(Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'static str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Signs RS256 JWT assertions for the OAuth2 JWT-bearer grant.
pub struct TokenSigner {
    key: RsaKeyPair,
    client_email: String,
    key_id: Option<String>,
    token_uri: String,
    rng: SystemRandom,
}

impl TokenSigner {
    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// `header.claims.signature`, each part base64url without padding.
    pub fn assertion(&self, now: i64) -> Result<String, CredentialsError> {
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
            kid: self.key_id.as_deref(),
        };
        let claims = JwtClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let mut signature = vec![0u8; self.key.public().modulus_len()];
        self.key
            .sign(&RSA_PKCS1_SHA256, &self.rng, signing_input.as_bytes(), &mut signature)
            .map_err(|_| CredentialsError::Signing)?;
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

/// Exchanged access token and its expiry (unix seconds).
#[derive(Clone)]
pub struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Where bearer tokens for store requests come from.
pub enum TokenSource {
    Emulator,
    Static(String),
    ServiceAccount {
        signer: TokenSigner,
        cached: Mutex<Option<CachedToken>>,
    },
}

impl TokenSource {
    pub fn service_account(signer: TokenSigner) -> Self {
        Self::ServiceAccount {
            signer,
            cached: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Emulator => "emulator",
            Self::Static(_) => "static",
            Self::ServiceAccount { .. } => "service_account",
        }
    }

    /// Current bearer token, exchanging a fresh one if needed.
    pub fn bearer(&self, client: &reqwest::blocking::Client) -> Result<String, StoreError> {
        self.bearer_at(client, chrono::Utc::now().timestamp())
    }

    /// `bearer` as of `now` (unix seconds).
    pub fn bearer_at(
        &self,
        client: &reqwest::blocking::Client,
        now: i64,
    ) -> Result<String, StoreError> {
        match self {
            Self::Emulator => Ok(EMULATOR_TOKEN.to_string()),
            Self::Static(token) => Ok(token.clone()),
            Self::ServiceAccount { signer, cached } => {
                let mut guard = cached
                    .lock()
                    .map_err(|_| StoreError::Auth("token cache lock poisoned".into()))?;
                if let Some(token) = guard.as_ref() {
                    if now < token.expires_at - REFRESH_MARGIN_SECS {
                        return Ok(token.value.clone());
                    }
                }
                let fresh = exchange(client, signer, now)?;
                tracing::debug!(expires_at = fresh.expires_at, "Access token refreshed");
                *guard = Some(fresh.clone());
                Ok(fresh.value)
            }
        }
    }
}

fn exchange(
    client: &reqwest::blocking::Client,
    signer: &TokenSigner,
    now: i64,
) -> Result<CachedToken, StoreError> {
    let assertion = signer
        .assertion(now)
        .map_err(|e| StoreError::Auth(e.to_string()))?;

    let response = client
        .post(signer.token_uri())
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(StoreError::Auth(format!("token endpoint returned {status}: {body}")));
    }

    let parsed: TokenResponse = response
        .json()
        .map_err(|e| StoreError::Auth(format!("unreadable token response: {e}")))?;

    Ok(CachedToken {
        value: parsed.access_token,
        expires_at: now + parsed.expires_in,
    })
}
