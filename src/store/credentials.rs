//! Service-account credentials and OAuth2 access tokens.
//!
//! Tokens are exchanged with the JWT-bearer grant: a short-lived RS256 assertion
//! signed with the key's private key is traded at `token_uri` for a bearer token.
//! The exchange happens on first use, not when the key is loaded.

use crate::error::ImportError;
use crate::store::firestore::{status_error, transport_error};
use crate::store::traits::{CloudCredentials, CloudIOError, CloudResult, ErrorKind};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Refresh a little early so a token never expires mid-request.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a service-account key file the importer needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Load and validate a key file.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::MissingInput`] if the file does not exist, and
    /// [`ImportError::InvalidCredentials`] if it cannot be parsed or is incomplete.
    pub fn from_file(path: &Path) -> Result<Self, ImportError> {
        if !path.exists() {
            return Err(ImportError::missing_credentials(path));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ImportError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|e| ImportError::InvalidCredentials {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Parse and validate key JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the JSON is malformed, or the error from [`CloudCredentials::validate`].
    pub fn from_json(raw: &str) -> CloudResult<Self> {
        let key: Self = serde_json::from_str(raw).map_err(|e| {
            CloudIOError::new(ErrorKind::InvalidInput, "malformed service account key")
                .with_source(e.to_string())
        })?;
        key.validate()?;
        Ok(key)
    }
}

impl CloudCredentials for ServiceAccountKey {
    fn identifier(&self) -> &str {
        &self.client_email
    }

    fn credential_type(&self) -> &str {
        self.key_type.as_deref().unwrap_or("service_account")
    }

    fn validate(&self) -> CloudResult<()> {
        if self.credential_type() != "service_account" {
            return Err(CloudIOError::new(
                ErrorKind::Authentication,
                format!("unsupported credential type {}", self.credential_type()),
            ));
        }
        for (name, value) in [
            ("project_id", &self.project_id),
            ("client_email", &self.client_email),
            ("private_key", &self.private_key),
            ("token_uri", &self.token_uri),
        ] {
            if value.trim().is_empty() {
                return Err(CloudIOError::new(
                    ErrorKind::Authentication,
                    format!("service account key has an empty {name}"),
                ));
            }
        }
        Ok(())
    }

    fn metadata(&self) -> HashMap<String, String> {
        HashMap::from([("project_id".to_string(), self.project_id.clone())])
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Lazily exchanges a service-account key for bearer tokens and caches them.
pub struct TokenProvider {
    key: ServiceAccountKey,
    http: reqwest::blocking::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    #[must_use]
    pub fn new(key: ServiceAccountKey, http: reqwest::blocking::Client) -> Self {
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid access token, exchanging a new assertion if the cached one is stale.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` if the assertion cannot be signed or the exchange is rejected,
    /// and a transport error kind if the token endpoint cannot be reached.
    pub fn token(&self) -> CloudResult<String> {
        let now = Utc::now();
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| CloudIOError::new(ErrorKind::InternalError, "token cache poisoned"))?;
        if let Some(token) = cached.as_ref()
            && token.expires_at > now
        {
            return Ok(token.value.clone());
        }

        let fresh = self.exchange(now)?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> CloudResult<String> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes()).map_err(|e| {
            CloudIOError::new(ErrorKind::Authentication, "invalid private key")
                .with_source(e.to_string())
        })?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key).map_err(|e| {
            CloudIOError::new(ErrorKind::Authentication, "failed to sign token assertion")
                .with_source(e.to_string())
        })
    }

    fn exchange(&self, now: DateTime<Utc>) -> CloudResult<CachedToken> {
        let assertion = self.assertion(now)?;
        debug!(
            token_uri = %self.key.token_uri,
            account = %self.key.client_email,
            "exchanging service account assertion"
        );

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            // Any rejection at the token endpoint is a credential problem.
            let mut err = status_error(status, "token exchange failed", body);
            if matches!(err.kind, ErrorKind::InvalidInput | ErrorKind::NotFound) {
                err.kind = ErrorKind::Authentication;
            }
            return Err(err);
        }

        let parsed: TokenResponse = response.json().map_err(|e| {
            CloudIOError::new(ErrorKind::Authentication, "malformed token response")
                .with_source(e.to_string())
        })?;
        let lifetime = (parsed.expires_in - EXPIRY_MARGIN_SECS).max(0);
        Ok(CachedToken {
            value: parsed.access_token,
            expires_at: now + ChronoDuration::seconds(lifetime),
        })
    }
}
