//! OAuth client entity and identifier types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_client_id, validate_owner_id, ClientValidationError};

/// Client identifier - alphanumeric + hyphens, max 64 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Create a new ClientId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, ClientValidationError> {
        let id = id.into();
        validate_client_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a random UUID-based identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ClientValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user owning a client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Create a new OwnerId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, ClientValidationError> {
        let id = id.into();
        validate_owner_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = ClientValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// OAuth client registered with the authorization server
///
/// The secret is serialized on purpose: cached copies must be usable for
/// client-credential checks without a round trip to the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    id: ClientId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    owner_id: Option<OwnerId>,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    provider: Option<String>,
    redirect: String,
    personal_access_client: bool,
    password_client: bool,
    revoked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Client {
    /// Create a new confidential client without secret
    pub fn new(
        id: ClientId,
        owner_id: Option<OwnerId>,
        name: impl Into<String>,
        redirect: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            owner_id,
            name: name.into(),
            secret: None,
            provider: None,
            redirect: redirect.into(),
            personal_access_client: false,
            password_client: false,
            revoked: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Mark as a personal access client
    pub fn as_personal_access_client(mut self) -> Self {
        self.personal_access_client = true;
        self
    }

    /// Mark as a password grant client
    pub fn as_password_client(mut self) -> Self {
        self.password_client = true;
        self
    }

    /// Restore persisted state flags and timestamps
    pub fn with_state(
        mut self,
        revoked: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        self.revoked = revoked;
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    // Getters

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn owner_id(&self) -> Option<&OwnerId> {
        self.owner_id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn redirect(&self) -> &str {
        &self.redirect
    }

    pub fn is_personal_access_client(&self) -> bool {
        self.personal_access_client
    }

    pub fn is_password_client(&self) -> bool {
        self.password_client
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Confidential clients carry a secret
    pub fn is_confidential(&self) -> bool {
        self.secret.is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Update the display name and redirect target
    pub fn set_details(&mut self, name: impl Into<String>, redirect: impl Into<String>) {
        self.name = name.into();
        self.redirect = redirect.into();
        self.touch();
    }

    pub fn set_secret(&mut self, secret: impl Into<String>) {
        self.secret = Some(secret.into());
        self.touch();
    }

    pub fn revoke(&mut self) {
        self.revoked = true;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
