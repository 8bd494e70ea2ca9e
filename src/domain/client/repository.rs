//! Client repository trait

use async_trait::async_trait;

use super::entity::{Client, ClientId, OwnerId};
use super::secret::generate_client_secret;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository for OAuth client lookups and mutations
///
/// Reads return the committed state; writes are durable on return.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Get a client by its ID
    async fn find(&self, id: &ClientId) -> Result<Option<Client>, DomainError>;

    /// Get a client by its ID, only if it belongs to the given owner
    async fn find_for_owner(
        &self,
        id: &ClientId,
        owner_id: &OwnerId,
    ) -> Result<Option<Client>, DomainError>;

    /// List the clients of an owner, ordered by name ascending
    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Client>, DomainError>;

    /// Look up the registered personal access client, if any
    async fn find_personal_access_client(&self) -> Result<Option<Client>, DomainError>;

    /// Get the personal access client for the application
    async fn personal_access_client(&self) -> Result<Client, DomainError> {
        self.find_personal_access_client()
            .await?
            .ok_or_else(personal_access_client_missing)
    }

    /// Persist a new client
    async fn create(&self, client: Client) -> Result<Client, DomainError>;

    /// Create a client and register it as the personal access client
    async fn create_personal_access_client(
        &self,
        owner_id: Option<OwnerId>,
        name: &str,
        redirect: &str,
    ) -> Result<Client, DomainError>;

    /// Create a password grant client
    async fn create_password_grant_client(
        &self,
        owner_id: Option<OwnerId>,
        name: &str,
        redirect: &str,
    ) -> Result<Client, DomainError> {
        let client = Client::new(ClientId::generate(), owner_id, name, redirect)
            .with_secret(generate_client_secret())
            .as_password_client();

        self.create(client).await
    }

    /// Update the name and redirect target of a client
    async fn update(
        &self,
        client: &Client,
        name: &str,
        redirect: &str,
    ) -> Result<Client, DomainError>;

    /// Replace the secret of a client with a freshly generated one
    async fn regenerate_secret(&self, client: &Client) -> Result<Client, DomainError>;

    /// Revoke a client; the record stays in place with `revoked` set
    async fn delete(&self, client: &Client) -> Result<(), DomainError>;

    /// Whether the client is revoked or does not exist
    async fn revoked(&self, id: &ClientId) -> Result<bool, DomainError> {
        Ok(self
            .find(id)
            .await?
            .map_or(true, |client| client.is_revoked()))
    }

    /// List the non-revoked clients of an owner
    async fn active_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Client>, DomainError> {
        Ok(self
            .list_for_owner(owner_id)
            .await?
            .into_iter()
            .filter(|client| !client.is_revoked())
            .collect())
    }
}

/// Error raised when no personal access client has been created
pub fn personal_access_client_missing() -> DomainError {
    DomainError::configuration("Personal access client not found. Please create one.")
}
