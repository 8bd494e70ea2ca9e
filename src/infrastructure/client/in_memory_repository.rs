//! In-memory client repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::client::{
    generate_client_secret, validate_client_name, Client, ClientId, ClientRepository, OwnerId,
};
use crate::domain::DomainError;

/// In-memory implementation of ClientRepository
#[derive(Debug, Clone, Default)]
pub struct InMemoryClientRepository {
    clients: Arc<RwLock<HashMap<String, Client>>>,
    /// Personal access client registrations, oldest first
    personal_access: Arc<RwLock<Vec<ClientId>>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial clients
    pub fn with_clients(clients: Vec<Client>) -> Self {
        let mut personal_access = Vec::new();
        let clients: HashMap<String, Client> = clients
            .into_iter()
            .inspect(|client| {
                if client.is_personal_access_client() {
                    personal_access.push(client.id().clone());
                }
            })
            .map(|client| (client.id().as_str().to_string(), client))
            .collect();

        Self {
            clients: Arc::new(RwLock::new(clients)),
            personal_access: Arc::new(RwLock::new(personal_access)),
        }
    }

    async fn modify<F>(&self, client: &Client, change: F) -> Result<Client, DomainError>
    where
        F: FnOnce(&mut Client) + Send,
    {
        let mut clients = self.clients.write().await;

        let stored = clients.get_mut(client.id().as_str()).ok_or_else(|| {
            DomainError::not_found(format!("Client '{}' not found", client.id()))
        })?;

        change(stored);
        Ok(stored.clone())
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn find(&self, id: &ClientId) -> Result<Option<Client>, DomainError> {
        let clients = self.clients.read().await;
        Ok(clients.get(id.as_str()).cloned())
    }

    async fn find_for_owner(
        &self,
        id: &ClientId,
        owner_id: &OwnerId,
    ) -> Result<Option<Client>, DomainError> {
        let clients = self.clients.read().await;

        Ok(clients
            .get(id.as_str())
            .filter(|client| client.owner_id() == Some(owner_id))
            .cloned())
    }

    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Client>, DomainError> {
        let clients = self.clients.read().await;

        let mut owned: Vec<Client> = clients
            .values()
            .filter(|client| client.owner_id() == Some(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });

        Ok(owned)
    }

    async fn find_personal_access_client(&self) -> Result<Option<Client>, DomainError> {
        let personal_access = self.personal_access.read().await;

        let Some(id) = personal_access.last() else {
            return Ok(None);
        };

        self.find(id).await
    }

    async fn create(&self, client: Client) -> Result<Client, DomainError> {
        validate_client_name(client.name())?;

        let mut clients = self.clients.write().await;
        let id = client.id().as_str().to_string();

        if clients.contains_key(&id) {
            return Err(DomainError::conflict(format!(
                "Client with ID '{}' already exists",
                id
            )));
        }

        clients.insert(id, client.clone());

        Ok(client)
    }

    async fn create_personal_access_client(
        &self,
        owner_id: Option<OwnerId>,
        name: &str,
        redirect: &str,
    ) -> Result<Client, DomainError> {
        let client = Client::new(ClientId::generate(), owner_id, name, redirect)
            .with_secret(generate_client_secret())
            .as_personal_access_client();

        let client = self.create(client).await?;
        self.personal_access.write().await.push(client.id().clone());

        Ok(client)
    }

    async fn update(
        &self,
        client: &Client,
        name: &str,
        redirect: &str,
    ) -> Result<Client, DomainError> {
        validate_client_name(name)?;

        self.modify(client, |stored| stored.set_details(name, redirect))
            .await
    }

    async fn regenerate_secret(&self, client: &Client) -> Result<Client, DomainError> {
        let secret = generate_client_secret();
        self.modify(client, |stored| stored.set_secret(secret)).await
    }

    async fn delete(&self, client: &Client) -> Result<(), DomainError> {
        self.modify(client, Client::revoke).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id).unwrap()
    }

    fn client(id: &str, owner_id: &str, name: &str) -> Client {
        Client::new(
            ClientId::new(id).unwrap(),
            Some(owner(owner_id)),
            name,
            "http://localhost/callback",
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryClientRepository::new();
        repo.create(client("7", "3", "A")).await.unwrap();

        let found = repo.find(&ClientId::new("7").unwrap()).await.unwrap();
        assert_eq!(found.unwrap().name(), "A");

        let missing = repo.find(&ClientId::new("8").unwrap()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let repo = InMemoryClientRepository::new();
        repo.create(client("7", "3", "A")).await.unwrap();

        let result = repo.create(client("7", "3", "B")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_find_for_owner_checks_ownership() {
        let repo = InMemoryClientRepository::with_clients(vec![client("7", "3", "A")]);
        let id = ClientId::new("7").unwrap();

        assert!(repo.find_for_owner(&id, &owner("3")).await.unwrap().is_some());
        assert!(repo.find_for_owner(&id, &owner("4")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_owner_sorted_by_name() {
        let repo = InMemoryClientRepository::with_clients(vec![
            client("1", "3", "zeta"),
            client("2", "3", "alpha"),
            client("3", "4", "beta"),
        ]);

        let names: Vec<String> = repo
            .list_for_owner(&owner("3"))
            .await
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_update_and_regenerate_secret() {
        let repo = InMemoryClientRepository::with_clients(vec![
            client("7", "3", "A").with_secret("old")
        ]);
        let original = repo.find(&ClientId::new("7").unwrap()).await.unwrap().unwrap();

        let updated = repo.update(&original, "B", "http://b/").await.unwrap();
        assert_eq!(updated.name(), "B");
        assert_eq!(updated.redirect(), "http://b/");

        let rotated = repo.regenerate_secret(&updated).await.unwrap();
        assert_ne!(rotated.secret(), Some("old"));
        assert_eq!(rotated.name(), "B");
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let repo = InMemoryClientRepository::with_clients(vec![client("7", "3", "A")]);

        let created = repo.create(client("8", "3", "  ")).await;
        assert!(matches!(created, Err(DomainError::Validation { .. })));

        let updated = repo.update(&client("7", "3", "A"), "", "http://b/").await;
        assert!(matches!(updated, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_update_missing_client() {
        let repo = InMemoryClientRepository::new();

        let result = repo.update(&client("7", "3", "A"), "B", "http://b/").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_revokes() {
        let repo = InMemoryClientRepository::with_clients(vec![client("7", "3", "A")]);
        let id = ClientId::new("7").unwrap();
        let stored = repo.find(&id).await.unwrap().unwrap();

        assert!(!repo.revoked(&id).await.unwrap());
        repo.delete(&stored).await.unwrap();

        assert!(repo.revoked(&id).await.unwrap());
        assert!(repo.find(&id).await.unwrap().is_some());
        assert!(repo.active_for_owner(&owner("3")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_personal_access_client() {
        let repo = InMemoryClientRepository::new();

        let err = repo.personal_access_client().await.unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));

        let created = repo
            .create_personal_access_client(None, "Personal Access", "http://localhost")
            .await
            .unwrap();

        let found = repo.personal_access_client().await.unwrap();
        assert_eq!(found.id(), created.id());
        assert!(found.is_personal_access_client());
        assert!(found.is_confidential());
    }

    #[tokio::test]
    async fn test_create_password_grant_client() {
        let repo = InMemoryClientRepository::new();

        let created = repo
            .create_password_grant_client(Some(owner("3")), "Password Grant", "http://localhost")
            .await
            .unwrap();

        assert!(created.is_password_client());
        assert!(repo.find(created.id()).await.unwrap().is_some());
    }
}
