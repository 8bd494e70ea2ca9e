//! PostgreSQL client repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Postgres, Row};
use std::time::Duration;

use crate::domain::client::{
    generate_client_secret, validate_client_name, Client, ClientId, ClientRepository, OwnerId,
};
use crate::domain::DomainError;

const CLIENT_COLUMNS: &str = "id, user_id, name, secret, provider, redirect, \
     personal_access_client, password_client, revoked, created_at, updated_at";

/// PostgreSQL connection settings
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/oauth".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Open a connection pool with these settings
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e))
            })
    }
}

/// PostgreSQL implementation of ClientRepository
///
/// Clients live in `oauth_clients`; the personal access singleton is the
/// newest row of `oauth_personal_access_clients`.
#[derive(Debug, Clone)]
pub struct PostgresClientRepository {
    pool: PgPool,
}

impl PostgresClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_client(
        &self,
        sql: &str,
        binds: &[&str],
    ) -> Result<Option<Client>, DomainError> {
        let mut query = sqlx::query(sql);

        for value in binds {
            query = query.bind(*value);
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get client: {}", e)))?;

        row.as_ref().map(row_to_client).transpose()
    }

    /// Runs a single-row `UPDATE .. RETURNING` and maps the committed row
    async fn fetch_updated(
        &self,
        query: Query<'_, Postgres, PgArguments>,
        id: &ClientId,
    ) -> Result<Client, DomainError> {
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update client: {}", e)))?;

        match row {
            Some(row) => row_to_client(&row),
            None => Err(DomainError::not_found(format!("Client '{}' not found", id))),
        }
    }
}

/// `UPDATE` touching only `assignments` and `updated_at` ($2); `$1` is the id
fn update_statement(assignments: &str) -> String {
    format!(
        "UPDATE oauth_clients SET {}, updated_at = $2 WHERE id = $1 RETURNING {}",
        assignments, CLIENT_COLUMNS
    )
}

#[async_trait]
impl ClientRepository for PostgresClientRepository {
    async fn find(&self, id: &ClientId) -> Result<Option<Client>, DomainError> {
        let sql = format!("SELECT {} FROM oauth_clients WHERE id = $1", CLIENT_COLUMNS);
        self.fetch_one_client(&sql, &[id.as_str()]).await
    }

    async fn find_for_owner(
        &self,
        id: &ClientId,
        owner_id: &OwnerId,
    ) -> Result<Option<Client>, DomainError> {
        let sql = format!(
            "SELECT {} FROM oauth_clients WHERE id = $1 AND user_id = $2",
            CLIENT_COLUMNS
        );
        self.fetch_one_client(&sql, &[id.as_str(), owner_id.as_str()])
            .await
    }

    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Client>, DomainError> {
        let sql = format!(
            "SELECT {} FROM oauth_clients WHERE user_id = $1 ORDER BY name ASC, id ASC",
            CLIENT_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(owner_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list clients: {}", e)))?;

        rows.iter().map(row_to_client).collect()
    }

    async fn find_personal_access_client(&self) -> Result<Option<Client>, DomainError> {
        let sql = format!(
            r#"
            SELECT {} FROM oauth_clients
            WHERE id = (
                SELECT client_id FROM oauth_personal_access_clients
                ORDER BY id DESC
                LIMIT 1
            )
            "#,
            CLIENT_COLUMNS
        );
        self.fetch_one_client(&sql, &[]).await
    }

    async fn create(&self, client: Client) -> Result<Client, DomainError> {
        validate_client_name(client.name())?;

        sqlx::query(
            r#"
            INSERT INTO oauth_clients (id, user_id, name, secret, provider, redirect,
                                       personal_access_client, password_client, revoked,
                                       created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(client.id().as_str())
        .bind(client.owner_id().map(OwnerId::as_str))
        .bind(client.name())
        .bind(client.secret())
        .bind(client.provider())
        .bind(client.redirect())
        .bind(client.is_personal_access_client())
        .bind(client.is_password_client())
        .bind(client.is_revoked())
        .bind(client.created_at())
        .bind(client.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict(format!(
                    "Client with ID '{}' already exists",
                    client.id()
                ))
            } else {
                DomainError::storage(format!("Failed to create client: {}", e))
            }
        })?;

        Ok(client)
    }

    async fn create_personal_access_client(
        &self,
        owner_id: Option<OwnerId>,
        name: &str,
        redirect: &str,
    ) -> Result<Client, DomainError> {
        let client = self
            .create(
                Client::new(ClientId::generate(), owner_id, name, redirect)
                    .with_secret(generate_client_secret())
                    .as_personal_access_client(),
            )
            .await?;

        sqlx::query(
            r#"
            INSERT INTO oauth_personal_access_clients (client_id, created_at, updated_at)
            VALUES ($1, $2, $2)
            "#,
        )
        .bind(client.id().as_str())
        .bind(client.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::storage(format!("Failed to register personal access client: {}", e))
        })?;

        Ok(client)
    }

    async fn update(
        &self,
        client: &Client,
        name: &str,
        redirect: &str,
    ) -> Result<Client, DomainError> {
        validate_client_name(name)?;

        let sql = update_statement("name = $3, redirect = $4");
        let query = sqlx::query(&sql)
            .bind(client.id().as_str())
            .bind(Utc::now())
            .bind(name)
            .bind(redirect);

        self.fetch_updated(query, client.id()).await
    }

    async fn regenerate_secret(&self, client: &Client) -> Result<Client, DomainError> {
        let sql = update_statement("secret = $3");
        let query = sqlx::query(&sql)
            .bind(client.id().as_str())
            .bind(Utc::now())
            .bind(generate_client_secret());

        self.fetch_updated(query, client.id()).await
    }

    async fn delete(&self, client: &Client) -> Result<(), DomainError> {
        let sql = update_statement("revoked = TRUE");
        let query = sqlx::query(&sql)
            .bind(client.id().as_str())
            .bind(Utc::now());

        self.fetch_updated(query, client.id()).await.map(|_| ())
    }
}

fn row_to_client(row: &PgRow) -> Result<Client, DomainError> {
    let id: String = row.get("id");
    let owner_id: Option<String> = row.get("user_id");
    let name: String = row.get("name");
    let secret: Option<String> = row.get("secret");
    let provider: Option<String> = row.get("provider");
    let redirect: String = row.get("redirect");
    let personal_access_client: bool = row.get("personal_access_client");
    let password_client: bool = row.get("password_client");
    let revoked: bool = row.get("revoked");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    let id = ClientId::new(id)
        .map_err(|e| DomainError::storage(format!("Invalid client ID in database: {}", e)))?;
    let owner_id = owner_id
        .map(OwnerId::new)
        .transpose()
        .map_err(|e| DomainError::storage(format!("Invalid owner ID in database: {}", e)))?;

    let mut client = Client::new(id, owner_id, name, redirect).with_state(
        revoked,
        created_at,
        updated_at,
    );

    if let Some(secret) = secret {
        client = client.with_secret(secret);
    }

    if let Some(provider) = provider {
        client = client.with_provider(provider);
    }

    if personal_access_client {
        client = client.as_personal_access_client();
    }

    if password_client {
        client = client.as_password_client();
    }

    Ok(client)
}
