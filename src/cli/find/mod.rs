//! Find command - reads a client through the cache

use clap::Args;
use serde_json::Value;
use tracing::info;

use crate::domain::{Client, ClientId, ClientRepository, OwnerId};

const REDACTED: &str = "[REDACTED]";

/// Arguments for the find command
#[derive(Args, Clone)]
pub struct FindArgs {
    /// Client identifier
    #[arg(long)]
    pub client: String,

    /// Only return the client if it belongs to this owner
    #[arg(long)]
    pub owner: Option<String>,
}

pub async fn run(args: FindArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let repository = crate::create_client_repository(&config).await?;

    let client_id = ClientId::new(args.client)?;
    let client = match args.owner {
        Some(owner) => {
            let owner_id = OwnerId::new(owner)?;
            repository.find_for_owner(&client_id, &owner_id).await?
        }
        None => repository.find(&client_id).await?,
    };

    match client {
        Some(client) => {
            println!("{}", serde_json::to_string_pretty(&redacted(&client)?)?)
        }
        None => info!(client_id = %client_id, "Client not found"),
    }

    Ok(())
}

/// JSON view of a client with its secret masked
fn redacted(client: &Client) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(client)?;

    if let Some(secret) = value.get_mut("secret") {
        *secret = Value::String(REDACTED.to_string());
    }

    Ok(value)
}
