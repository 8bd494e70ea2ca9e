//! Keys command - prints the cache keys derived for a client

use clap::Args;

use crate::config::AppConfig;
use crate::domain::{ClientCacheKeys, ClientId, OwnerId};

/// Arguments for the keys command
#[derive(Args, Clone)]
pub struct KeysArgs {
    /// Client identifier
    #[arg(long)]
    pub client: String,

    /// Owner identifier; adds the owner-scoped keys
    #[arg(long)]
    pub owner: Option<String>,
}

pub async fn run(args: KeysArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    for key in derive_keys(&config, &args)? {
        println!("{}", key);
    }

    Ok(())
}

fn derive_keys(config: &AppConfig, args: &KeysArgs) -> anyhow::Result<Vec<String>> {
    let keys = ClientCacheKeys::new(config.client_cache.key_prefix.clone());
    let client_id = ClientId::new(args.client.clone())?;

    let mut derived = vec![keys.for_entity(&client_id)];

    if let Some(owner) = &args.owner {
        let owner_id = OwnerId::new(owner.clone())?;
        derived.push(keys.for_owner(&owner_id));
        derived.push(keys.for_owner_entity(&owner_id, &client_id));
    }

    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(client: &str, owner: Option<&str>) -> KeysArgs {
        KeysArgs {
            client: client.to_string(),
            owner: owner.map(str::to_string),
        }
    }

    #[test]
    fn test_derive_keys_with_owner() {
        let mut config = AppConfig::default();
        config.client_cache.key_prefix = "passport".to_string();

        let keys = derive_keys(&config, &args("7", Some("3"))).unwrap();

        assert_eq!(
            keys,
            vec![
                "passport:for_entity:7",
                "passport:for_owner:3",
                "passport:for_owner_entity:3_7",
            ]
        );
    }

    #[test]
    fn test_derive_keys_rejects_invalid_id() {
        let config = AppConfig::default();

        assert!(derive_keys(&config, &args("a:b", None)).is_err());
        assert_eq!(derive_keys(&config, &args("7", None)).unwrap().len(), 1);
    }
}
