//! OAuth client domain
//!
//! Client entities, identifier validation and the repository trait that
//! both the source-of-truth stores and the caching layer implement.

mod entity;
mod repository;
mod secret;
mod validation;

pub use entity::{Client, ClientId, OwnerId};
pub use repository::{personal_access_client_missing, ClientRepository};
pub use secret::{generate_client_secret, CLIENT_SECRET_LENGTH};
pub use validation::{
    validate_client_id, validate_client_name, validate_owner_id, ClientValidationError,
};

#[cfg(test)]
pub use repository::MockClientRepository;
