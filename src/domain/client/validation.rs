//! Client and owner identifier validation

use thiserror::Error;

/// Errors that can occur during identifier validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientValidationError {
    #[error("{0} ID cannot be empty")]
    EmptyId(&'static str),

    #[error("{0} ID exceeds maximum length of {1} characters")]
    IdTooLong(&'static str, usize),

    #[error("{0} ID must start with a letter or number")]
    InvalidIdStart(&'static str),

    #[error("{0} ID must end with a letter or number")]
    InvalidIdEnd(&'static str),

    #[error("{0} ID contains invalid character: '{1}'. Only alphanumeric characters and hyphens are allowed")]
    InvalidIdCharacter(&'static str, char),

    #[error("Client name cannot be empty")]
    EmptyName,

    #[error("Client name exceeds maximum length of {0} characters")]
    NameTooLong(usize),
}

const MAX_ID_LENGTH: usize = 64;
const MAX_NAME_LENGTH: usize = 255;

/// Validate a client ID
///
/// Identifiers end up inside cache keys, so `:` and `_` are rejected
/// to keep the key layout unambiguous.
pub fn validate_client_id(id: &str) -> Result<(), ClientValidationError> {
    validate_identifier("Client", id)
}

/// Validate an owner ID
pub fn validate_owner_id(id: &str) -> Result<(), ClientValidationError> {
    validate_identifier("Owner", id)
}

/// Validate a client display name
pub fn validate_client_name(name: &str) -> Result<(), ClientValidationError> {
    if name.trim().is_empty() {
        return Err(ClientValidationError::EmptyName);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ClientValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    Ok(())
}

fn validate_identifier(kind: &'static str, id: &str) -> Result<(), ClientValidationError> {
    if id.is_empty() {
        return Err(ClientValidationError::EmptyId(kind));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ClientValidationError::IdTooLong(kind, MAX_ID_LENGTH));
    }

    if let Some(c) = id.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
        return Err(ClientValidationError::InvalidIdCharacter(kind, c));
    }

    if id.starts_with('-') {
        return Err(ClientValidationError::InvalidIdStart(kind));
    }

    if id.ends_with('-') {
        return Err(ClientValidationError::InvalidIdEnd(kind));
    }

    Ok(())
}
