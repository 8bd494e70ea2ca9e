//! Client secret generation

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated client secrets
pub const CLIENT_SECRET_LENGTH: usize = 40;

/// Generate a random alphanumeric client secret
pub fn generate_client_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CLIENT_SECRET_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_length_and_charset() {
        let secret = generate_client_secret();

        assert_eq!(secret.len(), CLIENT_SECRET_LENGTH);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_secrets_differ() {
        assert_ne!(generate_client_secret(), generate_client_secret());
    }
}
