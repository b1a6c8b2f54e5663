//! WireGuard key generation

use base64::prelude::*;
use rand::rngs::OsRng;
use tracing::debug;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::ProviderError;
use crate::types::Keypair;

/// Generate a fresh x25519 keypair, base64 encoded the way `wg genkey` prints it
pub fn generate_keypair() -> Result<Keypair, ProviderError> {
    debug!("Generating x25519 keypair");

    let private_key = StaticSecret::random_from_rng(OsRng);
    let public_key = PublicKey::from(&private_key);

    Ok(Keypair {
        private_key: BASE64_STANDARD.encode(private_key.to_bytes()),
        public_key: BASE64_STANDARD.encode(public_key.as_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public_key_for(private_key: &str) -> Result<String, ProviderError> {
        let bytes = BASE64_STANDARD
            .decode(private_key)
            .map_err(|e| ProviderError::KeyGeneration(format!("invalid private key: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ProviderError::KeyGeneration("private key must be 32 bytes".to_string()))?;

        let secret = StaticSecret::from(bytes);
        Ok(BASE64_STANDARD.encode(PublicKey::from(&secret).as_bytes()))
    }

    #[test]
    fn test_generate_keypair_format() {
        let keypair = generate_keypair().unwrap();

        // 32 bytes -> 44 base64 chars with one padding char
        assert_eq!(keypair.private_key.len(), 44);
        assert_eq!(keypair.public_key.len(), 44);
        assert!(keypair.private_key.ends_with('='));
        assert_ne!(keypair.private_key, keypair.public_key);
    }

    #[test]
    fn test_public_key_matches_private_key() {
        let keypair = generate_keypair().unwrap();
        assert_eq!(
            public_key_for(&keypair.private_key).unwrap(),
            keypair.public_key
        );
    }

    #[test]
    fn test_keypairs_are_unique() {
        let a = generate_keypair().unwrap();
        let b = generate_keypair().unwrap();
        assert_ne!(a.private_key, b.private_key);
    }

    #[test]
    fn test_public_key_for_rejects_garbage() {
        assert!(public_key_for("not base64!").is_err());
        assert!(public_key_for("AAAA").is_err());
    }
}
