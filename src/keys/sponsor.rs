//! Sponsor identity for dual-signature fee collection.
//!
//! The sponsor is one fixed keypair shared by the whole process. It co-signs
//! every withdrawal so the network submission cost is debited from the
//! sponsor's balance instead of the agent's gas reserve.
//!
//! # Security
//!
//! Unlike agent keys (which stay encrypted at rest and are never decrypted
//! here), the sponsor key is decrypted once at startup and held in memory for
//! the process lifetime. Intermediate buffers are zeroized after decryption;
//! the held key is read-only after construction, so signing is safe across
//! overlapping collection cycles.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};
use zeroize::Zeroize;

use crate::config::Args;
use crate::types::{Result, TollgateError};

use super::crypto::{
    decrypt_private_key, derive_key_encryption_key, generate_keypair, NONCE_LEN, SALT_LEN,
};

/// Expected bundle length: salt || nonce || ciphertext(key + auth tag)
const BUNDLE_LEN: usize = SALT_LEN + NONCE_LEN + 48;

/// Process-wide sponsor signing identity
pub struct SponsorIdentity {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl SponsorIdentity {
    /// Decrypt the sponsor key bundle from configuration.
    ///
    /// The bundle is base64(salt || nonce || ciphertext). In dev mode with no
    /// bundle configured, an ephemeral keypair is generated instead so the
    /// scheduler can run against local services.
    pub fn from_config(args: &Args) -> Result<Self> {
        match (&args.sponsor_key, &args.sponsor_passphrase) {
            (Some(bundle), Some(passphrase)) => Self::from_bundle(bundle, passphrase),
            _ if args.dev_mode => {
                let (signing_key, verifying_key) = generate_keypair();
                tracing::warn!("Dev mode: generated ephemeral sponsor keypair");
                Ok(Self {
                    signing_key,
                    verifying_key,
                })
            }
            _ => Err(TollgateError::Config(
                "SPONSOR_KEY and SPONSOR_PASSPHRASE are required".into(),
            )),
        }
    }

    /// Decrypt a sponsor key bundle: base64(salt || nonce || ciphertext).
    pub fn from_bundle(bundle: &str, passphrase: &str) -> Result<Self> {
        let mut decoded = BASE64
            .decode(bundle)
            .map_err(|e| TollgateError::Config(format!("Invalid SPONSOR_KEY encoding: {e}")))?;

        if decoded.len() != BUNDLE_LEN {
            decoded.zeroize();
            return Err(TollgateError::Config(format!(
                "Invalid SPONSOR_KEY bundle length: expected {}, got {}",
                BUNDLE_LEN,
                decoded.len()
            )));
        }

        let salt = &decoded[..SALT_LEN];
        let nonce: [u8; NONCE_LEN] = decoded[SALT_LEN..SALT_LEN + NONCE_LEN]
            .try_into()
            .map_err(|_| TollgateError::Internal("Invalid nonce length".into()))?;
        let ciphertext = &decoded[SALT_LEN + NONCE_LEN..];

        let mut encryption_key = derive_key_encryption_key(passphrase.as_bytes(), salt)?;
        let decrypt_result = decrypt_private_key(ciphertext, &encryption_key, &nonce);
        encryption_key.zeroize();

        let mut private_key = decrypt_result
            .map_err(|_| TollgateError::Config("Failed to decrypt SPONSOR_KEY (wrong passphrase?)".into()))?;

        let signing_key = SigningKey::from_bytes(&private_key);
        private_key.zeroize();
        decoded.zeroize();

        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Build an identity directly from a signing key, skipping the bundle
    /// format (and its Argon2 derivation) in tests.
    #[cfg(test)]
    pub(crate) fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Sign transaction bytes with the sponsor key.
    ///
    /// Pure and non-mutating; callers may sign concurrently.
    pub fn sign(&self, tx_bytes: &[u8]) -> Vec<u8> {
        super::crypto::sign_payload(&self.signing_key, tx_bytes)
            .to_bytes()
            .to_vec()
    }

    /// The sponsor's public key
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// The sponsor's public key, base64-encoded (for /status)
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.verifying_key.to_bytes())
    }
}

/// Encrypt a signing key into the bundle format `from_bundle` accepts.
///
/// Used by operator tooling to provision the SPONSOR_KEY environment value;
/// kept here so the format lives next to its parser.
pub fn encrypt_to_bundle(signing_key: &SigningKey, passphrase: &str) -> Result<String> {
    use super::crypto::{encrypt_private_key, generate_random_bytes};

    let salt: [u8; SALT_LEN] = generate_random_bytes();
    let nonce: [u8; NONCE_LEN] = generate_random_bytes();

    let mut encryption_key = derive_key_encryption_key(passphrase.as_bytes(), &salt)?;
    let mut private_key = signing_key.to_bytes();
    let ciphertext = encrypt_private_key(&private_key, &encryption_key, &nonce);
    encryption_key.zeroize();
    private_key.zeroize();

    let ciphertext = ciphertext?;

    let mut bundle = Vec::with_capacity(BUNDLE_LEN);
    bundle.extend_from_slice(&salt);
    bundle.extend_from_slice(&nonce);
    bundle.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(bundle))
}
