//! Ed25519 signing of QR issuance requests.
//!
//! Deployments receive their key as base64 PKCS#8 DER. Some issued keys carry
//! the 32-byte seed directly in the outer OCTET STRING instead of the nested
//! `CurvePrivateKey` wrapper, so parsing only checks the algorithm OID and takes
//! the trailing seed. A bare base64 32-byte seed is accepted as well.

use super::{ClientError, Credentials};
use base64ct::{Base64, Encoding};
use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use secrecy::{ExposeSecret, SecretString};

// id-Ed25519 (1.3.101.112)
const ED25519_OID: [u8; 5] = [0x06, 0x03, 0x2b, 0x65, 0x70];

/// Decode the deployment signing key.
///
/// # Errors
/// Returns `ClientError::Signing` if the key is not base64 or not an Ed25519 key.
pub fn decode_signing_key(secret: &SecretString) -> Result<SigningKey, ClientError> {
    let der = Base64::decode_vec(secret.expose_secret().trim())
        .map_err(|_| ClientError::Signing("signing key is not valid base64".to_string()))?;

    if der.len() == SECRET_KEY_LENGTH {
        return seed_from(&der);
    }

    if der.first() != Some(&0x30) || !der.windows(ED25519_OID.len()).any(|w| w == ED25519_OID) {
        return Err(ClientError::Signing(
            "signing key is not an Ed25519 PKCS#8 key".to_string(),
        ));
    }

    // The seed is always the last OCTET STRING: 0x04 0x20 <32 bytes>
    let offset = der
        .len()
        .checked_sub(SECRET_KEY_LENGTH + 2)
        .ok_or_else(|| ClientError::Signing("signing key is truncated".to_string()))?;
    if der[offset..offset + 2] != [0x04, 0x20] {
        return Err(ClientError::Signing(
            "signing key has an unexpected layout".to_string(),
        ));
    }

    seed_from(&der[offset + 2..])
}

fn seed_from(bytes: &[u8]) -> Result<SigningKey, ClientError> {
    let seed: [u8; SECRET_KEY_LENGTH] = bytes
        .try_into()
        .map_err(|_| ClientError::Signing("signing key has the wrong length".to_string()))?;
    Ok(SigningKey::from_bytes(&seed))
}

/// Message covered by the issuance signature.
#[must_use]
pub fn issuance_message(application_id: &str, hub_id: &str, timestamp: u64) -> String {
    format!("{application_id}.{hub_id}.{timestamp}")
}

/// Sign an issuance request, returning the base64 signature.
///
/// # Errors
/// Returns `ClientError::Signing` if the deployment key cannot be decoded.
pub fn sign_issuance(credentials: &Credentials, timestamp: u64) -> Result<String, ClientError> {
    let key = decode_signing_key(credentials.signing_key())?;
    let message = issuance_message(credentials.application_id(), credentials.hub_id(), timestamp);
    let signature = key.sign(message.as_bytes());
    Ok(Base64::encode_string(&signature.to_bytes()))
}
