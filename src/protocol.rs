//! Protocol orchestration: minting and opening envelopes.
//!
//! Both operations are freestanding, synchronous, and stateless: all
//! identity material arrives as explicit parameters, resolved by the
//! caller (or an [`IdentityProvider`]) before the call. Nothing is
//! cached across calls; the session key, IV, and every intermediate
//! sensitive buffer live only for the duration of one call and are
//! zeroized on all exit paths.

use core::fmt;

use tracing::debug;
use zeroize::Zeroizing;

use crate::binder;
use crate::cipher::{self, Cipher, BLOCK_BYTES};
use crate::envelope;
use crate::error::{CipherError, DecryptError, EncryptError};
use crate::identity::{IdentityProvider, RecipientIdentity, RecipientSecret};
use crate::transport;

// ---------------------------------------------------------------------------
// Core operations
// ---------------------------------------------------------------------------

/// Encrypt a payload for one recipient, producing the text token.
///
/// A fresh session key and IV are generated per call; encrypting the
/// same payload twice yields two unrelated tokens. The IV is prepended
/// to the plaintext before encryption rather than carried as its own
/// envelope field, and the recipient's fingerprint is bound into the
/// fourth field so the decryptor can verify who the token was minted
/// for.
pub fn encrypt(recipient: &RecipientIdentity, payload: &[u8]) -> Result<String, EncryptError> {
    let cipher = Cipher::Aes256Cbc;
    let key = cipher::session_key()?;
    let iv = cipher::fresh_iv()?;

    let mut message = Zeroizing::new(Vec::with_capacity(iv.len() + payload.len()));
    message.extend_from_slice(&iv);
    message.extend_from_slice(payload);
    let ciphertext = cipher.encrypt(key.as_slice(), &iv, &message)?;

    let wrapped_key = transport::wrap(recipient.public_key(), key.as_slice())?;
    let wrapped_fingerprint = binder::bind(&cipher, key.as_slice(), &iv, recipient.fingerprint())?;

    debug!(
        cipher = cipher.wire_id(),
        payload_bytes = payload.len(),
        "minted envelope"
    );

    Ok(envelope::encode(
        cipher.wire_id().as_bytes(),
        &wrapped_key,
        &ciphertext,
        &wrapped_fingerprint,
    ))
}

/// Open a token with the holder's private key and own fingerprint.
///
/// Failure order: structural envelope validation, cipher selection by
/// the wire id, session key unwrap, payload decryption, and only then
/// the fingerprint comparison, so every cipher-level failure surfaces
/// before identity binding is judged. The payload is decrypted under a
/// zero IV and the leading block (the embedded IV) discarded.
pub fn decrypt(secret: &RecipientSecret, token: &str) -> Result<Zeroizing<Vec<u8>>, DecryptError> {
    let fields = envelope::decode(token)?;
    let cipher = Cipher::from_wire_id(&fields.cipher_id)?;
    let key = transport::unwrap(secret.private_key(), &fields.wrapped_key)?;

    let clear = Zeroizing::new(cipher.decrypt(
        key.as_slice(),
        &[0u8; BLOCK_BYTES],
        &fields.ciphertext,
    )?);
    if clear.len() < BLOCK_BYTES {
        return Err(CipherError::MissingIvPrefix.into());
    }

    let recovered = binder::unbind(&cipher, key.as_slice(), &fields.wrapped_fingerprint)?;
    if !binder::matches(&recovered, secret.fingerprint()) {
        return Err(DecryptError::IdentityMismatch);
    }

    debug!(cipher = cipher.wire_id(), "opened envelope");
    Ok(Zeroizing::new(clear[BLOCK_BYTES..].to_vec()))
}

// ---------------------------------------------------------------------------
// Provider-resolved forms
// ---------------------------------------------------------------------------

/// [`encrypt`] with the recipient resolved by a provider.
///
/// An unresolvable recipient is a hard [`EncryptError::NoRecipient`];
/// the protocol never substitutes a local or default identity.
pub fn encrypt_with<P: IdentityProvider>(
    provider: &P,
    payload: &[u8],
) -> Result<String, EncryptError> {
    let recipient = provider.recipient().ok_or(EncryptError::NoRecipient)?;
    encrypt(&recipient, payload)
}

/// [`decrypt`] with the holder's secret resolved by a provider.
pub fn decrypt_with<P: IdentityProvider>(
    provider: &P,
    token: &str,
) -> Result<Zeroizing<Vec<u8>>, DecryptError> {
    let secret = provider.holder().ok_or(DecryptError::NoIdentity)?;
    decrypt(&secret, token)
}

// ---------------------------------------------------------------------------
// Structured-value convenience (serializer supplied by the caller)
// ---------------------------------------------------------------------------

/// External collaborator turning structured values into payload bytes
/// and back. The protocol composes with one but never defines one.
pub trait Serializer {
    type Value;
    type Error;

    fn serialize(&self, value: &Self::Value) -> Result<Vec<u8>, Self::Error>;
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Value, Self::Error>;
}

/// Failure of a serializer-composed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError<E> {
    /// The caller's serializer failed.
    Codec(E),
    Encrypt(EncryptError),
    Decrypt(DecryptError),
}

impl<E: fmt::Display> fmt::Display for ValueError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "serializer failure: {}", e),
            Self::Encrypt(e) => e.fmt(f),
            Self::Decrypt(e) => e.fmt(f),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ValueError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            Self::Encrypt(e) => Some(e),
            Self::Decrypt(e) => Some(e),
        }
    }
}

/// Serialize a value, then encrypt the bytes for the recipient.
pub fn encrypt_value<S: Serializer>(
    serializer: &S,
    recipient: &RecipientIdentity,
    value: &S::Value,
) -> Result<String, ValueError<S::Error>> {
    let payload = Zeroizing::new(serializer.serialize(value).map_err(ValueError::Codec)?);
    encrypt(recipient, &payload).map_err(ValueError::Encrypt)
}

/// Decrypt a token, then deserialize the recovered payload.
pub fn decrypt_value<S: Serializer>(
    serializer: &S,
    secret: &RecipientSecret,
    token: &str,
) -> Result<S::Value, ValueError<S::Error>> {
    let payload = decrypt(secret, token).map_err(ValueError::Decrypt)?;
    serializer.deserialize(&payload).map_err(ValueError::Codec)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyProvider;

    impl IdentityProvider for EmptyProvider {
        fn recipient(&self) -> Option<RecipientIdentity> {
            None
        }

        fn holder(&self) -> Option<RecipientSecret> {
            None
        }
    }

    #[test]
    fn missing_recipient_is_a_hard_error() {
        assert_eq!(
            encrypt_with(&EmptyProvider, b"data").unwrap_err(),
            EncryptError::NoRecipient
        );
    }

    #[test]
    fn missing_holder_is_a_hard_error() {
        assert_eq!(
            decrypt_with(&EmptyProvider, "a|b|c|d").unwrap_err(),
            DecryptError::NoIdentity
        );
    }
}
