//! Key transport: RSA PKCS#1 v1.5 wrapping of the one-time session key.
//!
//! The session key (32 bytes) must fit in a single RSA block after
//! padding, i.e. `modulus_bytes - 11`. Any realistic recipient key
//! (2048-bit and up) leaves ample room; the check exists so undersized
//! keys fail loudly instead of deep inside the RSA backend.

use rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::cipher::SESSION_KEY_BYTES;
use crate::error::KeyTransportError;

/// PKCS#1 v1.5 overhead per block.
const PKCS1V15_OVERHEAD: usize = 11;

/// Encrypt the session key under the recipient's public key.
pub fn wrap(public_key: &RsaPublicKey, session_key: &[u8]) -> Result<Vec<u8>, KeyTransportError> {
    if session_key.len() + PKCS1V15_OVERHEAD > public_key.size() {
        return Err(KeyTransportError::Wrap);
    }
    public_key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, session_key)
        .map_err(|_| KeyTransportError::Wrap)
}

/// Recover the session key under the holder's private key.
///
/// A structural decryption failure, or a recovered key whose length is
/// not [`SESSION_KEY_BYTES`], both signal the wrong private key.
pub fn unwrap(
    private_key: &RsaPrivateKey,
    wrapped: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeyTransportError> {
    let key = Zeroizing::new(
        private_key
            .decrypt(Pkcs1v15Encrypt, wrapped)
            .map_err(|_| KeyTransportError::Unwrap)?,
    );
    if key.len() != SESSION_KEY_BYTES {
        return Err(KeyTransportError::SessionKeyLength {
            expected: SESSION_KEY_BYTES,
            got: key.len(),
        });
    }
    Ok(key)
}
