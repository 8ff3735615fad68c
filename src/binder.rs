//! Identity binder: ties a token to the recipient's current certificate.
//!
//! The recipient's fingerprint is encrypted under the same one-time
//! session key and IV as the payload, as its own short message in the
//! fourth envelope field. At decrypt time the recovered fingerprint is
//! compared, in constant time, against the decrypting party's own
//! fingerprint. This catches the case where the private key still
//! unwraps the session key but the token was minted for a since-rotated
//! or entirely different identity.
//!
//! Bind and unbind are two independent short-lived cipher invocations;
//! no cipher state is shared with the payload encryption.

use zeroize::Zeroizing;

use crate::cipher::{Cipher, BLOCK_BYTES};
use crate::error::CipherError;
use crate::identity::Fingerprint;

/// Encrypt `iv ++ fingerprint`, the same convention the payload uses.
pub fn bind(
    cipher: &Cipher,
    key: &[u8],
    iv: &[u8],
    fingerprint: &Fingerprint,
) -> Result<Vec<u8>, CipherError> {
    let mut message = Zeroizing::new(Vec::with_capacity(iv.len() + fingerprint.as_bytes().len()));
    message.extend_from_slice(iv);
    message.extend_from_slice(fingerprint.as_bytes());
    cipher.encrypt(key, iv, &message)
}

/// Recover the bound fingerprint bytes from the fourth envelope field.
///
/// Decrypts under a zero IV and discards the leading block: the real IV
/// rides inside the ciphertext and only garbles the block that carried
/// it.
pub fn unbind(
    cipher: &Cipher,
    key: &[u8],
    wrapped: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    let clear = Zeroizing::new(cipher.decrypt(key, &[0u8; BLOCK_BYTES], wrapped)?);
    if clear.len() < BLOCK_BYTES {
        return Err(CipherError::MissingIvPrefix);
    }
    Ok(Zeroizing::new(clear[BLOCK_BYTES..].to_vec()))
}

/// Constant-time check of recovered fingerprint bytes against the
/// holder's own fingerprint.
pub fn matches(recovered: &[u8], own: &Fingerprint) -> bool {
    own.ct_matches(recovered)
}
