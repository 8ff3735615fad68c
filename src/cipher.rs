//! Symmetric cipher engine: AES-256-CBC with PKCS#7 padding.
//!
//! The engine is selected by the wire cipher id carried in the first
//! envelope field, so decryptors dispatch on what the token says rather
//! than assuming a hard-coded algorithm. One id is implemented today;
//! the registry exists for algorithm agility.
//!
//! CBC here is deliberately unauthenticated: tampering surfaces as a
//! PKCS#7 validation failure on decrypt, and the identity binding rides
//! in a separate encrypted field.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use getrandom::getrandom;
use zeroize::Zeroizing;

use crate::error::CipherError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Session key size: AES-256.
pub const SESSION_KEY_BYTES: usize = 32;

/// Cipher block size, which is also the IV size and the length of the
/// IV prefix embedded in each encrypted field.
pub const BLOCK_BYTES: usize = 16;

/// IV size (one block).
pub const IV_BYTES: usize = BLOCK_BYTES;

// ---------------------------------------------------------------------------
// Cipher registry
// ---------------------------------------------------------------------------

/// A symmetric cipher named by the envelope's first field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cipher {
    /// AES-256 in CBC mode with PKCS#7 padding. Wire id `AES-256-CBC`.
    Aes256Cbc,
}

impl Cipher {
    /// The identifier written to (and read from) the wire.
    pub const fn wire_id(&self) -> &'static str {
        match self {
            Self::Aes256Cbc => "AES-256-CBC",
        }
    }

    /// Select the engine matching a decoded cipher-id field.
    pub fn from_wire_id(id: &[u8]) -> Result<Self, CipherError> {
        match id {
            b"AES-256-CBC" => Ok(Self::Aes256Cbc),
            other => Err(CipherError::UnknownCipher(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    /// Encrypt one padded message under a one-time key and IV.
    pub fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let engine = self.encryptor(key, iv)?;
        Ok(engine.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    /// Decrypt one padded message.
    ///
    /// A PKCS#7 failure maps to [`CipherError::Padding`], the primary
    /// signal that the session key recovered under the wrong private key.
    pub fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_BYTES != 0 {
            return Err(CipherError::BlockAlignment(ciphertext.len()));
        }
        let engine = self.decryptor(key, iv)?;
        engine
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::Padding)
    }

    fn encryptor(&self, key: &[u8], iv: &[u8]) -> Result<Aes256CbcEnc, CipherError> {
        check_lengths(key, iv)?;
        Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| CipherError::KeyLength(key.len()))
    }

    fn decryptor(&self, key: &[u8], iv: &[u8]) -> Result<Aes256CbcDec, CipherError> {
        check_lengths(key, iv)?;
        Aes256CbcDec::new_from_slices(key, iv).map_err(|_| CipherError::KeyLength(key.len()))
    }
}

fn check_lengths(key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
    if key.len() != SESSION_KEY_BYTES {
        return Err(CipherError::KeyLength(key.len()));
    }
    if iv.len() != IV_BYTES {
        return Err(CipherError::IvLength(iv.len()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Random material
// ---------------------------------------------------------------------------

/// Generate a fresh one-time session key. Used during encryption only.
pub fn session_key() -> Result<Zeroizing<[u8; SESSION_KEY_BYTES]>, CipherError> {
    let mut key = Zeroizing::new([0u8; SESSION_KEY_BYTES]);
    getrandom(key.as_mut()).map_err(|_| CipherError::Rng)?;
    Ok(key)
}

/// Generate a fresh random IV.
pub fn fresh_iv() -> Result<[u8; IV_BYTES], CipherError> {
    let mut iv = [0u8; IV_BYTES];
    getrandom(&mut iv).map_err(|_| CipherError::Rng)?;
    Ok(iv)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; SESSION_KEY_BYTES] = [0x42; SESSION_KEY_BYTES];
    const IV: [u8; IV_BYTES] = [0x17; IV_BYTES];

    #[test]
    fn roundtrip() {
        let c = Cipher::Aes256Cbc;
        let ct = c.encrypt(&KEY, &IV, b"sixteen byte msg and change").unwrap();
        assert_eq!(ct.len() % BLOCK_BYTES, 0);
        let pt = c.decrypt(&KEY, &IV, &ct).unwrap();
        assert_eq!(pt, b"sixteen byte msg and change");
    }

    #[test]
    fn empty_plaintext_pads_to_one_block() {
        let c = Cipher::Aes256Cbc;
        let ct = c.encrypt(&KEY, &IV, b"").unwrap();
        assert_eq!(ct.len(), BLOCK_BYTES);
        assert_eq!(c.decrypt(&KEY, &IV, &ct).unwrap(), b"");
    }

    #[test]
    fn rejects_bad_key_length() {
        let c = Cipher::Aes256Cbc;
        let err = c.encrypt(&KEY[..16], &IV, b"data").unwrap_err();
        assert_eq!(err, CipherError::KeyLength(16));
    }

    #[test]
    fn rejects_bad_iv_length() {
        let c = Cipher::Aes256Cbc;
        let err = c.encrypt(&KEY, &IV[..8], b"data").unwrap_err();
        assert_eq!(err, CipherError::IvLength(8));
    }

    #[test]
    fn rejects_unaligned_ciphertext() {
        let c = Cipher::Aes256Cbc;
        assert_eq!(
            c.decrypt(&KEY, &IV, &[0u8; 17]).unwrap_err(),
            CipherError::BlockAlignment(17)
        );
        assert_eq!(
            c.decrypt(&KEY, &IV, &[]).unwrap_err(),
            CipherError::BlockAlignment(0)
        );
    }

    #[test]
    fn tampering_breaks_padding() {
        let c = Cipher::Aes256Cbc;
        let mut ct = c.encrypt(&KEY, &IV, b"payload under test").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        assert_eq!(c.decrypt(&KEY, &IV, &ct).unwrap_err(), CipherError::Padding);
    }

    #[test]
    fn wrong_key_never_yields_the_plaintext() {
        let c = Cipher::Aes256Cbc;
        let ct = c.encrypt(&KEY, &IV, b"payload under test").unwrap();
        let other = [0x43u8; SESSION_KEY_BYTES];
        // Almost always a padding failure; if the garbage happens to
        // unpad, it still cannot be the original plaintext.
        match c.decrypt(&other, &IV, &ct) {
            Err(CipherError::Padding) => {}
            Ok(pt) => assert_ne!(pt, b"payload under test"),
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    // Decryptors never learn the IV: it travels as the first plaintext
    // block, so decrypting under a zero IV garbles only that block.
    #[test]
    fn zero_iv_decrypt_recovers_all_but_the_iv_block() {
        let c = Cipher::Aes256Cbc;
        let mut message = Vec::from(IV);
        message.extend_from_slice(b"the actual payload");
        let ct = c.encrypt(&KEY, &IV, &message).unwrap();

        let clear = c.decrypt(&KEY, &[0u8; IV_BYTES], &ct).unwrap();
        assert_eq!(&clear[BLOCK_BYTES..], b"the actual payload");
        assert_ne!(&clear[..BLOCK_BYTES], &IV);
    }

    #[test]
    fn wire_id_dispatch() {
        assert_eq!(Cipher::from_wire_id(b"AES-256-CBC"), Ok(Cipher::Aes256Cbc));
        assert_eq!(Cipher::Aes256Cbc.wire_id(), "AES-256-CBC");
        assert!(matches!(
            Cipher::from_wire_id(b"AES-128-GCM"),
            Err(CipherError::UnknownCipher(_))
        ));
    }

    #[test]
    fn fresh_material_is_distinct() {
        assert_ne!(*session_key().unwrap(), *session_key().unwrap());
        assert_ne!(fresh_iv().unwrap(), fresh_iv().unwrap());
    }
}
