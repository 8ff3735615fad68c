//! Error taxonomy for the envelope protocol.
//!
//! Every failure mode a caller can hit is a distinct, typed error. In
//! particular [`DecryptError::IdentityMismatch`] is kept separate from the
//! cryptographic failures: the token decrypted fine but was minted for a
//! different certificate (e.g. the recipient's cert has rotated), which is
//! actionable in a way "wrong key" is not.

use core::fmt;

// ---------------------------------------------------------------------------
// Leaf errors
// ---------------------------------------------------------------------------

/// Structural failure while parsing the four-field token.
///
/// Reported before any cryptographic operation is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeFormatError {
    /// Token did not split into exactly four fields.
    FieldCount(usize),
    /// Field at the given position (0-based) is not valid Base64.
    FieldEncoding(usize),
}

impl fmt::Display for EnvelopeFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldCount(n) => write!(f, "expected 4 envelope fields, found {}", n),
            Self::FieldEncoding(i) => write!(f, "envelope field {} is not valid base64", i),
        }
    }
}

impl std::error::Error for EnvelopeFormatError {}

/// Failure inside the symmetric cipher engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Key is not the cipher's native key length.
    KeyLength(usize),
    /// IV is not the cipher's native block length.
    IvLength(usize),
    /// Ciphertext is empty or not a whole number of blocks.
    BlockAlignment(usize),
    /// PKCS#7 validation failed on decrypt. The dominant signal of a
    /// wrong-key decryption or a tampered ciphertext.
    Padding,
    /// Decrypted payload is shorter than the embedded IV block.
    MissingIvPrefix,
    /// The envelope names a cipher this build does not implement.
    UnknownCipher(String),
    /// The OS random source failed.
    Rng,
}

impl fmt::Display for CipherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyLength(n) => write!(f, "symmetric key must be 32 bytes, got {}", n),
            Self::IvLength(n) => write!(f, "iv must be 16 bytes, got {}", n),
            Self::BlockAlignment(n) => {
                write!(f, "ciphertext length {} is not a whole number of blocks", n)
            }
            Self::Padding => write!(f, "padding validation failed"),
            Self::MissingIvPrefix => write!(f, "decrypted payload shorter than one iv block"),
            Self::UnknownCipher(id) => write!(f, "unsupported cipher id: {}", id),
            Self::Rng => write!(f, "random source unavailable"),
        }
    }
}

impl std::error::Error for CipherError {}

/// Failure while wrapping or unwrapping the one-time session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransportError {
    /// Asymmetric encryption of the session key failed (malformed public
    /// key, or a modulus too small to carry the session key).
    Wrap,
    /// Asymmetric decryption failed structurally. Usually the wrong
    /// private key.
    Unwrap,
    /// Unwrap produced a key of the wrong length. Signals the wrong
    /// private key when v1.5 padding happens to parse anyway.
    SessionKeyLength { expected: usize, got: usize },
}

impl fmt::Display for KeyTransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wrap => write!(f, "session key wrap failed"),
            Self::Unwrap => write!(f, "session key unwrap failed"),
            Self::SessionKeyLength { expected, got } => {
                write!(f, "unwrapped key is {} bytes, expected {}", got, expected)
            }
        }
    }
}

impl std::error::Error for KeyTransportError {}

// ---------------------------------------------------------------------------
// Operation errors
// ---------------------------------------------------------------------------

/// Failure while producing a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptError {
    /// The identity provider could not resolve a recipient. Never silently
    /// falls back to a local or default identity.
    NoRecipient,
    Cipher(CipherError),
    KeyTransport(KeyTransportError),
}

impl fmt::Display for EncryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecipient => write!(f, "no recipient identity available to encrypt for"),
            Self::Cipher(e) => write!(f, "cipher failure: {}", e),
            Self::KeyTransport(e) => write!(f, "key transport failure: {}", e),
        }
    }
}

impl std::error::Error for EncryptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoRecipient => None,
            Self::Cipher(e) => Some(e),
            Self::KeyTransport(e) => Some(e),
        }
    }
}

impl From<CipherError> for EncryptError {
    fn from(e: CipherError) -> Self {
        Self::Cipher(e)
    }
}

impl From<KeyTransportError> for EncryptError {
    fn from(e: KeyTransportError) -> Self {
        Self::KeyTransport(e)
    }
}

/// Failure while opening a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
    /// The identity provider could not resolve the holder's secret.
    NoIdentity,
    Envelope(EnvelopeFormatError),
    Cipher(CipherError),
    KeyTransport(KeyTransportError),
    /// Everything decrypted, but the token was minted for a different
    /// certificate than the one decrypting.
    IdentityMismatch,
}

impl fmt::Display for DecryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIdentity => write!(f, "no identity available to decrypt with"),
            Self::Envelope(e) => write!(f, "malformed envelope: {}", e),
            Self::Cipher(e) => write!(f, "cipher failure: {}", e),
            Self::KeyTransport(e) => write!(f, "key transport failure: {}", e),
            Self::IdentityMismatch => {
                write!(f, "not encrypted for the current certificate of this identity")
            }
        }
    }
}

impl std::error::Error for DecryptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Envelope(e) => Some(e),
            Self::Cipher(e) => Some(e),
            Self::KeyTransport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EnvelopeFormatError> for DecryptError {
    fn from(e: EnvelopeFormatError) -> Self {
        Self::Envelope(e)
    }
}

impl From<CipherError> for DecryptError {
    fn from(e: CipherError) -> Self {
        Self::Cipher(e)
    }
}

impl From<KeyTransportError> for DecryptError {
    fn from(e: KeyTransportError) -> Self {
        Self::KeyTransport(e)
    }
}
