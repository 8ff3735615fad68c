//! # certseal
//!
//! Hybrid envelope encryption bound to a recipient certificate identity.
//!
//! A sender encrypts an opaque byte payload for one recipient, producing
//! a single text-safe token; the recipient can open it only with the
//! matching private key, and a token minted for a *different* identity
//! (a rotated or unrelated certificate) is detected as its own distinct
//! failure, separate from "wrong key".
//!
//! ## Quick Start
//!
//! ```rust
//! let (identity, secret) = certseal::identity::generate(2048).unwrap();
//!
//! let token = certseal::encrypt(&identity, b"area 51 status report").unwrap();
//! let payload = certseal::decrypt(&secret, &token).unwrap();
//!
//! assert_eq!(&payload[..], b"area 51 status report");
//! ```
//!
//! ## Protocol
//!
//! - **Key transport**: a fresh 256-bit session key, RSA-wrapped
//!   (PKCS#1 v1.5) under the recipient's public key
//! - **Bulk encryption**: AES-256-CBC over `iv ++ payload`, PKCS#7 padded
//! - **Identity binding**: the recipient's certificate fingerprint,
//!   encrypted under the same session key and compared in constant time
//!   at decrypt
//! - **Wire format**: four Base64 fields joined by `|`, led by a cipher
//!   id for algorithm agility
//!
//! ## What's NOT Provided
//!
//! - Key management or certificate issuance
//! - A structured-data serializer (see [`Serializer`] for the seam)
//! - Transport of the token between sender and recipient
//! - Authenticated encryption: tampering is caught by padding
//!   validation, not a MAC

#![deny(unsafe_code)]

// ---------------------------------------------------------------------------
// Internal modules
// ---------------------------------------------------------------------------

mod binder;
mod protocol;
mod transport;

// ---------------------------------------------------------------------------
// Public modules
// ---------------------------------------------------------------------------

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod identity;

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

pub use cipher::{Cipher, IV_BYTES, SESSION_KEY_BYTES};
pub use error::{
    CipherError, DecryptError, EncryptError, EnvelopeFormatError, KeyTransportError,
};
pub use identity::{
    Fingerprint, IdentityProvider, RecipientIdentity, RecipientSecret, FINGERPRINT_BYTES,
};
pub use protocol::{
    decrypt, decrypt_value, decrypt_with, encrypt, encrypt_value, encrypt_with, Serializer,
    ValueError,
};
