//! Envelope codec: the four-field text token.
//!
//! Wire layout, fixed and positional:
//!
//! ```text
//! base64(cipher-id) | base64(wrapped-key) | base64(ciphertext) | base64(wrapped-fingerprint)
//! ```
//!
//! Fields use the standard Base64 alphabet, so the `|` delimiter can
//! never appear inside a field. The codec is purely structural: it
//! validates shape and text-encoding, never cryptography. Decoding is
//! strict: a field with stray bytes is rejected rather than skipped.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::EnvelopeFormatError;

/// Field separator. Not part of the Base64 alphabet.
pub const DELIMITER: char = '|';

/// An envelope is exactly four fields.
pub const FIELD_COUNT: usize = 4;

/// Decoded envelope fields, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeFields {
    pub cipher_id: Vec<u8>,
    pub wrapped_key: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub wrapped_fingerprint: Vec<u8>,
}

/// Assemble the token from its four byte-fields.
pub fn encode(
    cipher_id: &[u8],
    wrapped_key: &[u8],
    ciphertext: &[u8],
    wrapped_fingerprint: &[u8],
) -> String {
    let fields = [cipher_id, wrapped_key, ciphertext, wrapped_fingerprint];
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        out.push_str(&STANDARD.encode(field));
    }
    out
}

/// Split and decode a token.
///
/// Fails if the field count is not exactly four or any field is not
/// valid Base64, before any cryptographic work happens downstream.
pub fn decode(token: &str) -> Result<EnvelopeFields, EnvelopeFormatError> {
    let parts: Vec<&str> = token.split(DELIMITER).collect();
    let [cipher_id, wrapped_key, ciphertext, wrapped_fingerprint]: [&str; FIELD_COUNT] = parts
        .as_slice()
        .try_into()
        .map_err(|_| EnvelopeFormatError::FieldCount(parts.len()))?;

    let field = |index: usize, text: &str| {
        STANDARD
            .decode(text)
            .map_err(|_| EnvelopeFormatError::FieldEncoding(index))
    };

    Ok(EnvelopeFields {
        cipher_id: field(0, cipher_id)?,
        wrapped_key: field(1, wrapped_key)?,
        ciphertext: field(2, ciphertext)?,
        wrapped_fingerprint: field(3, wrapped_fingerprint)?,
    })
}
