use std::sync::OnceLock;

use certseal::{
    decrypt, decrypt_value, decrypt_with, encrypt, encrypt_value, encrypt_with, envelope,
    CipherError, DecryptError, EnvelopeFormatError, Fingerprint, IdentityProvider,
    RecipientIdentity, RecipientSecret, Serializer,
};

// RSA keygen dominates test time, so each identity is generated once
// and shared across tests.
fn identity() -> &'static (RecipientIdentity, RecipientSecret) {
    static PAIR: OnceLock<(RecipientIdentity, RecipientSecret)> = OnceLock::new();
    PAIR.get_or_init(|| certseal::identity::generate(2048).unwrap())
}

fn other_identity() -> &'static (RecipientIdentity, RecipientSecret) {
    static PAIR: OnceLock<(RecipientIdentity, RecipientSecret)> = OnceLock::new();
    PAIR.get_or_init(|| certseal::identity::generate(2048).unwrap())
}

#[test]
fn roundtrip_basic() {
    let (identity, secret) = identity();
    let token = encrypt(identity, b"the aliens are alive and well").unwrap();
    let payload = decrypt(secret, &token).unwrap();
    assert_eq!(&payload[..], b"the aliens are alive and well");
}

#[test]
fn roundtrip_empty_payload() {
    let (identity, secret) = identity();
    let token = encrypt(identity, b"").unwrap();
    assert!(decrypt(secret, &token).unwrap().is_empty());
}

#[test]
fn roundtrip_large_payload() {
    let (identity, secret) = identity();
    let payload = vec![0xABu8; 65536];
    let token = encrypt(identity, &payload).unwrap();
    assert_eq!(&decrypt(secret, &token).unwrap()[..], &payload[..]);
}

#[test]
fn token_is_text_safe() {
    let (identity, _) = identity();
    let token = encrypt(identity, b"payload").unwrap();
    assert_eq!(token.matches('|').count(), 3);
    assert!(token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '|')));
}

#[test]
fn same_payload_twice_yields_distinct_tokens() {
    let (identity, secret) = identity();
    let a = encrypt(identity, b"repeatable payload").unwrap();
    let b = encrypt(identity, b"repeatable payload").unwrap();
    assert_ne!(a, b);
    assert_eq!(&decrypt(secret, &a).unwrap()[..], b"repeatable payload");
    assert_eq!(&decrypt(secret, &b).unwrap()[..], b"repeatable payload");
}

#[test]
fn tampered_ciphertext_never_passes_silently() {
    let (identity, secret) = identity();
    let token = encrypt(identity, b"integrity matters").unwrap();

    let mut fields = envelope::decode(&token).unwrap();
    let last = fields.ciphertext.len() - 1;
    fields.ciphertext[last] ^= 0x01;
    let tampered = envelope::encode(
        &fields.cipher_id,
        &fields.wrapped_key,
        &fields.ciphertext,
        &fields.wrapped_fingerprint,
    );

    // Garbling the final block almost always breaks the padding; in the
    // rare case it does not, the recovered payload must still differ.
    match decrypt(secret, &tampered) {
        Err(DecryptError::Cipher(_)) => {}
        Ok(payload) => assert_ne!(&payload[..], b"integrity matters"),
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn tampered_wrapped_key_fails_key_transport() {
    let (identity, secret) = identity();
    let token = encrypt(identity, b"payload").unwrap();

    let mut fields = envelope::decode(&token).unwrap();
    fields.wrapped_key[0] ^= 0x01;
    let tampered = envelope::encode(
        &fields.cipher_id,
        &fields.wrapped_key,
        &fields.ciphertext,
        &fields.wrapped_fingerprint,
    );

    assert!(matches!(
        decrypt(secret, &tampered).unwrap_err(),
        DecryptError::KeyTransport(_) | DecryptError::Cipher(_)
    ));
}

#[test]
fn identity_mismatch_is_its_own_error() {
    let (identity, secret) = identity();
    let token = encrypt(identity, b"for the old cert").unwrap();

    // Same private key, different (rotated) fingerprint.
    let rotated = RecipientSecret::new(
        secret.private_key().clone(),
        Fingerprint::from_bytes([0u8; 32]),
    );
    assert_eq!(
        decrypt(&rotated, &token).unwrap_err(),
        DecryptError::IdentityMismatch
    );
}

#[test]
fn unrelated_private_key_fails_before_identity_check() {
    let (identity, _) = identity();
    let (_, stranger) = other_identity();
    let token = encrypt(identity, b"not for you").unwrap();

    assert!(matches!(
        decrypt(stranger, &token).unwrap_err(),
        DecryptError::KeyTransport(_) | DecryptError::Cipher(_)
    ));
}

#[test]
fn structural_validation_precedes_cryptography() {
    let (_, secret) = identity();

    assert_eq!(
        decrypt(secret, "not an envelope at all").unwrap_err(),
        DecryptError::Envelope(EnvelopeFormatError::FieldCount(1))
    );
    assert_eq!(
        decrypt(secret, "YQ==|YQ==|YQ==|YQ==|YQ==").unwrap_err(),
        DecryptError::Envelope(EnvelopeFormatError::FieldCount(5))
    );
    assert_eq!(
        decrypt(secret, "YQ==|@@@|YQ==|YQ==").unwrap_err(),
        DecryptError::Envelope(EnvelopeFormatError::FieldEncoding(1))
    );
}

#[test]
fn unknown_cipher_id_is_rejected() {
    let (identity, secret) = identity();
    let token = encrypt(identity, b"payload").unwrap();

    let fields = envelope::decode(&token).unwrap();
    let relabeled = envelope::encode(
        b"ROT-13",
        &fields.wrapped_key,
        &fields.ciphertext,
        &fields.wrapped_fingerprint,
    );

    assert!(matches!(
        decrypt(secret, &relabeled).unwrap_err(),
        DecryptError::Cipher(CipherError::UnknownCipher(_))
    ));
}

// ---------------------------------------------------------------------------
// Provider-resolved operation
// ---------------------------------------------------------------------------

struct StaticProvider;

impl IdentityProvider for StaticProvider {
    fn recipient(&self) -> Option<RecipientIdentity> {
        Some(identity().0.clone())
    }

    fn holder(&self) -> Option<RecipientSecret> {
        Some(identity().1.clone())
    }
}

#[test]
fn provider_resolved_roundtrip() {
    let token = encrypt_with(&StaticProvider, b"resolved by provider").unwrap();
    let payload = decrypt_with(&StaticProvider, &token).unwrap();
    assert_eq!(&payload[..], b"resolved by provider");
}

// ---------------------------------------------------------------------------
// Serializer-composed operation
// ---------------------------------------------------------------------------

struct Utf8Serializer;

impl Serializer for Utf8Serializer {
    type Value = String;
    type Error = std::string::FromUtf8Error;

    fn serialize(&self, value: &String) -> Result<Vec<u8>, Self::Error> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String, Self::Error> {
        String::from_utf8(bytes.to_vec())
    }
}

#[test]
fn value_roundtrip_through_serializer() {
    let (identity, secret) = identity();
    let token = encrypt_value(&Utf8Serializer, identity, &"structured value".to_string()).unwrap();
    let value = decrypt_value(&Utf8Serializer, secret, &token).unwrap();
    assert_eq!(value, "structured value");
}
