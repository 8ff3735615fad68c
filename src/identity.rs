//! Recipient identity material: fingerprints, key pairs, and the
//! provider seam that resolves them.
//!
//! The protocol never looks identities up on its own. Callers (or an
//! [`IdentityProvider`] they supply) resolve "who to encrypt for" and
//! "who is decrypting" before invoking the protocol, and absence of an
//! identity is a hard error; there is no fallback to a local or
//! default identity.

use core::fmt;

use rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Fingerprint length: SHA-256 over the identity's certificate.
pub const FINGERPRINT_BYTES: usize = 32;

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Short fixed-length digest identifying an identity's current
/// certificate/key material.
///
/// The fingerprint is what binds a token to a specific recipient: it is
/// encrypted into the envelope at mint time and compared against the
/// decrypting party's own fingerprint, so a token minted for a rotated
/// or unrelated certificate is detected even when the private key still
/// unwraps the session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint([u8; FINGERPRINT_BYTES]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, FingerprintLengthError> {
        let arr: [u8; FINGERPRINT_BYTES] = bytes
            .try_into()
            .map_err(|_| FingerprintLengthError(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Fingerprint of an X.509 certificate, SHA-256 over its DER bytes.
    pub fn of_cert_der(der: &[u8]) -> Self {
        let digest = Sha256::digest(der);
        let mut out = [0u8; FINGERPRINT_BYTES];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// Fingerprint of a bare RSA public key, for deployments that have
    /// no certificate to hash. SHA-256 over `n || e` big-endian bytes.
    pub fn of_public_key(public_key: &RsaPublicKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(public_key.n().to_bytes_be());
        hasher.update(public_key.e().to_bytes_be());
        let digest = hasher.finalize();
        let mut out = [0u8; FINGERPRINT_BYTES];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_BYTES] {
        &self.0
    }

    /// Constant-time comparison against recovered fingerprint bytes.
    /// A length mismatch is a non-match.
    pub fn ct_matches(&self, candidate: &[u8]) -> bool {
        if candidate.len() != FINGERPRINT_BYTES {
            return false;
        }
        self.0.as_slice().ct_eq(candidate).into()
    }
}

/// Colon-separated uppercase hex, the usual certificate fingerprint form.
impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintLengthError(pub usize);

impl fmt::Display for FingerprintLengthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fingerprint must be {} bytes, got {}",
            FINGERPRINT_BYTES, self.0
        )
    }
}

impl std::error::Error for FingerprintLengthError {}

// ---------------------------------------------------------------------------
// Identity material
// ---------------------------------------------------------------------------

/// Who to encrypt for: a public key and its certificate fingerprint.
///
/// Supplied by the caller for each operation; never cached by the
/// protocol.
#[derive(Clone)]
pub struct RecipientIdentity {
    public_key: RsaPublicKey,
    fingerprint: Fingerprint,
}

impl RecipientIdentity {
    pub fn new(public_key: RsaPublicKey, fingerprint: Fingerprint) -> Self {
        Self {
            public_key,
            fingerprint,
        }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

/// Who is decrypting: the matching private key and the holder's own
/// current fingerprint. Supplied only at decryption time.
#[derive(Clone)]
pub struct RecipientSecret {
    private_key: RsaPrivateKey,
    fingerprint: Fingerprint,
}

impl RecipientSecret {
    pub fn new(private_key: RsaPrivateKey, fingerprint: Fingerprint) -> Self {
        Self {
            private_key,
            fingerprint,
        }
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

/// Resolves identity material for the two protocol operations.
///
/// `None` from either method means "no identity available" and must
/// surface as a typed error, never as a silent substitution.
pub trait IdentityProvider {
    /// The current encryption target.
    fn recipient(&self) -> Option<RecipientIdentity>;

    /// The current holder's decryption material.
    fn holder(&self) -> Option<RecipientSecret>;
}

/// Generate a fresh matched identity pair, fingerprinting the public
/// key. Intended for bootstrap and tests; production deployments derive
/// fingerprints from their certificates.
pub fn generate(bits: usize) -> Result<(RecipientIdentity, RecipientSecret), rsa::Error> {
    let private_key = RsaPrivateKey::new(&mut OsRng, bits)?;
    let public_key = RsaPublicKey::from(&private_key);
    let fingerprint = Fingerprint::of_public_key(&public_key);
    Ok((
        RecipientIdentity::new(public_key, fingerprint),
        RecipientSecret::new(private_key, fingerprint),
    ))
}
