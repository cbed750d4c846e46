//! Error types.

use num_bigint::BigUint;
use pkcs1::der;
use thiserror::Error;

use crate::protocol::SqueezeVariant;

/// Alias for [`core::result::Result`] with the `rsqueeze` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested squeeze variant embeds a field the key does not carry.
    #[error("squeeze variant {variant} requires the {field}, which the key does not carry")]
    IncompleteKey {
        /// Variant that was requested.
        variant: SqueezeVariant,
        /// Name of the missing field.
        field: &'static str,
    },

    /// No protocol is registered for the version tag found in the stream.
    #[error("unsupported squeeze protocol version {version}")]
    UnsupportedVersion {
        /// Version tag read from the stream.
        version: BigUint,
    },

    /// The variant tag is not defined by the protocol version.
    #[error("unknown squeeze variant {tag} for protocol version {version}")]
    UnknownVariant {
        /// Protocol version that was being decoded.
        version: u32,
        /// Variant tag read from the stream.
        tag: BigUint,
    },

    /// The squeezed key carries no public key and none was supplied.
    #[error("squeezed key has no modulus or public exponent and no public key was supplied")]
    MissingPublicKey,

    /// The embedded public key disagrees with the supplied one.
    #[error("embedded public key does not match the supplied public key")]
    PublicKeyMismatch,

    /// The public exponent has no inverse modulo the totient.
    #[error("public exponent is not invertible modulo the totient")]
    NonInvertibleExponent,

    /// The reassembled key failed functional verification.
    #[error("self-test failed: {0}")]
    SelfTest(SelfTestFailure),

    /// Invalid prime value.
    #[error("invalid prime value")]
    InvalidPrime,

    /// Invalid modulus.
    #[error("invalid modulus")]
    InvalidModulus,

    /// Invalid exponent.
    #[error("invalid exponent")]
    InvalidExponent,

    /// Invalid CRT coefficient.
    #[error("invalid coefficient")]
    InvalidCoefficient,

    /// Message too long for the modulus.
    #[error("message too long")]
    MessageTooLong,

    /// Decryption error.
    #[error("decryption error")]
    Decryption,

    /// Verification error.
    #[error("verification error")]
    Verification,

    /// PEM document with an unexpected type label.
    #[error("unexpected PEM label `{label}`")]
    UnexpectedPemLabel {
        /// Label found in the document.
        label: String,
    },

    /// Unknown envelope name.
    #[error("unknown envelope `{0}`")]
    UnknownEnvelope(String),

    /// Unknown squeeze variant name.
    #[error("unknown squeeze variant `{0}`")]
    UnknownVariantName(String),

    /// Unknown totient function name.
    #[error("unknown totient function `{0}`")]
    UnknownTotient(String),

    /// Malformed hexadecimal number.
    #[error("invalid hexadecimal number")]
    InvalidHex,

    /// ASN.1 DER errors.
    #[error(transparent)]
    Der(#[from] der::Error),

    /// PEM encoding errors.
    #[error("PEM error: {0}")]
    Pem(der::pem::Error),

    /// PKCS#1 errors.
    #[error(transparent)]
    Pkcs1(#[from] pkcs1::Error),

    /// PKCS#8 errors.
    #[error(transparent)]
    Pkcs8(#[from] pkcs8::Error),

    /// SubjectPublicKeyInfo errors.
    #[error(transparent)]
    Spki(#[from] spki::Error),
}

/// Stage of the self-test that did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelfTestFailure {
    /// Decrypting under the candidate key did not return the plaintext.
    #[error("encrypt/decrypt round trip failed")]
    Encryption,
    /// A signature by the candidate key did not verify.
    #[error("sign/verify round trip failed")]
    Signature,
}

impl From<der::pem::Error> for Error {
    fn from(err: der::pem::Error) -> Self {
        Error::Pem(err)
    }
}

impl From<SelfTestFailure> for Error {
    fn from(failure: SelfTestFailure) -> Self {
        Error::SelfTest(failure)
    }
}
