//! Functional verification of a reassembled key.
//!
//! A candidate private key is checked against the public key it is meant to
//! pair with: a PKCS#1 v1.5 encryption under the public key must decrypt with
//! the candidate, and a PKCS#1 v1.5 SHA-256 signature by the candidate must
//! verify under the public key.

use rand_core::CryptoRngCore;
use sha2::Sha256;

use crate::algorithms::pkcs1v15;
use crate::errors::{Error, Result, SelfTestFailure};
use crate::key::{RsaPrivateKey, RsaPublicKey};

/// Plaintext encrypted and signed during the self-test.
pub const TEST_VECTOR: &[u8] = b"Test vector";

/// Parses `candidate` as a DER-encoded PKCS#1 private key and runs
/// [`self_test_key`] on it.
pub fn self_test<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    candidate: &[u8],
    reference: &RsaPublicKey,
) -> Result<()> {
    let key = RsaPrivateKey::from_pkcs1_der(candidate)?;
    self_test_key(rng, &key, reference)
}

/// Checks that `key` decrypts and signs for `reference`.
pub fn self_test_key<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    key: &RsaPrivateKey,
    reference: &RsaPublicKey,
) -> Result<()> {
    check_encryption(rng, key, reference).map_err(|err| {
        log::warn!("self-test encryption round trip failed: {}", err);
        SelfTestFailure::Encryption
    })?;

    check_signature(key, reference).map_err(|err| {
        log::warn!("self-test signature round trip failed: {}", err);
        SelfTestFailure::Signature
    })?;

    log::debug!("self-test passed");
    Ok(())
}

fn check_encryption<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    key: &RsaPrivateKey,
    reference: &RsaPublicKey,
) -> Result<()> {
    let ciphertext = pkcs1v15::encrypt(rng, reference, TEST_VECTOR)?;
    let plaintext = pkcs1v15::decrypt(key, &ciphertext)?;
    if plaintext != TEST_VECTOR {
        return Err(Error::Decryption);
    }
    Ok(())
}

fn check_signature(key: &RsaPrivateKey, reference: &RsaPublicKey) -> Result<()> {
    let signature = pkcs1v15::sign::<Sha256>(key, TEST_VECTOR)?;
    pkcs1v15::verify::<Sha256>(reference, TEST_VECTOR, &signature)
}
