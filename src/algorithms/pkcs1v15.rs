//! PKCS#1 v1.5 encryption and signatures as described in [RFC8017 § 7.2 and § 8.2].
//!
//! Only the self-test exercises a key through these; they are not exposed.
//!
//! [RFC8017 § 7.2 and § 8.2]: https://datatracker.ietf.org/doc/html/rfc8017

use const_oid::AssociatedOid;
use digest::Digest;
use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroizing;

use crate::algorithms::pad::{uint_to_be_pad, uint_to_zeroizing_be_pad};
use crate::algorithms::rsa::{rsa_decrypt_and_check, rsa_encrypt};
use crate::errors::{Error, Result};
use crate::traits::{PrivateKeyParts, PublicKeyParts};

/// Fills the provided slice with random values, which are guaranteed
/// to not be zero.
#[inline]
fn non_zero_random_bytes<R: CryptoRngCore + ?Sized>(rng: &mut R, data: &mut [u8]) {
    rng.fill_bytes(data);

    for el in data {
        if *el == 0u8 {
            while *el == 0u8 {
                rng.fill_bytes(core::slice::from_mut(el));
            }
        }
    }
}

/// Applied the padding scheme from PKCS#1 v1.5 for encryption.  The message must be no longer than
/// the length of the public modulus minus 11 bytes.
pub(crate) fn pkcs1v15_encrypt_pad<R>(
    rng: &mut R,
    msg: &[u8],
    k: usize,
) -> Result<Zeroizing<Vec<u8>>>
where
    R: CryptoRngCore + ?Sized,
{
    if msg.len() + 11 > k {
        return Err(Error::MessageTooLong);
    }

    // EM = 0x00 || 0x02 || PS || 0x00 || M
    let mut em = Zeroizing::new(vec![0u8; k]);
    em[1] = 2;
    non_zero_random_bytes(rng, &mut em[2..k - msg.len() - 1]);
    em[k - msg.len() - 1] = 0;
    em[k - msg.len()..].copy_from_slice(msg);
    Ok(em)
}

/// Removes the encryption padding scheme from PKCS#1 v1.5.
#[inline]
pub(crate) fn pkcs1v15_encrypt_unpad(em: Zeroizing<Vec<u8>>, k: usize) -> Result<Vec<u8>> {
    let (valid, out, index) = decrypt_inner(em, k)?;
    if valid == 0 {
        return Err(Error::Decryption);
    }

    Ok(out[index as usize..].to_vec())
}

/// Removes the PKCS1v15 padding It returns one or zero in valid that indicates whether the
/// plaintext was correctly structured. In either case, the plaintext is
/// returned in em so that it may be read independently of whether it was valid
/// in order to maintain constant memory access patterns. If the plaintext was
/// valid then index contains the index of the original message in em.
#[inline]
fn decrypt_inner(em: Zeroizing<Vec<u8>>, k: usize) -> Result<(u8, Zeroizing<Vec<u8>>, u32)> {
    if k < 11 || em.len() != k {
        return Err(Error::Decryption);
    }

    let first_byte_is_zero = em[0].ct_eq(&0u8);
    let second_byte_is_two = em[1].ct_eq(&2u8);

    // The remainder of the plaintext must be a string of non-zero random
    // octets, followed by a 0, followed by the message.
    //   looking_for_index: 1 iff we are still looking for the zero.
    //   index: the offset of the first zero byte.
    let mut looking_for_index = 1u8;
    let mut index = 0u32;

    for (i, el) in em.iter().enumerate().skip(2) {
        let equals0 = el.ct_eq(&0u8);
        index.conditional_assign(&(i as u32), Choice::from(looking_for_index) & equals0);
        looking_for_index.conditional_assign(&0u8, equals0);
    }

    // The PS padding must be at least 8 bytes long, and it starts two
    // bytes into em.
    let valid_ps = Choice::from((((2i32 + 8i32 - index as i32 - 1i32) >> 31) & 1) as u8);
    let valid =
        first_byte_is_zero & second_byte_is_two & Choice::from(!looking_for_index & 1) & valid_ps;
    index = u32::conditional_select(&0, &(index + 1), valid);

    Ok((valid.unwrap_u8(), em, index))
}

#[inline]
pub(crate) fn pkcs1v15_sign_pad(prefix: &[u8], hashed: &[u8], k: usize) -> Result<Vec<u8>> {
    let hash_len = hashed.len();
    let t_len = prefix.len() + hashed.len();
    if k < t_len + 11 {
        return Err(Error::MessageTooLong);
    }

    // EM = 0x00 || 0x01 || PS || 0x00 || T
    let mut em = vec![0xff; k];
    em[0] = 0;
    em[1] = 1;
    em[k - t_len - 1] = 0;
    em[k - t_len..k - hash_len].copy_from_slice(prefix);
    em[k - hash_len..k].copy_from_slice(hashed);

    Ok(em)
}

#[inline]
pub(crate) fn pkcs1v15_sign_unpad(prefix: &[u8], hashed: &[u8], em: &[u8], k: usize) -> Result<()> {
    let hash_len = hashed.len();
    let t_len = prefix.len() + hashed.len();
    if k < t_len + 11 || em.len() != k {
        return Err(Error::Verification);
    }

    // EM = 0x00 || 0x01 || PS || 0x00 || T
    let mut ok = em[0].ct_eq(&0u8);
    ok &= em[1].ct_eq(&1u8);
    ok &= em[k - hash_len..k].ct_eq(hashed);
    ok &= em[k - t_len..k - hash_len].ct_eq(prefix);
    ok &= em[k - t_len - 1].ct_eq(&0u8);

    for el in em.iter().skip(2).take(k - t_len - 3) {
        ok &= el.ct_eq(&0xff)
    }

    if ok.unwrap_u8() != 1 {
        return Err(Error::Verification);
    }

    Ok(())
}

/// prefix = 0x30 <oid_len + 8 + digest_len> 0x30 <oid_len + 4> 0x06 <oid_len> oid 0x05 0x00 0x04 <digest_len>
#[inline]
pub(crate) fn pkcs1v15_generate_prefix<D>() -> Vec<u8>
where
    D: Digest + AssociatedOid,
{
    let oid = D::OID.as_bytes();
    let oid_len = oid.len() as u8;
    let digest_len = <D as Digest>::output_size() as u8;
    let mut v = vec![
        0x30,
        oid_len + 8 + digest_len,
        0x30,
        oid_len + 4,
        0x6,
        oid_len,
    ];
    v.extend_from_slice(oid);
    v.extend_from_slice(&[0x05, 0x00, 0x04, digest_len]);
    v
}

/// Encrypts the given message with RSA and the padding scheme from PKCS#1 v1.5.
#[inline]
pub(crate) fn encrypt<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    pub_key: &impl PublicKeyParts,
    msg: &[u8],
) -> Result<Vec<u8>> {
    let em = pkcs1v15_encrypt_pad(rng, msg, pub_key.size())?;
    let int = BigUint::from_bytes_be(&em);
    uint_to_be_pad(rsa_encrypt(pub_key, &int), pub_key.size())
}

/// Decrypts a ciphertext using RSA and the padding scheme from PKCS#1 v1.5.
#[inline]
pub(crate) fn decrypt(priv_key: &impl PrivateKeyParts, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let c = BigUint::from_bytes_be(ciphertext);
    let em = rsa_decrypt_and_check(priv_key, &c)?;
    let em = uint_to_zeroizing_be_pad(em, priv_key.size())?;

    pkcs1v15_encrypt_unpad(em, priv_key.size())
}

/// Signs the digest of `msg` under `D` using RSASSA-PKCS1-V1_5-SIGN.
///
/// This function is deterministic.
#[inline]
pub(crate) fn sign<D>(priv_key: &impl PrivateKeyParts, msg: &[u8]) -> Result<Vec<u8>>
where
    D: Digest + AssociatedOid,
{
    let prefix = pkcs1v15_generate_prefix::<D>();
    let hashed = D::digest(msg);
    let em = pkcs1v15_sign_pad(&prefix, &hashed, priv_key.size())?;

    let em = BigUint::from_bytes_be(&em);
    uint_to_zeroizing_be_pad(rsa_decrypt_and_check(priv_key, &em)?, priv_key.size())
        .map(|sig| sig.to_vec())
}

/// Verifies an RSA PKCS#1 v1.5 signature over the digest of `msg` under `D`.
#[inline]
pub(crate) fn verify<D>(pub_key: &impl PublicKeyParts, msg: &[u8], sig: &[u8]) -> Result<()>
where
    D: Digest + AssociatedOid,
{
    let sig = BigUint::from_bytes_be(sig);
    if &sig >= pub_key.n() {
        return Err(Error::Verification);
    }

    let prefix = pkcs1v15_generate_prefix::<D>();
    let hashed = D::digest(msg);
    let em = uint_to_be_pad(rsa_encrypt(pub_key, &sig), pub_key.size())?;

    pkcs1v15_sign_unpad(&prefix, &hashed, &em, pub_key.size())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
    use sha2::Sha256;

    #[test]
    fn test_non_zero_bytes() {
        for _ in 0..10 {
            let mut rng = ChaCha8Rng::from_seed([42; 32]);
            let mut b = vec![0u8; 512];
            non_zero_random_bytes(&mut rng, &mut b);
            for el in &b {
                assert_ne!(*el, 0u8);
            }
        }
    }

    #[test]
    fn test_encrypt_tiny_no_crash() {
        let mut rng = ChaCha8Rng::from_seed([42; 32]);
        let k = 8;
        let message = vec![1u8; 4];
        let res = pkcs1v15_encrypt_pad(&mut rng, &message, k);
        assert_eq!(res.unwrap_err(), Error::MessageTooLong);
    }

    #[test]
    fn test_encrypt_pad_unpad() {
        let mut rng = ChaCha8Rng::from_seed([7; 32]);
        let k = 64;
        let message = b"Test vector";
        let em = pkcs1v15_encrypt_pad(&mut rng, message, k).unwrap();
        assert_eq!(em[0], 0);
        assert_eq!(em[1], 2);
        assert_eq!(pkcs1v15_encrypt_unpad(em, k).unwrap(), message.to_vec());
    }

    #[test]
    fn test_sign_pad_unpad() {
        let prefix = pkcs1v15_generate_prefix::<Sha256>();
        let hashed = Sha256::digest(b"Test vector");
        let k = 128;
        let mut em = pkcs1v15_sign_pad(&prefix, &hashed, k).unwrap();
        pkcs1v15_sign_unpad(&prefix, &hashed, &em, k).unwrap();

        em[k - 1] ^= 1;
        assert_eq!(
            pkcs1v15_sign_unpad(&prefix, &hashed, &em, k),
            Err(Error::Verification)
        );
    }

    #[test]
    fn test_sha256_prefix() {
        assert_eq!(
            pkcs1v15_generate_prefix::<Sha256>(),
            hex!("3031300d060960864801650304020105000420").to_vec()
        );
    }
}
