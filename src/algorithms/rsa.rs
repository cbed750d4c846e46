//! Raw RSA primitives over the CRT form of a key.

use num_bigint::BigUint;
use num_traits::Zero;
use zeroize::Zeroizing;

use crate::errors::{Error, Result};
use crate::traits::{PrivateKeyParts, PublicKeyParts};

/// Raw RSA encryption of m with the public key. No padding is performed.
#[inline]
pub(crate) fn rsa_encrypt<K: PublicKeyParts>(key: &K, m: &BigUint) -> BigUint {
    m.modpow(key.e(), key.n())
}

/// Performs raw RSA decryption with no padding, using the CRT values of the
/// key: two half-size exponentiations recombined with Garner's formula.
#[inline]
pub(crate) fn rsa_decrypt(priv_key: &impl PrivateKeyParts, c: &BigUint) -> Result<BigUint> {
    if priv_key.n().is_zero() || c >= priv_key.n() {
        return Err(Error::Decryption);
    }

    let p = priv_key.p();
    let q = priv_key.q();

    let m1 = Zeroizing::new(c.modpow(priv_key.dp(), p));
    let m2 = Zeroizing::new(c.modpow(priv_key.dq(), q));

    // h = qinv * (m1 - m2) mod p, kept non-negative by adding p first
    let m2_mod_p = Zeroizing::new(&*m2 % p);
    let diff = Zeroizing::new((&*m1 + p - &*m2_mod_p) % p);
    let h = Zeroizing::new((priv_key.qinv() * &*diff) % p);

    Ok(&*m2 + &*h * q)
}

/// Performs raw RSA decryption and checks the result against the public key.
///
/// In order to defend against errors in the CRT computation, m^e is
/// calculated, which should match the original ciphertext.
#[inline]
pub(crate) fn rsa_decrypt_and_check(
    priv_key: &impl PrivateKeyParts,
    c: &BigUint,
) -> Result<BigUint> {
    let m = rsa_decrypt(priv_key, c)?;

    let check = rsa_encrypt(priv_key, &m);
    if c != &check {
        return Err(Error::Decryption);
    }

    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::reassemble::reassemble_key;
    use crate::algorithms::totient::Totient;
    use crate::key::RsaPublicKey;
    use num_traits::FromPrimitive;

    #[test]
    fn test_crt_decrypt_matches_plain_exponentiation() {
        let public_key = RsaPublicKey::new(
            BigUint::from_u64(3233).unwrap(),
            BigUint::from_u64(17).unwrap(),
        )
        .unwrap();
        let key = reassemble_key(
            &public_key,
            &BigUint::from_u64(61).unwrap(),
            Totient::Carmichael,
        )
        .unwrap();

        for m in 0u64..3233 {
            let m = BigUint::from_u64(m).unwrap();
            let c = rsa_encrypt(&public_key, &m);
            assert_eq!(rsa_decrypt_and_check(&key, &c).unwrap(), m);
        }
    }

    #[test]
    fn test_decrypt_rejects_out_of_range() {
        let public_key = RsaPublicKey::new(
            BigUint::from_u64(3233).unwrap(),
            BigUint::from_u64(17).unwrap(),
        )
        .unwrap();
        let key = reassemble_key(
            &public_key,
            &BigUint::from_u64(61).unwrap(),
            Totient::Carmichael,
        )
        .unwrap();

        let c = BigUint::from_u64(3233).unwrap();
        assert_eq!(rsa_decrypt(&key, &c), Err(Error::Decryption));
    }
}
