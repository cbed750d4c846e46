//! Reassembly of a CRT private key from the public key and one prime factor.

use num_bigint::{BigUint, IntoBigUint, ModInverse};
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::algorithms::totient::Totient;
use crate::errors::{Error, Result};
use crate::key::{RsaPrivateKey, RsaPublicKey};
use crate::traits::PublicKeyParts;

/// Derives the full private key from the public key and the prime factor `p`.
///
/// `q = n / p`, `d = e^-1 mod totient(p, q)`, `dp = d mod (p - 1)`,
/// `dq = d mod (q - 1)` and `qinv = q^-1 mod p`.
///
/// `p` must be a factor of `n` other than 1 and `n` itself, otherwise
/// [`Error::InvalidPrime`] is returned. Primality is not tested: a composite
/// factor yields a key that fails the self-test.
pub fn reassemble_key(
    public_key: &RsaPublicKey,
    p: &BigUint,
    totient: Totient,
) -> Result<RsaPrivateKey> {
    let n = public_key.n();
    let e = public_key.e();

    if p <= &BigUint::one() || p >= n {
        return Err(Error::InvalidPrime);
    }

    let (q, rem) = n.div_rem(p);
    if !rem.is_zero() {
        return Err(Error::InvalidPrime);
    }

    let t = totient.apply(p, &q)?;
    let d = e
        .clone()
        .mod_inverse(&t)
        .and_then(IntoBigUint::into_biguint)
        .ok_or(Error::NonInvertibleExponent)?;

    let dp = &d % (p - BigUint::one());
    let dq = &d % (&q - BigUint::one());
    let qinv = q
        .clone()
        .mod_inverse(p)
        .and_then(IntoBigUint::into_biguint)
        .ok_or(Error::InvalidPrime)?;

    RsaPrivateKey::from_components(n.clone(), e.clone(), d, p.clone(), q, dp, dq, qinv)
}
