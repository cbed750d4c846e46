use core::fmt;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Error, Result};
use crate::traits::{PrivateKeyParts, PublicKeyParts};

/// Represents the public part of an RSA key.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct RsaPublicKey {
    /// Modulus: product of prime numbers `p` and `q`
    n: BigUint,
    /// Public exponent: power to which a plaintext message is raised in
    /// order to encrypt it.
    e: BigUint,
}

/// Represents a whole two-prime RSA key in CRT form, public and private parts.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    /// Public components of the private key.
    pubkey_components: RsaPublicKey,
    /// Private exponent
    d: BigUint,
    /// First prime factor of N.
    p: BigUint,
    /// Second prime factor of N.
    q: BigUint,
    /// D mod (P-1)
    dp: BigUint,
    /// D mod (Q-1)
    dq: BigUint,
    /// Q^-1 mod P
    qinv: BigUint,
}

/// The minimal state of a private key: one prime factor, plus the public key
/// for variants that embed it.
///
/// The modulus and public exponent travel together as an [`RsaPublicKey`],
/// so a squeezed key never carries one without the other.
#[derive(Clone, PartialEq, Eq)]
pub struct SqueezedKey {
    prime_p: BigUint,
    public_key: Option<RsaPublicKey>,
}

impl PublicKeyParts for RsaPublicKey {
    fn n(&self) -> &BigUint {
        &self.n
    }

    fn e(&self) -> &BigUint {
        &self.e
    }
}

impl RsaPublicKey {
    /// Create a new public key from its components.
    ///
    /// The modulus must be odd and at least 3, the exponent odd and at least 3.
    pub fn new(n: BigUint, e: BigUint) -> Result<Self> {
        if n < BigUint::from(3u8) || n.is_even() {
            return Err(Error::InvalidModulus);
        }
        if e < BigUint::from(3u8) || e.is_even() {
            return Err(Error::InvalidExponent);
        }

        Ok(Self { n, e })
    }

    /// Parse a public key from its hexadecimal modulus and exponent.
    ///
    /// An optional `0x` prefix is accepted on both values.
    pub fn from_hex(n: &str, e: &str) -> Result<Self> {
        Self::new(parse_hex(n)?, parse_hex(e)?)
    }

    /// Returns the public exponent as `u64` when it fits, which it does for
    /// practically every key in use.
    pub fn e_u64(&self) -> Option<u64> {
        self.e.to_u64()
    }
}

fn parse_hex(s: &str) -> Result<BigUint> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    BigUint::parse_bytes(s.as_bytes(), 16).ok_or(Error::InvalidHex)
}

impl From<&RsaPrivateKey> for RsaPublicKey {
    fn from(private_key: &RsaPrivateKey) -> Self {
        private_key.pubkey_components.clone()
    }
}

impl From<RsaPrivateKey> for RsaPublicKey {
    fn from(private_key: RsaPrivateKey) -> Self {
        RsaPublicKey::from(&private_key)
    }
}

impl PublicKeyParts for RsaPrivateKey {
    fn n(&self) -> &BigUint {
        &self.pubkey_components.n
    }

    fn e(&self) -> &BigUint {
        &self.pubkey_components.e
    }
}

impl PrivateKeyParts for RsaPrivateKey {
    fn d(&self) -> &BigUint {
        &self.d
    }

    fn p(&self) -> &BigUint {
        &self.p
    }

    fn q(&self) -> &BigUint {
        &self.q
    }

    fn dp(&self) -> &BigUint {
        &self.dp
    }

    fn dq(&self) -> &BigUint {
        &self.dq
    }

    fn qinv(&self) -> &BigUint {
        &self.qinv
    }
}

impl RsaPrivateKey {
    /// Constructs an RSA key pair from the eight PKCS#1 components.
    ///
    /// Only checks that `n = p * q`; call [`RsaPrivateKey::validate`] for the
    /// full set of identities.
    #[allow(clippy::too_many_arguments)]
    pub fn from_components(
        n: BigUint,
        e: BigUint,
        d: BigUint,
        p: BigUint,
        q: BigUint,
        dp: BigUint,
        dq: BigUint,
        qinv: BigUint,
    ) -> Result<Self> {
        let pubkey_components = RsaPublicKey::new(n, e)?;

        if p <= BigUint::one() || q <= BigUint::one() {
            return Err(Error::InvalidPrime);
        }
        if &p * &q != pubkey_components.n {
            return Err(Error::InvalidModulus);
        }

        Ok(Self {
            pubkey_components,
            d,
            p,
            q,
            dp,
            dq,
            qinv,
        })
    }

    /// Get the public key from the private key, cloning `n` and `e`.
    pub fn to_public_key(&self) -> RsaPublicKey {
        self.pubkey_components.clone()
    }

    /// Performs basic sanity checks on the key.
    /// Returns `Ok(())` if everything is good, otherwise an appropriate error.
    pub fn validate(&self) -> Result<()> {
        if &self.p * &self.q != self.pubkey_components.n {
            return Err(Error::InvalidModulus);
        }

        // Check that de ≡ 1 mod p-1, for each prime.
        // This implies that e is coprime to each p-1 as e has a multiplicative
        // inverse. Therefore e is coprime to lcm(p-1,q-1) = λ(N).
        // It also implies that a^de ≡ a mod p as a^(p-1) ≡ 1 mod p. Thus a^de
        // ≡ a mod n for all a coprime to n, as required.
        let de = &self.d * &self.pubkey_components.e;
        for prime in [&self.p, &self.q] {
            let congruence = &de % (prime - BigUint::one());
            if !congruence.is_one() {
                return Err(Error::InvalidExponent);
            }
        }

        if self.dp != &self.d % (&self.p - BigUint::one())
            || self.dq != &self.d % (&self.q - BigUint::one())
        {
            return Err(Error::InvalidExponent);
        }

        if !((&self.qinv * &self.q) % &self.p).is_one() {
            return Err(Error::InvalidCoefficient);
        }

        Ok(())
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("pubkey_components", &self.pubkey_components)
            .finish_non_exhaustive()
    }
}

impl Zeroize for RsaPrivateKey {
    fn zeroize(&mut self) {
        self.d.zeroize();
        self.p.zeroize();
        self.q.zeroize();
        self.dp.zeroize();
        self.dq.zeroize();
        self.qinv.zeroize();
    }
}

impl Drop for RsaPrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for RsaPrivateKey {}

impl SqueezedKey {
    /// A squeezed key holding only the prime factor P.
    pub fn new(prime_p: BigUint) -> Self {
        Self {
            prime_p,
            public_key: None,
        }
    }

    /// A squeezed key holding the prime factor P and the public key.
    pub fn with_public_key(prime_p: BigUint, public_key: RsaPublicKey) -> Self {
        Self {
            prime_p,
            public_key: Some(public_key),
        }
    }

    /// The prime factor P.
    pub fn prime_p(&self) -> &BigUint {
        &self.prime_p
    }

    /// The embedded public key, if any.
    pub fn public_key(&self) -> Option<&RsaPublicKey> {
        self.public_key.as_ref()
    }

    /// The embedded modulus, if any.
    pub fn n(&self) -> Option<&BigUint> {
        self.public_key.as_ref().map(PublicKeyParts::n)
    }

    /// The embedded public exponent, if any.
    pub fn e(&self) -> Option<&BigUint> {
        self.public_key.as_ref().map(PublicKeyParts::e)
    }

    /// Picks the public key to reassemble against.
    ///
    /// An embedded key is used as-is; an external key fills the gap when
    /// nothing is embedded. When both are present they must agree.
    pub fn resolve(&self, external: Option<&RsaPublicKey>) -> Result<RsaPublicKey> {
        match (self.public_key.as_ref(), external) {
            (Some(embedded), Some(external)) if embedded != external => {
                Err(Error::PublicKeyMismatch)
            }
            (Some(embedded), _) => Ok(embedded.clone()),
            (None, Some(external)) => Ok(external.clone()),
            (None, None) => Err(Error::MissingPublicKey),
        }
    }
}

impl From<&RsaPrivateKey> for SqueezedKey {
    fn from(private_key: &RsaPrivateKey) -> Self {
        SqueezedKey::with_public_key(private_key.p.clone(), private_key.to_public_key())
    }
}

impl fmt::Debug for SqueezedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqueezedKey")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl Drop for SqueezedKey {
    fn drop(&mut self) {
        self.prime_p.zeroize();
    }
}
