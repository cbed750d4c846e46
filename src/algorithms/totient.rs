//! Totient functions of the two RSA primes.

use core::fmt;
use core::str::FromStr;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;

use crate::errors::{Error, Result};

/// Totient used to derive the private exponent from the public one.
///
/// Both choices yield a private exponent that decrypts correctly. Carmichael's
/// function gives the smallest such exponent and is what current key
/// generators use; Euler's matches keys generated under the older convention.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Totient {
    /// Euler's totient: φ(n) = (p - 1)(q - 1)
    Euler,
    /// Carmichael's totient: λ(n) = lcm(p - 1, q - 1)
    #[default]
    Carmichael,
}

impl Totient {
    /// Computes the totient of `n = p * q`.
    ///
    /// Both factors must be greater than 1, otherwise [`Error::InvalidPrime`]
    /// is returned.
    pub fn apply(self, p: &BigUint, q: &BigUint) -> Result<BigUint> {
        if p <= &BigUint::one() || q <= &BigUint::one() {
            return Err(Error::InvalidPrime);
        }

        let p1 = p - BigUint::one();
        let q1 = q - BigUint::one();
        Ok(match self {
            Totient::Euler => p1 * q1,
            Totient::Carmichael => lcm(&p1, &q1),
        })
    }
}

/// lcm(a, b) = |a * b| / gcd(a, b)
fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    (a * b) / a.gcd(b)
}

impl fmt::Display for Totient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Totient::Euler => "euler",
            Totient::Carmichael => "carmichael",
        })
    }
}

impl FromStr for Totient {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("euler") {
            Ok(Totient::Euler)
        } else if s.eq_ignore_ascii_case("carmichael") {
            Ok(Totient::Carmichael)
        } else {
            Err(Error::UnknownTotient(s.into()))
        }
    }
}
