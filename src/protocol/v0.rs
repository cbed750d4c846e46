//! Protocol version 0.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};
use pkcs1::der::{Reader, SliceReader};

use super::{read_uint, write_uint, Protocol, SqueezeVariant};
use crate::errors::{Error, Result};
use crate::key::{RsaPublicKey, SqueezedKey};
use crate::traits::PublicKeyParts;

/// The first and, so far, only version of the squeeze wire format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct V0Protocol;

impl V0Protocol {
    fn require_public_key(key: &SqueezedKey, variant: SqueezeVariant) -> Result<&RsaPublicKey> {
        key.public_key().ok_or(Error::IncompleteKey {
            variant,
            field: "modulus and public exponent",
        })
    }
}

impl Protocol for V0Protocol {
    fn version(&self) -> u32 {
        0
    }

    fn encode(&self, key: &SqueezedKey, variant: SqueezeVariant) -> Result<Vec<u8>> {
        let p = key.prime_p();

        let mut out = Vec::new();
        write_uint(&mut out, &BigUint::from(self.version()))?;
        write_uint(&mut out, &BigUint::from(variant.tag()))?;
        write_uint(&mut out, p)?;

        match variant {
            SqueezeVariant::PrimeOnly => {}
            SqueezeVariant::PrimeWithModulus => {
                let public_key = Self::require_public_key(key, variant)?;
                write_uint(&mut out, public_key.n())?;
                write_uint(&mut out, public_key.e())?;
            }
            SqueezeVariant::PrimePairWithExponent => {
                let public_key = Self::require_public_key(key, variant)?;
                if p.is_zero() {
                    return Err(Error::InvalidPrime);
                }
                let (q, rem) = public_key.n().div_rem(p);
                if !rem.is_zero() {
                    return Err(Error::InvalidPrime);
                }
                write_uint(&mut out, &q)?;
                write_uint(&mut out, public_key.e())?;
            }
        }

        log::trace!("encoded {} byte squeezed key", out.len());
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<SqueezedKey> {
        let mut reader = SliceReader::new(data)?;

        let version = read_uint(&mut reader)?;
        if version != BigUint::from(self.version()) {
            return Err(Error::UnsupportedVersion { version });
        }

        let tag = read_uint(&mut reader)?;
        let variant = match tag.to_u8().and_then(SqueezeVariant::from_tag) {
            Some(variant) => variant,
            None => {
                return Err(Error::UnknownVariant {
                    version: self.version(),
                    tag,
                })
            }
        };

        let prime_p = read_uint(&mut reader)?;
        let key = match variant {
            SqueezeVariant::PrimeOnly => SqueezedKey::new(prime_p),
            SqueezeVariant::PrimeWithModulus => {
                let n = read_uint(&mut reader)?;
                let e = read_uint(&mut reader)?;
                SqueezedKey::with_public_key(prime_p, RsaPublicKey::new(n, e)?)
            }
            SqueezeVariant::PrimePairWithExponent => {
                let q = read_uint(&mut reader)?;
                let e = read_uint(&mut reader)?;
                let n = &prime_p * &q;
                SqueezedKey::with_public_key(prime_p, RsaPublicKey::new(n, e)?)
            }
        };

        log::trace!("decoded {} squeezed key", variant);
        Ok(reader.finish(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use num_traits::FromPrimitive;

    fn toy_key() -> SqueezedKey {
        SqueezedKey::with_public_key(
            BigUint::from_u64(61).unwrap(),
            RsaPublicKey::new(
                BigUint::from_u64(3233).unwrap(),
                BigUint::from_u64(17).unwrap(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_encode_prime_only() {
        let encoded = V0Protocol
            .encode(&toy_key(), SqueezeVariant::PrimeOnly)
            .unwrap();
        assert_eq!(encoded, hex!("020100 020100 02013d").to_vec());

        // the public key is not needed for this variant
        let bare = SqueezedKey::new(BigUint::from_u64(61).unwrap());
        assert_eq!(
            V0Protocol.encode(&bare, SqueezeVariant::PrimeOnly).unwrap(),
            encoded
        );
    }

    #[test]
    fn test_encode_prime_with_modulus() {
        let encoded = V0Protocol
            .encode(&toy_key(), SqueezeVariant::PrimeWithModulus)
            .unwrap();
        assert_eq!(encoded, hex!("020100 020101 02013d 02020ca1 020111").to_vec());
    }

    #[test]
    fn test_encode_prime_pair() {
        let encoded = V0Protocol
            .encode(&toy_key(), SqueezeVariant::PrimePairWithExponent)
            .unwrap();
        assert_eq!(encoded, hex!("020100 020102 02013d 020135 020111").to_vec());
    }

    #[test]
    fn test_encode_incomplete_key() {
        let bare = SqueezedKey::new(BigUint::from_u64(61).unwrap());
        for variant in [
            SqueezeVariant::PrimeWithModulus,
            SqueezeVariant::PrimePairWithExponent,
        ] {
            assert!(matches!(
                V0Protocol.encode(&bare, variant),
                Err(Error::IncompleteKey { variant: v, .. }) if v == variant
            ));
        }
    }

    #[test]
    fn test_encode_prime_pair_rejects_non_divisor() {
        let key = SqueezedKey::with_public_key(
            BigUint::from_u64(59).unwrap(),
            toy_key().public_key().unwrap().clone(),
        );
        assert_eq!(
            V0Protocol.encode(&key, SqueezeVariant::PrimePairWithExponent),
            Err(Error::InvalidPrime)
        );
    }

    #[test]
    fn test_decode_all_variants() {
        let key = toy_key();
        for variant in SqueezeVariant::ALL {
            let encoded = V0Protocol.encode(&key, variant).unwrap();
            let decoded = V0Protocol.decode(&encoded).unwrap();

            assert_eq!(decoded.prime_p(), key.prime_p());
            if variant.embeds_public_key() {
                assert_eq!(decoded.public_key(), key.public_key());
            } else {
                assert_eq!(decoded.public_key(), None);
            }
        }
    }

    #[test]
    fn test_decode_unknown_variant() {
        assert_eq!(
            V0Protocol.decode(&hex!("020100 020103 02013d")),
            Err(Error::UnknownVariant {
                version: 0,
                tag: BigUint::from_u64(3).unwrap(),
            })
        );
    }

    #[test]
    fn test_decode_wrong_version() {
        assert_eq!(
            V0Protocol.decode(&hex!("020101 020100 02013d")),
            Err(Error::UnsupportedVersion {
                version: BigUint::from_u64(1).unwrap(),
            })
        );
    }

    #[test]
    fn test_decode_truncated() {
        // prime-with-modulus missing its exponent
        let res = V0Protocol.decode(&hex!("020100 020101 02013d 02020ca1"));
        assert!(matches!(res, Err(Error::Der(_))));
    }

    #[test]
    fn test_decode_rejects_trailing_data() {
        let res = V0Protocol.decode(&hex!("020100 020100 02013d 020100"));
        assert!(matches!(res, Err(Error::Der(_))));
    }

    #[test]
    fn test_decode_rejects_negative_integer() {
        let res = V0Protocol.decode(&hex!("020100 020100 0201ff"));
        assert!(matches!(res, Err(Error::Der(_))));
    }
}
