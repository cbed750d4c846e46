//! The versioned squeeze protocol.
//!
//! A squeezed key is serialized as a flat run of DER `INTEGER`s with no
//! enclosing `SEQUENCE`:
//!
//! ```text
//! protocol_version : INTEGER
//! variant_tag      : INTEGER   (0 = prime-only, 1 = prime-with-modulus, 2 = prime-pair-with-exponent)
//! prime-only:               prime_p
//! prime-with-modulus:       prime_p, modulus, public_exponent
//! prime-pair-with-exponent: prime_p, prime_q, public_exponent
//! ```
//!
//! New layouts are added as new protocol versions; a registered version never
//! changes, so previously squeezed keys stay decodable.

mod v0;

pub use self::v0::V0Protocol;

use core::fmt;
use core::str::FromStr;

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use pkcs1::der::{self, asn1::UintRef, Encode, Reader, SliceReader};

use crate::errors::{Error, Result};
use crate::key::SqueezedKey;

/// Selects which key fields a squeezed key embeds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqueezeVariant {
    /// Only the prime factor P. Reassembly needs the public key from
    /// elsewhere.
    PrimeOnly,
    /// P, the modulus and the public exponent.
    #[default]
    PrimeWithModulus,
    /// P, the other prime Q and the public exponent. The modulus is
    /// recomputed as P * Q when decoding, so no division is needed there.
    PrimePairWithExponent,
}

impl SqueezeVariant {
    /// All variants, in tag order.
    pub const ALL: [SqueezeVariant; 3] = [
        SqueezeVariant::PrimeOnly,
        SqueezeVariant::PrimeWithModulus,
        SqueezeVariant::PrimePairWithExponent,
    ];

    /// Wire tag of the variant.
    pub fn tag(self) -> u8 {
        match self {
            SqueezeVariant::PrimeOnly => 0,
            SqueezeVariant::PrimeWithModulus => 1,
            SqueezeVariant::PrimePairWithExponent => 2,
        }
    }

    /// Looks a variant up by its wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|variant| variant.tag() == tag)
    }

    /// Whether the variant carries enough to rebuild the public key.
    pub fn embeds_public_key(self) -> bool {
        !matches!(self, SqueezeVariant::PrimeOnly)
    }

    fn name(self) -> &'static str {
        match self {
            SqueezeVariant::PrimeOnly => "prime-only",
            SqueezeVariant::PrimeWithModulus => "prime-with-modulus",
            SqueezeVariant::PrimePairWithExponent => "prime-pair-with-exponent",
        }
    }
}

impl fmt::Display for SqueezeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqueezeVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownVariantName(s.into()))
    }
}

/// A single version of the squeeze wire format.
pub trait Protocol: Sync {
    /// Version number written at the head of every encoding.
    fn version(&self) -> u32;

    /// Serializes `key` using the layout of `variant`.
    ///
    /// Fails with [`Error::IncompleteKey`] if the variant embeds the public
    /// key and `key` has none.
    fn encode(&self, key: &SqueezedKey, variant: SqueezeVariant) -> Result<Vec<u8>>;

    /// Parses a squeezed key. Public components the variant omits are left
    /// absent; filling them is up to the caller.
    fn decode(&self, data: &[u8]) -> Result<SqueezedKey>;
}

/// Registered protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ProtocolVersion {
    /// Version 0: all three variants.
    V0,
}

impl ProtocolVersion {
    /// The version used for new encodings.
    pub const LATEST: ProtocolVersion = ProtocolVersion::V0;

    /// The version used for new encodings.
    pub fn latest() -> Self {
        Self::LATEST
    }

    /// Number written on the wire.
    pub fn number(self) -> u32 {
        match self {
            ProtocolVersion::V0 => 0,
        }
    }

    /// Looks a version up by its wire number.
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            0 => Some(ProtocolVersion::V0),
            _ => None,
        }
    }

    /// The implementation registered for this version.
    pub fn protocol(self) -> &'static dyn Protocol {
        match self {
            ProtocolVersion::V0 => &V0Protocol,
        }
    }
}

/// Encodes `key` with the latest protocol version.
pub fn encode(key: &SqueezedKey, variant: SqueezeVariant) -> Result<Vec<u8>> {
    let version = ProtocolVersion::latest();
    log::debug!(
        "encoding squeezed key: protocol version {}, variant {}",
        version.number(),
        variant
    );
    version.protocol().encode(key, variant)
}

/// Decodes a squeezed key with whichever protocol version produced it.
pub fn decode(data: &[u8]) -> Result<SqueezedKey> {
    let version = peek_version(data)?;
    log::debug!("decoding squeezed key: protocol version {}", version.number());
    version.protocol().decode(data)
}

/// Reads the leading version tag and resolves it against the registry.
///
/// Nothing after the tag is looked at.
pub fn peek_version(data: &[u8]) -> Result<ProtocolVersion> {
    let mut reader = SliceReader::new(data)?;
    let version = read_uint(&mut reader)?;

    version
        .to_u32()
        .and_then(ProtocolVersion::from_number)
        .ok_or(Error::UnsupportedVersion { version })
}

/// Appends `value` as a DER `INTEGER`.
pub(crate) fn write_uint(out: &mut Vec<u8>, value: &BigUint) -> Result<()> {
    let bytes = value.to_bytes_be();
    UintRef::new(&bytes)?.encode_to_vec(out)?;
    Ok(())
}

/// Reads the next DER `INTEGER`, which must be non-negative.
pub(crate) fn read_uint(reader: &mut SliceReader<'_>) -> der::Result<BigUint> {
    let uint: UintRef<'_> = reader.decode()?;
    Ok(BigUint::from_bytes_be(uint.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_variant_tags() {
        for variant in SqueezeVariant::ALL {
            assert_eq!(SqueezeVariant::from_tag(variant.tag()), Some(variant));
        }
        assert_eq!(SqueezeVariant::from_tag(3), None);
        assert!(!SqueezeVariant::PrimeOnly.embeds_public_key());
        assert!(SqueezeVariant::PrimePairWithExponent.embeds_public_key());
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(
            "Prime-Only".parse::<SqueezeVariant>(),
            Ok(SqueezeVariant::PrimeOnly)
        );
        assert_eq!(
            "prime-pair-with-exponent".parse::<SqueezeVariant>(),
            Ok(SqueezeVariant::PrimePairWithExponent)
        );
        assert_eq!(
            "modulus".parse::<SqueezeVariant>(),
            Err(Error::UnknownVariantName("modulus".into()))
        );
        assert_eq!(
            SqueezeVariant::PrimeWithModulus.to_string(),
            "prime-with-modulus"
        );
    }

    #[test]
    fn test_registry() {
        assert_eq!(ProtocolVersion::latest(), ProtocolVersion::V0);
        assert_eq!(ProtocolVersion::from_number(0), Some(ProtocolVersion::V0));
        assert_eq!(ProtocolVersion::from_number(1), None);
        for number in [0u32] {
            let version = ProtocolVersion::from_number(number).unwrap();
            assert_eq!(version.protocol().version(), number);
        }
    }

    #[test]
    fn test_registered_protocols_tag_their_own_version() {
        let key = SqueezedKey::new(BigUint::from(61u8));
        for version in [ProtocolVersion::V0] {
            let protocol = version.protocol();
            let encoded = protocol.encode(&key, SqueezeVariant::PrimeOnly).unwrap();
            assert_eq!(peek_version(&encoded), Ok(version));
            assert_eq!(protocol.decode(&encoded), Ok(key.clone()));
        }
    }

    #[test]
    fn test_uint_wire_format() {
        let mut out = Vec::new();
        write_uint(&mut out, &BigUint::from(0u8)).unwrap();
        write_uint(&mut out, &BigUint::from(0x7fu8)).unwrap();
        write_uint(&mut out, &BigUint::from(0x80u8)).unwrap();
        write_uint(&mut out, &BigUint::from(65537u32)).unwrap();
        assert_eq!(out, hex!("020100 02017f 02020080 0203010001").to_vec());

        let mut reader = SliceReader::new(&out).unwrap();
        for expected in [0u32, 0x7f, 0x80, 65537] {
            assert_eq!(read_uint(&mut reader).unwrap(), BigUint::from(expected));
        }
        assert!(reader.is_finished());
    }

    #[test]
    fn test_peek_version() {
        assert_eq!(
            peek_version(&hex!("020100 020100 02013d")),
            Ok(ProtocolVersion::V0)
        );
        assert_eq!(
            peek_version(&hex!("020107 020100 02013d")),
            Err(Error::UnsupportedVersion {
                version: BigUint::from(7u8)
            })
        );
        // larger than any u32
        assert_eq!(
            peek_version(&hex!("020901ffffffffffffffff")),
            Err(Error::UnsupportedVersion {
                version: BigUint::from(0x01_ffff_ffff_ffff_ffffu128)
            })
        );
        assert!(matches!(peek_version(&[]), Err(Error::Der(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_version_before_payload() {
        // a well-formed prime-only payload behind an unregistered version
        let data = hex!("020105 020100 02013d");
        assert_eq!(
            decode(&data),
            Err(Error::UnsupportedVersion {
                version: BigUint::from(5u8)
            })
        );

        // and garbage behind it is never looked at
        let data = hex!("020105 ffffffff");
        assert_eq!(
            decode(&data),
            Err(Error::UnsupportedVersion {
                version: BigUint::from(5u8)
            })
        );
    }
}
