//! PKCS#1, PKCS#8, SubjectPublicKeyInfo and X.509 encoding support.
//!
//! Private keys are imported from PKCS#1 or PKCS#8 and exported as PKCS#1,
//! which is the form the self-test feeds back into the parser. Public keys are
//! accepted in any of the common containers.

use num_bigint::BigUint;
use pkcs1::der::{
    self,
    pem::{self, LineEnding, PemLabel},
    Decode, Document, Encode, SecretDocument,
};
use x509_cert::Certificate;
use zeroize::Zeroizing;

use crate::errors::{Error, Result};
use crate::key::{RsaPrivateKey, RsaPublicKey};
use crate::traits::{PrivateKeyParts, PublicKeyParts};

const PKCS1_PRIVATE_KEY_LABEL: &str = <pkcs1::RsaPrivateKey<'static> as PemLabel>::PEM_LABEL;
const PKCS1_PUBLIC_KEY_LABEL: &str = <pkcs1::RsaPublicKey<'static> as PemLabel>::PEM_LABEL;

/// PEM label of a PKCS#8 private key.
const PKCS8_PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// PEM label of a SubjectPublicKeyInfo.
const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// PEM label of an X.509 certificate.
const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Verify that the `AlgorithmIdentifier` for a key is correct.
pub(crate) fn verify_algorithm_id(algorithm: &spki::AlgorithmIdentifierRef<'_>) -> spki::Result<()> {
    if algorithm.oid != pkcs1::ALGORITHM_OID {
        return Err(spki::Error::OidUnknown { oid: algorithm.oid });
    }

    if algorithm.parameters_any()? != der::asn1::Null.into() {
        return Err(spki::Error::KeyMalformed);
    }

    Ok(())
}

fn uint_from_ref(uint: pkcs1::UintRef<'_>) -> BigUint {
    BigUint::from_bytes_be(uint.as_bytes())
}

fn decode_pem(s: &str) -> Result<(&str, Zeroizing<Vec<u8>>)> {
    let (label, der) = pem::decode_vec(s.as_bytes())?;
    Ok((label, Zeroizing::new(der)))
}

fn unexpected_label(label: &str) -> Error {
    Error::UnexpectedPemLabel {
        label: label.into(),
    }
}

impl TryFrom<pkcs1::RsaPrivateKey<'_>> for RsaPrivateKey {
    type Error = Error;

    fn try_from(pkcs1_key: pkcs1::RsaPrivateKey<'_>) -> Result<Self> {
        // Multi-prime RSA keys not currently supported
        if pkcs1_key.version() != pkcs1::Version::TwoPrime {
            return Err(pkcs1::Error::Version.into());
        }

        let key = RsaPrivateKey::from_components(
            uint_from_ref(pkcs1_key.modulus),
            uint_from_ref(pkcs1_key.public_exponent),
            uint_from_ref(pkcs1_key.private_exponent),
            uint_from_ref(pkcs1_key.prime1),
            uint_from_ref(pkcs1_key.prime2),
            uint_from_ref(pkcs1_key.exponent1),
            uint_from_ref(pkcs1_key.exponent2),
            uint_from_ref(pkcs1_key.coefficient),
        )?;
        key.validate()?;

        Ok(key)
    }
}

impl TryFrom<pkcs1::RsaPublicKey<'_>> for RsaPublicKey {
    type Error = Error;

    fn try_from(pkcs1_key: pkcs1::RsaPublicKey<'_>) -> Result<Self> {
        RsaPublicKey::new(
            uint_from_ref(pkcs1_key.modulus),
            uint_from_ref(pkcs1_key.public_exponent),
        )
    }
}

impl RsaPrivateKey {
    /// Parses a DER-encoded PKCS#1 `RSAPrivateKey`.
    pub fn from_pkcs1_der(bytes: &[u8]) -> Result<Self> {
        Self::try_from(pkcs1::RsaPrivateKey::try_from(bytes)?)
    }

    /// Parses a PEM-encoded PKCS#1 `RSAPrivateKey` (`RSA PRIVATE KEY`).
    pub fn from_pkcs1_pem(s: &str) -> Result<Self> {
        let (label, der) = decode_pem(s)?;
        if label != PKCS1_PRIVATE_KEY_LABEL {
            return Err(unexpected_label(label));
        }
        Self::from_pkcs1_der(&der)
    }

    /// Parses a DER-encoded PKCS#8 `PrivateKeyInfo` holding an RSA key.
    pub fn from_pkcs8_der(bytes: &[u8]) -> Result<Self> {
        let private_key_info = pkcs8::PrivateKeyInfo::from_der(bytes)?;
        verify_algorithm_id(&private_key_info.algorithm)?;
        Self::from_pkcs1_der(private_key_info.private_key)
    }

    /// Parses a PEM-encoded PKCS#8 `PrivateKeyInfo` (`PRIVATE KEY`).
    pub fn from_pkcs8_pem(s: &str) -> Result<Self> {
        let (label, der) = decode_pem(s)?;
        if label != PKCS8_PRIVATE_KEY_LABEL {
            return Err(unexpected_label(label));
        }
        Self::from_pkcs8_der(&der)
    }

    /// Parses a PEM private key, picking PKCS#1 or PKCS#8 from its label.
    pub fn from_pem(s: &str) -> Result<Self> {
        let (label, der) = decode_pem(s)?;
        log::trace!("decoding private key from PEM `{}`", label);

        match label {
            PKCS1_PRIVATE_KEY_LABEL => Self::from_pkcs1_der(&der),
            PKCS8_PRIVATE_KEY_LABEL => Self::from_pkcs8_der(&der),
            other => Err(unexpected_label(other)),
        }
    }

    /// Serializes the key as a DER-encoded PKCS#1 `RSAPrivateKey`.
    pub fn to_pkcs1_der(&self) -> Result<SecretDocument> {
        let modulus = self.n().to_bytes_be();
        let public_exponent = self.e().to_bytes_be();
        let private_exponent = Zeroizing::new(self.d().to_bytes_be());
        let prime1 = Zeroizing::new(self.p().to_bytes_be());
        let prime2 = Zeroizing::new(self.q().to_bytes_be());
        let exponent1 = Zeroizing::new(self.dp().to_bytes_be());
        let exponent2 = Zeroizing::new(self.dq().to_bytes_be());
        let coefficient = Zeroizing::new(self.qinv().to_bytes_be());

        let private_key = pkcs1::RsaPrivateKey {
            modulus: pkcs1::UintRef::new(&modulus)?,
            public_exponent: pkcs1::UintRef::new(&public_exponent)?,
            private_exponent: pkcs1::UintRef::new(&private_exponent)?,
            prime1: pkcs1::UintRef::new(&prime1)?,
            prime2: pkcs1::UintRef::new(&prime2)?,
            exponent1: pkcs1::UintRef::new(&exponent1)?,
            exponent2: pkcs1::UintRef::new(&exponent2)?,
            coefficient: pkcs1::UintRef::new(&coefficient)?,
            other_prime_infos: None,
        };

        Ok(SecretDocument::try_from(&private_key)?)
    }

    /// Serializes the key as a PEM-encoded PKCS#1 `RSAPrivateKey`.
    pub fn to_pkcs1_pem(&self, line_ending: LineEnding) -> Result<Zeroizing<String>> {
        let doc = self.to_pkcs1_der()?;
        Ok(doc.to_pem(PKCS1_PRIVATE_KEY_LABEL, line_ending)?)
    }
}

impl RsaPublicKey {
    /// Parses a DER-encoded PKCS#1 `RSAPublicKey`.
    pub fn from_pkcs1_der(bytes: &[u8]) -> Result<Self> {
        Self::try_from(pkcs1::RsaPublicKey::try_from(bytes)?)
    }

    /// Parses a PEM-encoded PKCS#1 `RSAPublicKey` (`RSA PUBLIC KEY`).
    pub fn from_pkcs1_pem(s: &str) -> Result<Self> {
        let (label, der) = pem::decode_vec(s.as_bytes())?;
        if label != PKCS1_PUBLIC_KEY_LABEL {
            return Err(unexpected_label(label));
        }
        Self::from_pkcs1_der(&der)
    }

    /// Parses a DER-encoded `SubjectPublicKeyInfo` holding an RSA key.
    pub fn from_public_key_der(bytes: &[u8]) -> Result<Self> {
        let spki = spki::SubjectPublicKeyInfoRef::from_der(bytes)?;
        verify_algorithm_id(&spki.algorithm)?;

        let subject_public_key = spki
            .subject_public_key
            .as_bytes()
            .ok_or(spki::Error::KeyMalformed)?;
        Self::from_pkcs1_der(subject_public_key)
    }

    /// Parses a PEM-encoded `SubjectPublicKeyInfo` (`PUBLIC KEY`).
    pub fn from_public_key_pem(s: &str) -> Result<Self> {
        let (label, der) = pem::decode_vec(s.as_bytes())?;
        if label != PUBLIC_KEY_LABEL {
            return Err(unexpected_label(label));
        }
        Self::from_public_key_der(&der)
    }

    /// Extracts the subject public key of a DER-encoded X.509 certificate.
    ///
    /// The certificate itself is not validated.
    pub fn from_certificate_der(bytes: &[u8]) -> Result<Self> {
        let cert = Certificate::from_der(bytes)?;
        let spki = cert.tbs_certificate.subject_public_key_info.to_der()?;
        Self::from_public_key_der(&spki)
    }

    /// Extracts the subject public key of a PEM-encoded X.509 certificate
    /// (`CERTIFICATE`).
    ///
    /// The certificate itself is not validated.
    pub fn from_certificate_pem(s: &str) -> Result<Self> {
        let (label, der) = pem::decode_vec(s.as_bytes())?;
        if label != CERTIFICATE_LABEL {
            return Err(unexpected_label(label));
        }
        Self::from_certificate_der(&der)
    }

    /// Parses any PEM document that carries an RSA public key: a PKCS#1 or
    /// SubjectPublicKeyInfo public key, an X.509 certificate, or a PKCS#1 or
    /// PKCS#8 private key.
    pub fn from_pem(s: &str) -> Result<Self> {
        let (label, der) = decode_pem(s)?;
        log::trace!("decoding public key from PEM `{}`", label);

        match label {
            PKCS1_PUBLIC_KEY_LABEL => Self::from_pkcs1_der(&der),
            PUBLIC_KEY_LABEL => Self::from_public_key_der(&der),
            CERTIFICATE_LABEL => Self::from_certificate_der(&der),
            PKCS1_PRIVATE_KEY_LABEL => {
                RsaPrivateKey::from_pkcs1_der(&der).map(RsaPublicKey::from)
            }
            PKCS8_PRIVATE_KEY_LABEL => RsaPrivateKey::from_pkcs8_der(&der).map(RsaPublicKey::from),
            other => Err(unexpected_label(other)),
        }
    }

    /// Serializes the key as a DER-encoded PKCS#1 `RSAPublicKey`.
    pub fn to_pkcs1_der(&self) -> Result<Document> {
        let modulus = self.n().to_bytes_be();
        let public_exponent = self.e().to_bytes_be();

        let public_key = pkcs1::RsaPublicKey {
            modulus: pkcs1::UintRef::new(&modulus)?,
            public_exponent: pkcs1::UintRef::new(&public_exponent)?,
        };

        Ok(Document::try_from(&public_key)?)
    }
}
