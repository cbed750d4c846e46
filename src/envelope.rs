//! Outer wrapping of squeezed key bytes.

use core::fmt;
use core::str::FromStr;

use pkcs1::der::pem::{self, LineEnding};

use crate::errors::{Error, Result};

/// Type label of PEM-wrapped squeezed keys.
pub const PEM_LABEL: &str = "SQUEEZED RSA PRIVATE KEY";

/// How squeezed key bytes are packaged for storage or transport.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Envelope {
    /// The raw protocol bytes.
    #[default]
    Der,
    /// RFC 7468 text with the [`PEM_LABEL`] type label.
    Pem,
}

impl Envelope {
    /// All envelopes.
    pub const ALL: [Envelope; 2] = [Envelope::Der, Envelope::Pem];

    /// Packages protocol bytes.
    pub fn encode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Envelope::Der => Ok(data.to_vec()),
            Envelope::Pem => {
                let text = pem::encode_string(PEM_LABEL, LineEnding::LF, data)?;
                Ok(text.into_bytes())
            }
        }
    }

    /// Recovers the protocol bytes from a package built by [`Envelope::encode`].
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Envelope::Der => Ok(data.to_vec()),
            Envelope::Pem => {
                let (label, bytes) = pem::decode_vec(data)?;
                if label != PEM_LABEL {
                    return Err(Error::UnexpectedPemLabel {
                        label: label.into(),
                    });
                }
                Ok(bytes)
            }
        }
    }

    fn name(self) -> &'static str {
        match self {
            Envelope::Der => "der",
            Envelope::Pem => "pem",
        }
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Envelope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|envelope| envelope.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownEnvelope(s.into()))
    }
}
