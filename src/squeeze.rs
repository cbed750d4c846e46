//! The squeeze and reassemble workflows.
//!
//! Squeezing encodes a private key with the latest protocol version and
//! wraps it in an [`Envelope`]. Before the bytes are handed back they are
//! reassembled, exported to PKCS#1 and self-tested against the original public
//! key, so a squeezed key that cannot be restored is never returned.

use rand_core::CryptoRngCore;

use crate::algorithms::reassemble::reassemble_key;
use crate::algorithms::totient::Totient;
use crate::envelope::Envelope;
use crate::errors::Result;
use crate::key::{RsaPrivateKey, RsaPublicKey, SqueezedKey};
use crate::protocol::{self, SqueezeVariant};
use crate::selftest::self_test;

/// Options for [`squeeze`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SqueezeOptions {
    /// Which key fields to embed.
    pub variant: SqueezeVariant,
    /// How to package the protocol bytes.
    pub envelope: Envelope,
}

impl SqueezeOptions {
    /// Sets the squeeze variant.
    pub fn with_variant(mut self, variant: SqueezeVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Sets the envelope.
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }
}

/// Options for [`reassemble`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReassembleOptions {
    /// How the protocol bytes are packaged.
    pub envelope: Envelope,
    /// Totient used to derive the private exponent.
    pub totient: Totient,
    /// Public key to use when the squeezed key does not embed one. If both are
    /// present they must be equal.
    pub public_key: Option<RsaPublicKey>,
}

impl ReassembleOptions {
    /// Sets the envelope.
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    /// Sets the totient.
    pub fn with_totient(mut self, totient: Totient) -> Self {
        self.totient = totient;
        self
    }

    /// Supplies the public key.
    pub fn with_public_key(mut self, public_key: RsaPublicKey) -> Self {
        self.public_key = Some(public_key);
        self
    }
}

/// Squeezes `key` and returns the packaged bytes.
///
/// The result is reassembled and self-tested before it is returned; any
/// failure along the way is returned instead of the bytes.
pub fn squeeze<R: CryptoRngCore + ?Sized>(
    rng: &mut R,
    key: &RsaPrivateKey,
    opts: &SqueezeOptions,
) -> Result<Vec<u8>> {
    let public_key = key.to_public_key();

    let encoded = protocol::encode(&SqueezedKey::from(key), opts.variant)?;
    let packaged = opts.envelope.encode(&encoded)?;
    log::trace!(
        "squeezed key: {} protocol bytes, {} packaged bytes",
        encoded.len(),
        packaged.len()
    );

    log::debug!("verifying squeezed key");
    let reassemble_opts = ReassembleOptions {
        envelope: opts.envelope,
        totient: Totient::default(),
        public_key: Some(public_key.clone()),
    };
    let restored = reassemble(&packaged, &reassemble_opts)?;
    let der = restored.to_pkcs1_der()?;
    self_test(rng, der.as_bytes(), &public_key)?;

    Ok(packaged)
}

/// Restores a private key from bytes produced by [`squeeze`].
pub fn reassemble(data: &[u8], opts: &ReassembleOptions) -> Result<RsaPrivateKey> {
    let encoded = opts.envelope.decode(data)?;
    let squeezed = protocol::decode(&encoded)?;
    let public_key = squeezed.resolve(opts.public_key.as_ref())?;

    log::debug!("reassembling private key with {} totient", opts.totient);
    reassemble_key(&public_key, squeezed.prime_p(), opts.totient)
}
