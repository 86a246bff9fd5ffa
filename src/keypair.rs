//! EC Key Pair Generation Module
//!
//! Produces validated elliptic-curve key pairs for certificate generation.
//!
//! # Generation Steps
//! 1. Look up the curve parameters for the requested [`CurveIdentifier`]
//! 2. Generate a private scalar and public point from the OpenSSL CSPRNG
//! 3. Check the pair against the curve equation and subgroup order
//! 4. Wrap the EC key in an algorithm-tagged `PKey` container (`Id::EC`)
//!
//! Every intermediate OpenSSL object is an owning handle, so any early return
//! frees what was built so far exactly once.

use crate::curve::CurveIdentifier;
use crate::error::{CertGenError, Result};
use openssl::ec::{Asn1Flag, EcGroup, EcKey};
use openssl::pkey::{Id, PKey, PKeyRef, Private};
use std::fmt;
use tracing::{debug, trace, warn};

#[cfg(test)]
thread_local! {
    static LIVE_KEY_PAIRS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Number of key pairs alive on the current thread
#[cfg(test)]
pub(crate) fn live_key_pairs() -> usize {
    LIVE_KEY_PAIRS.with(|live| live.get())
}

/// An EC key pair owned by the certificate pipeline
///
/// The private key is never handed out. Dropping the pair releases the
/// underlying OpenSSL key.
pub struct KeyPair {
    curve: CurveIdentifier,
    pkey: PKey<Private>,
}

impl KeyPair {
    fn new(curve: CurveIdentifier, pkey: PKey<Private>) -> Self {
        #[cfg(test)]
        LIVE_KEY_PAIRS.with(|live| live.set(live.get() + 1));
        Self { curve, pkey }
    }

    pub fn curve(&self) -> CurveIdentifier {
        self.curve
    }

    /// Algorithm tag of the key container, always `Id::EC`
    pub fn algorithm(&self) -> Id {
        self.pkey.id()
    }

    pub(crate) fn pkey(&self) -> &PKeyRef<Private> {
        &self.pkey
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        trace!(curve = %self.curve, "Releasing EC key pair");
        #[cfg(test)]
        LIVE_KEY_PAIRS.with(|live| live.set(live.get() - 1));
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("curve", &self.curve)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Generator for validated EC key pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyPairGenerator;

impl KeyPairGenerator {
    /// Generate and validate a fresh key pair on `curve`
    ///
    /// # Errors
    /// - `UnsupportedCurve` if OpenSSL has no parameters for the curve
    /// - `KeyValidationFailed` if generation, the structural check, or
    ///   wrapping into a `PKey` fails
    ///
    /// No retries are attempted; the caller may retry the whole call.
    pub fn generate(curve: CurveIdentifier) -> Result<KeyPair> {
        let mut group = EcGroup::from_curve_name(curve.nid()).map_err(|e| {
            warn!(%curve, error = %e, "Curve parameters unavailable");
            CertGenError::UnsupportedCurve(format!("{}: {}", curve, e))
        })?;
        // Encode the curve by OID rather than explicit parameters
        group.set_asn1_flag(Asn1Flag::NAMED_CURVE);

        let ec_key = EcKey::generate(&group).map_err(CertGenError::KeyValidationFailed)?;

        ec_key.check_key().map_err(|e| {
            warn!(%curve, error = %e, "Generated EC key failed check");
            CertGenError::KeyValidationFailed(e)
        })?;

        let pkey = PKey::from_ec_key(ec_key).map_err(CertGenError::KeyValidationFailed)?;

        debug!(%curve, "Generated EC key pair");
        Ok(KeyPair::new(curve, pkey))
    }

    /// Parse a curve name and generate a key pair on it
    ///
    /// Unknown names fail with `UnsupportedCurve` before anything is allocated.
    pub fn generate_by_name(curve_name: &str) -> Result<KeyPair> {
        let curve: CurveIdentifier = curve_name.parse()?;
        Self::generate(curve)
    }
}
