//! Named elliptic curves supported for key generation
//!
//! The set is closed: every variant maps onto an OpenSSL curve NID. Names are
//! accepted in both the OpenSSL spelling (`prime256v1`, `secp384r1`) and the
//! NIST spelling (`P-256`, `P-384`), case-insensitively.

use crate::error::CertGenError;
use openssl::nid::Nid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurveIdentifier {
    /// NIST P-256, ASN1 OID prime256v1
    #[default]
    Prime256v1,
    /// NIST P-384
    Secp384r1,
    /// NIST P-521
    Secp521r1,
}

impl CurveIdentifier {
    pub const ALL: [CurveIdentifier; 3] = [
        CurveIdentifier::Prime256v1,
        CurveIdentifier::Secp384r1,
        CurveIdentifier::Secp521r1,
    ];

    /// OpenSSL NID used to look up the curve parameters
    pub fn nid(self) -> Nid {
        match self {
            CurveIdentifier::Prime256v1 => Nid::X9_62_PRIME256V1,
            CurveIdentifier::Secp384r1 => Nid::SECP384R1,
            CurveIdentifier::Secp521r1 => Nid::SECP521R1,
        }
    }

    /// Canonical OpenSSL short name
    pub fn name(self) -> &'static str {
        match self {
            CurveIdentifier::Prime256v1 => "prime256v1",
            CurveIdentifier::Secp384r1 => "secp384r1",
            CurveIdentifier::Secp521r1 => "secp521r1",
        }
    }

    /// Map an OpenSSL curve NID back onto a supported curve
    pub fn from_nid(nid: Nid) -> Option<Self> {
        Self::ALL.into_iter().find(|curve| curve.nid() == nid)
    }
}

impl fmt::Display for CurveIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveIdentifier {
    type Err = CertGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prime256v1" | "secp256r1" | "p-256" | "p256" => Ok(CurveIdentifier::Prime256v1),
            "secp384r1" | "p-384" | "p384" => Ok(CurveIdentifier::Secp384r1),
            "secp521r1" | "p-521" | "p521" => Ok(CurveIdentifier::Secp521r1),
            _ => Err(CertGenError::UnsupportedCurve(s.to_string())),
        }
    }
}

impl TryFrom<String> for CurveIdentifier {
    type Error = CertGenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurveIdentifier> for String {
    fn from(curve: CurveIdentifier) -> Self {
        curve.name().to_string()
    }
}
