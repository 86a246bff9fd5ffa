use crate::error::{CertGenError, Result};
use openssl::asn1::Asn1Integer;
use openssl::bn::BigNum;
use std::fmt;

const SERIAL_BYTES: usize = 8;

/// Random positive certificate serial number in `[0, 2^63 - 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SerialNumber(u64);

impl SerialNumber {
    /// Draw a serial from the OpenSSL CSPRNG
    ///
    /// No uniqueness is tracked across calls.
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; SERIAL_BYTES];
        openssl::rand::rand_bytes(&mut bytes).map_err(CertGenError::RandomSourceFailed)?;
        Ok(Self::from_random_bytes(bytes))
    }

    /// Fold raw bytes into a serial, clearing the sign bit of the first byte
    pub fn from_random_bytes(mut bytes: [u8; SERIAL_BYTES]) -> Self {
        // Positive when read as a signed big-endian integer
        bytes[0] &= 0x7F;
        let serial = bytes
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
        SerialNumber(serial)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn to_asn1_integer(self) -> Result<Asn1Integer> {
        BigNum::from_slice(&self.0.to_be_bytes())
            .and_then(|bn| bn.to_asn1_integer())
            .map_err(CertGenError::field("serial number"))
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}
