//! Self-Signed EC Certificate Generation Module
//!
//! Builds X.509v3 test certificates around a freshly generated EC key pair.
//!
//! # Certificate Properties
//! - **Version**: X.509v3 (encoded as `2`)
//! - **Serial Number**: Random 63-bit positive integer
//! - **Validity**: Exactly 365 days (31,536,000 seconds) from generation time
//! - **Subject**: C, ST, L, O, CN in that order
//! - **Issuer**: Same as subject
//! - **Public Key**: EC key on the requested curve
//! - **Signature**: ECDSA with SHA-256 under [`SignaturePolicy::SelfSigned`],
//!   absent under [`SignaturePolicy::Unsigned`]
//!
//! # Key Lifetime
//! The key pair lives only for the duration of [`CertificateBuilder::build`].
//! It is dropped once the public key is embedded and, under the self-signed
//! policy, once the signature is written. The private key is never returned.
//!
//! # Example
//! ```rust,no_run
//! use ec_testcert::{CertificateBuilder, CurveIdentifier, SubjectAttributes};
//! # fn example() -> ec_testcert::Result<()> {
//!
//! let subject = SubjectAttributes::new()
//!     .country("US".to_string())
//!     .state("California".to_string())
//!     .locality("San Francisco".to_string())
//!     .organization("Example Corporation".to_string())
//!     .common_name("localhost".to_string());
//!
//! let certificate = CertificateBuilder::new().build(CurveIdentifier::Prime256v1, &subject)?;
//! assert_eq!(certificate.version(), 2);
//! # Ok(())
//! # }
//! ```

use crate::curve::CurveIdentifier;
use crate::error::{CertGenError, Result};
use crate::keypair::KeyPairGenerator;
use crate::serial::SerialNumber;
use crate::subject::{is_printable_string, SubjectAttributes};
use openssl::asn1::{Asn1Time, Asn1Type};
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::x509::{X509Builder, X509Name, X509NameRef, X509Ref, X509};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const X509_VERSION_3: i32 = 2; // X509 version 3 is represented by 2
/// Certificate lifetime: 365 days
pub const VALIDITY_SECONDS: i64 = 60 * 60 * 24 * 365;

/// Whether the certificate is signed before the key pair is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignaturePolicy {
    /// Sign with the generated private key (ECDSA/SHA-256), then release it
    #[default]
    SelfSigned,
    /// Release the key without signing; signing is left to the caller's tooling
    Unsigned,
}

/// `not_before`/`not_after` as unix timestamps in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    not_before: i64,
    not_after: i64,
}

impl ValidityWindow {
    /// Window starting at `not_before` and lasting [`VALIDITY_SECONDS`]
    pub fn starting_at(not_before: i64) -> Self {
        Self {
            not_before,
            not_after: not_before + VALIDITY_SECONDS,
        }
    }

    /// Window starting at `secs` since the unix epoch
    ///
    /// Fails with `ClockOutOfRange` unless `not_after` still fits in an `i64`.
    pub fn from_unix_secs(secs: u64) -> Result<Self> {
        i64::try_from(secs.saturating_add(VALIDITY_SECONDS as u64))?;
        Ok(Self::starting_at(i64::try_from(secs)?))
    }

    /// Window starting at the current system time
    pub fn from_now() -> Result<Self> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
        Self::from_unix_secs(now.as_secs())
    }

    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    pub fn duration_secs(&self) -> i64 {
        self.not_after - self.not_before
    }
}

/// A populated X.509v3 certificate with its generation metadata
pub struct Certificate {
    x509: X509,
    curve: CurveIdentifier,
    serial: SerialNumber,
    validity: ValidityWindow,
    signed: bool,
}

impl Certificate {
    /// Underlying OpenSSL certificate, for serialization or external signing
    pub fn x509(&self) -> &X509Ref {
        &self.x509
    }

    pub fn into_x509(self) -> X509 {
        self.x509
    }

    pub fn curve(&self) -> CurveIdentifier {
        self.curve
    }

    pub fn serial(&self) -> SerialNumber {
        self.serial
    }

    pub fn validity(&self) -> ValidityWindow {
        self.validity
    }

    /// Raw version field; `2` means X.509v3
    pub fn version(&self) -> i32 {
        self.x509.version()
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Subject attributes as `(short name, value)` pairs in encoded order
    pub fn subject_entries(&self) -> Vec<(String, String)> {
        name_entries(self.x509.subject_name())
    }

    /// Issuer attributes; identical to the subject for self-signed certificates
    pub fn issuer_entries(&self) -> Vec<(String, String)> {
        name_entries(self.x509.issuer_name())
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("curve", &self.curve)
            .field("serial", &self.serial)
            .field("validity", &self.validity)
            .field("subject", &self.subject_entries())
            .field("signed", &self.signed)
            .finish()
    }
}

fn name_entries(name: &X509NameRef) -> Vec<(String, String)> {
    name.entries()
        .map(|entry| {
            let code = entry.object().nid().short_name().unwrap_or("UNDEF");
            // Decoded per the encoded string type, not as raw bytes
            let value = match entry.data().as_utf8() {
                Ok(utf8) => utf8.to_string(),
                Err(_) => String::from_utf8_lossy(entry.data().as_slice()).into_owned(),
            };
            (code.to_string(), value)
        })
        .collect()
}

/// Source of empty X509 structures
///
/// Production code uses [`OpensslAllocator`]; other implementations can
/// simulate allocation failure.
pub trait CertificateAllocator {
    fn allocate(&self) -> std::result::Result<X509Builder, ErrorStack>;
}

/// Allocates through `X509_new`
#[derive(Debug, Clone, Copy, Default)]
pub struct OpensslAllocator;

impl CertificateAllocator for OpensslAllocator {
    fn allocate(&self) -> std::result::Result<X509Builder, ErrorStack> {
        X509::builder()
    }
}

/// Builder for EC key pairs and their self-signed X.509v3 certificates
///
/// # Examples
/// ```rust,no_run
/// use ec_testcert::{CertificateBuilder, CurveIdentifier, SignaturePolicy, SubjectAttributes};
/// # fn example() -> ec_testcert::Result<()> {
///
/// // Populated but unsigned, leaving signing to external tooling
/// let certificate = CertificateBuilder::new()
///     .signature_policy(SignaturePolicy::Unsigned)
///     .build(CurveIdentifier::Secp384r1, &SubjectAttributes::default())?;
/// assert!(!certificate.is_signed());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CertificateBuilder<A = OpensslAllocator> {
    allocator: A,
    signature_policy: SignaturePolicy,
}

impl CertificateBuilder<OpensslAllocator> {
    pub fn new() -> Self {
        Self {
            allocator: OpensslAllocator,
            signature_policy: SignaturePolicy::default(),
        }
    }
}

impl Default for CertificateBuilder<OpensslAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: CertificateAllocator> CertificateBuilder<A> {
    /// Replace the X509 allocator
    pub fn with_allocator<B: CertificateAllocator>(self, allocator: B) -> CertificateBuilder<B> {
        CertificateBuilder {
            allocator,
            signature_policy: self.signature_policy,
        }
    }

    /// Set whether the certificate is signed before the key is released
    pub fn signature_policy(mut self, policy: SignaturePolicy) -> Self {
        self.signature_policy = policy;
        self
    }

    /// Generate a key pair on `curve` and build a certificate for `subject`
    ///
    /// # Errors
    /// - `UnsupportedCurve` / `KeyValidationFailed` from key generation, unchanged
    /// - `CertificateAllocationFailed` if the X509 structure cannot be created
    /// - `RandomSourceFailed` if no serial number can be drawn
    /// - `FieldAssignmentFailed` if a field or name entry is rejected
    /// - `SigningFailed` if self-signing fails
    ///
    /// The key pair is released on every path, success or failure.
    pub fn build(&self, curve: CurveIdentifier, subject: &SubjectAttributes) -> Result<Certificate> {
        let key_pair = KeyPairGenerator::generate(curve)?;

        let mut builder = self.allocator.allocate().map_err(|e| {
            warn!(%curve, error = %e, "Unable to create X509 structure");
            CertGenError::CertificateAllocationFailed(e)
        })?;

        builder
            .set_version(X509_VERSION_3)
            .map_err(CertGenError::field("version"))?;

        let serial = SerialNumber::random()?;
        let asn1_serial = serial.to_asn1_integer()?;
        builder
            .set_serial_number(&asn1_serial)
            .map_err(CertGenError::field("serial number"))?;

        let validity = ValidityWindow::from_now()?;
        let not_before =
            Asn1Time::from_unix(validity.not_before() as _).map_err(CertGenError::field("not_before"))?;
        builder
            .set_not_before(&not_before)
            .map_err(CertGenError::field("not_before"))?;

        let not_after =
            Asn1Time::from_unix(validity.not_after() as _).map_err(CertGenError::field("not_after"))?;
        builder
            .set_not_after(&not_after)
            .map_err(CertGenError::field("not_after"))?;

        // Public half only; the private key stays in the key pair
        builder
            .set_pubkey(key_pair.pkey())
            .map_err(CertGenError::field("public key"))?;

        let name = build_name(subject)?;
        builder
            .set_subject_name(&name)
            .map_err(CertGenError::field("subject"))?;
        builder
            .set_issuer_name(&name)
            .map_err(CertGenError::field("issuer"))?;

        let signed = match self.signature_policy {
            SignaturePolicy::SelfSigned => {
                builder
                    .sign(key_pair.pkey(), MessageDigest::sha256())
                    .map_err(CertGenError::SigningFailed)?;
                true
            }
            SignaturePolicy::Unsigned => false,
        };

        drop(key_pair);

        let x509 = builder.build();
        debug!(%curve, %serial, signed, "Built EC certificate");

        Ok(Certificate {
            x509,
            curve,
            serial,
            validity,
            signed,
        })
    }
}

fn build_name(subject: &SubjectAttributes) -> Result<X509Name> {
    let mut name_builder = X509Name::builder().map_err(CertGenError::field("subject"))?;
    for entry in subject.entries() {
        if entry.string_type == Asn1Type::PRINTABLESTRING && !is_printable_string(entry.value) {
            warn!(field = entry.short_name, "Value outside PrintableString charset");
            return Err(CertGenError::invalid_field(
                entry.short_name,
                format!("{:?} is not a PrintableString", entry.value),
            ));
        }
        name_builder
            .append_entry_by_nid_with_type(entry.nid, entry.value, entry.string_type)
            .map_err(CertGenError::field(entry.short_name))?;
    }
    Ok(name_builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::live_key_pairs;
    use openssl::bn::BigNum;
    use openssl::nid::Nid;
    use std::cell::Cell;
    use std::cmp::Ordering;

    struct FailingAllocator {
        live_at_allocation: Cell<Option<usize>>,
    }

    impl CertificateAllocator for FailingAllocator {
        fn allocate(&self) -> std::result::Result<X509Builder, ErrorStack> {
            self.live_at_allocation.set(Some(live_key_pairs()));
            Err(ErrorStack::get())
        }
    }

    fn codes(entries: &[(String, String)]) -> Vec<&str> {
        entries.iter().map(|(code, _)| code.as_str()).collect()
    }

    #[test]
    fn test_subject_order_with_empty_fields() {
        let subject = SubjectAttributes::new();
        let cert = CertificateBuilder::new()
            .build(CurveIdentifier::Prime256v1, &subject)
            .unwrap();

        let entries = cert.subject_entries();
        assert_eq!(codes(&entries), ["C", "ST", "L", "O", "CN"]);
        assert!(entries.iter().all(|(_, value)| value.is_empty()));
    }

    #[test]
    fn test_subject_values_and_issuer_match() {
        let subject = SubjectAttributes::new()
            .country("DE".to_string())
            .state("Bayern".to_string())
            .locality("München".to_string())
            .organization("Beispiel GmbH".to_string())
            .common_name("test.local".to_string());
        let cert = CertificateBuilder::new()
            .build(CurveIdentifier::Secp384r1, &subject)
            .unwrap();

        let entries = cert.subject_entries();
        let values: Vec<&str> = entries.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, ["DE", "Bayern", "München", "Beispiel GmbH", "test.local"]);
        assert_eq!(cert.issuer_entries(), entries);
    }

    #[test]
    fn test_version_and_validity_span() {
        let cert = CertificateBuilder::new()
            .build(CurveIdentifier::Prime256v1, &SubjectAttributes::default())
            .unwrap();
        assert_eq!(cert.version(), X509_VERSION_3);
        assert_eq!(cert.validity().duration_secs(), 31_536_000);

        let diff = cert.x509().not_before().diff(cert.x509().not_after()).unwrap();
        assert_eq!(diff.days, 365);
        assert_eq!(diff.secs, 0);
    }

    #[test]
    fn test_serial_set_on_certificate() {
        let cert = CertificateBuilder::new()
            .build(CurveIdentifier::Prime256v1, &SubjectAttributes::default())
            .unwrap();
        let encoded = cert.x509().serial_number().to_bn().unwrap();
        let expected = BigNum::from_slice(&cert.serial().value().to_be_bytes()).unwrap();
        assert_eq!(encoded.ucmp(&expected), Ordering::Equal);
        assert!(!encoded.is_negative());
    }

    #[test]
    fn test_self_signed_verifies_with_embedded_key() {
        let before = live_key_pairs();
        let cert = CertificateBuilder::new()
            .build(CurveIdentifier::Secp521r1, &SubjectAttributes::default())
            .unwrap();
        assert_eq!(live_key_pairs(), before);
        assert!(cert.is_signed());

        let public_key = cert.x509().public_key().unwrap();
        assert!(cert.x509().verify(&public_key).unwrap());

        let ec = public_key.ec_key().unwrap();
        assert_eq!(ec.group().curve_name(), Some(Nid::SECP521R1));
    }

    #[test]
    fn test_unsigned_policy_releases_key_without_signing() {
        let before = live_key_pairs();
        let cert = CertificateBuilder::new()
            .signature_policy(SignaturePolicy::Unsigned)
            .build(CurveIdentifier::Prime256v1, &SubjectAttributes::default())
            .unwrap();
        assert_eq!(live_key_pairs(), before);
        assert!(!cert.is_signed());
        assert_eq!(cert.version(), X509_VERSION_3);
        assert_eq!(codes(&cert.subject_entries()), ["C", "ST", "L", "O", "CN"]);
    }

    #[test]
    fn test_allocation_failure_releases_key_pair() {
        let before = live_key_pairs();
        let allocator = FailingAllocator {
            live_at_allocation: Cell::new(None),
        };
        let builder = CertificateBuilder::new().with_allocator(allocator);

        let err = builder
            .build(CurveIdentifier::Prime256v1, &SubjectAttributes::default())
            .unwrap_err();
        assert!(matches!(err, CertGenError::CertificateAllocationFailed(_)));

        // The pair existed while allocating and is gone afterwards
        assert_eq!(builder.allocator.live_at_allocation.get(), Some(before + 1));
        assert_eq!(live_key_pairs(), before);
    }

    #[test]
    fn test_parallel_builds() {
        let builder = CertificateBuilder::new();
        let subject = SubjectAttributes::default();
        let serials: Vec<SerialNumber> = std::thread::scope(|scope| {
            let handles: Vec<_> = CurveIdentifier::ALL
                .into_iter()
                .map(|curve| {
                    let builder = &builder;
                    let subject = &subject;
                    scope.spawn(move || builder.build(curve, subject).unwrap().serial())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(serials.len(), CurveIdentifier::ALL.len());
    }

    #[test]
    fn test_invalid_country_is_field_assignment_failure() {
        let before = live_key_pairs();
        let subject = SubjectAttributes::default().country("Ü@".to_string());

        let err = CertificateBuilder::new()
            .build(CurveIdentifier::Prime256v1, &subject)
            .unwrap_err();
        assert!(matches!(err, CertGenError::FieldAssignmentFailed { field: "C", .. }));
        assert_eq!(live_key_pairs(), before);
    }

    #[test]
    fn test_subject_entries_decode_encoded_strings() {
        let subject = SubjectAttributes::default()
            .country("NZ".to_string())
            .organization("Ōtautahi Ltd.".to_string());
        let cert = CertificateBuilder::new()
            .build(CurveIdentifier::Prime256v1, &subject)
            .unwrap();

        // Re-parse the encoded form so the accessor reflects what was written
        let der = cert.x509().to_der().unwrap();
        let parsed = X509::from_der(&der).unwrap();
        let country = parsed
            .subject_name()
            .entries_by_nid(Nid::COUNTRYNAME)
            .next()
            .unwrap();
        assert_eq!(country.data().as_utf8().unwrap().to_string(), "NZ");

        let entries = cert.subject_entries();
        assert_eq!(entries[0], ("C".to_string(), "NZ".to_string()));
        assert_eq!(entries[3], ("O".to_string(), "Ōtautahi Ltd.".to_string()));
    }

    #[test]
    fn test_validity_window_out_of_range() {
        let window = ValidityWindow::from_unix_secs(1_700_000_000).unwrap();
        assert_eq!(window.duration_secs(), VALIDITY_SECONDS);

        let err = ValidityWindow::from_unix_secs(u64::MAX).unwrap_err();
        assert!(matches!(err, CertGenError::ClockOutOfRange(_)));

        let err = ValidityWindow::from_unix_secs(i64::MAX as u64).unwrap_err();
        assert!(matches!(err, CertGenError::ClockOutOfRange(_)));
    }

    #[test]
    fn test_validity_window_arithmetic() {
        let window = ValidityWindow::starting_at(1_700_000_000);
        assert_eq!(window.not_before(), 1_700_000_000);
        assert_eq!(window.not_after(), 1_731_536_000);
        assert_eq!(window.duration_secs(), VALIDITY_SECONDS);
    }
}
