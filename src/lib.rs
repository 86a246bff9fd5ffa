//! EC Test Certificates - self-signed X.509v3 certificates for development
//!
//! Generates a fresh elliptic-curve key pair and wraps its public key in a
//! populated X.509v3 certificate, for exercising TLS handshakes or
//! certificate-parsing code. Not intended for production issuance.
//!
//! # Pipeline
//!
//! ```text
//! KeyPairGenerator::generate(curve)     EC key, validated, tagged Id::EC
//!   └── CertificateBuilder::build(..)   version, serial, validity, key, DN
//!         └── key pair released         private key never returned
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use ec_testcert::{generate_test_certificate, CurveIdentifier};
//!
//! let certificate = generate_test_certificate(CurveIdentifier::Prime256v1)?;
//! assert_eq!(certificate.version(), 2); // X.509v3
//!
//! // PEM/DER encoding is left to the caller
//! let pem = certificate.x509().to_pem()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Overview
//!
//! - [`curve`]: Closed set of supported named curves
//! - [`keypair`]: EC key pair generation and validation
//! - [`serial`]: Random positive 63-bit serial numbers
//! - [`subject`]: Distinguished-name attributes with demonstration defaults
//! - [`generate_ec_cert`]: Certificate assembly and the signing policy
//! - [`configs`]: TOML configuration
//!
//! # Error Handling
//!
//! Generation returns [`Result`] over [`CertGenError`], whose variants tell
//! key-generation failures apart from certificate-assembly failures.
//! Configuration loading returns `anyhow::Result`.
//!
//! # Logging
//!
//! Events are emitted through `tracing`; no subscriber is installed by this
//! crate.

pub mod configs;
pub mod curve;
pub mod error;
pub mod generate_ec_cert;
pub mod keypair;
pub mod serial;
pub mod subject;

pub use configs::GeneratorConfig;
pub use curve::CurveIdentifier;
pub use error::{CertGenError, Result};
pub use generate_ec_cert::{
    Certificate, CertificateAllocator, CertificateBuilder, OpensslAllocator, SignaturePolicy,
    ValidityWindow, VALIDITY_SECONDS,
};
pub use keypair::{KeyPair, KeyPairGenerator};
pub use serial::SerialNumber;
pub use subject::SubjectAttributes;

/// Generate a self-signed certificate with the demonstration subject
///
/// Subject: C=PG, ST=Papua New Guinea, L=Papua New Guinea, O=Company Ltd.,
/// CN=EC Test.
pub fn generate_test_certificate(curve: CurveIdentifier) -> Result<Certificate> {
    generate_certificate(curve, SubjectAttributes::default())
}

/// Generate a self-signed certificate for `subject` on `curve`
pub fn generate_certificate(curve: CurveIdentifier, subject: SubjectAttributes) -> Result<Certificate> {
    CertificateBuilder::new().build(curve, &subject)
}

/// Generate a certificate using curve, subject and signing policy from `config`
pub fn generate_certificate_with_config(config: &GeneratorConfig) -> Result<Certificate> {
    CertificateBuilder::new()
        .signature_policy(config.signature)
        .build(config.curve, &config.subject)
}
