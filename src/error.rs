use openssl::error::ErrorStack;
use thiserror::Error;

/// Errors produced while generating a key pair or assembling a certificate
///
/// Key-generation failures (`UnsupportedCurve`, `KeyValidationFailed`) are
/// returned unchanged by the certificate builder so callers can tell them
/// apart from certificate-assembly failures.
#[derive(Error, Debug)]
pub enum CertGenError {
    #[error("Unsupported curve: {0}")]
    UnsupportedCurve(String),

    #[error("Generated EC key pair failed validation: {0}")]
    KeyValidationFailed(#[source] ErrorStack),

    #[error("Failed to create X509 structure: {0}")]
    CertificateAllocationFailed(#[source] ErrorStack),

    #[error("Failed to set {field}: {reason}")]
    FieldAssignmentFailed {
        field: &'static str,
        reason: String,
        #[source]
        source: Option<ErrorStack>,
    },

    #[error("Secure random source failed: {0}")]
    RandomSourceFailed(#[source] ErrorStack),

    #[error("Failed to sign certificate: {0}")]
    SigningFailed(#[source] ErrorStack),

    #[error("System time error: {0}")]
    Clock(#[from] std::time::SystemTimeError),

    #[error("System time out of range: {0}")]
    ClockOutOfRange(#[from] std::num::TryFromIntError),
}

impl CertGenError {
    pub(crate) fn field(field: &'static str) -> impl FnOnce(ErrorStack) -> Self {
        move |source| CertGenError::FieldAssignmentFailed {
            field,
            reason: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        CertGenError::FieldAssignmentFailed {
            field,
            reason: reason.into(),
            source: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CertGenError>;
