//! Subject distinguished-name attributes
//!
//! The five attributes are always emitted in the fixed order C, ST, L, O, CN.
//! Defaults are the demonstration values used by
//! [`generate_test_certificate`](crate::generate_test_certificate).

use openssl::asn1::Asn1Type;
use openssl::nid::Nid;
use serde::Deserialize;

/// Distinguished-name fields for the certificate subject
///
/// No length validation is performed; empty strings are accepted and produce
/// a degenerate name. The country must fit the PrintableString charset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubjectAttributes {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default = "default_locality")]
    pub locality: String,
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default = "default_common_name")]
    pub common_name: String,
}

impl Default for SubjectAttributes {
    fn default() -> Self {
        Self {
            country: default_country(),
            state: default_state(),
            locality: default_locality(),
            organization: default_organization(),
            common_name: default_common_name(),
        }
    }
}

fn default_country() -> String {
    "PG".to_string()
}

fn default_state() -> String {
    "Papua New Guinea".to_string()
}

fn default_locality() -> String {
    "Papua New Guinea".to_string()
}

fn default_organization() -> String {
    "Company Ltd.".to_string()
}

fn default_common_name() -> String {
    "EC Test".to_string()
}

/// True if every character belongs to the X.680 PrintableString set
pub(crate) fn is_printable_string(value: &str) -> bool {
    value.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || matches!(c, ' ' | '\'' | '(' | ')' | '+' | ',' | '-' | '.' | '/' | ':' | '=' | '?')
    })
}

/// One attribute of the subject name, ready for the X509 name builder
#[derive(Debug, Clone, Copy)]
pub(crate) struct NameEntry<'a> {
    pub(crate) nid: Nid,
    pub(crate) short_name: &'static str,
    pub(crate) value: &'a str,
    pub(crate) string_type: Asn1Type,
}

impl SubjectAttributes {
    /// Create subject attributes with every field empty
    pub fn new() -> Self {
        Self {
            country: String::new(),
            state: String::new(),
            locality: String::new(),
            organization: String::new(),
            common_name: String::new(),
        }
    }

    /// Set the country (C), conventionally a 2-letter ISO code
    pub fn country(mut self, country: String) -> Self {
        self.country = country;
        self
    }

    /// Set the state/province (ST)
    pub fn state(mut self, state: String) -> Self {
        self.state = state;
        self
    }

    /// Set the locality (L)
    pub fn locality(mut self, locality: String) -> Self {
        self.locality = locality;
        self
    }

    /// Set the organization (O)
    pub fn organization(mut self, org: String) -> Self {
        self.organization = org;
        self
    }

    /// Set the common name (CN)
    pub fn common_name(mut self, cn: String) -> Self {
        self.common_name = cn;
        self
    }

    /// Attributes in DN order: C, ST, L, O, CN
    ///
    /// Country is a PrintableString per X.520; everything else is UTF8String.
    /// Explicit types skip OpenSSL's per-attribute size table, which would
    /// otherwise reject an empty country. OpenSSL does not check the
    /// PrintableString charset, so the name builder does.
    pub(crate) fn entries(&self) -> [NameEntry<'_>; 5] {
        [
            NameEntry {
                nid: Nid::COUNTRYNAME,
                short_name: "C",
                value: &self.country,
                string_type: Asn1Type::PRINTABLESTRING,
            },
            NameEntry {
                nid: Nid::STATEORPROVINCENAME,
                short_name: "ST",
                value: &self.state,
                string_type: Asn1Type::UTF8STRING,
            },
            NameEntry {
                nid: Nid::LOCALITYNAME,
                short_name: "L",
                value: &self.locality,
                string_type: Asn1Type::UTF8STRING,
            },
            NameEntry {
                nid: Nid::ORGANIZATIONNAME,
                short_name: "O",
                value: &self.organization,
                string_type: Asn1Type::UTF8STRING,
            },
            NameEntry {
                nid: Nid::COMMONNAME,
                short_name: "CN",
                value: &self.common_name,
                string_type: Asn1Type::UTF8STRING,
            },
        ]
    }
}
