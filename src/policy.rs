//! Approved TLS parameter sets
//!
//! The policy is an allow-list over the TLS registry identifiers that the
//! process may negotiate: protocol versions, cipher suites, key exchange
//! groups, and signature schemes. Anything absent from a set is rejected,
//! so additions to the underlying library's capability surface stay
//! non-compliant until they are reviewed into the policy.
//!
//! # Policy Content
//!
//! The canonical sets cover the FIPS 140-3 approved subset that the
//! aws-lc-rs module certifies:
//!
//! - TLS 1.2 and TLS 1.3 only
//! - AES-GCM cipher suites only (no ChaCha20-Poly1305, no CBC)
//! - NIST curves P-256, P-384, P-521 (no X25519)
//! - RSA PKCS#1/PSS and ECDSA signatures over SHA-2 (no Ed25519, no SHA-1)
//!
//! Policy content is hard-coded. There is deliberately no runtime flag,
//! environment variable, or config file that can alter these sets.

use rustls::{CipherSuite, NamedGroup, ProtocolVersion, SignatureScheme};
use tracing::debug;

use crate::error::Error;
use crate::Result;

const APPROVED_PROTOCOL_VERSIONS: &[ProtocolVersion] =
    &[ProtocolVersion::TLSv1_2, ProtocolVersion::TLSv1_3];

const TLS13_ONLY_PROTOCOL_VERSIONS: &[ProtocolVersion] = &[ProtocolVersion::TLSv1_3];

const APPROVED_CIPHER_SUITES: &[CipherSuite] = &[
    CipherSuite::TLS13_AES_128_GCM_SHA256,
    CipherSuite::TLS13_AES_256_GCM_SHA384,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
];

const TLS13_ONLY_CIPHER_SUITES: &[CipherSuite] = &[
    CipherSuite::TLS13_AES_128_GCM_SHA256,
    CipherSuite::TLS13_AES_256_GCM_SHA384,
];

const APPROVED_CURVES: &[NamedGroup] = &[
    NamedGroup::secp256r1,
    NamedGroup::secp384r1,
    NamedGroup::secp521r1,
];

const APPROVED_SIGNATURE_SCHEMES: &[SignatureScheme] = &[
    SignatureScheme::RSA_PKCS1_SHA256,
    SignatureScheme::RSA_PKCS1_SHA384,
    SignatureScheme::RSA_PKCS1_SHA512,
    SignatureScheme::RSA_PSS_SHA256,
    SignatureScheme::RSA_PSS_SHA384,
    SignatureScheme::RSA_PSS_SHA512,
    SignatureScheme::ECDSA_NISTP256_SHA256,
    SignatureScheme::ECDSA_NISTP384_SHA384,
    SignatureScheme::ECDSA_NISTP521_SHA512,
];

/// Allow-lists for TLS negotiation parameters
///
/// Two instances are comparable with `==`; that identity is what decides
/// whether a repeated activation is idempotent or a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompliancePolicy {
    /// Permitted protocol versions (TLS 1.2 is the lower bound)
    protocol_versions: &'static [ProtocolVersion],
    /// Permitted cipher suites
    cipher_suites: &'static [CipherSuite],
    /// Permitted key exchange groups
    curves: &'static [NamedGroup],
    /// Permitted signature schemes for peer authentication
    signature_schemes: &'static [SignatureScheme],
}

impl CompliancePolicy {
    /// The canonical approved policy
    ///
    /// This is the policy [`crate::activate`] installs. Its content mirrors
    /// the FIPS 140-3 approved subset certified for the linked module.
    pub fn approved() -> Self {
        Self {
            protocol_versions: APPROVED_PROTOCOL_VERSIONS,
            cipher_suites: APPROVED_CIPHER_SUITES,
            curves: APPROVED_CURVES,
            signature_schemes: APPROVED_SIGNATURE_SCHEMES,
        }
    }

    /// A stricter preset limited to TLS 1.3 parameters
    ///
    /// A narrowing of [`CompliancePolicy::approved`] for deployments that
    /// never need TLS 1.2 interop. There is no preset that widens the
    /// approved sets.
    pub fn strict_tls13() -> Self {
        Self {
            protocol_versions: TLS13_ONLY_PROTOCOL_VERSIONS,
            cipher_suites: TLS13_ONLY_CIPHER_SUITES,
            curves: APPROVED_CURVES,
            signature_schemes: APPROVED_SIGNATURE_SCHEMES,
        }
    }

    /// Permitted protocol versions
    pub fn protocol_versions(&self) -> &'static [ProtocolVersion] {
        self.protocol_versions
    }

    /// Permitted cipher suites
    pub fn cipher_suites(&self) -> &'static [CipherSuite] {
        self.cipher_suites
    }

    /// Permitted key exchange groups
    pub fn curves(&self) -> &'static [NamedGroup] {
        self.curves
    }

    /// Permitted signature schemes
    pub fn signature_schemes(&self) -> &'static [SignatureScheme] {
        self.signature_schemes
    }

    /// The lowest permitted protocol version
    pub fn min_protocol_version(&self) -> ProtocolVersion {
        *self
            .protocol_versions
            .iter()
            .min_by_key(|v| u16::from(**v))
            .unwrap_or(&ProtocolVersion::TLSv1_3)
    }

    /// Whether the given protocol version is in the approved set
    pub fn allows_protocol_version(&self, version: ProtocolVersion) -> bool {
        self.protocol_versions.contains(&version)
    }

    /// Whether the given cipher suite is in the approved set
    pub fn allows_cipher_suite(&self, suite: CipherSuite) -> bool {
        self.cipher_suites.contains(&suite)
    }

    /// Whether the given key exchange group is in the approved set
    pub fn allows_curve(&self, group: NamedGroup) -> bool {
        self.curves.contains(&group)
    }

    /// Whether the given signature scheme is in the approved set
    pub fn allows_signature_scheme(&self, scheme: SignatureScheme) -> bool {
        self.signature_schemes.contains(&scheme)
    }

    /// Reject a protocol version outside the approved set
    pub fn check_protocol_version(&self, version: ProtocolVersion) -> Result<()> {
        if self.allows_protocol_version(version) {
            Ok(())
        } else {
            debug!(version = ?version, "rejected protocol version outside the approved set");
            Err(Error::non_compliant(format!(
                "protocol version {version:?} is not in the approved set (minimum {:?})",
                self.min_protocol_version()
            )))
        }
    }

    /// Reject a cipher suite outside the approved set
    pub fn check_cipher_suite(&self, suite: CipherSuite) -> Result<()> {
        if self.allows_cipher_suite(suite) {
            Ok(())
        } else {
            debug!(suite = ?suite, "rejected cipher suite outside the approved set");
            Err(Error::non_compliant(format!(
                "cipher suite {suite:?} is not in the approved set"
            )))
        }
    }

    /// Reject a key exchange group outside the approved set
    pub fn check_curve(&self, group: NamedGroup) -> Result<()> {
        if self.allows_curve(group) {
            Ok(())
        } else {
            debug!(group = ?group, "rejected key exchange group outside the approved set");
            Err(Error::non_compliant(format!(
                "key exchange group {group:?} is not in the approved set"
            )))
        }
    }

    /// Reject a signature scheme outside the approved set
    pub fn check_signature_scheme(&self, scheme: SignatureScheme) -> Result<()> {
        if self.allows_signature_scheme(scheme) {
            Ok(())
        } else {
            debug!(scheme = ?scheme, "rejected signature scheme outside the approved set");
            Err(Error::non_compliant(format!(
                "signature scheme {scheme:?} is not in the approved set"
            )))
        }
    }
}
