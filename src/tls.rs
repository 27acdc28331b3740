//! Restricted TLS configuration construction
//!
//! Configurations built here come from the gate-installed provider and the
//! approved protocol versions, so they cannot name a parameter outside the
//! policy. A caller that asks for a disallowed version is rejected up
//! front rather than clamped to something permitted; silent clamping would
//! hide the misconfiguration from the operator.
//!
//! All constructors fail with [`Error::Inactive`] until [`crate::activate`]
//! has run. There is no fallback to an unrestricted provider.

use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{
    ClientConfig, ProtocolVersion, RootCertStore, ServerConfig, SupportedProtocolVersion,
};

use crate::error::Error;
use crate::gate;
use crate::policy::CompliancePolicy;
use crate::Result;

/// Build a client configuration restricted to the approved parameters
///
/// Verifies server certificates against `roots`, offers no client
/// certificate, and negotiates only policy-approved versions and suites.
pub fn client_config(roots: RootCertStore) -> Result<ClientConfig> {
    let policy = active_policy()?;
    client_config_with_versions(policy.protocol_versions(), roots)
}

/// Build a client configuration for an explicit set of protocol versions
///
/// # Errors
///
/// [`Error::NonCompliantConfiguration`] if any requested version is
/// outside the approved set. Nothing is built in that case.
pub fn client_config_with_versions(
    versions: &[ProtocolVersion],
    roots: RootCertStore,
) -> Result<ClientConfig> {
    let policy = active_policy()?;
    let versions = supported_versions(policy, versions)?;
    let provider = gate::installed_provider()?;

    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&versions)?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

/// Build a server configuration restricted to the approved parameters
///
/// Presents `cert_chain` with `key`, requires no client certificate, and
/// negotiates only policy-approved versions and suites.
pub fn server_config(
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<ServerConfig> {
    let policy = active_policy()?;
    server_config_with_versions(policy.protocol_versions(), cert_chain, key)
}

/// Build a server configuration for an explicit set of protocol versions
///
/// # Errors
///
/// [`Error::NonCompliantConfiguration`] if any requested version is
/// outside the approved set. Nothing is built in that case.
pub fn server_config_with_versions(
    versions: &[ProtocolVersion],
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<ServerConfig> {
    let policy = active_policy()?;
    let versions = supported_versions(policy, versions)?;
    let provider = gate::installed_provider()?;

    let config = ServerConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&versions)?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)?;
    Ok(config)
}

/// Attest that a client configuration was built under the gate
///
/// Accepts only configurations that reference the gate-installed provider;
/// a configuration carrying some other provider cannot be attested even if
/// its parameters happen to overlap the policy. Under the `fips` feature
/// the configuration's own FIPS self-check must also hold.
pub fn ensure_client_compliant(config: &ClientConfig) -> Result<()> {
    let provider = gate::installed_provider()?;
    if !Arc::ptr_eq(config.crypto_provider(), provider) {
        return Err(Error::non_compliant(
            "client configuration was not built from the gate-installed provider",
        ));
    }
    #[cfg(feature = "fips")]
    if !config.fips() {
        return Err(Error::non_compliant(
            "client configuration fails the FIPS self-check of the certified module",
        ));
    }
    Ok(())
}

/// Attest that a server configuration was built under the gate
///
/// Same contract as [`ensure_client_compliant`].
pub fn ensure_server_compliant(config: &ServerConfig) -> Result<()> {
    let provider = gate::installed_provider()?;
    if !Arc::ptr_eq(config.crypto_provider(), provider) {
        return Err(Error::non_compliant(
            "server configuration was not built from the gate-installed provider",
        ));
    }
    #[cfg(feature = "fips")]
    if !config.fips() {
        return Err(Error::non_compliant(
            "server configuration fails the FIPS self-check of the certified module",
        ));
    }
    Ok(())
}

fn active_policy() -> Result<&'static CompliancePolicy> {
    gate::installed_policy().ok_or_else(|| {
        Error::inactive("activate() must run during startup before building TLS configuration")
    })
}

/// Map requested protocol versions onto the library's supported-version
/// table, rejecting anything outside the approved set.
fn supported_versions(
    policy: &CompliancePolicy,
    versions: &[ProtocolVersion],
) -> Result<Vec<&'static SupportedProtocolVersion>> {
    if versions.is_empty() {
        return Err(Error::non_compliant("no protocol versions requested"));
    }

    let mut supported = Vec::with_capacity(versions.len());
    for &version in versions {
        policy.check_protocol_version(version)?;
        supported.push(match version {
            ProtocolVersion::TLSv1_2 => &rustls::version::TLS12,
            ProtocolVersion::TLSv1_3 => &rustls::version::TLS13,
            other => {
                return Err(Error::non_compliant(format!(
                    "protocol version {other:?} is not supported by the linked TLS library"
                )))
            }
        });
    }
    Ok(supported)
}

#[cfg(test)]
mod tests {
    use super::*;

    // No test here activates the gate; process-wide activation behavior
    // lives in the integration tests.

    #[test]
    fn obsolete_versions_are_rejected_not_clamped() {
        let policy = CompliancePolicy::approved();
        for version in [
            ProtocolVersion::SSLv3,
            ProtocolVersion::TLSv1_0,
            ProtocolVersion::TLSv1_1,
        ] {
            let err = supported_versions(&policy, &[version])
                .expect_err("version below the approved minimum should be rejected");
            assert!(matches!(err, Error::NonCompliantConfiguration(_)));
        }
    }

    #[test]
    fn one_rejected_version_fails_the_whole_request() {
        let policy = CompliancePolicy::approved();
        let err = supported_versions(
            &policy,
            &[ProtocolVersion::TLSv1_3, ProtocolVersion::TLSv1_0],
        )
        .expect_err("mixed request containing an obsolete version should be rejected");
        assert!(matches!(err, Error::NonCompliantConfiguration(_)));
    }

    #[test]
    fn approved_versions_map_to_library_tables() {
        let policy = CompliancePolicy::approved();
        let versions = supported_versions(
            &policy,
            &[ProtocolVersion::TLSv1_2, ProtocolVersion::TLSv1_3],
        )
        .expect("approved versions should map");
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version, ProtocolVersion::TLSv1_2);
        assert_eq!(versions[1].version, ProtocolVersion::TLSv1_3);
    }

    #[test]
    fn empty_version_request_is_rejected() {
        let err = supported_versions(&CompliancePolicy::approved(), &[])
            .expect_err("empty version request should be rejected");
        assert!(matches!(err, Error::NonCompliantConfiguration(_)));
    }

    #[test]
    fn configuration_before_activation_fails_closed() {
        // The unit test binary never activates the gate, so this observes
        // the pre-activation state.
        let err = client_config(RootCertStore::empty())
            .expect_err("configuration before activation should fail");
        assert!(matches!(err, Error::Inactive(_)));
    }
}
