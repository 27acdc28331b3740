//! Gate activation and process-wide provider installation
//!
//! Activation installs a restricted `CryptoProvider` as the rustls process
//! default: the provider's cipher suite, key exchange, and certificate
//! verification tables are filtered down to the approved sets before the
//! install, so parameters outside the policy are absent from the process
//! rather than merely unreached. Every `ClientConfig`/`ServerConfig` built
//! afterward, and every negotiation, consults the restricted tables.
//!
//! # Activation Model
//!
//! Activation happens once, during startup, before any TLS configuration
//! object exists. The transition is one-directional: there is no
//! deactivation and no per-connection opt-out. Concurrent callers follow a
//! first-writer-wins protocol: the first caller installs, later callers
//! with identical policy content observe success, and a caller with
//! different content gets [`Error::ActivationConflict`].
//!
//! If some other component installed a process default provider before the
//! gate ran, activation fails with [`Error::PlatformUnsupported`]: TLS
//! objects created before activation cannot be attested, and continuing
//! would claim compliance the process does not have.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Error;
use crate::policy::CompliancePolicy;
use crate::Result;

/// Policy content published by the winning activation. Write-once.
static INSTALLED: OnceLock<CompliancePolicy> = OnceLock::new();

/// Serializes the install critical section between racing activators.
static ACTIVATION: Mutex<()> = Mutex::new(());

/// Activate the gate with the canonical approved policy
///
/// Must run during process startup, before any TLS configuration object is
/// built or any TLS listener/dialer is started. Safe to call from multiple
/// independent initialization paths; repeated calls are idempotent.
///
/// # Errors
///
/// - [`Error::ActivationConflict`] if the gate is already active with
///   different policy content
/// - [`Error::PlatformUnsupported`] if the linked crypto module cannot
///   honor the approved sets, or a foreign process default provider was
///   installed first; treat this as fatal at startup
pub fn activate() -> Result<()> {
    activate_policy(CompliancePolicy::approved())
}

/// Activate the gate with an explicit policy preset
///
/// [`activate`] delegates here with [`CompliancePolicy::approved`].
/// Embedders that pin the stricter preset call this directly. The
/// first-writer-wins protocol compares policy content, so mixed callers
/// agree or the later one fails.
pub fn activate_policy(policy: CompliancePolicy) -> Result<()> {
    if let Some(current) = INSTALLED.get() {
        return check_match(current, &policy);
    }

    let _guard = ACTIVATION.lock().unwrap_or_else(PoisonError::into_inner);

    // Re-check under the lock: another activator may have won the race.
    if let Some(current) = INSTALLED.get() {
        return check_match(current, &policy);
    }

    platform_check()?;

    let provider = restricted_provider(&policy)?;
    let cipher_suites = provider.cipher_suites.len();
    let kx_groups = provider.kx_groups.len();

    if provider.install_default().is_err() {
        return Err(Error::platform_unsupported(
            "a process default crypto provider was installed outside the compliance gate; \
             TLS objects created before activation cannot be attested",
        ));
    }

    let min_protocol_version = policy.min_protocol_version();
    let _ = INSTALLED.set(policy);

    info!(
        cipher_suites,
        kx_groups,
        min_protocol_version = ?min_protocol_version,
        "compliance gate active: process TLS defaults restricted to approved parameters"
    );

    #[cfg(not(feature = "fips"))]
    tracing::warn!(
        "compliance gate running without the certified FIPS module; \
         build with --features fips for production"
    );

    Ok(())
}

/// Whether the gate has been activated for this process
pub fn is_active() -> bool {
    INSTALLED.get().is_some()
}

/// The policy installed by activation, if any
pub fn installed_policy() -> Option<&'static CompliancePolicy> {
    INSTALLED.get()
}

/// The process default provider installed by activation
pub(crate) fn installed_provider() -> Result<&'static Arc<CryptoProvider>> {
    if !is_active() {
        return Err(Error::inactive(
            "activate() must run during startup before TLS configuration",
        ));
    }
    CryptoProvider::get_default().ok_or_else(|| {
        Error::inactive("no process default crypto provider is installed")
    })
}

/// Snapshot of the gate state for compliance reporting
///
/// Serializable so health and status endpoints can embed it directly.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceStatus {
    /// Whether the gate has been activated
    pub active: bool,
    /// Whether the certified FIPS module is linked and operational
    pub certified_module: bool,
    /// Names of the permitted protocol versions
    pub protocol_versions: Vec<String>,
    /// Names of the permitted cipher suites
    pub cipher_suites: Vec<String>,
    /// Names of the permitted key exchange groups
    pub curves: Vec<String>,
    /// Names of the permitted signature schemes
    pub signature_schemes: Vec<String>,
}

/// Report the current gate state
///
/// Before activation this reports inactive with empty sets; consumers use
/// it to decide whether to present a compliance indicator.
pub fn status() -> ComplianceStatus {
    match INSTALLED.get() {
        Some(policy) => ComplianceStatus {
            active: true,
            certified_module: certified_module_active(),
            protocol_versions: names(policy.protocol_versions()),
            cipher_suites: names(policy.cipher_suites()),
            curves: names(policy.curves()),
            signature_schemes: names(policy.signature_schemes()),
        },
        None => ComplianceStatus {
            active: false,
            certified_module: certified_module_active(),
            protocol_versions: Vec::new(),
            cipher_suites: Vec::new(),
            curves: Vec::new(),
            signature_schemes: Vec::new(),
        },
    }
}

fn names<T: std::fmt::Debug>(values: &[T]) -> Vec<String> {
    values.iter().map(|v| format!("{v:?}")).collect()
}

fn check_match(current: &CompliancePolicy, requested: &CompliancePolicy) -> Result<()> {
    if current == requested {
        debug!("compliance gate already active with identical policy content");
        Ok(())
    } else {
        Err(Error::activation_conflict(
            "compliance gate already active with different policy content",
        ))
    }
}

/// Verify the linked crypto module can back the compliance claim.
#[cfg(feature = "fips")]
fn platform_check() -> Result<()> {
    aws_lc_rs::try_fips_mode().map_err(|e| {
        Error::platform_unsupported(format!("FIPS module failed to initialize: {e}"))
    })
}

#[cfg(not(feature = "fips"))]
fn platform_check() -> Result<()> {
    Ok(())
}

#[cfg(feature = "fips")]
fn certified_module_active() -> bool {
    aws_lc_rs::try_fips_mode().is_ok()
}

#[cfg(not(feature = "fips"))]
fn certified_module_active() -> bool {
    false
}

/// Build the aws-lc-rs provider with its negotiation tables filtered down
/// to the approved sets.
fn restricted_provider(policy: &CompliancePolicy) -> Result<CryptoProvider> {
    let mut provider = rustls::crypto::aws_lc_rs::default_provider();

    provider
        .cipher_suites
        .retain(|suite| policy.allows_cipher_suite(suite.suite()));
    provider
        .kx_groups
        .retain(|group| policy.allows_curve(group.name()));

    if provider.cipher_suites.is_empty() {
        return Err(Error::platform_unsupported(
            "linked crypto provider implements none of the approved cipher suites",
        ));
    }
    if provider.kx_groups.is_empty() {
        return Err(Error::platform_unsupported(
            "linked crypto provider implements none of the approved key exchange groups",
        ));
    }

    provider.signature_verification_algorithms =
        restricted_verify_algorithms(provider.signature_verification_algorithms, policy);

    Ok(provider)
}

/// Filter the certificate verification table down to approved signature
/// schemes. The filtered tables back the process default provider for the
/// remainder of the process, so they are moved into `'static` storage.
fn restricted_verify_algorithms(
    algorithms: WebPkiSupportedAlgorithms,
    policy: &CompliancePolicy,
) -> WebPkiSupportedAlgorithms {
    let mapping: Vec<_> = algorithms
        .mapping
        .iter()
        .copied()
        .filter(|(scheme, _)| policy.allows_signature_scheme(*scheme))
        .collect();
    let all: Vec<_> = mapping
        .iter()
        .flat_map(|(_, algs)| algs.iter().copied())
        .collect();

    WebPkiSupportedAlgorithms {
        all: Box::leak(all.into_boxed_slice()),
        mapping: Box::leak(mapping.into_boxed_slice()),
    }
}
