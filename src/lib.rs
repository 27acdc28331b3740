//! Fipsgate - process-wide FIPS compliance gate for rustls-based TLS
//!
//! Fipsgate restricts every TLS configuration path in the host process to a
//! fixed, FIPS-approved subset of protocol versions, cipher suites, key
//! exchange groups, and signature schemes. Once activated, anything outside
//! that subset fails fast; nothing is silently downgraded.
//!
//! # Activation Model
//!
//! The gate is activated exactly once, during startup, before any TLS
//! configuration object is constructed:
//!
//! ```ignore
//! fn main() -> fipsgate::Result<()> {
//!     // Must run before any TLS configuration is built.
//!     fipsgate::activate()?;
//!
//!     let roots = rustls::RootCertStore::empty();
//!     let config = fipsgate::tls::client_config(roots)?;
//!     // ... connect with a configuration that can only negotiate
//!     // approved parameters
//!     Ok(())
//! }
//! ```
//!
//! Activation installs a restricted crypto provider as the rustls process
//! default, so the restriction covers every configuration built afterward,
//! not only the ones built through this crate. Activation is idempotent
//! across independent initialization paths and irrevocable for the process
//! lifetime.
//!
//! # Modules
//!
//! - [`gate`] - Activation, status reporting, and provider installation
//! - [`policy`] - The approved parameter sets
//! - [`tls`] - Restricted client/server configuration construction
//! - [`error`] - Error types for the gate
//!
//! # FIPS Builds
//!
//! The `fips` cargo feature links the certified aws-lc-rs FIPS module and
//! makes activation fail unless that module initializes. Without the
//! feature the same restrictions are enforced, but the underlying module
//! is not the certified build; production deployments build with
//! `--features fips`.

#![deny(missing_docs)]

pub mod error;
pub mod gate;
pub mod policy;
pub mod tls;

pub use error::Error;
pub use gate::{activate, activate_policy, is_active, status, ComplianceStatus};
pub use policy::CompliancePolicy;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
