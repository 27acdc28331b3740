//! Negotiation tests against the restricted process defaults
//!
//! These drive real rustls client/server connections over in-memory
//! buffers; no network or certificate infrastructure is involved beyond a
//! self-signed test certificate.

use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName};
use rustls::{ClientConfig, ClientConnection, ProtocolVersion, RootCertStore, ServerConnection};

use fipsgate::{activate, tls, CompliancePolicy, Error};

fn test_identity() -> (CertificateDer<'static>, PrivateKeyDer<'static>) {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .expect("self-signed test certificate generation should succeed");
    let cert = certified.cert.der().clone();
    let key = PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()).into();
    (cert, key)
}

fn root_store(cert: &CertificateDer<'static>) -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots
        .add(cert.clone())
        .expect("test certificate should be a valid trust anchor");
    roots
}

/// Shuttle handshake records between the two connections until both sides
/// finish, or return the first rejection either side raises.
fn drive(
    client: &mut ClientConnection,
    server: &mut ServerConnection,
) -> Result<(), rustls::Error> {
    for _ in 0..32 {
        if !client.is_handshaking() && !server.is_handshaking() {
            return Ok(());
        }

        if client.wants_write() {
            let mut wire = Vec::new();
            while client.wants_write() {
                client
                    .write_tls(&mut wire)
                    .expect("writing TLS records to a buffer should not fail");
            }
            let mut unread = &wire[..];
            while !unread.is_empty() {
                server
                    .read_tls(&mut unread)
                    .expect("reading TLS records from a buffer should not fail");
            }
            server.process_new_packets()?;
        }

        if server.wants_write() {
            let mut wire = Vec::new();
            while server.wants_write() {
                server
                    .write_tls(&mut wire)
                    .expect("writing TLS records to a buffer should not fail");
            }
            let mut unread = &wire[..];
            while !unread.is_empty() {
                client
                    .read_tls(&mut unread)
                    .expect("reading TLS records from a buffer should not fail");
            }
            client.process_new_packets()?;
        }
    }
    panic!("handshake did not converge");
}

#[test]
fn compliant_peers_negotiate_approved_parameters() {
    activate().expect("activation should succeed");

    let (cert, key) = test_identity();
    let server_config =
        tls::server_config(vec![cert.clone()], key).expect("compliant server config should build");
    let client_config =
        tls::client_config(root_store(&cert)).expect("compliant client config should build");

    let server_name = ServerName::try_from("localhost").expect("static test name should parse");
    let mut client = ClientConnection::new(Arc::new(client_config), server_name)
        .expect("client connection should start");
    let mut server =
        ServerConnection::new(Arc::new(server_config)).expect("server connection should start");

    drive(&mut client, &mut server).expect("compliant peers should complete the handshake");

    let policy = CompliancePolicy::approved();
    let version = client
        .protocol_version()
        .expect("negotiated protocol version should be known");
    assert!(
        policy.allows_protocol_version(version),
        "negotiated version {version:?} outside the approved set"
    );

    let suite = client
        .negotiated_cipher_suite()
        .expect("negotiated cipher suite should be known")
        .suite();
    assert!(
        policy.allows_cipher_suite(suite),
        "negotiated suite {suite:?} outside the approved set"
    );
}

#[test]
fn obsolete_protocol_version_is_rejected_at_construction() {
    activate().expect("activation should succeed");

    let (cert, _) = test_identity();
    let err = tls::client_config_with_versions(&[ProtocolVersion::TLSv1_0], root_store(&cert))
        .expect_err("TLS 1.0 configuration should be rejected");
    assert!(matches!(err, Error::NonCompliantConfiguration(_)));
}

#[test]
fn peer_limited_to_disallowed_suites_cannot_negotiate() {
    activate().expect("activation should succeed");

    let (cert, key) = test_identity();
    let server_config =
        tls::server_config(vec![cert.clone()], key).expect("compliant server config should build");

    // A client that only offers ChaCha20-Poly1305, which the policy
    // excludes.
    let noncompliant_provider = rustls::crypto::CryptoProvider {
        cipher_suites: vec![rustls::crypto::aws_lc_rs::cipher_suite::TLS13_CHACHA20_POLY1305_SHA256],
        ..rustls::crypto::aws_lc_rs::default_provider()
    };
    let client_config = ClientConfig::builder_with_provider(Arc::new(noncompliant_provider))
        .with_protocol_versions(&[&rustls::version::TLS13])
        .expect("test client config should build")
        .with_root_certificates(root_store(&cert))
        .with_no_client_auth();

    let server_name = ServerName::try_from("localhost").expect("static test name should parse");
    let mut client = ClientConnection::new(Arc::new(client_config), server_name)
        .expect("client connection should start");
    let mut server =
        ServerConnection::new(Arc::new(server_config)).expect("server connection should start");

    drive(&mut client, &mut server)
        .expect_err("handshake offering only disallowed suites should fail");
    assert!(
        server.negotiated_cipher_suite().is_none(),
        "server must not fall back to a disallowed suite"
    );
}

#[test]
fn gate_built_configs_pass_attestation() {
    activate().expect("activation should succeed");

    let (cert, key) = test_identity();
    let server_config =
        tls::server_config(vec![cert.clone()], key).expect("compliant server config should build");
    let client_config =
        tls::client_config(root_store(&cert)).expect("compliant client config should build");

    tls::ensure_client_compliant(&client_config)
        .expect("gate-built client config should pass attestation");
    tls::ensure_server_compliant(&server_config)
        .expect("gate-built server config should pass attestation");
}

#[test]
fn foreign_provider_config_fails_attestation() {
    activate().expect("activation should succeed");

    let (cert, _) = test_identity();

    // Built from an unrestricted provider rather than the gate's install.
    let foreign = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = ClientConfig::builder_with_provider(foreign)
        .with_protocol_versions(&[&rustls::version::TLS13])
        .expect("test client config should build")
        .with_root_certificates(root_store(&cert))
        .with_no_client_auth();

    let err = tls::ensure_client_compliant(&config)
        .expect_err("configuration from a foreign provider should fail attestation");
    assert!(matches!(err, Error::NonCompliantConfiguration(_)));
}
