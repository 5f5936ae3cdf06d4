/*
 * net.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Staffetta, an HTTP client library for build and
 * integration tooling.
 *
 * Staffetta is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Staffetta is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Staffetta.  If not, see <http://www.gnu.org/licenses/>.
 */

//! TLS trust strategies and their rustls client configurations.
//!
//! A request carries one of three trust settings: the platform default
//! roots, a caller-supplied PEM trust bundle, or trust-all (accept any
//! certificate and hostname). Each maps to a `ClientConfig` built here;
//! the connection layer does the handshake.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::ClientConfig;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};

/// TLS trust configuration for one request.
#[derive(Debug, Clone, Default)]
pub enum TlsTrust {
    /// Platform trust: native certificate store, webpki roots as fallback.
    #[default]
    Default,
    /// Trust only the certificates in the supplied PEM bundle. The password
    /// travels with the bundle for store formats that require one; PEM
    /// bundles do not use it.
    KeyStore {
        pem: Bytes,
        password: Option<String>,
    },
    /// Accept any server certificate and hostname. For test endpoints with
    /// self-signed certificates only.
    TrustAll,
}

/// Root store from platform native certs, falling back to webpki roots
/// when the platform yields nothing.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    if let Ok(certs) = rustls_native_certs::load_native_certs() {
        for cert in certs {
            let _ = root_store.add(cert);
        }
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

/// Root store from a caller-supplied PEM bundle. A bundle with no usable
/// certificates is an error: the caller asked for a restricted trust set
/// and an empty one would reject every peer with a confusing message.
fn keystore_root_store(pem: &[u8]) -> io::Result<RootCertStore> {
    let mut reader = io::BufReader::new(pem);
    let mut root_store = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert?;
        root_store
            .add(cert)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    }
    if root_store.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "trust store contains no certificates",
        ));
    }
    Ok(root_store)
}

/// Verifier that accepts every certificate and hostname.
#[derive(Debug)]
struct TrustAllVerifier {
    schemes: Vec<SignatureScheme>,
}

impl TrustAllVerifier {
    fn new() -> Self {
        let provider = rustls::crypto::aws_lc_rs::default_provider();
        Self {
            schemes: provider.signature_verification_algorithms.supported_schemes(),
        }
    }
}

impl ServerCertVerifier for TrustAllVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes.clone()
    }
}

/// Build the rustls client config for a trust strategy. HTTP/1.1 only.
pub fn client_config(trust: &TlsTrust) -> io::Result<Arc<ClientConfig>> {
    let mut config = match trust {
        TlsTrust::Default => ClientConfig::builder()
            .with_root_certificates(build_root_store())
            .with_no_client_auth(),
        TlsTrust::KeyStore { pem, .. } => ClientConfig::builder()
            .with_root_certificates(keystore_root_store(pem)?)
            .with_no_client_auth(),
        TlsTrust::TrustAll => ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(TrustAllVerifier::new()))
            .with_no_client_auth(),
    };
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(Arc::new(config))
}
