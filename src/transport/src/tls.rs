// Copyright 2026 The Shuffler Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Certificate/key loading and acceptor/connector construction, grounded on
//! `dekaf`'s raw-socket TLS bootstrap (`crates/dekaf/src/main.rs`'s
//! `load_certs`/`load_key` plus its `tokio_rustls::TlsAcceptor::from`
//! setup) — the closest example in the retrieval pack to terminating TLS on
//! a bare byte stream rather than through an HTTP server wrapper.

use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::error::{Result, TransportError};

pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = std::fs::File::open(path).map_err(TransportError::Io)?;
    rustls_pemfile::certs(&mut std::io::BufReader::new(file))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(TransportError::Io)
}

pub fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = std::fs::File::open(path).map_err(TransportError::Io)?;
    rustls_pemfile::private_key(&mut std::io::BufReader::new(file))
        .map_err(TransportError::Io)?
        .ok_or_else(|| TransportError::Tls("no private key found in key file".into()))
}

/// Builds a mutually-authenticated server acceptor from a `cert.pem`/
/// `key.pem` pair in `tls_dir` (SPEC_FULL.md §4.7's "TLS material
/// directory").
pub fn server_acceptor(tls_dir: &Path) -> Result<TlsAcceptor> {
    let certs = load_certs(&tls_dir.join("cert.pem"))?;
    let key = load_key(&tls_dir.join("key.pem"))?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| TransportError::Tls(e.to_string()))?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Builds a client connector trusting the CA bundle at `ca_path`. Mutual
/// authentication here happens one layer up, in the token handshake
/// (`handshake.rs`) that follows the TLS handshake — spec.md §4.7 never asks
/// for client-certificate verification, only that the channel itself is TLS
/// and that both sides then exchange namespace tokens.
pub fn client_connector(ca_path: &Path) -> Result<TlsConnector> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in load_certs(ca_path)? {
        roots
            .add(cert)
            .map_err(|e| TransportError::Tls(e.to_string()))?;
    }
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}
