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

//! The shuffle server listener (SPEC_FULL.md §6): one TLS-terminated TCP
//! port, one lightweight task per accepted connection, graceful shutdown via
//! a `CancellationToken` handed to every in-flight connection task (grounded
//! on `dekaf`'s Ctrl-C wiring in `crates/dekaf/src/main.rs`).

pub mod connection;
pub mod error;
pub mod metrics;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use shuffler_registry::ShuffleRegistry;
use shuffler_transport::{server_accept, server_acceptor, TOKEN_LEN};

pub use error::{Result, ServerError};

pub struct ServerConfig {
    pub port: u16,
    pub tls_dir: PathBuf,
    pub scratch_root: PathBuf,
}

pub struct Server {
    config: ServerConfig,
    registry: Arc<ShuffleRegistry>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ShuffleRegistry::new()),
        }
    }

    /// Shared handle to the shuffle registry, for a side listener (e.g. the
    /// `/healthz` service) that wants to report liveness without touching
    /// the wire port.
    pub fn registry(&self) -> Arc<ShuffleRegistry> {
        self.registry.clone()
    }

    /// Binds the configured port and serves connections until `cancel` fires.
    /// Each accepted connection gets its own task; shutdown lets in-flight
    /// operations finish their current record before the connection task
    /// observes cancellation and exits (spec.md §5).
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let acceptor = server_acceptor(&self.config.tls_dir)?;
        let listener = TcpListener::bind(("0.0.0.0", self.config.port)).await?;
        info!(port = self.config.port, "shuffle server listening");

        loop {
            let accepted = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                result = listener.accept() => result,
            };

            let (tcp_stream, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            let acceptor = acceptor.clone();
            let registry = self.registry.clone();
            let scratch_root = self.config.scratch_root.clone();
            let cancel = cancel.clone();

            tokio::spawn(async move {
                let mut tls_stream = match acceptor.accept(tcp_stream).await {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(%peer, error = %e, "TLS handshake failed");
                        return;
                    }
                };

                let connection_id = match server_accept(&mut tls_stream, accept_all_tokens).await {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(%peer, error = %e, "token handshake failed");
                        return;
                    }
                };

                let ctx = connection::ConnectionContext {
                    registry,
                    scratch_root,
                    connection_id,
                };
                connection::serve(tls_stream, ctx, cancel).await;
            });
        }
    }
}

/// The wire shape requires a handshake; spec.md leaves the acceptance
/// policy itself to the deployment, so absent a configured allow-list every
/// presented namespace pair is accepted.
fn accept_all_tokens(_default_namespace: &[u8; TOKEN_LEN], _service_namespace: &[u8; TOKEN_LEN]) -> bool {
    true
}
