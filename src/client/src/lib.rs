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

//! Typed client over a single reconnectable connection (SPEC_FULL.md §4.6):
//! `start`, `put_row`, `end_put`, `get`, `partition_bounds`, `stop`,
//! `close`. Every operation but `start` transparently reconnects and
//! retries on a transient transport failure, using the `Retry` policy in
//! [`retry`] — mirroring `journal-client`'s `read/uncommitted/retry.rs`
//! shape, backed by the `exponential-backoff` crate.

pub mod error;
pub mod retry;

use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::warn;

use shuffler_codec::TypeDescriptor;
use shuffler_common::ShuffleId;
use shuffler_common::config::{DeployConfig, Location};
use shuffler_protocol as proto;
use shuffler_transport::{Tokens, TOKEN_LEN};

pub use error::{ClientError, Result};
pub use retry::{ExponentialBackoff, Retry};

/// Everything needed to dial and authenticate to the shuffle server, beyond
/// the row type descriptor that `start` sends.
pub struct ClientConfig {
    pub deploy: DeployConfig,
    pub ca_cert_path: PathBuf,
    pub service: String,
    pub tokens: Tokens,
}

type Conn = TlsStream<TcpStream>;

pub struct Client<R: Retry = ExponentialBackoff> {
    config: ClientConfig,
    connector: TlsConnector,
    conn: Option<Conn>,
    id: Option<ShuffleId>,
    /// Whether the current connection already has an open PUT row-stream
    /// (opcode + id sent, terminator not yet sent). Reset whenever the
    /// connection is torn down, since a fresh connection has no such state
    /// on the server side and the next row must re-open the stream.
    put_active: bool,
    retry: R,
}

impl Client<ExponentialBackoff> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_retry(config, ExponentialBackoff::new())
    }
}

impl<R: Retry> Client<R> {
    pub fn with_retry(config: ClientConfig, retry: R) -> Result<Self> {
        let connector = shuffler_transport::client_connector(&config.ca_cert_path)?;
        Ok(Self { config, connector, conn: None, id: None, put_active: false, retry })
    }

    async fn dial(&self) -> Result<Conn> {
        let (host, port) = self.config.deploy.resolve_host_port();
        let tcp = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(shuffler_transport::TransportError::Io)?;
        let server_name = rustls::pki_types::ServerName::try_from(host.clone())
            .map_err(|_| shuffler_transport::TransportError::Tls(format!("invalid server name '{host}'")))?
            .to_owned();
        let mut stream = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(shuffler_transport::TransportError::Io)?;

        match self.config.deploy.location {
            Location::Direct => {
                shuffler_transport::client_direct(&mut stream, &self.config.tokens).await?;
            }
            Location::ProxiedInternal | Location::ProxiedExternal => {
                shuffler_transport::client_proxied(
                    &mut stream,
                    &self.config.tokens,
                    &self.config.deploy.default_namespace,
                    &self.config.service,
                    port,
                )
                .await?;
            }
        }
        Ok(stream)
    }

    /// Lazily (re)establishes the connection. Does not reissue `START` —
    /// only the transport handshake is repeated; the caller is responsible
    /// for re-sending the shuffle operation once connected.
    async fn ensure_connected(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }
        self.conn = Some(self.dial().await?);
        Ok(())
    }

    fn conn_mut(&mut self) -> &mut Conn {
        self.conn.as_mut().expect("ensure_connected called first")
    }

    /// Runs `op` against the current connection, reconnecting and retrying
    /// on a retryable error per spec.md §4.6, until it succeeds or `Retry`
    /// gives up.
    async fn with_retry<T, F>(&mut self, mut op: F) -> Result<T>
    where
        F: for<'a> FnMut(&'a mut Conn) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<T>> + 'a>>,
    {
        loop {
            self.ensure_connected().await?;
            let result = op(self.conn_mut()).await;
            match result {
                Ok(v) => {
                    self.retry.reset();
                    return Ok(v);
                }
                Err(e) => {
                    self.conn = None;
                    self.put_active = false;
                    match self.retry.next_backoff(&e) {
                        Some(delay) => {
                            warn!(error = %e, delay_ms = delay.as_millis(), "retrying after transport error");
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(e),
                    }
                }
            }
        }
    }

    /// START is never retried (spec.md §4.6): a failure surfaces
    /// immediately, since retrying would allocate a second shuffle.
    pub async fn start(&mut self, descriptor: TypeDescriptor) -> Result<ShuffleId> {
        self.ensure_connected().await?;
        let stream = self.conn_mut();
        let result: Result<ShuffleId> = async {
            proto::write_start_request(stream, &descriptor).await?;
            Ok(proto::read_start_response(stream).await?)
        }
        .await;

        match result {
            Ok(id) => {
                self.id = Some(id);
                self.retry.reset();
                Ok(id)
            }
            Err(e) => {
                self.conn = None;
                Err(ClientError::Start(e.to_string()))
            }
        }
    }

    fn id(&self) -> Result<ShuffleId> {
        self.id.ok_or(ClientError::NotStarted)
    }

    /// Sends one row; call [`Client::end_put`] to flush and await the ack.
    /// The OP_PUT header is sent once per batch — only when this connection
    /// doesn't already have a row-stream open — since the server reads a
    /// single opcode and then loops on row frames until the terminator.
    pub async fn put_row(&mut self, encoded_row: Vec<u8>) -> Result<()> {
        let id = self.id()?;
        let send_header = !self.put_active;
        self.with_retry(move |conn| {
            let encoded_row = encoded_row.clone();
            Box::pin(async move {
                if send_header {
                    proto::write_simple_request(conn, proto::OP_PUT, id).await?;
                }
                proto::write_row_frame(conn, &encoded_row).await?;
                Ok(())
            })
        })
        .await?;
        self.put_active = true;
        Ok(())
    }

    /// Terminates the current PUT batch and waits for the server's ack,
    /// per spec.md §4.6's durability contract (ack observed ⇒ durable). If
    /// no row was ever sent there is no open stream to close; still open
    /// one so an empty PUT batch is a legal no-op round trip.
    pub async fn end_put(&mut self) -> Result<()> {
        let id = self.id()?;
        let send_header = !self.put_active;
        self.with_retry(move |conn| {
            Box::pin(async move {
                if send_header {
                    proto::write_simple_request(conn, proto::OP_PUT, id).await?;
                }
                proto::write_stream_terminator(conn).await?;
                Ok(proto::read_ack(conn).await?)
            })
        })
        .await?;
        self.put_active = false;
        Ok(())
    }

    pub async fn get(
        &mut self,
        start: Vec<u8>,
        start_inclusive: bool,
        end: Vec<u8>,
        end_inclusive: bool,
    ) -> Result<Vec<Vec<u8>>> {
        let id = self.id()?;
        self.with_retry(move |conn| {
            let range = proto::KeyRange {
                start: start.clone(),
                start_inclusive,
                end: end.clone(),
                end_inclusive,
            };
            Box::pin(async move {
                proto::write_get_request(conn, id, &range).await?;
                let mut rows = Vec::new();
                while let Some(row) = proto::read_row_frame(conn).await? {
                    rows.push(row);
                }
                Ok(rows)
            })
        })
        .await
    }

    pub async fn partition_bounds(&mut self, n: u32) -> Result<Vec<Vec<u8>>> {
        let id = self.id()?;
        self.with_retry(move |conn| {
            Box::pin(async move {
                proto::write_partition_bounds_request(conn, id, n).await?;
                let mut keys = Vec::new();
                while let Some(key) = proto::read_key_frame(conn).await? {
                    keys.push(key);
                }
                Ok(keys)
            })
        })
        .await
    }

    pub async fn stop(&mut self) -> Result<()> {
        let id = self.id()?;
        self.with_retry(move |conn| {
            Box::pin(async move {
                proto::write_simple_request(conn, proto::OP_STOP, id).await?;
                Ok(proto::read_ack(conn).await?)
            })
        })
        .await?;
        self.id = None;
        self.put_active = false;
        Ok(())
    }

    /// Sends `EOS` and closes the connection. Not retried: a close that
    /// fails mid-flight just means the socket tears down anyway.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.as_mut() {
            let _ = send_eos(conn).await;
        }
        self.conn = None;
        Ok(())
    }
}

async fn send_eos<S: AsyncRead + AsyncWrite + Unpin>(stream: &mut S) -> Result<()> {
    proto::write_eos(stream).await?;
    proto::read_eos_echo(stream).await?;
    Ok(())
}

/// Builds a [`Tokens`] using a single default-namespace secret, for the
/// common case of a service living in the default namespace (spec.md
/// §4.7's "32 zero bytes if the service is in the default namespace").
pub fn same_namespace_tokens(default_namespace_token: [u8; TOKEN_LEN]) -> Tokens {
    Tokens::same_namespace(default_namespace_token)
}
