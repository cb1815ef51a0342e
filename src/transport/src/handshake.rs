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

//! Post-TLS token handshake (SPEC_FULL.md §4.7): direct and proxied
//! reachability modes, each ending in a 1-byte ack and a server-minted
//! 16-byte per-connection UUID.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, TransportError};

pub const TOKEN_LEN: usize = 32;

pub struct Tokens {
    pub default_namespace: [u8; TOKEN_LEN],
    pub service_namespace: [u8; TOKEN_LEN],
}

impl Tokens {
    /// The all-zero service-namespace token stands for "service is in the
    /// default namespace" (spec.md §4.7).
    pub fn same_namespace(default_namespace: [u8; TOKEN_LEN]) -> Self {
        Self {
            default_namespace,
            service_namespace: [0u8; TOKEN_LEN],
        }
    }
}

/// Client-side direct-mode handshake: write both tokens, read the ack and
/// the server-assigned connection UUID.
pub async fn client_direct<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    tokens: &Tokens,
) -> Result<[u8; 16]> {
    stream.write_all(&tokens.default_namespace).await?;
    stream.write_all(&tokens.service_namespace).await?;
    stream.flush().await?;
    read_ack_and_uuid(stream).await
}

/// Client-side proxied-mode handshake: tokens, then a length-prefixed
/// namespace, length-prefixed service name, and 2-byte port, then the same
/// ack/UUID tail as direct mode.
pub async fn client_proxied<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    tokens: &Tokens,
    namespace: &str,
    service: &str,
    port: u16,
) -> Result<[u8; 16]> {
    stream.write_all(&tokens.default_namespace).await?;
    stream.write_all(&tokens.service_namespace).await?;
    write_length_prefixed(stream, namespace.as_bytes()).await?;
    write_length_prefixed(stream, service.as_bytes()).await?;
    stream.write_u16(port).await?;
    stream.flush().await?;
    read_ack_and_uuid(stream).await
}

async fn read_ack_and_uuid<S: AsyncRead + Unpin>(stream: &mut S) -> Result<[u8; 16]> {
    let ack = stream.read_u8().await?;
    if ack != 1 {
        return Err(TransportError::Ack(ack));
    }
    let mut uuid = [0u8; 16];
    stream.read_exact(&mut uuid).await?;
    Ok(uuid)
}

async fn write_length_prefixed<S: AsyncWrite + Unpin>(stream: &mut S, bytes: &[u8]) -> Result<()> {
    stream.write_u32(bytes.len() as u32).await?;
    stream.write_all(bytes).await?;
    Ok(())
}

/// Server-side mirror of the direct handshake (spec.md §4.7): read both
/// tokens, optionally reject, mint a UUID, write the ack and UUID.
/// `accept` decides whether the presented tokens are acceptable; the
/// caller supplies the acceptance policy (spec.md leaves token validation
/// scope to the deployment, only the wire shape is specified).
pub async fn server_accept<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    accept: impl FnOnce(&[u8; TOKEN_LEN], &[u8; TOKEN_LEN]) -> bool,
) -> Result<[u8; 16]> {
    let mut default_namespace = [0u8; TOKEN_LEN];
    let mut service_namespace = [0u8; TOKEN_LEN];
    stream.read_exact(&mut default_namespace).await?;
    stream.read_exact(&mut service_namespace).await?;

    if !accept(&default_namespace, &service_namespace) {
        stream.write_u8(0).await?;
        stream.flush().await?;
        return Err(TransportError::Ack(0));
    }

    let uuid: [u8; 16] = rand::random();
    stream.write_u8(1).await?;
    stream.write_all(&uuid).await?;
    stream.flush().await?;
    Ok(uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn direct_handshake_round_trips() {
        let (mut client, mut server) = duplex(1024);
        let tokens = Tokens::same_namespace([7u8; TOKEN_LEN]);

        let server_task = tokio::spawn(async move { server_accept(&mut server, |_, _| true).await });
        let client_uuid = client_direct(&mut client, &tokens).await.unwrap();
        let server_uuid = server_task.await.unwrap().unwrap();
        assert_eq!(client_uuid, server_uuid);
    }

    #[tokio::test]
    async fn server_rejection_surfaces_as_ack_error() {
        let (mut client, mut server) = duplex(1024);
        let tokens = Tokens::same_namespace([1u8; TOKEN_LEN]);

        let server_task = tokio::spawn(async move { server_accept(&mut server, |_, _| false).await });
        let result = client_direct(&mut client, &tokens).await;
        assert!(matches!(result, Err(TransportError::Ack(0))));
        let _ = server_task.await.unwrap();
    }
}
