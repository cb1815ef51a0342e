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

//! Per-connection state machine (SPEC_FULL.md §4.5): `AwaitOp ->
//! (ReadPayload -> Dispatch -> WriteResponse -> AwaitOp)* -> Terminating`.
//! `EOS` moves to `Terminating`; any parse or I/O error terminates the
//! connection with a log entry tagged by the connection UUID minted at
//! accept time, so traces correlate across a connection's lifetime.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use shuffler_codec::Codec;
use shuffler_common::ShuffleId;
use shuffler_protocol as proto;
use shuffler_registry::ShuffleRegistry;
use shuffler_store::Store;

use crate::error::{Result, ServerError};

/// Idle-connection read timeout (spec.md §5): a connection that issues no
/// request for this long is dropped.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct ConnectionContext {
    pub registry: Arc<ShuffleRegistry>,
    pub scratch_root: PathBuf,
    pub connection_id: [u8; 16],
}

/// Drives one accepted, already-handshaken connection until `EOS`,
/// cancellation, or an unrecoverable error.
pub async fn serve<S>(mut stream: S, ctx: ConnectionContext, cancel: CancellationToken)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let span = info_span!("connection", id = %uuid::Uuid::from_bytes(ctx.connection_id));
    async move {
        info!("connection accepted");
        loop {
            let request = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("server shutting down, closing connection");
                    return;
                }
                result = tokio::time::timeout(IDLE_TIMEOUT, proto::read_request(&mut stream)) => {
                    match result {
                        Err(_) => {
                            info!("idle timeout, closing connection");
                            return;
                        }
                        Ok(Err(e)) => {
                            warn!(error = %e, "closing connection on parse/IO error");
                            return;
                        }
                        Ok(Ok(req)) => req,
                    }
                }
            };

            match request {
                proto::Request::Eos => {
                    let _ = proto::write_eos_echo(&mut stream).await;
                    info!("EOS received, closing connection");
                    return;
                }
                other => {
                    if let Err(e) = dispatch(&mut stream, &ctx, other).await {
                        warn!(error = %e, "closing connection on dispatch error");
                        return;
                    }
                }
            }
        }
    }
    .instrument(span)
    .await
}

async fn dispatch<S>(stream: &mut S, ctx: &ConnectionContext, request: proto::Request) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match request {
        proto::Request::Start(descriptor) => {
            let codec = Codec::new(descriptor)
                .map_err(|e| ServerError::from(shuffler_protocol::ProtoError::from(e)))?;
            let id = ShuffleId::new_random();
            let dir = ctx.scratch_root.join(uuid::Uuid::from_bytes(*id.as_bytes()).to_string());
            let store = Store::open(dir).await.map_err(ServerError::from)?;
            ctx.registry.insert(id, codec, store);
            proto::write_start_response(stream, id).await?;
            Ok(())
        }
        proto::Request::Put { id } => handle_put(stream, ctx, id).await,
        proto::Request::Get { id, range } => handle_get(stream, ctx, id, range).await,
        proto::Request::Stop { id } => {
            ctx.registry.remove(&id).await;
            proto::write_ack(stream).await?;
            Ok(())
        }
        proto::Request::PartitionBounds { id, n } => handle_partition_bounds(stream, ctx, id, n).await,
        proto::Request::Eos => unreachable!("EOS handled by the caller"),
    }
}

async fn handle_put<S>(stream: &mut S, ctx: &ConnectionContext, id: ShuffleId) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let state = ctx
        .registry
        .get(&id)
        .ok_or(shuffler_protocol::ProtoError::UnknownShuffle)?;

    while let Some(encoded_row) = proto::read_row_frame(stream).await? {
        let row = state
            .codec
            .decode_row(&encoded_row)
            .map_err(shuffler_protocol::ProtoError::from)?;
        let key = state.codec.encode_key(&row);
        state.store.put(key, encoded_row).map_err(ServerError::from)?;
    }
    proto::write_ack(stream).await?;
    Ok(())
}

async fn handle_get<S>(
    stream: &mut S,
    ctx: &ConnectionContext,
    id: ShuffleId,
    range: proto::KeyRange,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let state = ctx
        .registry
        .get(&id)
        .ok_or(shuffler_protocol::ProtoError::UnknownShuffle)?;

    // A zero-length start/end is treated as "unbounded on this side"
    // (resolved ambiguity, DESIGN.md's Open Question decisions): a real
    // encoded key with at least one key field is never zero bytes, so this
    // never collides with an actual stored key.
    let lower = if range.start.is_empty() { None } else { Some(range.start.as_slice()) };
    let upper = if range.end.is_empty() { None } else { Some(range.end.as_slice()) };
    let rows = state
        .store
        .range(lower, range.start_inclusive, upper, range.end_inclusive)
        .await
        .map_err(ServerError::from)?;

    for (_, value) in rows {
        proto::write_row_frame(stream, &value).await?;
    }
    proto::write_stream_terminator(stream).await?;
    Ok(())
}

async fn handle_partition_bounds<S>(
    stream: &mut S,
    ctx: &ConnectionContext,
    id: ShuffleId,
    n: u32,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let state = ctx
        .registry
        .get(&id)
        .ok_or(shuffler_protocol::ProtoError::UnknownShuffle)?;

    let bounds = state.store.partition_keys(n as usize).map_err(ServerError::from)?;
    for key in bounds {
        proto::write_key_frame(stream, &key).await?;
    }
    proto::write_stream_terminator(stream).await?;
    Ok(())
}
