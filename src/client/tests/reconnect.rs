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

//! Full client/server round trip over a loopback TLS listener (spec.md §8
//! scenario 6: "kill TCP mid-GET; client reconnects"), using a fixture
//! self-signed certificate rather than `shuffler_server::Server` directly so
//! the test can sever one specific connection without tearing down the
//! listener or the shuffle registry backing it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use shuffler_client::{Client, ClientConfig};
use shuffler_codec::{Direction, KeyField, LogicalType, Row, RowField, TypeDescriptor, Value};
use shuffler_common::config::{DeployConfig, Location};
use shuffler_registry::ShuffleRegistry;
use shuffler_server::connection::{self, ConnectionContext};
use shuffler_transport::TOKEN_LEN;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn descriptor() -> TypeDescriptor {
    TypeDescriptor {
        row_fields: vec![
            RowField { name: "key".into(), ty: LogicalType::Int32 },
            RowField { name: "value".into(), ty: LogicalType::Utf8 },
        ],
        key_fields: vec![KeyField { name: "key".into(), direction: Direction::Ascending }],
    }
}

fn row(key: i32) -> Row {
    Row(vec![Some(Value::Int32(key)), Some(Value::Utf8(format!("row-{key}")))])
}

/// Accepts connections on `listener` forever, handing each one its own
/// cancellation token from `tokens` (falling back to a fresh, never-cancelled
/// token once `tokens` is exhausted) so the test can kill one specific
/// connection while the registry and listener keep running underneath it.
async fn run_test_server(
    listener: TcpListener,
    registry: Arc<ShuffleRegistry>,
    scratch_root: PathBuf,
    tokens: Vec<CancellationToken>,
) {
    let acceptor = shuffler_transport::server_acceptor(&fixtures_dir()).unwrap();
    let mut idx = 0usize;
    loop {
        let Ok((tcp, _)) = listener.accept().await else { return };
        let acceptor = acceptor.clone();
        let registry = registry.clone();
        let scratch_root = scratch_root.clone();
        let token = tokens.get(idx).cloned().unwrap_or_default();
        idx += 1;
        tokio::spawn(async move {
            let Ok(mut tls) = acceptor.accept(tcp).await else { return };
            let Ok(connection_id) = shuffler_transport::server_accept(&mut tls, |_, _| true).await else { return };
            let ctx = ConnectionContext { registry, scratch_root, connection_id };
            connection::serve(tls, ctx, token).await;
        });
    }
}

#[tokio::test]
async fn client_reconnects_after_connection_drop_mid_get() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let registry = Arc::new(ShuffleRegistry::new());
    let scratch = tempfile::tempdir().unwrap();

    // The first accepted connection gets a token we cancel ourselves,
    // mid-test, to simulate its TCP connection dying. Every later
    // connection (the client's reconnect) gets a fresh, live token.
    let first_conn_token = CancellationToken::new();
    let server_task = tokio::spawn(run_test_server(
        listener,
        registry.clone(),
        scratch.path().to_path_buf(),
        vec![first_conn_token.clone()],
    ));

    let config = ClientConfig {
        deploy: DeployConfig {
            location: Location::Direct,
            default_namespace: "default".into(),
            domain: "localhost".into(),
            port,
        },
        ca_cert_path: fixtures_dir().join("cert.pem"),
        service: "shuffle-server".into(),
        tokens: shuffler_client::same_namespace_tokens([0u8; TOKEN_LEN]),
    };
    let mut client = Client::new(config).unwrap();
    let codec = shuffler_codec::Codec::new(descriptor()).unwrap();

    client.start(descriptor()).await.unwrap();

    // Batch A: observed-acked before the connection dies, so it must
    // survive regardless of what happens next.
    for key in [3, 1, 2] {
        let encoded = codec.encode_row(&row(key)).unwrap();
        client.put_row(encoded).await.unwrap();
    }
    client.end_put().await.unwrap();

    // Kill the connection batch A was acked on. The registry/store and the
    // listener are untouched; only this one connection's task tears down.
    first_conn_token.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // This GET is issued against the now-dead connection; the client must
    // transparently reconnect and retry it rather than surface an error.
    let rows = client.get(Vec::new(), true, Vec::new(), true).await.unwrap();
    let decoded: Vec<_> = rows.iter().map(|r| codec.decode_row(r).unwrap()).collect();
    assert_eq!(decoded, vec![row(1), row(2), row(3)]);

    // The reconnect above left the client on a healthy connection; batch B
    // goes through normally on it.
    for key in [5, 4] {
        let encoded = codec.encode_row(&row(key)).unwrap();
        client.put_row(encoded).await.unwrap();
    }
    client.end_put().await.unwrap();

    let rows = client.get(Vec::new(), true, Vec::new(), true).await.unwrap();
    let decoded: Vec<_> = rows.iter().map(|r| codec.decode_row(r).unwrap()).collect();
    assert_eq!(decoded, vec![row(1), row(2), row(3), row(4), row(5)]);

    client.stop().await.unwrap();
    client.close().await.unwrap();
    server_task.abort();
}
