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

//! Throughput smoke test for a running shuffle server: starts one shuffle,
//! puts a batch of synthetic rows, reports elapsed time and rows/sec, then
//! tears the shuffle down. Mirrors the teacher's `sink_bench` in spirit
//! (`src/bench/sink_bench/main.rs`'s elapsed-time-over-a-fixed-row-count
//! measurement), scaled down to this service's single `put`/`get` surface.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use shuffler_client::{Client, ClientConfig};
use shuffler_codec::{Direction, KeyField, LogicalType, Row, RowField, TypeDescriptor, Value};
use shuffler_common::config::DeployConfig;
use shuffler_common::logging::{init_logger, LoggerSettings};
use shuffler_transport::TOKEN_LEN;

#[derive(Parser, Debug)]
#[command(name = "shuffle-bench")]
struct Opts {
    /// Path to the client deploy-configuration TOML document.
    #[clap(long)]
    deploy_config: PathBuf,

    /// CA bundle the client trusts for the server's TLS certificate.
    #[clap(long)]
    ca_cert: PathBuf,

    /// Service name used in proxied reachability modes.
    #[clap(long, default_value = "shuffle-server")]
    service: String,

    /// Number of synthetic `(i64 key, utf8 value)` rows to put.
    #[clap(long, default_value = "100000")]
    rows: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logger(LoggerSettings::new_default());

    let deploy = DeployConfig::from_file(&opts.deploy_config)?;
    let config = ClientConfig {
        deploy,
        ca_cert_path: opts.ca_cert,
        service: opts.service,
        tokens: shuffler_client::same_namespace_tokens([0u8; TOKEN_LEN]),
    };
    let mut client = Client::new(config)?;

    let descriptor = TypeDescriptor {
        row_fields: vec![
            RowField { name: "key".into(), ty: LogicalType::Int64 },
            RowField { name: "value".into(), ty: LogicalType::Utf8 },
        ],
        key_fields: vec![KeyField { name: "key".into(), direction: Direction::Ascending }],
    };
    let codec = shuffler_codec::Codec::new(descriptor.clone())?;

    let id = client.start(descriptor).await?;
    println!("started shuffle {id}");

    let start = Instant::now();
    for i in 0..opts.rows {
        let row = Row(vec![
            Some(Value::Int64(i as i64)),
            Some(Value::Utf8(format!("row-{i}"))),
        ]);
        let encoded = codec.encode_row(&row)?;
        client.put_row(encoded).await?;
    }
    client.end_put().await?;
    let elapsed = start.elapsed();

    let rows_per_sec = opts.rows as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    println!(
        "put {} rows in {:.3}s ({:.0} rows/sec)",
        opts.rows,
        elapsed.as_secs_f64(),
        rows_per_sec
    );

    client.stop().await?;
    client.close().await?;
    Ok(())
}
