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

use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use shuffler_common::logging::{init_logger, LoggerSettings};
use shuffler_server::{Server, ServerConfig};

/// Accepts rows from parallel producers, keeps them sorted per shuffle
/// session, and serves range scans and partition-boundary queries.
#[derive(Parser, Debug)]
#[command(name = "shuffle-server")]
struct Opts {
    /// TLS port to listen on.
    #[clap(long)]
    port: u16,

    /// Directory containing `cert.pem`/`key.pem`.
    #[clap(long)]
    tls_dir: PathBuf,

    /// Root directory for per-shuffle run files and memtable snapshots.
    #[clap(long, default_value = "./shuffle-data")]
    scratch_root: PathBuf,

    /// Plain-HTTP port to expose `GET /healthz` on. Disabled if unset.
    #[clap(long)]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    init_logger(LoggerSettings::new_default());

    let server = Server::new(ServerConfig {
        port: opts.port,
        tls_dir: opts.tls_dir,
        scratch_root: opts.scratch_root,
    });

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("ctrl-c received, shutting down");
        shutdown.cancel();
    });

    if let Some(metrics_port) = opts.metrics_port {
        let registry = server.registry();
        let metrics_cancel = cancel.clone();
        tokio::spawn(shuffler_server::metrics::serve_healthz(metrics_port, registry, metrics_cancel));
    }

    if let Err(e) = server.run(cancel).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
