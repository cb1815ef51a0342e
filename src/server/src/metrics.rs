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

//! Minimal health-check listener (SPEC_FULL.md §6), grounded on the
//! teacher's `MetricsManager::boot_metrics_service`
//! (`common_service/src/metrics_manager.rs`): a side `axum` service next to
//! the main wire-protocol port. Scoped down to a liveness check since full
//! Prometheus export is out of this component's budget.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use shuffler_registry::ShuffleRegistry;

/// Serves `GET /healthz` until `cancel` fires, returning the number of live
/// shuffles as plain text so an operator curl tells liveness from load.
pub async fn serve_healthz(port: u16, registry: Arc<ShuffleRegistry>, cancel: CancellationToken) {
    let app = Router::new().route(
        "/healthz",
        get(move || {
            let registry = registry.clone();
            async move { format!("ok shuffles={}\n", registry.len()) }
        }),
    );

    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(l) => l,
        Err(e) => {
            error!(port, error = %e, "failed to bind healthz listener");
            return;
        }
    };
    info!(port, "healthz listener up");

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        cancel.cancelled().await;
    });
    if let Err(e) = serve.await {
        error!(error = %e, "healthz service exited with error");
    }
}
