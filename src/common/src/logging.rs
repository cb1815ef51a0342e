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

//! Logging bootstrap shared by the `shuffle-server` and client binaries.

use tracing::Level;
use tracing_subscriber::filter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;

pub struct LoggerSettings {
    /// Render colored output; disabled automatically when stderr isn't a tty.
    pub colorful: bool,
}

impl LoggerSettings {
    pub fn new_default() -> Self {
        Self {
            colorful: std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Configure log targets for the shuffler crates. Third-party crates stay at
/// WARN unless `RUST_LOG` overrides them explicitly.
fn configure_shuffler_targets(targets: filter::Targets) -> filter::Targets {
    targets
        .with_target("shuffler_server", Level::DEBUG)
        .with_target("shuffler_client", Level::DEBUG)
        .with_target("shuffler_store", Level::DEBUG)
        .with_target("shuffler_protocol", Level::DEBUG)
        .with_target("shuffler_transport", Level::DEBUG)
        .with_target("tokio_rustls", Level::WARN)
        .with_target("rustls", Level::WARN)
}

/// Installs the process-wide `tracing` subscriber. Call once at binary
/// startup, before any other logging happens. `RUST_LOG` always wins when
/// set; otherwise falls back to the per-crate target levels below.
pub fn init_logger(settings: LoggerSettings) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(settings.colorful);

    match std::env::var("RUST_LOG") {
        Ok(directive) => {
            let env_filter = tracing_subscriber::EnvFilter::new(directive);
            tracing_subscriber::registry()
                .with(fmt_layer.with_filter(env_filter))
                .init();
        }
        Err(_) => {
            let filter = configure_shuffler_targets(filter::Targets::new().with_default(Level::INFO));
            tracing_subscriber::registry()
                .with(fmt_layer.with_filter(filter))
                .init();
        }
    }
}
