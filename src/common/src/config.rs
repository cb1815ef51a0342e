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

//! Client deploy-configuration document (spec.md/SPEC_FULL.md §6): how a
//! client locates the shuffle server it should talk to.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Reachability mode a client uses to reach the shuffle server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Location {
    /// Resolve `<service>.<namespace>` directly.
    Direct,
    /// Go through a proxy reachable from inside the cluster.
    ProxiedInternal,
    /// Go through a proxy reachable from outside the cluster.
    ProxiedExternal,
}

/// Deploy-configuration document recognized by the client (spec.md §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeployConfig {
    pub location: Location,
    pub default_namespace: String,
    pub domain: String,
    /// Port the shuffle server listens on, absent a `SHUFFLER_PORT` override.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    7761
}

impl DeployConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&contents)?)
    }

    /// Applies the `SHUFFLER_HOST`/`SHUFFLER_PORT` environment overrides
    /// documented in spec.md §6, returning the effective `(host, port)` to
    /// dial.
    pub fn resolve_host_port(&self) -> (String, u16) {
        let host = env::var("SHUFFLER_HOST").unwrap_or_else(|_| self.domain.clone());
        let port = env::var("SHUFFLER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.port);
        (host, port)
    }
}
