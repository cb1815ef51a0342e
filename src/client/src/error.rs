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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] shuffler_transport::TransportError),
    #[error(transparent)]
    Proto(#[from] shuffler_protocol::ProtoError),
    /// START is never retried (spec.md §4.6): a failed START surfaces
    /// immediately, because retrying it would allocate a second shuffle.
    #[error("start failed: {0}")]
    Start(String),
    #[error("no shuffle started on this client")]
    NotStarted,
}

impl ClientError {
    /// Every kind except a failed START is transient-by-construction here:
    /// transport and protocol errors on PUT/GET/STOP/PARTITION_BOUNDS are
    /// exactly the ones spec.md §4.6 says the client reconnects and retries
    /// on. `Start` is deliberately excluded.
    pub fn retryable(&self) -> bool {
        match self {
            ClientError::Transport(e) => e.retryable(),
            ClientError::Proto(e) => e.retryable(),
            ClientError::Start(_) | ClientError::NotStarted => false,
        }
    }
}
