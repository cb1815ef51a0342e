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

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TLS error: {0}")]
    Tls(String),
    /// The proxy (or server, in direct mode) returned a non-1 ack byte
    /// (spec.md §7's `TransportAck`, client-side only).
    #[error("transport declined the connection (ack byte {0})")]
    Ack(u8),
}

impl TransportError {
    /// Everything here happens before a shuffle operation is even attempted,
    /// so every failure is safe to retry with backoff — the same policy the
    /// client applies to mid-operation transport drops (spec.md §4.6).
    pub fn retryable(&self) -> bool {
        true
    }
}
