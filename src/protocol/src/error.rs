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

pub type Result<T> = std::result::Result<T, ProtoError>;

/// Wire-visible error kinds (spec.md §7). Every variant here closes the
/// connection; there is no in-band error frame.
#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("unknown shuffle identifier")]
    UnknownShuffle,
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("shuffle poisoned by a prior store failure")]
    ShufflePoisoned,
    #[error("truncated record")]
    Truncated,
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtoError {
    /// The server always closes the connection on any of these (spec.md
    /// §7); there is no server-side retry. On the client side, only `Io` —
    /// a transient transport failure — is worth reconnecting and retrying
    /// over (spec.md §4.6). The rest are semantic rejections (unknown
    /// shuffle, poisoned store, malformed framing, type mismatch) that a
    /// reconnect would just reproduce.
    pub fn retryable(&self) -> bool {
        matches!(self, ProtoError::Io(_))
    }
}

impl From<shuffler_codec::Error> for ProtoError {
    fn from(e: shuffler_codec::Error) -> Self {
        match e {
            shuffler_codec::Error::Truncated => ProtoError::Truncated,
            shuffler_codec::Error::MalformedRecord(m) => ProtoError::MalformedRequest(m),
            shuffler_codec::Error::TypeMismatch(m) => ProtoError::TypeMismatch(m),
        }
    }
}
