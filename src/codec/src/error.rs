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

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A row or key stream ended before a full record could be read.
    #[error("truncated record")]
    Truncated,
    /// A tag or length in the byte stream did not correspond to any known
    /// encoding.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    /// A `key_fields` list named a field that isn't a structural prefix of
    /// `row_fields` (spec.md §3): missing, or the wrong logical type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

impl Error {
    /// Both kinds are fatal for the connection on which they occur
    /// (spec.md §4.1); codec errors never admit a client-side retry.
    pub fn retryable(&self) -> bool {
        false
    }
}
