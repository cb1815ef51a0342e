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

use std::sync::Arc;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A flush or merge hit an I/O error (spec.md §4.2/§7). The store is
    /// poisoned from this point forward.
    #[error("store I/O error: {0}")]
    StoreIoError(Arc<std::io::Error>),
    /// A prior I/O failure poisoned this store; every subsequent operation
    /// fails the same way until an explicit `close()` tears it down
    /// (spec.md §7).
    #[error("shuffle poisoned by a prior store failure")]
    ShufflePoisoned,
}

impl Error {
    /// Store errors are never transient from the server's point of view:
    /// `StoreIoError` poisons the shuffle and `ShufflePoisoned` just
    /// reports that poisoning. Neither goes away on its own.
    pub fn retryable(&self) -> bool {
        false
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StoreIoError(Arc::new(e))
    }
}
