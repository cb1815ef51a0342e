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

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Proto(#[from] shuffler_protocol::ProtoError),
    #[error(transparent)]
    Transport(#[from] shuffler_transport::TransportError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A store failure is never the client's fault — unlike the other
/// `ProtoError` variants, it doesn't mean the request was malformed — so
/// both `shuffler_store::Error` variants map to `ShufflePoisoned` here: a
/// `StoreIoError` is the poisoning event itself (the store is unusable for
/// this shuffle from this point on), and `ShufflePoisoned` just reports
/// poisoning that already happened.
impl From<shuffler_store::Error> for ServerError {
    fn from(e: shuffler_store::Error) -> Self {
        match e {
            shuffler_store::Error::ShufflePoisoned | shuffler_store::Error::StoreIoError(_) => {
                ServerError::Proto(shuffler_protocol::ProtoError::ShufflePoisoned)
            }
        }
    }
}
