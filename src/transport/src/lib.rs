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

//! TLS session establishment and the post-handshake token exchange
//! (SPEC_FULL.md §4.7).

pub mod error;
pub mod handshake;
pub mod tls;

pub use error::{Result, TransportError};
pub use handshake::{client_direct, client_proxied, server_accept, Tokens, TOKEN_LEN};
pub use tls::{client_connector, load_certs, load_key, server_acceptor};
