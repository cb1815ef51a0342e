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

//! Reconnect-with-backoff policy (SPEC_FULL.md §4.6): unbounded retries,
//! bounded exponential backoff, reset on the first success after a run of
//! failures. Shape mirrors `journal-client`'s
//! `read/uncommitted/retry.rs::Retry` trait; re-exports `Backoff` from the
//! same `exponential-backoff` crate it's built on.

use std::time::Duration;

pub use exponential_backoff::Backoff;

use crate::error::ClientError;

/// Decides whether an error admits a retry and how long to wait first.
pub trait Retry: std::fmt::Debug + Clone {
    fn reset(&mut self);
    /// `None` aborts the retry loop and surfaces `error` to the caller.
    fn next_backoff(&mut self, error: &ClientError) -> Option<Duration>;
}

/// Unbounded retries with exponential backoff, only for errors the
/// underlying layer marks retryable (spec.md §4.6: every operation but
/// START reconnects transparently on transient transport errors).
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    attempt: u32,
    backoff: Backoff,
}

impl ExponentialBackoff {
    pub fn new() -> Self {
        Self {
            attempt: 0,
            backoff: Backoff::new(u32::MAX, Duration::from_millis(100), Some(Duration::from_secs(30))),
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Retry for ExponentialBackoff {
    fn reset(&mut self) {
        self.attempt = 0;
    }

    fn next_backoff(&mut self, error: &ClientError) -> Option<Duration> {
        if !error.retryable() {
            return None;
        }
        self.attempt += 1;
        self.backoff.next(self.attempt)
    }
}
