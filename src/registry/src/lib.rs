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

//! Process-wide mapping from shuffle identifier to live shuffle state
//! (SPEC_FULL.md §4.4): `insert`, `get`, `remove`, guarded by a
//! `parking_lot::RwLock` so lookups (the common case — every PUT/GET hits
//! this map) don't contend with each other, only with the rarer
//! insert/remove from START/STOP.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::info;

use shuffler_codec::Codec;
use shuffler_common::ShuffleId;
use shuffler_store::Store;

/// Everything the Registry tracks for one live shuffle (spec.md §3's
/// "Shuffle state"). The type descriptor lives inside `codec`, which also
/// carries the validated key-field indices so dispatch never re-validates
/// the structural-prefix rule on every PUT/GET.
pub struct ShuffleState {
    pub id: ShuffleId,
    pub codec: Codec,
    pub store: Arc<Store>,
    pub created_at: Instant,
}

#[derive(Default)]
pub struct ShuffleRegistry {
    shuffles: RwLock<HashMap<ShuffleId, Arc<ShuffleState>>>,
}

impl ShuffleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: ShuffleId, codec: Codec, store: Arc<Store>) {
        let state = Arc::new(ShuffleState {
            id,
            codec,
            store,
            created_at: Instant::now(),
        });
        self.shuffles.write().insert(id, state);
        info!(shuffle = %id, "shuffle registered");
    }

    /// A lookup miss is a sentinel absence (spec.md §4.4); callers translate
    /// that into `UnknownShuffle` on the wire.
    pub fn get(&self, id: &ShuffleId) -> Option<Arc<ShuffleState>> {
        self.shuffles.read().get(id).cloned()
    }

    /// Removes a shuffle and closes its Store. A second `remove` for an
    /// already-gone identifier is a no-op (spec.md §8's idempotent-STOP
    /// property), surfaced to callers as the same lookup-miss sentinel as
    /// `get`.
    pub async fn remove(&self, id: &ShuffleId) -> Option<Arc<ShuffleState>> {
        let state = self.shuffles.write().remove(id)?;
        if let Err(e) = state.store.close().await {
            tracing::warn!(shuffle = %id, error = %e, "error closing store on removal");
        }
        info!(shuffle = %id, "shuffle removed");
        Some(state)
    }

    pub fn len(&self) -> usize {
        self.shuffles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
