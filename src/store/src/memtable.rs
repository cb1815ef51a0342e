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

//! In-memory sorted buffer of recent puts, mirroring the teacher's
//! `SharedBuffer` (storage/src/hummock/shared_buffer/shared_buffer_batch.rs):
//! a balanced tree keyed by encoded bytes, flushed to a run file once it
//! crosses a size threshold (SPEC_FULL.md §4.2).

use std::collections::BTreeMap;

/// One memtable entry: the insertion sequence number breaks ties between
/// rows that share a key, per spec.md §3's "insertion order" rule.
pub type Entry = (u64, Vec<u8>);

#[derive(Default)]
pub struct MemTable {
    // key -> entries inserted under that key, oldest first.
    map: BTreeMap<Vec<u8>, Vec<Entry>>,
    size_bytes: usize,
}

impl MemTable {
    pub fn insert(&mut self, key: Vec<u8>, seq: u64, value: Vec<u8>) {
        self.size_bytes += key.len() + value.len() + std::mem::size_of::<u64>();
        self.map.entry(key).or_default().push((seq, value));
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.size_bytes = 0;
    }

    /// Flattened, key-ordered, insertion-ordered snapshot of the memtable's
    /// contents, ready to either scan in-memory or serialize to a run file.
    pub fn snapshot(&self) -> Vec<(Vec<u8>, u64, Vec<u8>)> {
        let mut out = Vec::new();
        for (key, entries) in &self.map {
            for (seq, value) in entries {
                out.push((key.clone(), *seq, value.clone()));
            }
        }
        out
    }

    pub fn iter_keys(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.map.keys()
    }

    pub fn len_entries(&self) -> usize {
        self.map.values().map(|v| v.len()).sum()
    }
}
