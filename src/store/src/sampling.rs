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

//! Reservoir sampling of keys during insertion, used by `partition_keys`
//! (SPEC_FULL.md §4.2) to approximate equi-depth partition boundaries
//! without scanning the whole store on every call.

use rand::Rng;

pub struct Reservoir {
    capacity: usize,
    samples: Vec<Vec<u8>>,
    seen: u64,
}

impl Reservoir {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: Vec::with_capacity(capacity),
            seen: 0,
        }
    }

    pub fn observe(&mut self, key: &[u8]) {
        self.seen += 1;
        if self.samples.len() < self.capacity {
            self.samples.push(key.to_vec());
            return;
        }
        let mut rng = rand::thread_rng();
        let j = rng.gen_range(0..self.seen);
        if (j as usize) < self.capacity {
            self.samples[j as usize] = key.to_vec();
        }
    }

    pub fn samples(&self) -> &[Vec<u8>] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Picks `n + 1` boundary keys approximately equally partitioning the key
/// distribution (spec.md §4.2). The first and last boundaries are always the
/// store's exact running minimum and maximum key (tracked separately from
/// the reservoir so the ≤min/≥max invariant holds exactly, not just
/// approximately); the interior boundaries come from uniform positions in
/// the sorted reservoir sample. Returns an empty list iff `n == 0`.
pub fn partition_keys(min: &[u8], max: &[u8], sorted_sample: &[Vec<u8>], n: usize) -> Vec<Vec<u8>> {
    if n == 0 {
        return Vec::new();
    }
    if sorted_sample.is_empty() {
        return std::iter::repeat(min.to_vec()).take(n + 1).collect();
    }

    let last_idx = sorted_sample.len() - 1;
    let mut out = Vec::with_capacity(n + 1);
    out.push(min.to_vec());
    for i in 1..n {
        let pos = (i * last_idx) / n;
        out.push(sorted_sample[pos.min(last_idx)].clone());
    }
    out.push(max.to_vec());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_partitions_returns_empty() {
        let sample = vec![b"a".to_vec()];
        assert!(partition_keys(b"a", b"a", &sample, 0).is_empty());
    }

    #[test]
    fn boundaries_span_min_to_max_and_are_monotone() {
        let sample: Vec<Vec<u8>> = (1u8..99).map(|b| vec![b]).collect();
        let bounds = partition_keys(&[0u8], &[99u8], &sample, 4);
        assert_eq!(bounds.len(), 5);
        assert_eq!(bounds.first().unwrap().as_slice(), &[0u8]);
        assert_eq!(bounds.last().unwrap().as_slice(), &[99u8]);
        for w in bounds.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn empty_sample_still_returns_n_plus_one_bounds() {
        let bounds = partition_keys(b"only", b"only", &[], 3);
        assert_eq!(bounds.len(), 4);
        assert!(bounds.iter().all(|b| b == b"only"));
    }
}
