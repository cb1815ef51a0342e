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

//! Bucket-balance property for `Store::partition_keys` (spec.md §8 scenario
//! 4: "large random key set, assert partition bucket sizes are within ±10%
//! of equal split"). `partition_keys_bounds_are_exact_min_and_max` in
//! `lib.rs` only checks the first/last boundary; this checks the interior
//! ones actually carve the keyspace up evenly.

use rand::seq::SliceRandom;
use shuffler_store::Store;

const KEY_COUNT: u64 = 10_000;
const PARTITIONS: usize = 4;

#[tokio::test]
async fn partition_keys_splits_a_large_random_key_set_within_ten_percent() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().to_path_buf()).await.unwrap();

    let mut keys: Vec<u64> = (0..KEY_COUNT).collect();
    keys.shuffle(&mut rand::thread_rng());
    for k in &keys {
        store.put(k.to_be_bytes().to_vec(), Vec::new()).unwrap();
    }

    let bounds = store.partition_keys(PARTITIONS).unwrap();
    assert_eq!(bounds.len(), PARTITIONS + 1);
    assert_eq!(bounds.first().unwrap().as_slice(), &0u64.to_be_bytes());
    assert_eq!(bounds.last().unwrap().as_slice(), &(KEY_COUNT - 1).to_be_bytes());
    for w in bounds.windows(2) {
        assert!(w[0] <= w[1], "bounds must be monotone: {w:?}");
    }

    let mut sorted_keys: Vec<u64> = keys.clone();
    sorted_keys.sort_unstable();
    let bound_values: Vec<u64> = bounds
        .iter()
        .map(|b| u64::from_be_bytes(b.as_slice().try_into().unwrap()))
        .collect();

    let expected_per_bucket = KEY_COUNT as f64 / PARTITIONS as f64;
    let tolerance = expected_per_bucket * 0.10;

    for i in 0..PARTITIONS {
        let lo = bound_values[i];
        let hi = bound_values[i + 1];
        let count = if i + 1 == PARTITIONS {
            sorted_keys.iter().filter(|&&k| k >= lo && k <= hi).count()
        } else {
            sorted_keys.iter().filter(|&&k| k >= lo && k < hi).count()
        };
        let diff = (count as f64 - expected_per_bucket).abs();
        assert!(
            diff <= tolerance,
            "bucket {i} holds {count} keys, expected {expected_per_bucket} +/- {tolerance}"
        );
    }
}
