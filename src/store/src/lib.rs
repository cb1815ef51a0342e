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

//! Per-shuffle sorted key-value store (SPEC_FULL.md §4.2): an in-memory
//! memtable accepting `put`s, periodically flushed to immutable sorted run
//! files and merged in the background, mirroring the teacher's Hummock
//! design (`SharedBuffer` + `SstableStore` + background compactor in
//! `storage/src/hummock/`) simplified to a single-node, single-writer scope.

pub mod error;
pub mod memtable;
pub mod merge;
pub mod run;
pub mod sampling;

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub use error::{Error, Result};
use memtable::MemTable;
use sampling::Reservoir;

/// Flush the memtable to a run file once it holds this many bytes
/// (SPEC_FULL.md §4.2). Chosen to keep a single flush's write small enough
/// to land quickly on the scratch disks this is expected to run on.
const FLUSH_THRESHOLD_BYTES: usize = 4 * 1024 * 1024;

/// Merge every run file into one once the run count crosses this, so
/// `range`/`partition_keys` don't pay for an ever-growing k-way merge
/// (mirrors the teacher's compaction trigger in spirit, not algorithm).
const COMPACTION_RUN_THRESHOLD: usize = 8;

const RESERVOIR_CAPACITY: usize = 4096;

struct Inner {
    memtable: MemTable,
    runs: Vec<run::RunMeta>,
    next_seq: u64,
    next_run_seq: u64,
    min_key: Option<Vec<u8>>,
    max_key: Option<Vec<u8>>,
    reservoir: Reservoir,
}

/// A single shuffle session's sorted key-value store.
///
/// All mutation goes through `&self` (interior locking), matching the
/// teacher's `HummockStorage` shared-handle style so a `Store` can be held
/// behind an `Arc` and driven concurrently by many producer connections.
pub struct Store {
    dir: PathBuf,
    inner: RwLock<Inner>,
    /// Set on the first I/O failure from a flush or merge; every subsequent
    /// operation fails with the same error until `close()` tears the store
    /// down (spec.md §7).
    poison: Mutex<Option<Error>>,
}

impl Store {
    pub async fn open(dir: PathBuf) -> Result<Arc<Self>> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Arc::new(Self {
            dir,
            inner: RwLock::new(Inner {
                memtable: MemTable::default(),
                runs: Vec::new(),
                next_seq: 0,
                next_run_seq: 0,
                min_key: None,
                max_key: None,
                reservoir: Reservoir::new(RESERVOIR_CAPACITY),
            }),
            poison: Mutex::new(None),
        }))
    }

    fn check_poison(&self) -> Result<()> {
        if let Some(e) = self.poison.lock().clone() {
            return Err(e);
        }
        Ok(())
    }

    fn poison_with(&self, err: Error) {
        warn!(error = %err, "store poisoned");
        *self.poison.lock() = Some(err);
    }

    /// Inserts one row's key/value bytes (spec.md §4.2). Rows sharing a key
    /// are kept in insertion order for `range`'s tiebreak. Triggers an
    /// async flush once the memtable crosses `FLUSH_THRESHOLD_BYTES`; the
    /// caller does not wait on the flush, matching the teacher's
    /// fire-and-forget `SharedBuffer` flush trigger.
    pub fn put(self: &Arc<Self>, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.check_poison()?;
        let should_flush = {
            let mut inner = self.inner.write();
            let seq = inner.next_seq;
            inner.next_seq += 1;

            inner.reservoir.observe(&key);
            inner.min_key = Some(match inner.min_key.take() {
                Some(m) if m <= key => m,
                _ => key.clone(),
            });
            inner.max_key = Some(match inner.max_key.take() {
                Some(m) if m >= key => m,
                _ => key.clone(),
            });

            inner.memtable.insert(key, seq, value);
            inner.memtable.size_bytes() >= FLUSH_THRESHOLD_BYTES
        };

        if should_flush {
            self.spawn_flush();
        }
        Ok(())
    }

    /// Flushes the current memtable to a new run file, off the caller's
    /// critical path. Poisons the store on I/O failure (spec.md §7).
    fn spawn_flush(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.flush_once().await {
                this.poison_with(e);
            }
        });
    }

    async fn flush_once(self: &Arc<Self>) -> Result<()> {
        let (entries, seq_no, dir) = {
            let mut inner = self.inner.write();
            if inner.memtable.is_empty() {
                return Ok(());
            }
            let entries = inner.memtable.snapshot();
            let seq_no = inner.next_run_seq;
            inner.next_run_seq += 1;
            inner.memtable.clear();
            (entries, seq_no, self.dir.clone())
        };

        let path = run::run_path(&dir, seq_no);
        run::write_run(&path, &entries).await?;
        debug!(seq_no, entries = entries.len(), "flushed memtable to run");

        let should_compact = {
            let mut inner = self.inner.write();
            inner.runs.push(run::RunMeta { seq_no, path });
            inner.runs.len() >= COMPACTION_RUN_THRESHOLD
        };
        if should_compact {
            self.compact_once().await?;
        }
        Ok(())
    }

    /// Merges every current run file into a single new one, mirroring the
    /// teacher's compactor (storage/src/hummock/compactor/) minimized to a
    /// full merge rather than a leveled one, since runs here are never huge.
    async fn compact_once(self: &Arc<Self>) -> Result<()> {
        let (runs, dir) = {
            let inner = self.inner.read();
            (inner.runs.clone(), self.dir.clone())
        };
        if runs.len() < 2 {
            return Ok(());
        }

        let mut sources = Vec::with_capacity(runs.len());
        for run_meta in &runs {
            sources.push(run::read_run(&run_meta.path).await?);
        }
        let merged = merge::merge_sorted(sources);

        let new_seq = {
            let mut inner = self.inner.write();
            let seq = inner.next_run_seq;
            inner.next_run_seq += 1;
            seq
        };
        let new_path = run::run_path(&dir, new_seq);
        run::write_run(&new_path, &merged).await?;

        {
            let mut inner = self.inner.write();
            inner.runs.retain(|r| !runs.iter().any(|old| old.seq_no == r.seq_no));
            inner.runs.push(run::RunMeta {
                seq_no: new_seq,
                path: new_path,
            });
        }
        for old in &runs {
            let _ = tokio::fs::remove_file(&old.path).await;
        }
        info!(merged_runs = runs.len(), new_seq, "compacted runs");
        Ok(())
    }

    /// Returns every stored `(key, value)` pair whose key falls in the
    /// interval bounded by `lower`/`upper`, each independently inclusive or
    /// exclusive per its flag (spec.md §4.2's `range(start, start_inclusive,
    /// end, end_inclusive)`), in key order with insertion order breaking
    /// ties within equal keys. `lower`/`upper` of `None` mean unbounded on
    /// that side. An I/O failure reading a run file poisons the store the
    /// same way a flush/merge failure does (spec.md §4.2/§7) — a disk fault
    /// on a read path is no less fatal than one on a write path.
    pub async fn range(
        self: &Arc<Self>,
        lower: Option<&[u8]>,
        lower_inclusive: bool,
        upper: Option<&[u8]>,
        upper_inclusive: bool,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.check_poison()?;
        let merged = match self.merged_view().await {
            Ok(merged) => merged,
            Err(e) => {
                self.poison_with(e.clone());
                return Err(e);
            }
        };
        Ok(merged
            .into_iter()
            .filter(|(k, _, _)| {
                let above_lower = lower.map_or(true, |l| {
                    if lower_inclusive { k.as_slice() >= l } else { k.as_slice() > l }
                });
                let below_upper = upper.map_or(true, |u| {
                    if upper_inclusive { k.as_slice() <= u } else { k.as_slice() < u }
                });
                above_lower && below_upper
            })
            .map(|(k, _, v)| (k, v))
            .collect())
    }

    /// Picks `n + 1` boundary keys approximately equally partitioning the
    /// stored keys (spec.md §4.2), with the first and last always exactly
    /// the minimum/maximum stored key.
    pub fn partition_keys(&self, n: usize) -> Result<Vec<Vec<u8>>> {
        self.check_poison()?;
        let inner = self.inner.read();
        let (Some(min), Some(max)) = (inner.min_key.as_ref(), inner.max_key.as_ref()) else {
            return Ok(Vec::new());
        };
        let mut sample = inner.reservoir.samples().to_vec();
        sample.sort();
        Ok(sampling::partition_keys(min, max, &sample, n))
    }

    /// Materializes the memtable plus every run file, merged into one
    /// key-ordered, insertion-ordered stream. Used by `range`; not cached,
    /// since shuffles are read rarely relative to how often they're written.
    async fn merged_view(&self) -> Result<Vec<(Vec<u8>, u64, Vec<u8>)>> {
        let (mut sources, runs) = {
            let inner = self.inner.read();
            (vec![inner.memtable.snapshot()], inner.runs.clone())
        };
        for run_meta in &runs {
            sources.push(run::read_run(&run_meta.path).await?);
        }
        Ok(merge::merge_sorted(sources))
    }

    /// Flushes any remaining in-memory data and tears down the store's
    /// scratch directory. Idempotent: a closed store's scratch files may
    /// already be gone (spec.md §4.6's idempotent-STOP requirement).
    pub async fn close(self: &Arc<Self>) -> Result<()> {
        self.flush_once().await?;
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn order(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_tmp() -> (Arc<Store>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().to_path_buf()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn put_then_range_returns_sorted_rows() {
        let (store, _dir) = open_tmp().await;
        store.put(b"b".to_vec(), b"2".to_vec()).unwrap();
        store.put(b"a".to_vec(), b"1".to_vec()).unwrap();
        store.put(b"c".to_vec(), b"3".to_vec()).unwrap();

        let rows = store.range(None, true, None, true).await.unwrap();
        assert_eq!(
            rows,
            vec![
                (b"a".to_vec(), b"1".to_vec()),
                (b"b".to_vec(), b"2".to_vec()),
                (b"c".to_vec(), b"3".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn range_respects_inclusivity_flags() {
        let (store, _dir) = open_tmp().await;
        for k in [b"a", b"b", b"c", b"d"] {
            store.put(k.to_vec(), k.to_vec()).unwrap();
        }
        let half_open = store.range(Some(b"b"), true, Some(b"d"), false).await.unwrap();
        let keys: Vec<_> = half_open.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec()]);

        let closed = store.range(Some(b"b"), true, Some(b"d"), true).await.unwrap();
        let keys: Vec<_> = closed.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);

        let open_start = store.range(Some(b"b"), false, Some(b"d"), true).await.unwrap();
        let keys: Vec<_> = open_start.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"c".to_vec(), b"d".to_vec()]);
    }

    #[tokio::test]
    async fn flush_and_merge_preserve_range_results() {
        let (store, _dir) = open_tmp().await;
        store.put(b"z".to_vec(), b"1".to_vec()).unwrap();
        store.flush_once().await.unwrap();
        store.put(b"a".to_vec(), b"2".to_vec()).unwrap();

        let rows = store.range(None, true, None, true).await.unwrap();
        assert_eq!(
            rows,
            vec![(b"a".to_vec(), b"2".to_vec()), (b"z".to_vec(), b"1".to_vec())]
        );
    }

    #[tokio::test]
    async fn partition_keys_bounds_are_exact_min_and_max() {
        let (store, _dir) = open_tmp().await;
        for k in 0u8..50 {
            store.put(vec![k], vec![k]).unwrap();
        }
        let bounds = store.partition_keys(4).unwrap();
        assert_eq!(bounds.len(), 5);
        assert_eq!(bounds.first().unwrap().as_slice(), &[0u8]);
        assert_eq!(bounds.last().unwrap().as_slice(), &[49u8]);
    }

    #[tokio::test]
    async fn partition_keys_on_empty_store_is_empty() {
        let (store, _dir) = open_tmp().await;
        assert!(store.partition_keys(4).unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_poisons_the_store_on_a_run_read_failure() {
        let (store, _dir) = open_tmp().await;
        store.put(b"a".to_vec(), b"1".to_vec()).unwrap();
        store.flush_once().await.unwrap();

        // Corrupt the just-flushed run file's path so the next `range`
        // hits a real I/O error reading it back, the same way a failing
        // disk would.
        let run_path = { store.inner.read().runs[0].path.clone() };
        tokio::fs::remove_file(&run_path).await.unwrap();

        assert!(store.range(None, true, None, true).await.is_err());
        // Poisoned: every later operation fails the same way, even one
        // that wouldn't itself touch the missing file.
        assert!(matches!(store.partition_keys(1), Err(Error::StoreIoError(_))));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (store, _dir) = open_tmp().await;
        store.put(b"a".to_vec(), b"1".to_vec()).unwrap();
        store.close().await.unwrap();
        store.close().await.unwrap();
    }
}
