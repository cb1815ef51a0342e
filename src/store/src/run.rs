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

//! One sorted run file on disk (SPEC_FULL.md §4.2, §6): a flat sequence of
//! length-prefixed `(key, seq, value)` records, already key- and
//! insertion-ordered by construction. Named by monotonic sequence number,
//! mirroring the teacher's `SstableStore` naming-by-id convention
//! (storage/src/hummock/sstable_store.rs), simplified: no block index or
//! bloom filter, since every run here is read back in full.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::Result;

pub struct RunMeta {
    pub seq_no: u64,
    pub path: PathBuf,
}

pub fn run_path(dir: &Path, seq_no: u64) -> PathBuf {
    dir.join(format!("run-{seq_no:020}.data"))
}

/// Serializes an already key-ordered batch of entries to a new run file.
pub async fn write_run(path: &Path, entries: &[(Vec<u8>, u64, Vec<u8>)]) -> Result<()> {
    let mut buf = Vec::new();
    for (key, seq, value) in entries {
        buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&seq.to_be_bytes());
        buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
        buf.extend_from_slice(value);
    }

    let tmp_path = path.with_extension("data.tmp");
    let mut file = tokio::fs::File::create(&tmp_path).await?;
    file.write_all(&buf).await?;
    file.flush().await?;
    drop(file);
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Reads a run file back into memory in its on-disk (key, seq) order.
pub async fn read_run(path: &Path) -> Result<Vec<(Vec<u8>, u64, Vec<u8>)>> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await?;

    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos < buf.len() {
        let key_len = u32::from_be_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        let key = buf[pos..pos + key_len].to_vec();
        pos += key_len;
        let seq = u64::from_be_bytes(buf[pos..pos + 8].try_into().unwrap());
        pos += 8;
        let val_len = u32::from_be_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        let value = buf[pos..pos + val_len].to_vec();
        pos += val_len;
        out.push((key, seq, value));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = run_path(dir.path(), 0);
        let entries = vec![
            (b"a".to_vec(), 1, b"v1".to_vec()),
            (b"b".to_vec(), 2, b"v2".to_vec()),
        ];
        write_run(&path, &entries).await.unwrap();
        let read_back = read_run(&path).await.unwrap();
        assert_eq!(read_back, entries);
    }
}
