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

//! Bidirectional conversion between typed rows and a byte stream, plus a
//! total ordering predicate on encoded keys (SPEC_FULL.md §4.1).

pub mod error;
pub mod key_codec;
pub mod row_codec;
pub mod types;

use std::cmp::Ordering;

pub use error::{Error, Result};
pub use types::{Direction, KeyField, LogicalType, Row, RowField, TypeDescriptor, Value};

/// A codec parameterized by a row encoded type and a key encoded type at
/// construction (spec.md §4.1's contract).
#[derive(Clone, Debug)]
pub struct Codec {
    descriptor: TypeDescriptor,
    key_field_indices: Vec<usize>,
}

impl Codec {
    /// Builds a codec from a type descriptor, failing with `TypeMismatch` if
    /// the key fields aren't a structural prefix of the row fields
    /// (spec.md §3).
    pub fn new(descriptor: TypeDescriptor) -> Result<Self> {
        let key_field_indices = descriptor
            .validate()
            .map_err(error::Error::TypeMismatch)?;
        Ok(Self {
            descriptor,
            key_field_indices,
        })
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn encode_row(&self, row: &Row) -> Result<Vec<u8>> {
        row_codec::encode_row(&self.descriptor.row_fields, row)
    }

    pub fn decode_row(&self, bytes: &[u8]) -> Result<Row> {
        row_codec::decode_row(&self.descriptor.row_fields, bytes)
    }

    /// Encodes the key portion of `row`, i.e. the fields named in
    /// `key_fields`, in key order.
    pub fn encode_key(&self, row: &Row) -> Vec<u8> {
        key_codec::encode_key(&self.descriptor.key_fields, &self.key_field_indices, row)
    }

    /// Total order on encoded keys produced by `encode_key`.
    pub fn order(&self, a: &[u8], b: &[u8]) -> Ordering {
        key_codec::order(a, b)
    }
}
