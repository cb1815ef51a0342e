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

//! Logical and encoded type vocabulary (SPEC_FULL.md §3).

use serde::{Deserialize, Serialize};

/// The closed set of logical element types a row field can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalType {
    Int32,
    Int64,
    Float64,
    Bool,
    Bytes,
    Utf8,
}

/// Sort direction for a key field (spec.md §3, §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Direction::Ascending),
            1 => Some(Direction::Descending),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Direction::Ascending => 0,
            Direction::Descending => 1,
        }
    }
}

/// One column of the row type: a name and its logical type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowField {
    pub name: String,
    pub ty: LogicalType,
}

/// One entry of the ordered sort-field list (spec.md §3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyField {
    pub name: String,
    pub direction: Direction,
}

/// The immutable type descriptor sent at `START` (spec.md §3, §4.3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub row_fields: Vec<RowField>,
    pub key_fields: Vec<KeyField>,
}

impl TypeDescriptor {
    /// Validates that every key field name exists in `row_fields` with the
    /// same logical type (spec.md §3's structural-prefix rule). Returns the
    /// row-field index for each key field, in key order, on success.
    pub fn validate(&self) -> Result<Vec<usize>, String> {
        let mut indices = Vec::with_capacity(self.key_fields.len());
        for key_field in &self.key_fields {
            let idx = self
                .row_fields
                .iter()
                .position(|row_field| row_field.name == key_field.name)
                .ok_or_else(|| format!("key field '{}' not present in row type", key_field.name))?;
            indices.push(idx);
        }
        Ok(indices)
    }
}

/// A single decoded value. `None` stands for a missing/null field.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Utf8(String),
}

impl Value {
    pub fn logical_type(&self) -> LogicalType {
        match self {
            Value::Int32(_) => LogicalType::Int32,
            Value::Int64(_) => LogicalType::Int64,
            Value::Float64(_) => LogicalType::Float64,
            Value::Bool(_) => LogicalType::Bool,
            Value::Bytes(_) => LogicalType::Bytes,
            Value::Utf8(_) => LogicalType::Utf8,
        }
    }
}

/// A typed row: one (possibly-missing) value per `row_fields` entry, in
/// order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row(pub Vec<Option<Value>>);
