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

//! Row encoding: a self-describing stream of primitive fields, one per
//! `row_fields` entry, each preceded by a presence byte (SPEC_FULL.md §4.1).
//! This is NOT order-preserving; only `key_codec` needs that property.

use crate::error::{Error, Result};
use crate::types::{LogicalType, Row, RowField, Value};

pub fn encode_row(fields: &[RowField], row: &Row) -> Result<Vec<u8>> {
    if row.0.len() != fields.len() {
        return Err(Error::MalformedRecord(format!(
            "row has {} values but type descriptor has {} fields",
            row.0.len(),
            fields.len()
        )));
    }

    let mut buf = Vec::new();
    for (field, value) in fields.iter().zip(row.0.iter()) {
        match value {
            None => buf.push(0u8),
            Some(v) => {
                if v.logical_type() != field.ty {
                    return Err(Error::MalformedRecord(format!(
                        "field '{}' expected {:?}, got {:?}",
                        field.name,
                        field.ty,
                        v.logical_type()
                    )));
                }
                buf.push(1u8);
                encode_value(&mut buf, v);
            }
        }
    }
    Ok(buf)
}

pub fn decode_row(fields: &[RowField], bytes: &[u8]) -> Result<Row> {
    let mut cursor = Cursor::new(bytes);
    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
        let present = cursor.read_u8()?;
        match present {
            0 => values.push(None),
            1 => values.push(Some(decode_value(&mut cursor, field.ty)?)),
            other => {
                return Err(Error::MalformedRecord(format!(
                    "unknown presence tag {other} for field '{}'",
                    field.name
                )))
            }
        }
    }
    if cursor.remaining() != 0 {
        return Err(Error::MalformedRecord(
            "trailing bytes after last row field".to_string(),
        ));
    }
    Ok(Row(values))
}

fn encode_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Int32(v) => buf.extend_from_slice(&v.to_be_bytes()),
        Value::Int64(v) => buf.extend_from_slice(&v.to_be_bytes()),
        Value::Float64(v) => buf.extend_from_slice(&v.to_be_bytes()),
        Value::Bool(v) => buf.push(if *v { 1 } else { 0 }),
        Value::Bytes(v) => {
            buf.extend_from_slice(&(v.len() as u32).to_be_bytes());
            buf.extend_from_slice(v);
        }
        Value::Utf8(v) => {
            let bytes = v.as_bytes();
            buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            buf.extend_from_slice(bytes);
        }
    }
}

fn decode_value(cursor: &mut Cursor<'_>, ty: LogicalType) -> Result<Value> {
    Ok(match ty {
        LogicalType::Int32 => Value::Int32(i32::from_be_bytes(cursor.read_array()?)),
        LogicalType::Int64 => Value::Int64(i64::from_be_bytes(cursor.read_array()?)),
        LogicalType::Float64 => Value::Float64(f64::from_be_bytes(cursor.read_array()?)),
        LogicalType::Bool => Value::Bool(cursor.read_u8()? != 0),
        LogicalType::Bytes => Value::Bytes(cursor.read_length_prefixed()?.to_vec()),
        LogicalType::Utf8 => {
            let bytes = cursor.read_length_prefixed()?;
            Value::Utf8(
                String::from_utf8(bytes.to_vec())
                    .map_err(|_| Error::MalformedRecord("invalid utf8".to_string()))?,
            )
        }
    })
}

/// A tiny forward-only byte cursor; truncation surfaces as `Error::Truncated`
/// per spec.md §4.1's "short read -> Truncated" failure mode.
pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.bytes.get(self.pos).ok_or(Error::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self
            .bytes
            .get(self.pos..self.pos + N)
            .ok_or(Error::Truncated)?;
        self.pos += N;
        Ok(slice.try_into().unwrap())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8]> {
        let len = self.read_u32()? as usize;
        let slice = self
            .bytes
            .get(self.pos..self.pos + len)
            .ok_or(Error::Truncated)?;
        self.pos += len;
        Ok(slice)
    }
}
