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

//! Order-preserving key encoding (SPEC_FULL.md §4.1): every field is encoded
//! so that an unsigned, left-to-right byte (memcmp) comparison of the
//! concatenated field encodings agrees with the logical lexicographic order
//! under the requested per-field directions. Because of this, `order` is
//! just a byte-slice comparison — the comparator does no per-field decoding.

use std::cmp::Ordering;

use crate::types::{Direction, KeyField, Row, Value};

/// Encodes the key portion of `row` given `key_fields` (already validated
/// against the row type) and their matching row-field indices.
pub fn encode_key(key_fields: &[KeyField], indices: &[usize], row: &Row) -> Vec<u8> {
    let mut buf = Vec::new();
    for (key_field, &idx) in key_fields.iter().zip(indices.iter()) {
        let start = buf.len();
        encode_field(&mut buf, row.0[idx].as_ref());
        if key_field.direction == Direction::Descending {
            invert_from(&mut buf, start);
        }
    }
    buf
}

/// Total order on encoded keys: plain byte-lexicographic comparison, which
/// `encode_key`'s layout guarantees agrees with the logical order.
pub fn order(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

fn invert_from(buf: &mut [u8], start: usize) {
    for byte in &mut buf[start..] {
        *byte = !*byte;
    }
}

/// Missing sorts before present (ascending); direction-flip happens on the
/// whole field afterwards via `invert_from`, so a descending missing field
/// correctly sorts after present values.
fn encode_field(buf: &mut Vec<u8>, value: Option<&Value>) {
    match value {
        None => buf.push(0x00),
        Some(v) => {
            buf.push(0x01);
            encode_ordered_value(buf, v);
        }
    }
}

fn encode_ordered_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Int32(v) => buf.extend_from_slice(&(*v as u32 ^ 0x8000_0000).to_be_bytes()),
        Value::Int64(v) => {
            buf.extend_from_slice(&(*v as u64 ^ 0x8000_0000_0000_0000).to_be_bytes())
        }
        Value::Float64(v) => buf.extend_from_slice(&order_preserving_f64(*v).to_be_bytes()),
        Value::Bool(v) => buf.push(if *v { 1 } else { 0 }),
        Value::Bytes(bytes) => encode_escaped(buf, bytes),
        Value::Utf8(s) => encode_escaped(buf, s.as_bytes()),
    }
}

/// IEEE-754 order-preserving transform: flip the sign bit for positive
/// numbers, flip every bit for negative numbers (and NaN, which then sorts
/// consistently with itself, if not meaningfully with other values).
fn order_preserving_f64(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits & (1 << 63) != 0 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

/// Escapes `0x00` as `0x00 0xFF` and terminates with `0x00 0x00`, so that two
/// concatenated variable-length fields remain memcmp-comparable regardless
/// of what follows them in the buffer (the open design point flagged in
/// DESIGN.md).
fn encode_escaped(buf: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        if byte == 0x00 {
            buf.push(0x00);
            buf.push(0xFF);
        } else {
            buf.push(byte);
        }
    }
    buf.push(0x00);
    buf.push(0x00);
}

/// Logical lexicographic comparison of two values of the same type,
/// independent of the byte encoding above; used by tests to check that the
/// encoding agrees with the "obvious" order.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, direction: Direction) -> Ordering {
    let ord = match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_present(a, b),
    };
    match direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
        (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
        (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
        (Value::Utf8(a), Value::Utf8(b)) => a.cmp(b),
        _ => unreachable!("compared values of different logical types"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kf(name: &str, dir: Direction) -> KeyField {
        KeyField {
            name: name.into(),
            direction: dir,
        }
    }

    #[test]
    fn ascending_int_order_matches_logical_order() {
        let fields = vec![kf("a", Direction::Ascending)];
        let row_a = Row(vec![Some(Value::Int32(1))]);
        let row_b = Row(vec![Some(Value::Int32(2))]);
        let ka = encode_key(&fields, &[0], &row_a);
        let kb = encode_key(&fields, &[0], &row_b);
        assert_eq!(order(&ka, &kb), Ordering::Less);
    }

    #[test]
    fn descending_int_order_is_reversed() {
        let fields = vec![kf("a", Direction::Descending)];
        let row_a = Row(vec![Some(Value::Int32(1))]);
        let row_b = Row(vec![Some(Value::Int32(2))]);
        let ka = encode_key(&fields, &[0], &row_a);
        let kb = encode_key(&fields, &[0], &row_b);
        assert_eq!(order(&ka, &kb), Ordering::Greater);
    }

    #[test]
    fn negative_and_positive_ints_compare_correctly() {
        let fields = vec![kf("a", Direction::Ascending)];
        let neg = encode_key(&fields, &[0], &Row(vec![Some(Value::Int32(-5))]));
        let pos = encode_key(&fields, &[0], &Row(vec![Some(Value::Int32(5))]));
        let zero = encode_key(&fields, &[0], &Row(vec![Some(Value::Int32(0))]));
        assert_eq!(order(&neg, &zero), Ordering::Less);
        assert_eq!(order(&zero, &pos), Ordering::Less);
    }

    #[test]
    fn missing_sorts_before_present_ascending() {
        let fields = vec![kf("a", Direction::Ascending)];
        let missing = encode_key(&fields, &[0], &Row(vec![None]));
        let present = encode_key(&fields, &[0], &Row(vec![Some(Value::Int32(i32::MIN))]));
        assert_eq!(order(&missing, &present), Ordering::Less);
    }

    #[test]
    fn utf8_fields_compare_lexicographically() {
        let fields = vec![kf("a", Direction::Ascending)];
        let a = encode_key(&fields, &[0], &Row(vec![Some(Value::Utf8("alpha".into()))]));
        let b = encode_key(&fields, &[0], &Row(vec![Some(Value::Utf8("beta".into()))]));
        assert_eq!(order(&a, &b), Ordering::Less);
    }

    #[test]
    fn floats_preserve_order_across_sign() {
        let fields = vec![kf("a", Direction::Ascending)];
        let neg = encode_key(&fields, &[0], &Row(vec![Some(Value::Float64(-1.5))]));
        let zero = encode_key(&fields, &[0], &Row(vec![Some(Value::Float64(0.0))]));
        let pos = encode_key(&fields, &[0], &Row(vec![Some(Value::Float64(1.5))]));
        assert_eq!(order(&neg, &zero), Ordering::Less);
        assert_eq!(order(&zero, &pos), Ordering::Less);
    }
}
