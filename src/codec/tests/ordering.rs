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

//! Whole-descriptor check that `Codec::order` (a plain byte comparison of
//! `encode_key`'s output) reproduces the logical order a per-field, per-type
//! comparator would produce, across every `LogicalType` and both
//! `Direction`s at once, including missing fields. `key_codec.rs`'s unit
//! tests each check one field/type/direction in isolation; this checks the
//! composed multi-field key a real descriptor actually produces.

use std::cmp::Ordering;

use shuffler_codec::key_codec::compare_values;
use shuffler_codec::{Codec, Direction, KeyField, LogicalType, Row, RowField, TypeDescriptor, Value};

fn descriptor() -> TypeDescriptor {
    TypeDescriptor {
        row_fields: vec![
            RowField { name: "region".into(), ty: LogicalType::Utf8 },
            RowField { name: "priority".into(), ty: LogicalType::Int32 },
            RowField { name: "score".into(), ty: LogicalType::Float64 },
            RowField { name: "active".into(), ty: LogicalType::Bool },
            RowField { name: "payload".into(), ty: LogicalType::Bytes },
            RowField { name: "sequence".into(), ty: LogicalType::Int64 },
        ],
        key_fields: vec![
            KeyField { name: "region".into(), direction: Direction::Ascending },
            KeyField { name: "priority".into(), direction: Direction::Descending },
            KeyField { name: "score".into(), direction: Direction::Ascending },
            KeyField { name: "active".into(), direction: Direction::Descending },
            KeyField { name: "sequence".into(), direction: Direction::Ascending },
        ],
    }
}

/// Every row exercises a distinct combination of key values, including a
/// `None` in the leading (`region`) and a middle (`score`) key field, so
/// both the "missing sorts first" rule and the cross-field tiebreak chain
/// get exercised together rather than one field at a time.
fn rows() -> Vec<Row> {
    vec![
        Row(vec![
            None,
            Some(Value::Int32(1)),
            Some(Value::Float64(0.0)),
            Some(Value::Bool(true)),
            Some(Value::Bytes(vec![1])),
            Some(Value::Int64(9)),
        ]),
        Row(vec![
            Some(Value::Utf8("eu".into())),
            Some(Value::Int32(5)),
            None,
            Some(Value::Bool(false)),
            Some(Value::Bytes(vec![2])),
            Some(Value::Int64(-3)),
        ]),
        Row(vec![
            Some(Value::Utf8("eu".into())),
            Some(Value::Int32(5)),
            Some(Value::Float64(-1.5)),
            Some(Value::Bool(false)),
            Some(Value::Bytes(vec![3])),
            Some(Value::Int64(-3)),
        ]),
        Row(vec![
            Some(Value::Utf8("eu".into())),
            Some(Value::Int32(5)),
            Some(Value::Float64(-1.5)),
            Some(Value::Bool(true)),
            Some(Value::Bytes(vec![4])),
            Some(Value::Int64(-3)),
        ]),
        Row(vec![
            Some(Value::Utf8("eu".into())),
            Some(Value::Int32(2)),
            Some(Value::Float64(3.25)),
            Some(Value::Bool(true)),
            Some(Value::Bytes(vec![5])),
            Some(Value::Int64(100)),
        ]),
        Row(vec![
            Some(Value::Utf8("us".into())),
            Some(Value::Int32(-10)),
            Some(Value::Float64(f64::MAX)),
            Some(Value::Bool(false)),
            Some(Value::Bytes(vec![6])),
            Some(Value::Int64(0)),
        ]),
    ]
}

fn reference_cmp(descriptor: &TypeDescriptor, indices: &[usize], a: &Row, b: &Row) -> Ordering {
    for (key_field, &idx) in descriptor.key_fields.iter().zip(indices) {
        let ord = compare_values(a.0[idx].as_ref(), b.0[idx].as_ref(), key_field.direction);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[test]
fn byte_order_of_encoded_keys_matches_a_per_field_reference_comparator() {
    let descriptor = descriptor();
    let indices = descriptor.validate().unwrap();
    let codec = Codec::new(descriptor.clone()).unwrap();

    // Deliberately not already sorted by any single field.
    let shuffled = [4usize, 0, 5, 2, 1, 3];
    let batch: Vec<Row> = shuffled.iter().map(|&i| rows()[i].clone()).collect();

    for row in &batch {
        let encoded = codec.encode_row(row).unwrap();
        assert_eq!(&codec.decode_row(&encoded).unwrap(), row);
    }

    let mut by_byte_order = batch.clone();
    by_byte_order.sort_by(|a, b| codec.order(&codec.encode_key(a), &codec.encode_key(b)));

    let mut by_reference = batch.clone();
    by_reference.sort_by(|a, b| reference_cmp(&descriptor, &indices, a, b));

    assert_eq!(by_byte_order, by_reference);
}
