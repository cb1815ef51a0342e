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

//! Wire protocol framing shared by the client and server (SPEC_FULL.md
//! §4.3): the six opcodes, their request/response payload layouts, and the
//! wire-visible error taxonomy.

pub mod error;
pub mod wire;

pub use error::{ProtoError, Result};
pub use wire::{
    read_ack, read_eos_echo, read_key_frame, read_request, read_row_frame, read_start_response,
    write_ack, write_eos, write_eos_echo, write_get_request, write_key_frame,
    write_partition_bounds_request, write_row_frame, write_simple_request, write_start_request,
    write_start_response, write_stream_terminator, write_type_descriptor, KeyRange, Request,
    OP_EOS, OP_GET, OP_PARTITION_BOUNDS, OP_PUT, OP_START, OP_STOP,
};
