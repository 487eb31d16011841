// Copyright 2019 Stichting Organism
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

//! Validator erasure coding.
//!
//! A payload is split into one chunk per validator with a systematic
//! Reed-Solomon code, so that any `recovery_threshold(n)` chunks rebuild it.

use serde::{Deserialize, Serialize};

use crate::errors::ErasureError;

mod codec;
pub use codec::{
    flatten_chunks, obtain_chunks, obtain_chunks_flat, reconstruct, reconstruct_flattened,
    FLAT_INDEX_LENGTH,
};

mod branches;
pub use branches::{erasure_root, verify_chunk, Blake3, ChunkBranches, ChunkProof, Hash};

/// Smallest supported validator count.
pub const MIN_VALIDATORS: usize = 2;

/// Largest supported validator count, the size of GF(2^16).
pub const MAX_VALIDATORS: usize = 65536;

/// Largest validator count coded over GF(2^8).
pub const MAX_GF8_VALIDATORS: usize = 256;

/// Length of the little endian payload length prefix.
pub(crate) const LENGTH_PREFIX: usize = 8;

/// Which Galois field a code runs over.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    /// GF(2^8), up to 256 validators.
    Gf8,
    /// GF(2^16), up to 65536 validators.
    Gf16,
}

/// Parameters of the code for a validator count.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeParams {
    n_validators: usize,
    data_shards: usize,
}

impl CodeParams {
    /// Code parameters for `n_validators` chunks.
    pub fn derive(n_validators: usize) -> Result<CodeParams, ErasureError> {
        if !(MIN_VALIDATORS..=MAX_VALIDATORS).contains(&n_validators) {
            return Err(ErasureError::InvalidValidatorCount(n_validators));
        }
        Ok(CodeParams {
            n_validators,
            data_shards: (n_validators - 1) / 3 + 1,
        })
    }

    /// Total chunks, one per validator.
    pub fn n_validators(&self) -> usize {
        self.n_validators
    }

    /// Systematic chunks, which is also the recovery threshold.
    pub fn data_shards(&self) -> usize {
        self.data_shards
    }

    /// Redundant chunks.
    pub fn parity_shards(&self) -> usize {
        self.n_validators - self.data_shards
    }

    /// Galois field used for this validator count.
    pub fn field(&self) -> Field {
        if self.n_validators <= MAX_GF8_VALIDATORS {
            Field::Gf8
        } else {
            Field::Gf16
        }
    }

    /// Length of every chunk of a `data_len` byte payload: the prefixed
    /// payload spread over the data shards, rounded up to an even length.
    pub fn chunk_len(&self, data_len: usize) -> usize {
        let prefixed = LENGTH_PREFIX + data_len;
        let len = (prefixed + self.data_shards - 1) / self.data_shards;
        len + (len & 1)
    }
}

/// Minimum number of chunks needed to reconstruct data for `n_validators`.
///
/// Any set of more than a third of the validators can recover the data.
pub fn recovery_threshold(n_validators: usize) -> Result<usize, ErasureError> {
    CodeParams::derive(n_validators).map(|p| p.data_shards())
}

/// Length of each chunk `obtain_chunks` produces for `data_len` bytes.
pub fn chunk_size(n_validators: usize, data_len: usize) -> Result<usize, ErasureError> {
    CodeParams::derive(n_validators).map(|p| p.chunk_len(data_len))
}
