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

//! Chunking and reconstruction.

use reed_solomon_erasure::{galois_16, galois_8};

use crate::erasure::{CodeParams, Field, LENGTH_PREFIX};
use crate::errors::ErasureError;

/// Length of the chunk index in a flattened record.
pub const FLAT_INDEX_LENGTH: usize = 4;

/// Reed-Solomon coder over the field chosen by `CodeParams`.
enum Coder {
    Gf8(galois_8::ReedSolomon),
    Gf16(galois_16::ReedSolomon),
}

fn to_pairs(bytes: &[u8]) -> Vec<[u8; 2]> {
    bytes.chunks_exact(2).map(|c| [c[0], c[1]]).collect()
}

fn from_pairs(pairs: &[[u8; 2]]) -> Vec<u8> {
    pairs.iter().flat_map(|p| p.iter().copied()).collect()
}

impl Coder {
    fn new(params: &CodeParams) -> Result<Coder, ErasureError> {
        let (data, parity) = (params.data_shards(), params.parity_shards());
        Ok(match params.field() {
            Field::Gf8 => Coder::Gf8(galois_8::ReedSolomon::new(data, parity)?),
            Field::Gf16 => Coder::Gf16(galois_16::ReedSolomon::new(data, parity)?),
        })
    }

    /// Fill the parity shards from the data shards.
    fn encode(&self, shards: &mut Vec<Vec<u8>>) -> Result<(), ErasureError> {
        match self {
            Coder::Gf8(rs) => rs.encode(shards)?,
            Coder::Gf16(rs) => {
                let mut wide: Vec<Vec<[u8; 2]>> = shards.iter().map(|s| to_pairs(s)).collect();
                rs.encode(&mut wide)?;
                *shards = wide.iter().map(|s| from_pairs(s)).collect();
            }
        }
        Ok(())
    }

    /// Rebuild the missing data shards, returning the data shards in order.
    fn reconstruct_data(&self, shards: Vec<Option<Vec<u8>>>) -> Result<Vec<Vec<u8>>, ErasureError> {
        let data_shards = match self {
            Coder::Gf8(rs) => rs.data_shard_count(),
            Coder::Gf16(rs) => rs.data_shard_count(),
        };

        let rebuilt: Vec<Option<Vec<u8>>> = match self {
            Coder::Gf8(rs) => {
                let mut shards = shards;
                rs.reconstruct_data(&mut shards)?;
                shards
            }
            Coder::Gf16(rs) => {
                let mut wide: Vec<Option<Vec<[u8; 2]>>> = shards
                    .iter()
                    .map(|s| s.as_ref().map(|s| to_pairs(s)))
                    .collect();
                rs.reconstruct_data(&mut wide)?;
                wide.iter().map(|s| s.as_ref().map(|s| from_pairs(s))).collect()
            }
        };

        rebuilt
            .into_iter()
            .take(data_shards)
            .map(|s| s.ok_or_else(|| ErasureError::ReconstructionFailed("data shard missing".into())))
            .collect()
    }
}

/// Strip the length prefix and padding from a decoded payload.
fn decode_payload(mut payload: Vec<u8>) -> Result<Vec<u8>, ErasureError> {
    if payload.len() < LENGTH_PREFIX {
        return Err(ErasureError::ReconstructionFailed("payload shorter than its length prefix".into()));
    }
    let mut prefix = [0u8; LENGTH_PREFIX];
    prefix.copy_from_slice(&payload[..LENGTH_PREFIX]);
    let len = u64::from_le_bytes(prefix);

    let available = (payload.len() - LENGTH_PREFIX) as u64;
    if len > available {
        return Err(ErasureError::ReconstructionFailed(format!(
            "length prefix {} exceeds the {} payload bytes",
            len, available
        )));
    }

    payload.truncate(LENGTH_PREFIX + len as usize);
    payload.drain(..LENGTH_PREFIX);
    Ok(payload)
}

/// Split `data` into one chunk per validator.
///
/// Chunk `i` belongs to validator `i`. The first `recovery_threshold(n)`
/// chunks hold the length prefixed payload itself.
pub fn obtain_chunks(n_validators: usize, data: &[u8]) -> Result<Vec<Vec<u8>>, ErasureError> {
    let params = CodeParams::derive(n_validators)?;
    let chunk_len = params.chunk_len(data.len());

    let mut payload = Vec::with_capacity(chunk_len * params.data_shards());
    payload.extend_from_slice(&(data.len() as u64).to_le_bytes());
    payload.extend_from_slice(data);
    payload.resize(chunk_len * params.data_shards(), 0);

    let mut shards: Vec<Vec<u8>> = payload.chunks(chunk_len).map(|c| c.to_vec()).collect();
    shards.resize(n_validators, vec![0u8; chunk_len]);

    Coder::new(&params)?.encode(&mut shards)?;
    Ok(shards)
}

/// Reconstruct the original data from chunks tagged with their validator
/// index. Order does not matter; at least `recovery_threshold(n)` distinct
/// chunks are needed.
pub fn reconstruct<'a, I>(n_validators: usize, chunks: I) -> Result<Vec<u8>, ErasureError>
where
    I: IntoIterator<Item = (&'a [u8], usize)>,
{
    let params = CodeParams::derive(n_validators)?;

    let mut shards: Vec<Option<Vec<u8>>> = vec![None; n_validators];
    let mut chunk_len: Option<usize> = None;
    let mut received = 0usize;

    for (chunk, index) in chunks {
        if chunk.is_empty() || chunk.len() % 2 != 0 {
            return Err(ErasureError::InvalidChunkSize(chunk.len()));
        }
        match chunk_len {
            None => chunk_len = Some(chunk.len()),
            Some(len) if len != chunk.len() => return Err(ErasureError::InconsistentChunkSizes),
            Some(_) => {}
        }
        if index >= n_validators {
            return Err(ErasureError::ReconstructionFailed(format!(
                "chunk index {} out of range for {} validators",
                index, n_validators
            )));
        }
        if shards[index].is_some() {
            return Err(ErasureError::ReconstructionFailed(format!(
                "duplicate chunk index {}",
                index
            )));
        }
        shards[index] = Some(chunk.to_vec());
        received += 1;
    }

    let required = params.data_shards();
    if received < required {
        return Err(ErasureError::InsufficientChunks { received, required });
    }

    let data_shards: Vec<Vec<u8>> = if shards[..required].iter().all(Option::is_some) {
        // Systematic chunks are the payload, nothing to decode.
        shards.into_iter().take(required).flatten().collect()
    } else {
        Coder::new(&params)?.reconstruct_data(shards)?
    };

    decode_payload(data_shards.concat())
}

/// Lay out chunks as records of a little endian `u32` index followed by
/// the chunk bytes, in index order.
pub fn flatten_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = chunks.iter().map(|c| FLAT_INDEX_LENGTH + c.len()).sum();
    let mut flat = Vec::with_capacity(total);
    for (index, chunk) in chunks.iter().enumerate() {
        flat.extend_from_slice(&(index as u32).to_le_bytes());
        flat.extend_from_slice(chunk);
    }
    flat
}

/// `obtain_chunks` followed by `flatten_chunks`.
pub fn obtain_chunks_flat(n_validators: usize, data: &[u8]) -> Result<Vec<u8>, ErasureError> {
    obtain_chunks(n_validators, data).map(|chunks| flatten_chunks(&chunks))
}

/// Reconstruct from flattened records whose chunks are `chunk_size` bytes.
pub fn reconstruct_flattened(
    n_validators: usize,
    flat: &[u8],
    chunk_size: usize,
) -> Result<Vec<u8>, ErasureError> {
    if chunk_size == 0 || chunk_size % 2 != 0 {
        return Err(ErasureError::InvalidChunkSize(chunk_size));
    }
    let record = FLAT_INDEX_LENGTH + chunk_size;
    if flat.len() % record != 0 {
        return Err(ErasureError::InconsistentChunkSizes);
    }

    let chunks = flat.chunks_exact(record).map(|r| {
        let mut index = [0u8; FLAT_INDEX_LENGTH];
        index.copy_from_slice(&r[..FLAT_INDEX_LENGTH]);
        (&r[FLAT_INDEX_LENGTH..], u32::from_le_bytes(index) as usize)
    });
    reconstruct(n_validators, chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erasure::recovery_threshold;

    fn data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    fn indexed(chunks: &[Vec<u8>]) -> Vec<(&[u8], usize)> {
        chunks.iter().enumerate().map(|(i, c)| (&c[..], i)).collect()
    }

    #[test]
    fn round_trip_with_threshold_chunks() {
        for n in [2usize, 3, 4, 7, 10, 31] {
            let k = recovery_threshold(n).unwrap();
            for len in [0usize, 1, 2, 33, 1000] {
                let original = data(len);
                let chunks = obtain_chunks(n, &original).unwrap();
                assert_eq!(chunks.len(), n);

                // Only the last k chunks, so parity is used whenever n > k.
                let subset: Vec<(&[u8], usize)> = indexed(&chunks).into_iter().skip(n - k).collect();
                assert_eq!(reconstruct(n, subset).unwrap(), original, "n={} len={}", n, len);

                // The systematic fast path.
                let systematic: Vec<(&[u8], usize)> = indexed(&chunks).into_iter().take(k).collect();
                assert_eq!(reconstruct(n, systematic).unwrap(), original);
            }
        }
    }

    #[test]
    fn systematic_chunks_hold_the_payload() {
        let original = data(20);
        let chunks = obtain_chunks(4, &original).unwrap();
        let joined = [chunks[0].clone(), chunks[1].clone()].concat();
        assert_eq!(&joined[..8], &20u64.to_le_bytes());
        assert_eq!(&joined[8..28], &original[..]);
    }

    #[test]
    fn order_does_not_matter() {
        let original = data(100);
        let chunks = obtain_chunks(10, &original).unwrap();
        let mut subset = indexed(&chunks);
        subset.reverse();
        subset.truncate(4);
        assert_eq!(reconstruct(10, subset).unwrap(), original);
    }

    #[test]
    fn large_validator_sets_use_gf16() {
        let n = 300;
        let k = recovery_threshold(n).unwrap();
        let original = data(5000);
        let chunks = obtain_chunks(n, &original).unwrap();
        assert_eq!(chunks.len(), n);

        let subset: Vec<(&[u8], usize)> = indexed(&chunks).into_iter().skip(n - k).collect();
        assert_eq!(reconstruct(n, subset).unwrap(), original);
    }

    #[test]
    fn insufficient_chunks() {
        let chunks = obtain_chunks(10, &data(64)).unwrap();
        let subset: Vec<(&[u8], usize)> = indexed(&chunks).into_iter().take(3).collect();
        assert_eq!(
            reconstruct(10, subset),
            Err(ErasureError::InsufficientChunks {
                received: 3,
                required: 4
            })
        );
        assert_eq!(
            reconstruct(10, Vec::<(&[u8], usize)>::new()),
            Err(ErasureError::InsufficientChunks {
                received: 0,
                required: 4
            })
        );
    }

    #[test]
    fn bad_chunks_are_rejected() {
        let chunks = obtain_chunks(4, &data(10)).unwrap();

        let dup = vec![(&chunks[0][..], 0usize), (&chunks[0][..], 0usize)];
        assert!(matches!(
            reconstruct(4, dup),
            Err(ErasureError::ReconstructionFailed(_))
        ));

        let out_of_range = vec![(&chunks[0][..], 0usize), (&chunks[1][..], 4usize)];
        assert!(matches!(
            reconstruct(4, out_of_range),
            Err(ErasureError::ReconstructionFailed(_))
        ));

        let odd = [1u8, 2, 3];
        assert_eq!(
            reconstruct(4, vec![(&odd[..], 0usize)]),
            Err(ErasureError::InvalidChunkSize(3))
        );
        assert_eq!(
            reconstruct(4, vec![(&[0u8; 0][..], 0usize)]),
            Err(ErasureError::InvalidChunkSize(0))
        );

        let short = &chunks[1][..chunks[1].len() - 2];
        assert_eq!(
            reconstruct(4, vec![(&chunks[0][..], 0usize), (short, 1usize)]),
            Err(ErasureError::InconsistentChunkSizes)
        );
    }

    #[test]
    fn corrupt_length_prefix() {
        let mut chunks = obtain_chunks(2, &data(4)).unwrap();
        chunks[0][..8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            reconstruct(2, vec![(&chunks[0][..], 0usize)]),
            Err(ErasureError::ReconstructionFailed(_))
        ));
    }

    #[test]
    fn invalid_validator_count() {
        assert_eq!(
            obtain_chunks(1, b"x"),
            Err(ErasureError::InvalidValidatorCount(1))
        );
        assert_eq!(
            reconstruct(70000, Vec::<(&[u8], usize)>::new()),
            Err(ErasureError::InvalidValidatorCount(70000))
        );
    }

    #[test]
    fn flattened_round_trip() {
        let original = data(77);
        let flat = obtain_chunks_flat(7, &original).unwrap();
        let chunk_size = flat.len() / 7 - FLAT_INDEX_LENGTH;
        assert_eq!(chunk_size, crate::erasure::chunk_size(7, 77).unwrap());
        assert_eq!(reconstruct_flattened(7, &flat, chunk_size).unwrap(), original);

        // Any threshold subset of records, here the last three.
        let record = FLAT_INDEX_LENGTH + chunk_size;
        let tail = &flat[flat.len() - 3 * record..];
        assert_eq!(reconstruct_flattened(7, tail, chunk_size).unwrap(), original);

        assert_eq!(
            reconstruct_flattened(7, &flat[1..], chunk_size),
            Err(ErasureError::InconsistentChunkSizes)
        );
        assert_eq!(
            reconstruct_flattened(7, &flat, 3),
            Err(ErasureError::InvalidChunkSize(3))
        );
    }
}
