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

//! Erasure root: a Merkle commitment to a chunk set, with per chunk
//! inclusion proofs so a validator can check its chunk against the root.

use rs_merkle::{Hasher, MerkleProof, MerkleTree};

use crate::errors::ErasureError;

/// A BLAKE3 digest.
pub type Hash = [u8; 32];

/// BLAKE3 hasher for `rs_merkle`.
#[derive(Debug, Clone, Copy)]
pub struct Blake3;

impl Hasher for Blake3 {
    type Hash = Hash;

    fn hash(data: &[u8]) -> Hash {
        *blake3::hash(data).as_bytes()
    }
}

/// Inclusion proof of one chunk.
pub struct ChunkProof(MerkleProof<Blake3>);

impl ChunkProof {
    /// Concatenated sibling hashes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }

    /// Parse concatenated sibling hashes.
    pub fn from_bytes(bytes: &[u8]) -> Result<ChunkProof, ErasureError> {
        MerkleProof::<Blake3>::from_bytes(bytes)
            .map(ChunkProof)
            .map_err(|e| ErasureError::ReconstructionFailed(format!("malformed chunk proof: {}", e)))
    }
}

/// Merkle tree over the hashes of a chunk set.
pub struct ChunkBranches {
    tree: MerkleTree<Blake3>,
    leaves: usize,
}

impl ChunkBranches {
    /// Hash every chunk and build the tree.
    pub fn new<C: AsRef<[u8]>>(chunks: &[C]) -> ChunkBranches {
        let hashes: Vec<Hash> = chunks.iter().map(|c| Blake3::hash(c.as_ref())).collect();
        ChunkBranches {
            tree: MerkleTree::<Blake3>::from_leaves(&hashes),
            leaves: hashes.len(),
        }
    }

    /// The erasure root, `None` for an empty chunk set.
    pub fn root(&self) -> Option<Hash> {
        self.tree.root()
    }

    /// Number of chunks committed to.
    pub fn len(&self) -> usize {
        self.leaves
    }

    /// Whether no chunks were committed to.
    pub fn is_empty(&self) -> bool {
        self.leaves == 0
    }

    /// Inclusion proof of chunk `index`.
    pub fn proof(&self, index: usize) -> Option<ChunkProof> {
        if index >= self.leaves {
            return None;
        }
        Some(ChunkProof(self.tree.proof(&[index])))
    }
}

/// Erasure root of a chunk set.
pub fn erasure_root<C: AsRef<[u8]>>(chunks: &[C]) -> Option<Hash> {
    ChunkBranches::new(chunks).root()
}

/// Check that `chunk` is chunk `index` of the `n_chunks` committed to by `root`.
pub fn verify_chunk(root: &Hash, index: usize, chunk: &[u8], proof: &ChunkProof, n_chunks: usize) -> bool {
    if index >= n_chunks {
        return false;
    }
    proof.0.verify(*root, &[index], &[Blake3::hash(chunk)], n_chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erasure::obtain_chunks;

    #[test]
    fn every_chunk_proves_against_the_root() {
        let chunks = obtain_chunks(10, b"erasure root over validator chunks").unwrap();
        let branches = ChunkBranches::new(&chunks);
        let root = branches.root().unwrap();
        assert_eq!(erasure_root(&chunks), Some(root));
        assert_eq!(branches.len(), 10);

        for (i, chunk) in chunks.iter().enumerate() {
            let proof = branches.proof(i).unwrap();
            assert!(verify_chunk(&root, i, chunk, &proof, chunks.len()));

            let parsed = ChunkProof::from_bytes(&proof.to_bytes()).unwrap();
            assert!(verify_chunk(&root, i, chunk, &parsed, chunks.len()));
        }
    }

    #[test]
    fn tampering_is_detected() {
        let chunks = obtain_chunks(7, b"some payload").unwrap();
        let branches = ChunkBranches::new(&chunks);
        let root = branches.root().unwrap();
        let proof = branches.proof(2).unwrap();

        let mut chunk = chunks[2].clone();
        chunk[0] ^= 1;
        assert!(!verify_chunk(&root, 2, &chunk, &proof, chunks.len()));
        assert!(!verify_chunk(&root, 3, &chunks[2], &proof, chunks.len()));

        let mut bad_root = root;
        bad_root[0] ^= 0xff;
        assert!(!verify_chunk(&bad_root, 2, &chunks[2], &proof, chunks.len()));

        assert!(branches.proof(7).is_none());
    }

    #[test]
    fn empty_set_has_no_root() {
        let chunks: Vec<Vec<u8>> = Vec::new();
        assert!(erasure_root(&chunks).is_none());
        assert!(ChunkBranches::new(&chunks).is_empty());
    }
}
