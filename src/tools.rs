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

//! The Extra Sauce
//! Defines a `TranscriptProtocol` trait for using a Merlin transcript.
//! ristretto point tooling
//!
//! We provide a `RistrettoBoth` type that contains both an uncompressed
//! `RistrettoPoint` along side its matching `CompressedRistretto`,
//! which helps several protocols avoid duplicate ristretto compressions
//! and/or decompressions.

use core::fmt::Debug;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use rand::{CryptoRng, RngCore};
use sha2::digest::consts::{U32, U64};
use sha2::digest::FixedOutput;
use zeroize::Zeroize;

/// Signing context used by substrate-style hosts for all sr25519 signatures.
pub const SIGNING_CTX: &[u8] = b"substrate";

/// Extension methods over a Merlin transcript shared by signing, derivation and the VRF.
pub trait TranscriptProtocol {
    /// Commit a protocol name for domain separation.
    fn proto_name(&mut self, label: &'static [u8]);

    /// Commit a compressed point.
    fn commit_point(&mut self, label: &'static [u8], point: &CompressedRistretto);

    /// Squeeze a challenge scalar from 64 uniform bytes.
    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar;

    /// Fill `dest` with witness bytes bound to the transcript, the secret
    /// `nonce_seeds` and fresh randomness from `rng`.
    fn witness_bytes_rng<R>(
        &self,
        label: &'static [u8],
        dest: &mut [u8],
        nonce_seeds: &[&[u8]],
        rng: R,
    ) where
        R: RngCore + CryptoRng;

    /// Like `witness_bytes_rng` with the thread local generator.
    fn witness_bytes(&self, label: &'static [u8], dest: &mut [u8], nonce_seeds: &[&[u8]]) {
        self.witness_bytes_rng(label, dest, nonce_seeds, rand::thread_rng())
    }

    /// Produce a secret witness scalar, e.g. a signing nonce.
    fn witness_scalar(&self, label: &'static [u8], nonce_seeds: &[&[u8]]) -> Scalar {
        let mut scalar_bytes = [0u8; 64];
        self.witness_bytes(label, &mut scalar_bytes, nonce_seeds);
        let scalar = Scalar::from_bytes_mod_order_wide(&scalar_bytes);
        scalar_bytes.zeroize();
        scalar
    }
}

impl TranscriptProtocol for Transcript {
    fn proto_name(&mut self, label: &'static [u8]) {
        self.append_message(b"proto-name", label);
    }

    fn commit_point(&mut self, label: &'static [u8], point: &CompressedRistretto) {
        self.append_message(label, point.as_bytes());
    }

    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        let mut buf = [0u8; 64];
        self.challenge_bytes(label, &mut buf);
        Scalar::from_bytes_mod_order_wide(&buf)
    }

    fn witness_bytes_rng<R>(
        &self,
        label: &'static [u8],
        dest: &mut [u8],
        nonce_seeds: &[&[u8]],
        mut rng: R,
    ) where
        R: RngCore + CryptoRng,
    {
        let mut br = self.build_rng();
        for ns in nonce_seeds {
            br = br.rekey_with_witness_bytes(label, ns);
        }
        let mut r = br.finalize(&mut rng);
        r.fill_bytes(dest)
    }
}

/// A Signing Context Provides an abstraction for signature protocol Merlin Transcript
#[derive(Clone)]
pub struct SigningContext(Transcript);

impl SigningContext {
    /// Initialize a signing context from a byte string that
    /// identifies the signature's role in the larger protocol.
    pub fn new(context: &[u8]) -> SigningContext {
        let mut t = Transcript::new(b"SigningContext");
        t.append_message(b"", context);
        SigningContext(t)
    }

    /// The `"substrate"` context.
    pub fn substrate() -> SigningContext {
        SigningContext::new(SIGNING_CTX)
    }

    /// Initalize an owned signing transcript on a message provided as a byte array
    pub fn bytes(&self, bytes: &[u8]) -> Transcript {
        let mut t = self.0.clone();
        t.append_message(b"sign-bytes", bytes);
        t
    }

    /// Initalize an owned signing transcript on a message provided as
    /// a hash function with 256 bit output.
    pub fn hash256<D: FixedOutput<OutputSize = U32>>(&self, h: D) -> Transcript {
        let mut prehash = [0u8; 32];
        prehash.copy_from_slice(h.finalize_fixed().as_slice());
        let mut t = self.0.clone();
        t.append_message(b"sign-256", &prehash);
        t
    }

    /// Initalize an owned signing transcript on a message provided as
    /// a hash function with 512 bit output, usually a gross over kill.
    pub fn hash512<D: FixedOutput<OutputSize = U64>>(&self, h: D) -> Transcript {
        let mut prehash = [0u8; 64];
        prehash.copy_from_slice(h.finalize_fixed().as_slice());
        let mut t = self.0.clone();
        t.append_message(b"sign-512", &prehash);
        t
    }
}

/// A `RistrettoPoint` kept alongside its `CompressedRistretto` encoding.
#[derive(Copy, Clone)]
pub struct RistrettoBoth {
    compressed: CompressedRistretto,
    point: RistrettoPoint,
}

impl Debug for RistrettoBoth {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "RistrettoPoint( {:?} )", self.compressed)
    }
}

impl Default for RistrettoBoth {
    fn default() -> RistrettoBoth {
        RistrettoBoth {
            compressed: CompressedRistretto::default(),
            point: RistrettoPoint::default(),
        }
    }
}

impl Zeroize for RistrettoBoth {
    fn zeroize(&mut self) {
        self.compressed.0.zeroize();
        self.point.zeroize();
    }
}

impl RistrettoBoth {
    /// Access the compressed Ristretto form
    pub fn as_compressed(&self) -> &CompressedRistretto {
        &self.compressed
    }

    /// Extract the compressed Ristretto form
    pub fn into_compressed(self) -> CompressedRistretto {
        self.compressed
    }

    /// Access the point form
    pub fn as_point(&self) -> &RistrettoPoint {
        &self.point
    }

    /// Extract the point form
    pub fn into_point(self) -> RistrettoPoint {
        self.point
    }

    /// Decompress into the `RistrettoBoth` format that also retains the
    /// compressed form.
    pub fn from_compressed(compressed: CompressedRistretto) -> Option<RistrettoBoth> {
        let point = compressed.decompress()?;
        Some(RistrettoBoth { compressed, point })
    }

    /// Compress into the `RistrettoBoth` format that also retains the
    /// uncompressed form.
    pub fn from_point(point: RistrettoPoint) -> RistrettoBoth {
        RistrettoBoth {
            compressed: point.compress(),
            point,
        }
    }

    /// Convert to the canonical 32 byte encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.compressed.to_bytes()
    }

    /// Decode from 32 bytes, `None` on wrong length or an invalid encoding.
    pub fn from_bytes(bytes: &[u8]) -> Option<RistrettoBoth> {
        if bytes.len() != 32 {
            return None;
        }
        let mut compressed = [0u8; 32];
        compressed.copy_from_slice(bytes);
        RistrettoBoth::from_compressed(CompressedRistretto(compressed))
    }
}

// Canonical encodings make byte comparison sufficient.
impl PartialEq for RistrettoBoth {
    fn eq(&self, other: &Self) -> bool {
        self.compressed == other.compressed
    }
}

impl Eq for RistrettoBoth {}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;

    #[test]
    fn signing_context_separates_messages() {
        let ctx = SigningContext::substrate();
        let mut a = ctx.bytes(b"one");
        let mut b = ctx.bytes(b"two");
        assert_ne!(a.challenge_scalar(b"c"), b.challenge_scalar(b"c"));

        let mut c = ctx.bytes(b"one");
        let mut d = SigningContext::new(b"other").bytes(b"one");
        assert_ne!(c.challenge_scalar(b"c"), d.challenge_scalar(b"c"));
    }

    #[test]
    fn ristretto_both_round_trip() {
        let both = RistrettoBoth::from_point(RISTRETTO_BASEPOINT_POINT);
        let again = RistrettoBoth::from_bytes(&both.to_bytes()).unwrap();
        assert_eq!(both, again);
        assert_eq!(again.as_point(), &RISTRETTO_BASEPOINT_POINT);
        assert!(RistrettoBoth::from_bytes(&[0u8; 31]).is_none());
        // 0xff.. is not a canonical field element
        assert!(RistrettoBoth::from_bytes(&[0xffu8; 32]).is_none());
    }

    #[test]
    fn witness_depends_on_secret_seed() {
        use rand::SeedableRng;
        use rand_chacha::ChaChaRng;

        let t = SigningContext::substrate().bytes(b"msg");
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        t.witness_bytes_rng(b"w", &mut a, &[&[1u8; 32][..]], ChaChaRng::from_seed([0u8; 32]));
        t.witness_bytes_rng(b"w", &mut b, &[&[2u8; 32][..]], ChaChaRng::from_seed([0u8; 32]));
        assert_ne!(a, b);
    }
}
