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

//! Verifiable random function over sr25519 keys.
//!
//! The input message is hashed to a point `H`, the output is `x·H` for the
//! secret scalar `x`, and a DLEQ proof shows `log_B(A) == log_H(output)`
//! without revealing `x`. The output is a function of the key and message
//! alone; proofs are randomized.

use core::fmt::Debug;

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use zeroize::Zeroize;

use crate::errors::SignatureError;
use crate::keys::{Keypair, PublicKey};
use crate::tools::{RistrettoBoth, TranscriptProtocol};

/// The length of a VRF output, in bytes.
pub const VRF_OUTPUT_LENGTH: usize = 32;

/// The length of a VRF proof, in bytes.
pub const VRF_PROOF_LENGTH: usize = 64;

/// Compressed VRF output point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VrfOutput(pub [u8; VRF_OUTPUT_LENGTH]);

impl VrfOutput {
    const DESCRIPTION: &'static str = "A 32 byte Ristretto compressed VRF output point";

    /// Convert this output to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; VRF_OUTPUT_LENGTH] {
        self.0
    }

    /// View this output as a byte array.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; VRF_OUTPUT_LENGTH] {
        &self.0
    }

    /// Construct a `VrfOutput` from a slice of bytes. The point is only
    /// decompressed when attached to an input.
    pub fn from_bytes(bytes: &[u8]) -> Result<VrfOutput, SignatureError> {
        if bytes.len() != VRF_OUTPUT_LENGTH {
            return Err(SignatureError::BytesLengthError {
                name: "VrfOutput",
                description: VrfOutput::DESCRIPTION,
                length: VRF_OUTPUT_LENGTH,
            });
        }
        let mut bits = [0u8; VRF_OUTPUT_LENGTH];
        bits.copy_from_slice(bytes);
        Ok(VrfOutput(bits))
    }

    /// Whether this output is strictly below `limit`, both read as
    /// little endian unsigned 256 bit integers.
    pub fn is_less(&self, limit: &[u8; VRF_OUTPUT_LENGTH]) -> bool {
        le_bytes_less_than(&self.0, limit)
    }

    /// Pair this output with the input hashed from `t` under `public`.
    pub fn attach_input_hash(
        &self,
        public: &PublicKey,
        t: Transcript,
    ) -> Result<VrfInOut, SignatureError> {
        let output = RistrettoBoth::from_bytes(&self.0[..])
            .ok_or(SignatureError::PointDecompressionError)?;
        let input = public.vrf_hash(t);
        Ok(VrfInOut { input, output })
    }
}

serde_boilerplate!(VrfOutput);

/// Little endian comparison of two 256 bit integers, byte 31 most
/// significant.
pub fn le_bytes_less_than(a: &[u8; 32], b: &[u8; 32]) -> bool {
    for i in (0..32).rev() {
        if a[i] != b[i] {
            return a[i] < b[i];
        }
    }
    false
}

/// A VRF input point together with its output point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VrfInOut {
    /// The input point, hashed from the message and public key.
    pub input: RistrettoBoth,
    /// The output point, `x·input`.
    pub output: RistrettoBoth,
}

impl VrfInOut {
    /// The compressed output.
    pub fn to_output(&self) -> VrfOutput {
        VrfOutput(self.output.to_bytes())
    }

    /// Output bytes, as they appear on the wire.
    pub fn as_output_bytes(&self) -> &[u8; VRF_OUTPUT_LENGTH] {
        &self.output.as_compressed().0
    }

    /// Commit both points to a transcript.
    pub fn commit(&self, t: &mut Transcript) {
        t.commit_point(b"vrf-in", self.input.as_compressed());
        t.commit_point(b"vrf-out", self.output.as_compressed());
    }

    /// Randomness derived from this pair under a caller chosen `context`.
    ///
    /// Only meaningful once the pair has been verified.
    pub fn make_bytes<B: Default + AsMut<[u8]>>(&self, context: &[u8]) -> B {
        let mut t = Transcript::new(b"VRFResult");
        t.append_message(b"", context);
        self.commit(&mut t);
        let mut seed = B::default();
        t.challenge_bytes(b"", seed.as_mut());
        seed
    }
}

/// Proof that a VRF output was computed with the secret key of a public key.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VrfProof {
    /// Challenge
    c: Scalar,
    /// Schnorr proof
    s: Scalar,
}

impl VrfProof {
    const DESCRIPTION: &'static str = "A 64 byte VRF DLEQ proof: two canonical scalars c and s";

    /// Convert this proof to a byte array: `c` then `s`.
    pub fn to_bytes(&self) -> [u8; VRF_PROOF_LENGTH] {
        let mut bytes = [0u8; VRF_PROOF_LENGTH];
        bytes[..32].copy_from_slice(self.c.as_bytes());
        bytes[32..].copy_from_slice(self.s.as_bytes());
        bytes
    }

    /// Construct a `VrfProof` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<VrfProof, SignatureError> {
        if bytes.len() != VRF_PROOF_LENGTH {
            return Err(SignatureError::BytesLengthError {
                name: "VrfProof",
                description: VrfProof::DESCRIPTION,
                length: VRF_PROOF_LENGTH,
            });
        }
        let mut c = [0u8; 32];
        let mut s = [0u8; 32];
        c.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        let c: Option<Scalar> = Scalar::from_canonical_bytes(c).into();
        let s: Option<Scalar> = Scalar::from_canonical_bytes(s).into();
        match (c, s) {
            (Some(c), Some(s)) => Ok(VrfProof { c, s }),
            _ => Err(SignatureError::ScalarFormatError),
        }
    }
}

serde_boilerplate!(VrfProof);

impl PublicKey {
    /// Hash the transcript `t` to the VRF input point of this key.
    pub fn vrf_hash(&self, mut t: Transcript) -> RistrettoBoth {
        let mut b = [0u8; 64];
        t.commit_point(b"vrf-nm-pk", self.as_compressed());
        t.challenge_bytes(b"VRFHash", &mut b);
        RistrettoBoth::from_point(RistrettoPoint::from_uniform_bytes(&b))
    }

    /// Verify the DLEQ proof for an in/out pair.
    #[allow(non_snake_case)]
    pub fn dleq_verify(&self, p: &VrfInOut, proof: &VrfProof) -> Result<(), SignatureError> {
        let mut t = Transcript::new(b"VRF");
        t.proto_name(b"DLEQProof");
        t.commit_point(b"vrf:h", p.input.as_compressed());
        t.commit_point(b"vrf:pk", self.as_compressed());

        // R = c·A + s·B
        let R = RistrettoPoint::vartime_double_scalar_mul_basepoint(&proof.c, self.as_point(), &proof.s);
        t.commit_point(b"vrf:R=g^r", &R.compress());

        // h^r = c·output + s·H
        let Hr = proof.c * p.output.as_point() + proof.s * p.input.as_point();
        t.commit_point(b"vrf:h^r", &Hr.compress());

        t.commit_point(b"vrf:h^sk", p.output.as_compressed());

        if t.challenge_scalar(b"prove") == proof.c {
            Ok(())
        } else {
            Err(SignatureError::EquationFalse)
        }
    }

    /// Verify a VRF output and proof for the message transcript `t`.
    ///
    /// Returns the verified in/out pair, from which `make_bytes` may
    /// derive randomness.
    pub fn vrf_verify(
        &self,
        t: Transcript,
        output: &VrfOutput,
        proof: &VrfProof,
    ) -> Result<VrfInOut, SignatureError> {
        let p = output.attach_input_hash(self, t)?;
        self.dleq_verify(&p, proof)?;
        Ok(p)
    }
}

impl Keypair {
    /// Compute the VRF in/out pair for the message transcript `t`.
    pub fn vrf_create_hash(&self, t: Transcript) -> VrfInOut {
        let input = self.public.vrf_hash(t);
        let output = RistrettoBoth::from_point(self.secret.as_scalar() * input.as_point());
        VrfInOut { input, output }
    }

    /// Prove that `p.output` is this secret scalar times `p.input`.
    #[allow(non_snake_case)]
    pub fn dleq_prove(&self, p: &VrfInOut) -> VrfProof {
        let mut t = Transcript::new(b"VRF");
        t.proto_name(b"DLEQProof");
        t.commit_point(b"vrf:h", p.input.as_compressed());
        t.commit_point(b"vrf:pk", self.public.as_compressed());

        let mut r = t.witness_scalar(b"proving\x000", &[&self.secret.nonce[..]]);
        let R = RistrettoPoint::mul_base(&r).compress();
        t.commit_point(b"vrf:R=g^r", &R);

        let Hr = (r * p.input.as_point()).compress();
        t.commit_point(b"vrf:h^r", &Hr);

        t.commit_point(b"vrf:h^sk", p.output.as_compressed());

        let c = t.challenge_scalar(b"prove");
        let s = r - c * self.secret.as_scalar();

        r.zeroize();

        VrfProof { c, s }
    }

    /// Evaluate the VRF on the message transcript `t`.
    pub fn vrf_sign(&self, t: Transcript) -> (VrfInOut, VrfProof) {
        let p = self.vrf_create_hash(t);
        let proof = self.dleq_prove(&p);
        (p, proof)
    }

    /// Evaluate the VRF and report whether the output falls below `limit`.
    ///
    /// The output and proof are produced either way, so a caller that
    /// loses the lottery can still show its output.
    pub fn vrf_sign_if_less(
        &self,
        t: Transcript,
        limit: &[u8; VRF_OUTPUT_LENGTH],
    ) -> (VrfInOut, VrfProof, bool) {
        let (p, proof) = self.vrf_sign(t);
        let is_less = p.to_output().is_less(limit);
        (p, proof, is_less)
    }
}
