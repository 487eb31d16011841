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

//! A Rust implementation of sr25519 signing

use core::fmt::Debug;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use zeroize::Zeroize;

use crate::errors::SignatureError;
use crate::keys::{Keypair, PublicKey, SecretKey};
use crate::tools::{SigningContext, TranscriptProtocol};

/// The length of an sr25519 `Signature`, in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// An sr25519 signature.
///
/// # Note
///
/// These signatures are "detached", they do **not** include a copy
/// of the message which has been signed.
///
/// The encoding sets the high bit of the last byte, which Ed25519 leaves
/// clear, so the two signature kinds cannot be confused.
#[allow(non_snake_case)]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Signature {
    /// `R` is the commitment `r·B` to the random nonce `r`.
    pub(crate) R: CompressedRistretto,

    /// `s` is a `Scalar`, formed by s = k·x + r
    ///
    /// - the `r` portion of this `Signature`,
    /// - the `x` is the secret key signing
    /// - the `k` is the transcript challenge over the public key, `R`
    ///   and the message.
    pub(crate) s: Scalar,
}

impl Debug for Signature {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "Signature( R: {:?}, s: {:?} )", &self.R, &self.s)
    }
}

impl Signature {
    const DESCRIPTION: &'static str =
        "An sr25519 signature as 64 bytes: compressed R then s with the high bit of byte 63 set";

    /// Convert this `Signature` to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes: [u8; SIGNATURE_LENGTH] = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(&self.R.as_bytes()[..]);
        bytes[32..].copy_from_slice(&self.s.as_bytes()[..]);
        bytes[63] |= 128;
        bytes
    }

    /// Construct a `Signature` from a slice of bytes.
    ///
    /// # Returns
    ///
    /// `NotMarkedSchnorrkel` when the high bit of byte 63 is clear, and
    /// `ScalarFormatError` when `s` is not reduced.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Signature, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::BytesLengthError {
                name: "Signature",
                description: Signature::DESCRIPTION,
                length: SIGNATURE_LENGTH,
            });
        }

        let mut lower: [u8; 32] = [0u8; 32];
        let mut upper: [u8; 32] = [0u8; 32];
        lower.copy_from_slice(&bytes[..32]);
        upper.copy_from_slice(&bytes[32..]);
        if upper[31] & 128 == 0 {
            return Err(SignatureError::NotMarkedSchnorrkel);
        }
        upper[31] &= 127;

        let s: Option<Scalar> = Scalar::from_canonical_bytes(upper).into();
        match s {
            Some(s) => Ok(Signature {
                R: CompressedRistretto(lower),
                s,
            }),
            None => Err(SignatureError::ScalarFormatError),
        }
    }

    /// Decode a signature whether or not it carries the sr25519 marker bit.
    pub fn from_bytes_not_distinguished_from_ed25519(
        bytes: &[u8],
    ) -> Result<Signature, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::BytesLengthError {
                name: "Signature",
                description: Signature::DESCRIPTION,
                length: SIGNATURE_LENGTH,
            });
        }
        let mut marked: [u8; SIGNATURE_LENGTH] = [0u8; SIGNATURE_LENGTH];
        marked.copy_from_slice(bytes);
        marked[63] |= 128;
        Signature::from_bytes(&marked[..])
    }

    /// Sign a transcript with `secret_key`.
    ///
    /// Requires a transcript, normally created from a `SigningContext`
    /// and a message, as well as the public key corresponding to
    /// `secret_key`. The public key is committed as given.
    ///
    /// We employ a randomized nonce here, but also incorporate the
    /// transcript like in a derandomized scheme, but only after first
    /// extending the transcript by the public key.
    #[allow(non_snake_case)]
    pub fn sign(
        transcript: &mut Transcript,
        secret_key: &SecretKey,
        public_key: &PublicKey,
    ) -> Signature {
        transcript.proto_name(b"Schnorr-sig");
        transcript.commit_point(b"sign:pk", public_key.as_compressed());

        let mut r = transcript.witness_scalar(b"signing", &[&secret_key.nonce[..]]);
        let R = RistrettoPoint::mul_base(&r).compress();

        transcript.commit_point(b"sign:R", &R);

        let k: Scalar = transcript.challenge_scalar(b"sign:c");
        let s: Scalar = k * secret_key.as_scalar() + r;

        r.zeroize();

        Signature { R, s }
    }

    /// Verify this signature by `public_key` on a transcript.
    ///
    /// # Return
    ///
    /// Returns `Ok(())` if `R == k·(−A) + s·B`, and `EquationFalse`
    /// otherwise.
    #[allow(non_snake_case)]
    pub fn verify(
        &self,
        transcript: &mut Transcript,
        public_key: &PublicKey,
    ) -> Result<(), SignatureError> {
        let A: &RistrettoPoint = public_key.as_point();

        transcript.proto_name(b"Schnorr-sig");
        transcript.commit_point(b"sign:pk", public_key.as_compressed());
        transcript.commit_point(b"sign:R", &self.R);

        let k: Scalar = transcript.challenge_scalar(b"sign:c");
        let R = RistrettoPoint::vartime_double_scalar_mul_basepoint(&k, &(-A), &self.s);

        if R.compress() == self.R {
            Ok(())
        } else {
            Err(SignatureError::EquationFalse)
        }
    }
}

serde_boilerplate!(Signature);

impl Keypair {
    /// Sign a transcript with this keypair.
    pub fn sign(&self, mut t: Transcript) -> Signature {
        Signature::sign(&mut t, &self.secret, &self.public)
    }

    /// Sign `msg` under the signing context `ctx`.
    pub fn sign_simple(&self, ctx: &[u8], msg: &[u8]) -> Signature {
        self.sign(SigningContext::new(ctx).bytes(msg))
    }
}

impl PublicKey {
    /// Verify a signature by this public key on a transcript.
    pub fn verify(&self, mut t: Transcript, signature: &Signature) -> Result<(), SignatureError> {
        signature.verify(&mut t, self)
    }

    /// Verify `signature` on `msg` under the signing context `ctx`.
    pub fn verify_simple(
        &self,
        ctx: &[u8],
        msg: &[u8],
        signature: &Signature,
    ) -> Result<(), SignatureError> {
        self.verify(SigningContext::new(ctx).bytes(msg), signature)
    }

    /// Verify raw signature bytes, also accepting signatures made before
    /// the marker bit and the signing context transcript existed.
    ///
    /// Marked signatures verify exactly as `verify_simple`. Unmarked ones
    /// are checked against a transcript named by `ctx` carrying only the
    /// message.
    pub fn verify_simple_deprecated(
        &self,
        ctx: &'static [u8],
        msg: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        if let Ok(signature) = Signature::from_bytes(signature) {
            return self.verify_simple(ctx, msg, &signature);
        }

        let signature = Signature::from_bytes_not_distinguished_from_ed25519(signature)?;
        let mut t = Transcript::new(ctx);
        t.append_message(b"sign-bytes", msg);
        self.verify(t, &signature)
    }
}
