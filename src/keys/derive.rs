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

//! Hierarchical deterministic key derivation.
//!
//! Soft derivation blinds a key with a scalar squeezed from a transcript
//! over the chain code and the parent public key, so public keys derive
//! the same way secret keys do. Hard derivation commits the secret scalar
//! instead and produces a fresh seed, breaking that link.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;

use crate::errors::SignatureError;
use crate::keys::{Keypair, MiniSecretKey, PublicKey, SecretKey, MINI_SECRET_KEY_LENGTH};
use crate::tools::TranscriptProtocol;

/// The length of a `ChainCode`, in bytes.
pub const CHAIN_CODE_LENGTH: usize = 32;

/// A chain code: the per-step input of a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainCode(pub [u8; CHAIN_CODE_LENGTH]);

impl ChainCode {
    const DESCRIPTION: &'static str = "A 32 byte HDKD chain code";

    /// Convert this chain code to a byte array.
    pub fn to_bytes(&self) -> [u8; CHAIN_CODE_LENGTH] {
        self.0
    }

    /// Construct a `ChainCode` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<ChainCode, SignatureError> {
        if bytes.len() != CHAIN_CODE_LENGTH {
            return Err(SignatureError::BytesLengthError {
                name: "ChainCode",
                description: ChainCode::DESCRIPTION,
                length: CHAIN_CODE_LENGTH,
            });
        }
        let mut cc = [0u8; CHAIN_CODE_LENGTH];
        cc.copy_from_slice(bytes);
        Ok(ChainCode(cc))
    }
}

serde_boilerplate!(ChainCode);

/// Fresh derivation transcript over the index bytes `i`.
fn hdkd_transcript(i: &[u8]) -> Transcript {
    let mut t = Transcript::new(b"SchnorrRistrettoHDKD");
    t.append_message(b"sign-bytes", i);
    t
}

/// Soft derivation, shared by public keys, secret keys and keypairs.
pub trait Derivation: Sized {
    /// Derive a child key and chain code from the transcript `t`.
    fn derived_key(&self, t: Transcript, cc: ChainCode) -> (Self, ChainCode);

    /// Derive a child key from the chain code and an index or path
    /// component `i`, which may be empty.
    fn derived_key_simple<B: AsRef<[u8]>>(&self, cc: ChainCode, i: B) -> (Self, ChainCode) {
        self.derived_key(hdkd_transcript(i.as_ref()), cc)
    }
}

impl PublicKey {
    /// Squeeze the blinding scalar and child chain code.
    pub(crate) fn derive_scalar_and_chaincode(
        &self,
        t: &mut Transcript,
        cc: ChainCode,
    ) -> (Scalar, ChainCode) {
        t.append_message(b"chain-code", &cc.0);
        t.commit_point(b"public-key", self.as_compressed());

        let scalar = t.challenge_scalar(b"HDKD-scalar");

        let mut chaincode = [0u8; CHAIN_CODE_LENGTH];
        t.challenge_bytes(b"HDKD-chaincode", &mut chaincode);

        (scalar, ChainCode(chaincode))
    }
}

impl Derivation for PublicKey {
    fn derived_key(&self, mut t: Transcript, cc: ChainCode) -> (PublicKey, ChainCode) {
        let (scalar, chaincode) = self.derive_scalar_and_chaincode(&mut t, cc);
        let point = self.as_point() + RistrettoPoint::mul_base(&scalar);
        (PublicKey::from_point(point), chaincode)
    }
}

impl Derivation for SecretKey {
    /// The child nonce is a witness over the parent secret, so two soft
    /// children of one parent never share nonces. Only the scalar half is
    /// reproducible across calls.
    fn derived_key(&self, mut t: Transcript, cc: ChainCode) -> (SecretKey, ChainCode) {
        let mut nonce = [0u8; 32];
        t.witness_bytes(b"HDKD-nonce", &mut nonce, &[&self.nonce[..], &self.to_bytes()[..]]);

        let (scalar, chaincode) = self.to_public().derive_scalar_and_chaincode(&mut t, cc);
        (
            SecretKey {
                key: self.key + scalar,
                nonce,
            },
            chaincode,
        )
    }
}

impl Derivation for Keypair {
    fn derived_key(&self, t: Transcript, cc: ChainCode) -> (Keypair, ChainCode) {
        let (secret, chaincode) = self.secret.derived_key(t, cc);
        (Keypair::from(secret), chaincode)
    }
}

impl SecretKey {
    /// Hard derive a new seed from this secret key, a chain code and an
    /// index `i`.
    pub fn hard_derive_mini_secret_key<B: AsRef<[u8]>>(
        &self,
        cc: Option<ChainCode>,
        i: B,
    ) -> (MiniSecretKey, ChainCode) {
        let mut t = hdkd_transcript(i.as_ref());
        if let Some(c) = cc {
            t.append_message(b"chain-code", &c.0);
        }
        t.append_message(b"secret-key", self.key.as_bytes());

        let mut msk = [0u8; MINI_SECRET_KEY_LENGTH];
        t.challenge_bytes(b"HDKD-hard", &mut msk);

        let mut chaincode = [0u8; CHAIN_CODE_LENGTH];
        t.challenge_bytes(b"HDKD-chaincode", &mut chaincode);

        (MiniSecretKey(msk), ChainCode(chaincode))
    }
}

impl Keypair {
    /// Hard derive a child keypair along the chain code `cc`.
    ///
    /// The child is a fresh seed expanded like any other, so its public key
    /// reveals nothing about this keypair's public key.
    pub fn hard_derive(&self, cc: ChainCode) -> (Keypair, ChainCode) {
        let (mini, chaincode) = self.secret.hard_derive_mini_secret_key(Some(cc), b"");
        (mini.expand_to_keypair(), chaincode)
    }

    /// Soft derive a child keypair along the chain code `cc`.
    pub fn soft_derive(&self, cc: ChainCode) -> (Keypair, ChainCode) {
        self.derived_key_simple(cc, b"")
    }
}

impl PublicKey {
    /// Soft derive a child public key along the chain code `cc`.
    pub fn soft_derive(&self, cc: ChainCode) -> (PublicKey, ChainCode) {
        self.derived_key_simple(cc, b"")
    }
}
