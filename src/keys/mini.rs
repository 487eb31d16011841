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

//! Seeds, and their expansion into secret keys.

use core::fmt::Debug;

use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use crate::errors::SignatureError;
use crate::keys::{Keypair, PublicKey, SecretKey};

/// The length of a `MiniSecretKey` (seed), in bytes.
pub const MINI_SECRET_KEY_LENGTH: usize = 32;

/// A 32 byte seed from which an sr25519 `SecretKey` is expanded.
#[derive(Clone)]
pub struct MiniSecretKey(pub(crate) [u8; MINI_SECRET_KEY_LENGTH]);

impl Debug for MiniSecretKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "MiniSecretKey: {:?}", &self.0[..])
    }
}

impl Eq for MiniSecretKey {}
impl PartialEq for MiniSecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).unwrap_u8() == 1u8
    }
}
impl ConstantTimeEq for MiniSecretKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl Zeroize for MiniSecretKey {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Overwrite secret key material with null bytes when it goes out of scope.
impl Drop for MiniSecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Divide a little endian 256 bit integer by the cofactor 8.
fn divide_scalar_bytes_by_cofactor(scalar: &mut [u8; 32]) {
    let mut low = 0u8;
    for i in scalar.iter_mut().rev() {
        let r = *i & 0b0000_0111;
        *i >>= 3;
        *i += low;
        low = r << 5;
    }
}

impl MiniSecretKey {
    const DESCRIPTION: &'static str = "A 32 byte sr25519 seed";

    /// Expand this seed into a `SecretKey` the way Ed25519 does.
    ///
    /// SHA-512 of the seed is split in two. The low half is clamped as in
    /// Ed25519 and divided by the cofactor to give the secret scalar; the
    /// high half becomes the nonce.
    pub fn expand_ed25519(&self) -> SecretKey {
        let mut h = Sha512::default();
        h.update(self.0);
        let r = h.finalize();

        let mut key = [0u8; 32];
        key.copy_from_slice(&r.as_slice()[0..32]);
        key[0] &= 248;
        key[31] &= 63;
        key[31] |= 64;
        // The clamped value is below 2^255, so after the division it is
        // below 2^252 < l and reducing it changes nothing.
        divide_scalar_bytes_by_cofactor(&mut key);
        let scalar = Scalar::from_bytes_mod_order(key);
        key.zeroize();

        let mut nonce = [0u8; 32];
        nonce.copy_from_slice(&r.as_slice()[32..64]);

        SecretKey { key: scalar, nonce }
    }

    /// Expand this seed straight into a `Keypair`.
    pub fn expand_to_keypair(&self) -> Keypair {
        Keypair::from(self.expand_ed25519())
    }

    /// Public key of the expanded secret key.
    pub fn expand_to_public(&self) -> PublicKey {
        self.expand_ed25519().to_public()
    }

    /// View this seed as a byte array.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; MINI_SECRET_KEY_LENGTH] {
        &self.0
    }

    /// Convert this seed to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; MINI_SECRET_KEY_LENGTH] {
        self.0
    }

    /// Construct a `MiniSecretKey` from a slice of bytes.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<MiniSecretKey, SignatureError> {
        if bytes.len() != MINI_SECRET_KEY_LENGTH {
            return Err(SignatureError::BytesLengthError {
                name: "MiniSecretKey",
                description: MiniSecretKey::DESCRIPTION,
                length: MINI_SECRET_KEY_LENGTH,
            });
        }
        let mut bits: [u8; 32] = [0u8; 32];
        bits.copy_from_slice(bytes);
        Ok(MiniSecretKey(bits))
    }

    /// Generate a `MiniSecretKey` from a `csprng`.
    pub fn generate<T>(csprng: &mut T) -> MiniSecretKey
    where
        T: CryptoRng + RngCore,
    {
        let mut seed = [0u8; MINI_SECRET_KEY_LENGTH];
        csprng.fill_bytes(&mut seed);
        MiniSecretKey(seed)
    }
}

serde_boilerplate!(MiniSecretKey);
