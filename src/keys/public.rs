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

//! sr25519 public keys.

use core::fmt::Debug;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use zeroize::Zeroize;

use crate::errors::SignatureError;
use crate::keys::SecretKey;
use crate::tools::RistrettoBoth;

/// The length of an sr25519 `PublicKey`, in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// An sr25519 public key.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct PublicKey(pub(crate) RistrettoBoth);

impl Debug for PublicKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "PublicKey( {:?} )", self.0)
    }
}

impl Zeroize for PublicKey {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}

impl PublicKey {
    const DESCRIPTION: &'static str = "A Ristretto Schnorr public key represented as a 32-byte Ristretto compressed point";

    /// Access the compressed Ristretto form
    pub fn as_compressed(&self) -> &CompressedRistretto {
        self.0.as_compressed()
    }

    /// Extract the compressed Ristretto form
    pub fn into_compressed(self) -> CompressedRistretto {
        self.0.into_compressed()
    }

    /// Access the point form
    pub fn as_point(&self) -> &RistrettoPoint {
        self.0.as_point()
    }

    /// Extract the point form
    pub fn into_point(self) -> RistrettoPoint {
        self.0.into_point()
    }

    /// Decompress into the `PublicKey` format that also retains the
    /// compressed form.
    pub fn from_compressed(compressed: CompressedRistretto) -> Result<PublicKey, SignatureError> {
        match RistrettoBoth::from_compressed(compressed) {
            None => Err(SignatureError::PointDecompressionError),
            Some(kosher) => Ok(PublicKey(kosher)),
        }
    }

    /// Compress into the `PublicKey` format that also retains the
    /// uncompressed form.
    pub fn from_point(point: RistrettoPoint) -> PublicKey {
        PublicKey(RistrettoBoth::from_point(point))
    }

    /// Convert this public key to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// View this public key as a byte array.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0.as_compressed().0
    }

    /// Construct a `PublicKey` from a slice of bytes.
    ///
    /// # Returns
    ///
    /// A `Result` whose okay value is a `PublicKey` or whose error value
    /// is a `BytesLengthError` for a wrong length and a
    /// `PointDecompressionError` when the bytes are not a canonical
    /// Ristretto encoding.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<PublicKey, SignatureError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(SignatureError::BytesLengthError {
                name: "PublicKey",
                description: PublicKey::DESCRIPTION,
                length: PUBLIC_KEY_LENGTH,
            });
        }
        let mut compressed = [0u8; PUBLIC_KEY_LENGTH];
        compressed.copy_from_slice(bytes);
        PublicKey::from_compressed(CompressedRistretto(compressed))
    }

    /// Derive this public key from its corresponding `SecretKey`.
    pub fn from_secret(secret_key: &SecretKey) -> PublicKey {
        Self::from_secret_scalar(secret_key.as_scalar())
    }

    /// Helper Function to convert [Scalar] into PubKey
    pub(crate) fn from_secret_scalar(privkey: &Scalar) -> PublicKey {
        PublicKey(RistrettoBoth::from_point(RistrettoPoint::mul_base(privkey)))
    }
}

impl From<&SecretKey> for PublicKey {
    fn from(source: &SecretKey) -> PublicKey {
        PublicKey::from_secret(source)
    }
}

serde_boilerplate!(PublicKey);
