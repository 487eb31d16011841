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

//! sr25519 Secret Key: a scalar together with its signing nonce seed.

use core::fmt::Debug;

use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use crate::errors::SignatureError;
use crate::keys::PublicKey;

/// The length of the secret scalar portion of a `SecretKey`, in bytes.
pub const SECRET_KEY_KEY_LENGTH: usize = 32;

/// The length of the nonce portion of a `SecretKey`, in bytes.
pub const SECRET_KEY_NONCE_LENGTH: usize = 32;

/// The length of a `SecretKey`, in bytes.
pub const SECRET_KEY_LENGTH: usize = SECRET_KEY_KEY_LENGTH + SECRET_KEY_NONCE_LENGTH;

/// An sr25519 secret key.
///
/// The nonce seeds every witness the key produces (signing nonces, VRF
/// proofs, derived nonces) and must stay as secret as the scalar itself.
#[derive(Clone)]
pub struct SecretKey {
    /// Actual secret key represented as a scalar.
    pub(crate) key: Scalar,
    /// Seed for deriving the nonces used in signing.
    pub(crate) nonce: [u8; SECRET_KEY_NONCE_LENGTH],
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
        write!(f, "SecretKey {{ key: {:?} nonce: {:?} }}", &self.key, &self.nonce)
    }
}

impl Eq for SecretKey {}
impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).unwrap_u8() == 1u8
    }
}
impl ConstantTimeEq for SecretKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.key.ct_eq(&other.key) & self.nonce[..].ct_eq(&other.nonce[..])
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.key.zeroize();
        self.nonce.zeroize();
    }
}

/// Overwrite secret key material with null bytes when it goes out of scope.
impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl SecretKey {
    const DESCRIPTION: &'static str =
        "An sr25519 secret key as 64 bytes: a canonical scalar followed by a 32 byte nonce.";

    /// Convert this secret key to a byte array: scalar then nonce.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        let mut bytes: [u8; SECRET_KEY_LENGTH] = [0u8; SECRET_KEY_LENGTH];
        bytes[..SECRET_KEY_KEY_LENGTH].copy_from_slice(self.key.as_bytes());
        bytes[SECRET_KEY_KEY_LENGTH..].copy_from_slice(&self.nonce);
        bytes
    }

    /// Construct a `SecretKey` from a slice of bytes.
    ///
    /// # Returns
    ///
    /// A `Result` whose okay value is a `SecretKey`, or a
    /// `BytesLengthError` for a wrong length and a `ScalarFormatError`
    /// when the scalar is not reduced modulo the group order.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<SecretKey, SignatureError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(SignatureError::BytesLengthError {
                name: "SecretKey",
                description: SecretKey::DESCRIPTION,
                length: SECRET_KEY_LENGTH,
            });
        }

        let mut key: [u8; 32] = [0u8; 32];
        key.copy_from_slice(&bytes[..SECRET_KEY_KEY_LENGTH]);
        let scalar: Option<Scalar> = Scalar::from_canonical_bytes(key).into();
        key.zeroize();

        let mut nonce: [u8; 32] = [0u8; 32];
        nonce.copy_from_slice(&bytes[SECRET_KEY_KEY_LENGTH..]);

        match scalar {
            Some(key) => Ok(SecretKey { key, nonce }),
            None => Err(SignatureError::ScalarFormatError),
        }
    }

    /// Generate a `SecretKey` from a `csprng`.
    pub fn generate<T>(csprng: &mut T) -> SecretKey
    where
        T: CryptoRng + RngCore,
    {
        let mut nonce: [u8; 32] = [0u8; 32];
        csprng.fill_bytes(&mut nonce);
        SecretKey {
            key: Scalar::random(csprng),
            nonce,
        }
    }

    /// Derive the `PublicKey` corresponding to this `SecretKey`.
    pub fn to_public(&self) -> PublicKey {
        PublicKey::from_secret_scalar(&self.key)
    }

    /// View this scalar.
    #[inline]
    pub fn as_scalar(&self) -> &Scalar {
        &self.key
    }

    /// Helper Method to Convert key to scalar
    pub fn to_scalar(&self) -> Scalar {
        self.key
    }
}

serde_boilerplate!(SecretKey);
