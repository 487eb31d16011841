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

//
// sr25519 via ristretto, and validator erasure coding
//

// Modified From the hard work off:
// Authors:
// - Isis Agora Lovecruft <isis@patternsinthevoid.net>
// - Jeff Burdges <jeff@web3.foundation>
// - Oleg Andreev <oleganza@gmail.com>

//Modeled from
//https://github.com/w3f/schnorrkel

//Useful links:
//https://wiki.polkadot.network/docs/learn-cryptography
//https://github.com/paritytech/substrate/blob/master/primitives/core/src/sr25519.rs

#[macro_use]
mod ser;

mod errors;
pub use errors::{ErasureError, ErasureResult, SignatureError, SignatureResult};
pub mod tools;
pub use crate::tools::{RistrettoBoth, SigningContext, TranscriptProtocol, SIGNING_CTX};
pub mod keys;
pub mod signature;
pub mod vrf;
pub mod erasure;
#[cfg(feature = "ffi")]
pub mod ffi;

pub use crate::keys::*;
pub use crate::signature::{Signature, SIGNATURE_LENGTH};
pub use crate::vrf::{VrfInOut, VrfOutput, VrfProof, VRF_OUTPUT_LENGTH, VRF_PROOF_LENGTH};

/// Size of an sr25519 seed.
pub const SR25519_SEED_SIZE: usize = MINI_SECRET_KEY_LENGTH;
/// Size of an sr25519 chain code.
pub const SR25519_CHAINCODE_SIZE: usize = CHAIN_CODE_LENGTH;
/// Size of an sr25519 public key.
pub const SR25519_PUBLIC_SIZE: usize = PUBLIC_KEY_LENGTH;
/// Size of an sr25519 secret key.
pub const SR25519_SECRET_SIZE: usize = SECRET_KEY_LENGTH;
/// Size of an sr25519 keypair.
pub const SR25519_KEYPAIR_SIZE: usize = KEYPAIR_LENGTH;
/// Size of an sr25519 signature.
pub const SR25519_SIGNATURE_SIZE: usize = SIGNATURE_LENGTH;
/// Size of a VRF output.
pub const SR25519_VRF_OUTPUT_SIZE: usize = VRF_OUTPUT_LENGTH;
/// Size of a VRF proof.
pub const SR25519_VRF_PROOF_SIZE: usize = VRF_PROOF_LENGTH;
/// Size of a VRF threshold.
pub const SR25519_VRF_THRESHOLD_SIZE: usize = VRF_OUTPUT_LENGTH;
