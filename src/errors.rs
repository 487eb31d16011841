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

//! Errors which may occur when parsing keys and/or signatures to or from wire formats,
//! or when verifying signatures and VRF proofs.

use thiserror::Error;

/// Represents an error in decoding, signing, or verification.
#[derive(Eq, PartialEq, Debug, Error, Clone)]
pub enum SignatureError {
    /// The verification equation wasn't satisfied
    #[error("Verification equation was not satisfied")]
    EquationFalse,

    /// Invalid point provided.
    #[error("Cannot decompress Ristretto point")]
    PointDecompressionError,

    /// Invalid scalar provided.
    #[error("Cannot use scalar with high-bit set or not reduced mod l")]
    ScalarFormatError,

    /// An error in the length of bytes handed to a constructor.
    ///
    /// To use this, pass a string specifying the `name` of the type
    /// which is returning the error, a `description` of the expected
    /// encoding, and the `length` in bytes which its constructor expects.
    #[error("{name} must be {length} bytes in length ({description})")]
    BytesLengthError {
        /// Identifies the type returning the error
        name: &'static str,
        /// Describes the type returning the error
        description: &'static str,
        /// Length expected by the constructor in bytes
        length: usize,
    },

    /// Signature bytes lack the schnorrkel marker bit, so they may be
    /// an Ed25519 signature.
    #[error("Signature bytes not marked as a schnorrkel signature")]
    NotMarkedSchnorrkel,

    /// A multi-signature session is missing a commitment, reveal or share.
    #[error("Multi-signature protocol value absent")]
    MuSigAbsent,

    /// A multi-signature session received contradicting values.
    #[error("Multi-signature protocol value inconsistent")]
    MuSigInconsistent,

    /// The public half of a keypair is not the secret scalar times the basepoint.
    #[error("Public key does not match secret key")]
    KeypairMismatch,
}

/// Result codes shared by signature and VRF verification at the C boundary.
///
/// The discriminants are part of the binary interface.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignatureResult {
    /// Success
    Ok = 0,
    /// See `SignatureError::EquationFalse`
    EquationFalse = 1,
    /// See `SignatureError::PointDecompressionError`
    PointDecompressionError = 2,
    /// See `SignatureError::ScalarFormatError`
    ScalarFormatError = 3,
    /// See `SignatureError::BytesLengthError`
    BytesLengthError = 4,
    /// See `SignatureError::NotMarkedSchnorrkel`
    NotMarkedSchnorrkel = 5,
    /// Reserved for multi-signature sessions.
    MuSigAbsent = 6,
    /// Reserved for multi-signature sessions.
    MuSigInconsistent = 7,
}

impl From<&SignatureError> for SignatureResult {
    fn from(err: &SignatureError) -> SignatureResult {
        match err {
            SignatureError::EquationFalse => SignatureResult::EquationFalse,
            SignatureError::PointDecompressionError => SignatureResult::PointDecompressionError,
            SignatureError::ScalarFormatError => SignatureResult::ScalarFormatError,
            SignatureError::BytesLengthError { .. } => SignatureResult::BytesLengthError,
            SignatureError::NotMarkedSchnorrkel => SignatureResult::NotMarkedSchnorrkel,
            SignatureError::MuSigAbsent => SignatureResult::MuSigAbsent,
            SignatureError::MuSigInconsistent => SignatureResult::MuSigInconsistent,
            // public = secret * B is the equation that failed
            SignatureError::KeypairMismatch => SignatureResult::EquationFalse,
        }
    }
}

impl From<SignatureError> for SignatureResult {
    fn from(err: SignatureError) -> SignatureResult {
        SignatureResult::from(&err)
    }
}

impl<T> From<Result<T, SignatureError>> for SignatureResult {
    fn from(res: Result<T, SignatureError>) -> SignatureResult {
        match res {
            Ok(_) => SignatureResult::Ok,
            Err(e) => SignatureResult::from(&e),
        }
    }
}

/// Convert `SignatureError` into `::serde::de::Error` aka `SerdeError`
///
/// We should do this with `From` but right now the orphan rules prohibit
/// `impl From<SignatureError> for E where E: ::serde::de::Error`.
pub(crate) fn serde_error_from_signature_error<E>(err: SignatureError) -> E
where
    E: ::serde::de::Error,
{
    match err {
        SignatureError::PointDecompressionError => {
            E::custom("Ristretto point decompression failed")
        }
        SignatureError::ScalarFormatError => E::custom("improper scalar has high-bit set"),
        other => E::custom(other),
    }
}

/// Errors of the validator erasure codec.
#[derive(Eq, PartialEq, Debug, Error, Clone)]
pub enum ErasureError {
    /// The validator count is outside `2..=65536`.
    #[error("Validator count {0} is outside the supported range")]
    InvalidValidatorCount(usize),

    /// Chunks must be non-empty and of even length.
    #[error("Invalid chunk size {0}: chunks must be non-empty and of even length")]
    InvalidChunkSize(usize),

    /// Fewer chunks than the recovery threshold were supplied.
    #[error("Received {received} chunks, at least {required} are required")]
    InsufficientChunks {
        /// Distinct chunks supplied
        received: usize,
        /// Recovery threshold for the validator count
        required: usize,
    },

    /// Supplied chunks differ in length.
    #[error("Chunks have inconsistent sizes")]
    InconsistentChunkSizes,

    /// The chunks could not be decoded into a payload.
    #[error("Reconstruction failed: {0}")]
    ReconstructionFailed(String),
}

impl From<reed_solomon_erasure::Error> for ErasureError {
    fn from(err: reed_solomon_erasure::Error) -> ErasureError {
        ErasureError::ReconstructionFailed(err.to_string())
    }
}

/// Result codes of the erasure entry points at the C boundary.
///
/// The discriminants are part of the binary interface.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErasureResult {
    /// Success
    Ok = 0,
    /// See `ErasureError::InvalidValidatorCount`
    InvalidValidatorCount = 1,
    /// See `ErasureError::InvalidChunkSize`
    InvalidChunkSize = 2,
    /// See `ErasureError::InsufficientChunks`
    InsufficientChunks = 3,
    /// See `ErasureError::InconsistentChunkSizes`
    InconsistentChunkSizes = 4,
    /// See `ErasureError::ReconstructionFailed`
    ReconstructionFailed = 5,
    /// A required pointer argument was null.
    NullPointer = 6,
}

impl ErasureResult {
    /// Static, NUL terminated description of this code.
    pub fn message(self) -> &'static [u8] {
        match self {
            ErasureResult::Ok => b"ok\0",
            ErasureResult::InvalidValidatorCount => b"validator count must be between 2 and 65536\0",
            ErasureResult::InvalidChunkSize => b"chunks must be non-empty and of even length\0",
            ErasureResult::InsufficientChunks => b"not enough chunks to reconstruct the data\0",
            ErasureResult::InconsistentChunkSizes => b"chunks have inconsistent sizes\0",
            ErasureResult::ReconstructionFailed => b"chunks could not be decoded\0",
            ErasureResult::NullPointer => b"null pointer argument\0",
        }
    }
}

impl From<&ErasureError> for ErasureResult {
    fn from(err: &ErasureError) -> ErasureResult {
        match err {
            ErasureError::InvalidValidatorCount(_) => ErasureResult::InvalidValidatorCount,
            ErasureError::InvalidChunkSize(_) => ErasureResult::InvalidChunkSize,
            ErasureError::InsufficientChunks { .. } => ErasureResult::InsufficientChunks,
            ErasureError::InconsistentChunkSizes => ErasureResult::InconsistentChunkSizes,
            ErasureError::ReconstructionFailed(_) => ErasureResult::ReconstructionFailed,
        }
    }
}

impl<T> From<Result<T, ErasureError>> for ErasureResult {
    fn from(res: Result<T, ErasureError>) -> ErasureResult {
        match res {
            Ok(_) => ErasureResult::Ok,
            Err(e) => ErasureResult::from(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes_are_stable() {
        assert_eq!(SignatureResult::Ok as u32, 0);
        assert_eq!(SignatureResult::EquationFalse as u32, 1);
        assert_eq!(SignatureResult::MuSigInconsistent as u32, 7);
    }

    #[test]
    fn keypair_mismatch_reports_equation_false() {
        let res: Result<(), SignatureError> = Err(SignatureError::KeypairMismatch);
        assert_eq!(SignatureResult::from(res), SignatureResult::EquationFalse);
        assert_eq!(
            SignatureResult::from(Ok::<(), SignatureError>(())),
            SignatureResult::Ok
        );
    }

    #[test]
    fn erasure_messages_are_nul_terminated() {
        for code in [
            ErasureResult::Ok,
            ErasureResult::InvalidValidatorCount,
            ErasureResult::InvalidChunkSize,
            ErasureResult::InsufficientChunks,
            ErasureResult::InconsistentChunkSizes,
            ErasureResult::ReconstructionFailed,
            ErasureResult::NullPointer,
        ] {
            let msg = code.message();
            assert_eq!(msg.last(), Some(&0u8));
            assert_eq!(msg.iter().filter(|b| **b == 0).count(), 1);
        }
    }

    #[test]
    fn reed_solomon_errors_fail_reconstruction() {
        let err = ErasureError::from(reed_solomon_erasure::Error::TooFewShardsPresent);
        assert_eq!(ErasureResult::from(&err), ErasureResult::ReconstructionFailed);
    }
}
