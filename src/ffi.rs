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

//! C-callable surface.
//!
//! sr25519 outputs are written to caller allocated buffers of the
//! `SR25519_*_SIZE` lengths. Erasure outputs are allocated here and must be
//! released with `erasure_free_buffer`.
//!
//! # Safety
//!
//! Every pointer must be null or valid for the documented length. A null
//! pointer is only accepted for a zero length message.

use std::os::raw::c_char;
use std::ptr;
use std::slice;

use crate::erasure;
use crate::errors::{ErasureResult, SignatureError, SignatureResult};
use crate::keys::{ChainCode, Keypair, MiniSecretKey, PublicKey, SecretKey};
use crate::signature::Signature;
use crate::tools::{SigningContext, SIGNING_CTX};
use crate::vrf::{VrfOutput, VrfProof};
use crate::{
    SR25519_CHAINCODE_SIZE, SR25519_KEYPAIR_SIZE, SR25519_PUBLIC_SIZE, SR25519_SECRET_SIZE,
    SR25519_SEED_SIZE, SR25519_SIGNATURE_SIZE, SR25519_VRF_OUTPUT_SIZE, SR25519_VRF_PROOF_SIZE,
    SR25519_VRF_THRESHOLD_SIZE,
};

/// Outcome of `sr25519_vrf_sign_if_less`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VrfSignResult {
    /// `Ok` unless the keypair failed to decode.
    pub result: SignatureResult,
    /// Whether the output is below the limit.
    pub is_less: bool,
}

const NULL_INPUT: SignatureError = SignatureError::BytesLengthError {
    name: "pointer",
    description: "A required input pointer was null",
    length: 0,
};

/// Borrow `len` bytes at `ptr`, `None` for a null pointer with a non-zero length.
unsafe fn input<'a>(ptr: *const u8, len: usize) -> Option<&'a [u8]> {
    if ptr.is_null() {
        if len == 0 {
            Some(&[])
        } else {
            None
        }
    } else {
        Some(slice::from_raw_parts(ptr, len))
    }
}

unsafe fn fixed<'a>(ptr: *const u8, len: usize) -> Result<&'a [u8], SignatureError> {
    if ptr.is_null() {
        return Err(NULL_INPUT);
    }
    Ok(slice::from_raw_parts(ptr, len))
}

unsafe fn write(out: *mut u8, bytes: &[u8]) -> Result<(), SignatureError> {
    if out.is_null() {
        return Err(NULL_INPUT);
    }
    ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len());
    Ok(())
}

/// Expand a 32 byte seed into a 96 byte keypair.
#[no_mangle]
pub unsafe extern "C" fn sr25519_keypair_from_seed(
    keypair_out: *mut u8,
    seed_ptr: *const u8,
) -> SignatureResult {
    let res = (|| -> Result<_, SignatureError> {
        let seed = MiniSecretKey::from_bytes(fixed(seed_ptr, SR25519_SEED_SIZE)?)?;
        write(keypair_out, &seed.expand_to_keypair().to_bytes())
    })();
    SignatureResult::from(res)
}

/// Hard derive a keypair along a chain code.
#[no_mangle]
pub unsafe extern "C" fn sr25519_derive_keypair_hard(
    keypair_out: *mut u8,
    pair_ptr: *const u8,
    cc_ptr: *const u8,
) -> SignatureResult {
    let res = (|| -> Result<_, SignatureError> {
        let keypair = Keypair::from_bytes(fixed(pair_ptr, SR25519_KEYPAIR_SIZE)?)?;
        let cc = ChainCode::from_bytes(fixed(cc_ptr, SR25519_CHAINCODE_SIZE)?)?;
        let (child, _) = keypair.hard_derive(cc);
        write(keypair_out, &child.to_bytes())
    })();
    SignatureResult::from(res)
}

/// Soft derive a keypair along a chain code.
#[no_mangle]
pub unsafe extern "C" fn sr25519_derive_keypair_soft(
    keypair_out: *mut u8,
    pair_ptr: *const u8,
    cc_ptr: *const u8,
) -> SignatureResult {
    let res = (|| -> Result<_, SignatureError> {
        let keypair = Keypair::from_bytes(fixed(pair_ptr, SR25519_KEYPAIR_SIZE)?)?;
        let cc = ChainCode::from_bytes(fixed(cc_ptr, SR25519_CHAINCODE_SIZE)?)?;
        let (child, _) = keypair.soft_derive(cc);
        write(keypair_out, &child.to_bytes())
    })();
    SignatureResult::from(res)
}

/// Soft derive a public key along a chain code.
#[no_mangle]
pub unsafe extern "C" fn sr25519_derive_public_soft(
    pubkey_out: *mut u8,
    public_ptr: *const u8,
    cc_ptr: *const u8,
) -> SignatureResult {
    let res = (|| -> Result<_, SignatureError> {
        let public = PublicKey::from_bytes(fixed(public_ptr, SR25519_PUBLIC_SIZE)?)?;
        let cc = ChainCode::from_bytes(fixed(cc_ptr, SR25519_CHAINCODE_SIZE)?)?;
        let (child, _) = public.soft_derive(cc);
        write(pubkey_out, &child.to_bytes())
    })();
    SignatureResult::from(res)
}

/// Sign a message in the `substrate` context.
#[no_mangle]
pub unsafe extern "C" fn sr25519_sign(
    signature_out: *mut u8,
    public_ptr: *const u8,
    secret_ptr: *const u8,
    message_ptr: *const u8,
    message_length: usize,
) -> SignatureResult {
    let res = (|| -> Result<_, SignatureError> {
        let public = PublicKey::from_bytes(fixed(public_ptr, SR25519_PUBLIC_SIZE)?)?;
        let secret = SecretKey::from_bytes(fixed(secret_ptr, SR25519_SECRET_SIZE)?)?;
        let message = input(message_ptr, message_length).ok_or(NULL_INPUT)?;
        let signature = Signature::sign(&mut SigningContext::substrate().bytes(message), &secret, &public);
        write(signature_out, &signature.to_bytes())
    })();
    SignatureResult::from(res)
}

/// Verify a signature on a message in the `substrate` context.
#[no_mangle]
pub unsafe extern "C" fn sr25519_verify(
    signature_ptr: *const u8,
    message_ptr: *const u8,
    message_length: usize,
    public_ptr: *const u8,
) -> bool {
    let res = (|| -> Result<_, SignatureError> {
        let signature = Signature::from_bytes(fixed(signature_ptr, SR25519_SIGNATURE_SIZE)?)?;
        let public = PublicKey::from_bytes(fixed(public_ptr, SR25519_PUBLIC_SIZE)?)?;
        let message = input(message_ptr, message_length).ok_or(NULL_INPUT)?;
        public.verify_simple(SIGNING_CTX, message, &signature)
    })();
    res.is_ok()
}

/// Verify a signature, also accepting legacy unmarked signatures.
#[no_mangle]
pub unsafe extern "C" fn sr25519_verify_deprecated(
    signature_ptr: *const u8,
    message_ptr: *const u8,
    message_length: usize,
    public_ptr: *const u8,
) -> bool {
    let res = (|| -> Result<_, SignatureError> {
        let signature = fixed(signature_ptr, SR25519_SIGNATURE_SIZE)?;
        let public = PublicKey::from_bytes(fixed(public_ptr, SR25519_PUBLIC_SIZE)?)?;
        let message = input(message_ptr, message_length).ok_or(NULL_INPUT)?;
        public.verify_simple_deprecated(SIGNING_CTX, message, signature)
    })();
    res.is_ok()
}

/// Evaluate the VRF on a message, writing the output then the proof to
/// `out_and_proof_ptr`, and compare the output with `limit_ptr`.
#[no_mangle]
pub unsafe extern "C" fn sr25519_vrf_sign_if_less(
    out_and_proof_ptr: *mut u8,
    keypair_ptr: *const u8,
    message_ptr: *const u8,
    message_length: usize,
    limit_ptr: *const u8,
) -> VrfSignResult {
    let res = (|| -> Result<bool, SignatureError> {
        let keypair = Keypair::from_bytes(fixed(keypair_ptr, SR25519_KEYPAIR_SIZE)?)?;
        let message = input(message_ptr, message_length).ok_or(NULL_INPUT)?;
        let mut limit = [0u8; SR25519_VRF_THRESHOLD_SIZE];
        limit.copy_from_slice(fixed(limit_ptr, SR25519_VRF_THRESHOLD_SIZE)?);

        let (io, proof, is_less) =
            keypair.vrf_sign_if_less(SigningContext::substrate().bytes(message), &limit);

        let mut out = [0u8; SR25519_VRF_OUTPUT_SIZE + SR25519_VRF_PROOF_SIZE];
        out[..SR25519_VRF_OUTPUT_SIZE].copy_from_slice(io.as_output_bytes());
        out[SR25519_VRF_OUTPUT_SIZE..].copy_from_slice(&proof.to_bytes());
        write(out_and_proof_ptr, &out)?;
        Ok(is_less)
    })();

    match res {
        Ok(is_less) => VrfSignResult {
            result: SignatureResult::Ok,
            is_less,
        },
        Err(e) => VrfSignResult {
            result: SignatureResult::from(e),
            is_less: false,
        },
    }
}

/// Verify a VRF output and proof for a message.
#[no_mangle]
pub unsafe extern "C" fn sr25519_vrf_verify(
    public_key_ptr: *const u8,
    message_ptr: *const u8,
    message_length: usize,
    output_ptr: *const u8,
    proof_ptr: *const u8,
) -> SignatureResult {
    let res = (|| -> Result<_, SignatureError> {
        let public = PublicKey::from_bytes(fixed(public_key_ptr, SR25519_PUBLIC_SIZE)?)?;
        let message = input(message_ptr, message_length).ok_or(NULL_INPUT)?;
        let output = VrfOutput::from_bytes(fixed(output_ptr, SR25519_VRF_OUTPUT_SIZE)?)?;
        let proof = VrfProof::from_bytes(fixed(proof_ptr, SR25519_VRF_PROOF_SIZE)?)?;
        public.vrf_verify(SigningContext::substrate().bytes(message), &output, &proof)
    })();
    SignatureResult::from(res)
}

/// Hand a buffer over to the caller.
unsafe fn give(bytes: Vec<u8>, out: *mut *mut u8, len_out: *mut usize) {
    let boxed = bytes.into_boxed_slice();
    *len_out = boxed.len();
    *out = Box::into_raw(boxed) as *mut u8;
}

/// Erasure code `data_length` bytes for `n_validators`, returning the
/// flattened `u32 LE index ‖ chunk` records in `chunks_out`.
#[no_mangle]
pub unsafe extern "C" fn erasure_obtain_chunks(
    n_validators: usize,
    data_ptr: *const u8,
    data_length: usize,
    chunks_out: *mut *mut u8,
    chunks_len_out: *mut usize,
) -> ErasureResult {
    if chunks_out.is_null() || chunks_len_out.is_null() {
        return ErasureResult::NullPointer;
    }
    let data = match input(data_ptr, data_length) {
        Some(data) => data,
        None => return ErasureResult::NullPointer,
    };
    match erasure::obtain_chunks_flat(n_validators, data) {
        Ok(flat) => {
            give(flat, chunks_out, chunks_len_out);
            ErasureResult::Ok
        }
        Err(e) => ErasureResult::from(&e),
    }
}

/// Reconstruct data from flattened records whose chunks are `chunk_size`
/// bytes long.
#[no_mangle]
pub unsafe extern "C" fn erasure_reconstruct(
    n_validators: usize,
    flat_ptr: *const u8,
    flat_length: usize,
    chunk_size: usize,
    data_out: *mut *mut u8,
    data_len_out: *mut usize,
) -> ErasureResult {
    if data_out.is_null() || data_len_out.is_null() {
        return ErasureResult::NullPointer;
    }
    let flat = match input(flat_ptr, flat_length) {
        Some(flat) => flat,
        None => return ErasureResult::NullPointer,
    };
    match erasure::reconstruct_flattened(n_validators, flat, chunk_size) {
        Ok(data) => {
            give(data, data_out, data_len_out);
            ErasureResult::Ok
        }
        Err(e) => ErasureResult::from(&e),
    }
}

/// Release a buffer returned by `erasure_obtain_chunks` or
/// `erasure_reconstruct`.
#[no_mangle]
pub unsafe extern "C" fn erasure_free_buffer(ptr: *mut u8, len: usize) {
    if ptr.is_null() {
        return;
    }
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)));
}

/// Static description of an `ErasureResult` code.
#[no_mangle]
pub extern "C" fn erasure_result_message(code: u32) -> *const c_char {
    let message: &'static [u8] = match code {
        0 => ErasureResult::Ok.message(),
        1 => ErasureResult::InvalidValidatorCount.message(),
        2 => ErasureResult::InvalidChunkSize.message(),
        3 => ErasureResult::InsufficientChunks.message(),
        4 => ErasureResult::InconsistentChunkSizes.message(),
        5 => ErasureResult::ReconstructionFailed.message(),
        6 => ErasureResult::NullPointer.message(),
        _ => b"unknown result code\0",
    };
    message.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    fn zero_seed_keypair() -> [u8; SR25519_KEYPAIR_SIZE] {
        let mut keypair = [0u8; SR25519_KEYPAIR_SIZE];
        let res = unsafe { sr25519_keypair_from_seed(keypair.as_mut_ptr(), [0u8; 32].as_ptr()) };
        assert_eq!(res, SignatureResult::Ok);
        keypair
    }

    #[test]
    fn keypair_from_seed_vector() {
        let keypair = zero_seed_keypair();
        assert_eq!(
            hex::encode(&keypair[..]),
            concat!(
                "caa835781b15c7706f65b71f7a58c807ab360faed6440fb23e0f4c52e930de0a",
                "0a6a85eaa642dac835424b5d7c8d637c00408c7a73da672b7f498521420b6dd3",
                "def12e42f3e487e9b14095aa8d5cc16a33491f1b50dadcf8811d1480f3fa8627"
            )
        );
    }

    #[test]
    fn keypair_from_seed_reports_null_pointers() {
        let mut keypair = [0u8; SR25519_KEYPAIR_SIZE];
        let res = unsafe { sr25519_keypair_from_seed(keypair.as_mut_ptr(), ptr::null()) };
        assert_eq!(res, SignatureResult::BytesLengthError);
        assert_eq!(keypair, [0u8; SR25519_KEYPAIR_SIZE]);

        let res = unsafe { sr25519_keypair_from_seed(ptr::null_mut(), [0u8; 32].as_ptr()) };
        assert_eq!(res, SignatureResult::BytesLengthError);
    }

    #[test]
    fn sign_and_verify_test_message() {
        let keypair = zero_seed_keypair();
        let message = b"test";
        let mut signature = [0u8; SR25519_SIGNATURE_SIZE];

        unsafe {
            let res = sr25519_sign(
                signature.as_mut_ptr(),
                keypair[64..].as_ptr(),
                keypair[..64].as_ptr(),
                message.as_ptr(),
                message.len(),
            );
            assert_eq!(res, SignatureResult::Ok);

            assert!(sr25519_verify(
                signature.as_ptr(),
                message.as_ptr(),
                message.len(),
                keypair[64..].as_ptr()
            ));
            assert!(sr25519_verify_deprecated(
                signature.as_ptr(),
                message.as_ptr(),
                message.len(),
                keypair[64..].as_ptr()
            ));

            let mut tampered = signature;
            tampered[63] ^= 0x01;
            assert!(!sr25519_verify(
                tampered.as_ptr(),
                message.as_ptr(),
                message.len(),
                keypair[64..].as_ptr()
            ));
        }
    }

    #[test]
    fn sign_reports_bad_secret() {
        let keypair = zero_seed_keypair();
        let mut secret = [0xffu8; SR25519_SECRET_SIZE];
        secret[32..].copy_from_slice(&keypair[32..64]);
        let mut signature = [0u8; SR25519_SIGNATURE_SIZE];
        let res = unsafe {
            sr25519_sign(
                signature.as_mut_ptr(),
                keypair[64..].as_ptr(),
                secret.as_ptr(),
                ptr::null(),
                0,
            )
        };
        assert_eq!(res, SignatureResult::ScalarFormatError);
        assert_eq!(signature, [0u8; SR25519_SIGNATURE_SIZE]);
    }

    #[test]
    fn soft_derivation_matches_public_derivation() {
        let keypair = zero_seed_keypair();
        let cc = [7u8; SR25519_CHAINCODE_SIZE];
        let mut child = [0u8; SR25519_KEYPAIR_SIZE];
        let mut child_public = [0u8; SR25519_PUBLIC_SIZE];
        let mut hard = [0u8; SR25519_KEYPAIR_SIZE];

        unsafe {
            assert_eq!(
                sr25519_derive_keypair_soft(child.as_mut_ptr(), keypair.as_ptr(), cc.as_ptr()),
                SignatureResult::Ok
            );
            assert_eq!(
                sr25519_derive_public_soft(child_public.as_mut_ptr(), keypair[64..].as_ptr(), cc.as_ptr()),
                SignatureResult::Ok
            );
            assert_eq!(
                sr25519_derive_keypair_hard(hard.as_mut_ptr(), keypair.as_ptr(), cc.as_ptr()),
                SignatureResult::Ok
            );
        }
        assert_eq!(child[64..], child_public[..]);
        assert_ne!(hard[64..], child_public[..]);
    }

    #[test]
    fn derivation_rejects_mismatched_pair() {
        let mut keypair = zero_seed_keypair();
        keypair[64..].copy_from_slice(&crate::RistrettoBoth::default().to_bytes());
        let mut out = [0u8; SR25519_KEYPAIR_SIZE];
        let res = unsafe {
            sr25519_derive_keypair_hard(out.as_mut_ptr(), keypair.as_ptr(), [0u8; 32].as_ptr())
        };
        assert_eq!(res, SignatureResult::EquationFalse);
    }

    #[test]
    fn vrf_round_trip() {
        let keypair = zero_seed_keypair();
        let message = b"slot";
        let mut out_and_proof = [0u8; SR25519_VRF_OUTPUT_SIZE + SR25519_VRF_PROOF_SIZE];

        unsafe {
            let res = sr25519_vrf_sign_if_less(
                out_and_proof.as_mut_ptr(),
                keypair.as_ptr(),
                message.as_ptr(),
                message.len(),
                [0xffu8; 32].as_ptr(),
            );
            assert_eq!(res.result, SignatureResult::Ok);
            assert!(res.is_less);

            assert_eq!(
                sr25519_vrf_verify(
                    keypair[64..].as_ptr(),
                    message.as_ptr(),
                    message.len(),
                    out_and_proof.as_ptr(),
                    out_and_proof[32..].as_ptr()
                ),
                SignatureResult::Ok
            );

            let res = sr25519_vrf_sign_if_less(
                out_and_proof.as_mut_ptr(),
                keypair.as_ptr(),
                message.as_ptr(),
                message.len(),
                [0u8; 32].as_ptr(),
            );
            assert_eq!(res.result, SignatureResult::Ok);
            assert!(!res.is_less);

            assert_eq!(
                sr25519_vrf_verify(
                    keypair[64..].as_ptr(),
                    b"other".as_ptr(),
                    5,
                    out_and_proof.as_ptr(),
                    out_and_proof[32..].as_ptr()
                ),
                SignatureResult::EquationFalse
            );
        }
    }

    #[test]
    fn vrf_sign_reports_bad_keypair() {
        let mut out_and_proof = [0u8; SR25519_VRF_OUTPUT_SIZE + SR25519_VRF_PROOF_SIZE];
        let keypair = [0xffu8; SR25519_KEYPAIR_SIZE];
        let res = unsafe {
            sr25519_vrf_sign_if_less(
                out_and_proof.as_mut_ptr(),
                keypair.as_ptr(),
                ptr::null(),
                0,
                [0xffu8; 32].as_ptr(),
            )
        };
        assert_eq!(res.result, SignatureResult::ScalarFormatError);
        assert!(!res.is_less);
        assert_eq!(out_and_proof, [0u8; SR25519_VRF_OUTPUT_SIZE + SR25519_VRF_PROOF_SIZE]);
    }

    #[test]
    fn erasure_round_trip_through_buffers() {
        let data: Vec<u8> = (0..200u32).map(|i| i as u8).collect();
        let n = 10usize;

        unsafe {
            let mut chunks: *mut u8 = ptr::null_mut();
            let mut chunks_len = 0usize;
            let res = erasure_obtain_chunks(n, data.as_ptr(), data.len(), &mut chunks, &mut chunks_len);
            assert_eq!(res, ErasureResult::Ok);

            let flat = slice::from_raw_parts(chunks, chunks_len);
            let chunk_size = chunks_len / n - 4;
            let record = chunk_size + 4;

            // Keep only the last four records, enough for ten validators.
            let tail = &flat[flat.len() - 4 * record..];
            let mut out: *mut u8 = ptr::null_mut();
            let mut out_len = 0usize;
            let res = erasure_reconstruct(n, tail.as_ptr(), tail.len(), chunk_size, &mut out, &mut out_len);
            assert_eq!(res, ErasureResult::Ok);
            assert_eq!(slice::from_raw_parts(out, out_len), &data[..]);

            let short = &flat[flat.len() - 3 * record..];
            let res = erasure_reconstruct(n, short.as_ptr(), short.len(), chunk_size, &mut out, &mut out_len);
            assert_eq!(res, ErasureResult::InsufficientChunks);

            erasure_free_buffer(out, out_len);
            erasure_free_buffer(chunks, chunks_len);
        }
    }

    #[test]
    fn erasure_errors_and_messages() {
        let mut out: *mut u8 = ptr::null_mut();
        let mut out_len = 0usize;
        let res = unsafe { erasure_obtain_chunks(1, b"x".as_ptr(), 1, &mut out, &mut out_len) };
        assert_eq!(res, ErasureResult::InvalidValidatorCount);
        assert!(out.is_null());

        let res = unsafe { erasure_obtain_chunks(4, ptr::null(), 3, &mut out, &mut out_len) };
        assert_eq!(res, ErasureResult::NullPointer);

        let message = unsafe { CStr::from_ptr(erasure_result_message(res as u32)) };
        assert_eq!(message.to_str().unwrap(), "null pointer argument");
        let unknown = unsafe { CStr::from_ptr(erasure_result_message(99)) };
        assert_eq!(unknown.to_str().unwrap(), "unknown result code");
    }
}
