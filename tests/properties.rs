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

//! Property-based tests for keys, signatures, VRF and erasure coding

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use sr25519_erasure::erasure::{obtain_chunks, reconstruct, recovery_threshold};
use sr25519_erasure::*;

fn keypair(seed: [u8; 32]) -> Keypair {
    MiniSecretKey::from_bytes(&seed).unwrap().expand_to_keypair()
}

// Any k of the n chunks give back the data, k - 1 never do
proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn erasure_recovers_from_any_threshold_subset(
        n in 2usize..80,
        data in prop::collection::vec(any::<u8>(), 0..2048),
        shuffle in any::<u64>()
    ) {
        let chunks = obtain_chunks(n, &data).unwrap();
        prop_assert_eq!(chunks.len(), n);

        let k = recovery_threshold(n).unwrap();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut ChaChaRng::seed_from_u64(shuffle));

        let picked = order[..k].iter().map(|&i| (&chunks[i][..], i));
        prop_assert_eq!(reconstruct(n, picked).unwrap(), data);

        let short = order[..k - 1].iter().map(|&i| (&chunks[i][..], i));
        let insufficient = matches!(
            reconstruct(n, short),
            Err(ErasureError::InsufficientChunks { .. })
        );
        prop_assert!(insufficient);
    }
}

// Deriving the keypair and the public key softly agree
proptest! {
    #[test]
    fn soft_derivation_is_homomorphic(
        seed in prop::array::uniform32(any::<u8>()),
        cc in prop::array::uniform32(any::<u8>())
    ) {
        let parent = keypair(seed);
        let (child, child_cc) = parent.soft_derive(ChainCode(cc));
        let (child_public, public_cc) = parent.public.soft_derive(ChainCode(cc));

        prop_assert_eq!(child.public, child_public);
        prop_assert_eq!(child_cc, public_cc);
    }
}

// Signatures verify on their message only
proptest! {
    #[test]
    fn signatures_verify_on_their_message(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..256),
        flip in any::<u8>()
    ) {
        let pair = keypair(seed);
        let sig = pair.sign_simple(SIGNING_CTX, &msg);
        prop_assert!(pair.public.verify_simple(SIGNING_CTX, &msg, &sig).is_ok());

        let parsed = Signature::from_bytes(&sig.to_bytes()).unwrap();
        prop_assert!(pair.public.verify_simple(SIGNING_CTX, &msg, &parsed).is_ok());

        let mut other = msg.clone();
        other.push(flip);
        prop_assert!(pair.public.verify_simple(SIGNING_CTX, &other, &sig).is_err());
    }
}

// VRF outputs verify and the threshold flag matches the output
proptest! {
    #[test]
    fn vrf_outputs_verify(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..128),
        limit in prop::array::uniform32(any::<u8>())
    ) {
        let pair = keypair(seed);
        let (io, proof, is_less) =
            pair.vrf_sign_if_less(SigningContext::substrate().bytes(&msg), &limit);

        let output = io.to_output();
        prop_assert_eq!(is_less, vrf::le_bytes_less_than(&output.0, &limit));

        let verified = pair
            .public
            .vrf_verify(SigningContext::substrate().bytes(&msg), &output, &proof)
            .unwrap();
        prop_assert_eq!(verified.to_output(), output);
    }
}
