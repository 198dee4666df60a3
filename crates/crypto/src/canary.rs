//! Key-share verification by encrypt/decrypt round trip.
//!
//! A submitted share claims to be SK_c = s·H(c) for condition `c`. There is no
//! direct "verify identity key" call in the IBE scheme, so the claim is checked
//! by using it:
//!
//! 1. Encrypt the fixed [`CANARY_PLAINTEXT`] to identity `c` under the master
//!    public key. This needs only public data.
//! 2. Decrypt the ciphertext with the candidate share.
//! 3. Accept iff decryption succeeds and returns exactly the canary.
//!
//! Only the key for `c` under the same master key reproduces the pairing value
//! used at encryption time; any other G2 point yields a different AEAD key and
//! fails authentication. The encryption randomness is derived from the master
//! key and the condition, so the check is a pure function of its inputs and
//! replays identically on every node.

use bls12_381::G2Affine;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

use condenc_types::sha256;

use crate::error::CryptoError;
use crate::ibe::{decrypt, encrypt, IbeParams};

/// Fixed plaintext encrypted and recovered during verification.
pub const CANARY_PLAINTEXT: &[u8] = b"test data";

/// Domain separation tag for the deterministic encryption seed.
const CANARY_SEED_DST: &[u8] = b"CONDENC-CANARY-SEED-V1";

/// Reasons a key share fails the canary round trip.
#[derive(Debug, Error)]
pub enum CanaryError {
    /// Encrypting the canary failed. Inputs are already decoded, so this is
    /// an internal fault rather than a verdict on the share.
    #[error("canary encryption failed: {0}")]
    Encrypt(#[source] CryptoError),

    #[error("decryption error: {0}")]
    Decrypt(#[source] CryptoError),

    #[error("decrypted data does not match original data")]
    Mismatch,
}

/// Verify that `key_share` is the decryption key for `identity` under the
/// master public key in `params`.
pub fn verify_key_share(
    params: &IbeParams,
    identity: &[u8],
    key_share: &G2Affine,
) -> Result<(), CanaryError> {
    let mut rng = canary_rng(params, identity);

    let ciphertext =
        encrypt(params, identity, CANARY_PLAINTEXT, &mut rng).map_err(CanaryError::Encrypt)?;

    let recovered = decrypt(params, key_share, &ciphertext).map_err(CanaryError::Decrypt)?;

    check_recovered(&recovered)
}

/// Exact-length, exact-content comparison against the canary.
fn check_recovered(recovered: &[u8]) -> Result<(), CanaryError> {
    if recovered != CANARY_PLAINTEXT {
        return Err(CanaryError::Mismatch);
    }
    Ok(())
}

/// Deterministic RNG seeded from SHA-256(DST || MPK || len(id) || id).
fn canary_rng(params: &IbeParams, identity: &[u8]) -> ChaCha20Rng {
    let mpk = params.mpk.to_compressed();

    let mut seed_material =
        Vec::with_capacity(CANARY_SEED_DST.len() + mpk.len() + 8 + identity.len());
    seed_material.extend_from_slice(CANARY_SEED_DST);
    seed_material.extend_from_slice(&mpk);
    seed_material.extend_from_slice(&(identity.len() as u64).to_le_bytes());
    seed_material.extend_from_slice(identity);

    ChaCha20Rng::from_seed(sha256(&seed_material))
}
