//! BLS12-381 identity-based encryption for conditional decryption.
//!
//! This crate implements the IBE primitive the network encrypts under and
//! the canary check used to admit condition keys on chain.
//!
//! # Overview
//!
//! 1. **Setup (DKG, external)**: the committee holds shares of a master
//!    secret `s` and publishes MPK = s·G1.
//!
//! 2. **Encryption**: anyone encrypts to a condition (block height, epoch
//!    label, trigger string) using only the MPK.
//!
//! 3. **Key release**: once the condition is met, the committee reveals
//!    SK_c = s·H(c), a G2 point.
//!
//! 4. **Admission**: before SK_c is stored on chain, [`canary::verify_key_share`]
//!    encrypts a fixed plaintext to `c` and checks SK_c decrypts it.

pub mod canary;
pub mod error;
pub mod ibe;

pub use canary::{verify_key_share, CanaryError, CANARY_PLAINTEXT};
pub use error::CryptoError;
pub use ibe::{decrypt, encrypt, extract, g1_from_hex, g2_from_hex, IbeParams};
