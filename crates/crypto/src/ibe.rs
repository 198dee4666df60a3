//! Identity-Based Encryption using BLS12-381 pairings.
//!
//! This implements a variant of the Boneh-Franklin IBE scheme with the master
//! public key in G1 and identity keys in G2.
//!
//! # Keys
//!
//! - Master public key: MPK = s·G1
//! - Identity key for `id`: SK_id = s·H_2(id) ∈ G2
//!
//! # Encryption
//!
//! To encrypt a message `m` to identity `id`:
//! 1. Compute id_hash = H_2(id) ∈ G2
//! 2. Sample random scalar r
//! 3. Compute U = r·G1 (ephemeral public key)
//! 4. Compute shared = e(r·MPK, id_hash) = e(MPK, id_hash)^r
//! 5. Derive symmetric key from shared, bound to MPK and U
//! 6. Encrypt m with AES-GCM
//!
//! # Decryption
//!
//! Given the identity key SK_id:
//! 1. Compute shared = e(U, SK_id)
//! 2. Derive symmetric key from shared
//! 3. Decrypt ciphertext with AES-GCM; a wrong key fails authentication

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use bls12_381::hash_to_curve::{ExpandMsgXmd, HashToCurve};
use bls12_381::{pairing, G1Affine, G1Projective, G2Affine, G2Projective, Gt, Scalar};
use ff::Field;
use group::Curve;
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use condenc_types::{G1Point, G2Point, IbeCiphertext};

use crate::error::CryptoError;

/// Domain separation tag for hashing identities to G2.
const H2_DST: &[u8] = b"CONDENC-IBE-V01-CS01-with-BLS12381G2_XMD:SHA-256_SSWU_RO_";

/// HKDF info prefix for the AEAD key.
const KDF_INFO: &[u8] = b"CONDENC-IBE-KEY";

/// Length of a compressed G1 point.
pub const G1_COMPRESSED_LEN: usize = 48;

/// Length of a compressed G2 point.
pub const G2_COMPRESSED_LEN: usize = 96;

/// Length of an encoded GT element.
const GT_LEN: usize = 576;

/// Parameters for IBE encryption.
#[derive(Clone, Debug)]
pub struct IbeParams {
    /// Master public key (MPK = s·G1 where s is the master secret)
    pub mpk: G1Affine,
}

impl IbeParams {
    /// Create IBE params from a serialized G1 point.
    pub fn from_bytes(bytes: &[u8; G1_COMPRESSED_LEN]) -> Result<Self, CryptoError> {
        let mpk = decompress_g1(bytes)?;
        if bool::from(mpk.is_identity()) {
            return Err(CryptoError::IdentityPoint);
        }
        Ok(Self { mpk })
    }

    /// Create IBE params from G1Point type.
    pub fn from_g1_point(point: &G1Point) -> Result<Self, CryptoError> {
        Self::from_bytes(&point.0)
    }

    /// Create IBE params from the hex encoding kept in module state.
    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        Ok(Self {
            mpk: g1_from_hex(encoded)?,
        })
    }
}

/// Encrypt a message to an identity.
///
/// # Arguments
/// * `params` - IBE parameters containing the master public key
/// * `identity` - The identity to encrypt to (the condition string)
/// * `plaintext` - The message to encrypt
/// * `rng` - Cryptographically secure random number generator
pub fn encrypt<R: RngCore + CryptoRng>(
    params: &IbeParams,
    identity: &[u8],
    plaintext: &[u8],
    rng: &mut R,
) -> Result<IbeCiphertext, CryptoError> {
    let id_hash = hash_to_g2(identity);
    let r = random_scalar(rng);

    // U = r·G1
    let u_affine = (G1Projective::generator() * r).to_affine();

    // e(r·MPK, H(id)) = e(MPK, H(id))^r
    let r_mpk = (params.mpk * r).to_affine();
    let shared_gt = pairing(&r_mpk, &id_hash);

    let key = derive_key_from_gt(&shared_gt, &params.mpk, &u_affine)?;

    let mut nonce_bytes = [0u8; 12];
    rng.fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| {
        CryptoError::EncryptionFailed(format!("Failed to create cipher: {}", e))
    })?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext_with_tag = cipher.encrypt(nonce, plaintext).map_err(|e| {
        CryptoError::EncryptionFailed(format!("AES-GCM encryption failed: {}", e))
    })?;

    // AES-GCM appends a 16 byte tag
    let tag_start = ciphertext_with_tag.len() - 16;
    let ciphertext = ciphertext_with_tag[..tag_start].to_vec();
    let mut tag = [0u8; 16];
    tag.copy_from_slice(&ciphertext_with_tag[tag_start..]);

    Ok(IbeCiphertext {
        ephemeral_pubkey: compress_g1(&u_affine),
        ciphertext,
        tag,
        nonce: nonce_bytes,
    })
}

/// Decrypt a ciphertext with an identity key.
///
/// # Arguments
/// * `params` - IBE parameters the ciphertext was produced under
/// * `decryption_key` - The identity key SK_id = s·H(id)
/// * `ciphertext` - The ciphertext to decrypt
pub fn decrypt(
    params: &IbeParams,
    decryption_key: &G2Affine,
    ciphertext: &IbeCiphertext,
) -> Result<Vec<u8>, CryptoError> {
    let u = decompress_g1(&ciphertext.ephemeral_pubkey.0)?;
    if bool::from(u.is_identity()) {
        return Err(CryptoError::InvalidCiphertextFormat);
    }

    // e(U, SK_id) = e(r·G1, s·H(id)) = e(s·G1, H(id))^r = e(MPK, H(id))^r
    let shared_gt = pairing(&u, decryption_key);

    let key = derive_key_from_gt(&shared_gt, &params.mpk, &u)?;

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| CryptoError::DecryptionFailed(format!("Failed to create cipher: {}", e)))?;

    let nonce = Nonce::from_slice(&ciphertext.nonce);

    let mut ct_with_tag = ciphertext.ciphertext.clone();
    ct_with_tag.extend_from_slice(&ciphertext.tag);

    cipher
        .decrypt(nonce, ct_with_tag.as_ref())
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Derive the identity key SK_id = s·H(id) from the master secret.
///
/// The network never holds `s` in one place; this exists for tooling and
/// tests that stand in for the DKG committee.
pub fn extract(master_secret: &Scalar, identity: &[u8]) -> G2Affine {
    (G2Projective::from(hash_to_g2(identity)) * master_secret).to_affine()
}

/// Master public key MPK = s·G1 for a master secret.
pub fn master_public_key(master_secret: &Scalar) -> G1Affine {
    (G1Projective::generator() * master_secret).to_affine()
}

/// Hash an identity to a G2 point.
///
/// RFC 9380 `hash_to_curve` (expand_message_xmd with SHA-256, SSWU, random
/// oracle variant). The output has no known discrete logarithm, so a key for
/// one identity says nothing about the key for another.
pub fn hash_to_g2(data: &[u8]) -> G2Affine {
    <G2Projective as HashToCurve<ExpandMsgXmd<Sha256>>>::hash_to_curve(data, H2_DST).to_affine()
}

/// Generate a random non-zero scalar.
pub(crate) fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let scalar = Scalar::random(&mut *rng);
        if !bool::from(scalar.is_zero()) {
            return scalar;
        }
    }
}

/// Derive a symmetric key from a GT element, bound to the master key and
/// the ephemeral key.
fn derive_key_from_gt(
    gt: &Gt,
    mpk: &G1Affine,
    ephemeral: &G1Affine,
) -> Result<[u8; 32], CryptoError> {
    let gt_bytes = gt_to_bytes(gt);

    let mut info = Vec::with_capacity(KDF_INFO.len() + G1_COMPRESSED_LEN);
    info.extend_from_slice(KDF_INFO);
    info.extend_from_slice(&mpk.to_compressed());

    let salt = ephemeral.to_compressed();
    let hk = Hkdf::<Sha256>::new(Some(&salt[..]), &gt_bytes);
    let mut key = [0u8; 32];
    hk.expand(&info, &mut key)
        .map_err(|_| CryptoError::KeyDerivationFailed)?;

    Ok(key)
}

/// Canonical encoding of a GT element (twelve big-endian Fp coefficients).
fn gt_to_bytes(gt: &Gt) -> [u8; GT_LEN] {
    gt.to_bytes()
}

/// Compress a G1 point to bytes.
pub fn compress_g1(point: &G1Affine) -> G1Point {
    G1Point(point.to_compressed())
}

/// Decompress a G1 point from bytes.
pub fn decompress_g1(bytes: &[u8; G1_COMPRESSED_LEN]) -> Result<G1Affine, CryptoError> {
    G1Affine::from_compressed(bytes)
        .into_option()
        .ok_or(CryptoError::InvalidG1Point)
}

/// Compress a G2 point to bytes.
pub fn compress_g2(point: &G2Affine) -> G2Point {
    G2Point(point.to_compressed())
}

/// Decompress a G2 point from bytes.
pub fn decompress_g2(bytes: &[u8; G2_COMPRESSED_LEN]) -> Result<G2Affine, CryptoError> {
    G2Affine::from_compressed(bytes)
        .into_option()
        .ok_or(CryptoError::InvalidG2Point)
}

/// Decode a hex-encoded compressed G1 point, rejecting the identity.
pub fn g1_from_hex(encoded: &str) -> Result<G1Affine, CryptoError> {
    let bytes: [u8; G1_COMPRESSED_LEN] = decode_fixed_hex(encoded)?;
    let point = decompress_g1(&bytes)?;
    if bool::from(point.is_identity()) {
        return Err(CryptoError::IdentityPoint);
    }
    Ok(point)
}

/// Decode a hex-encoded compressed G2 point, rejecting the identity.
pub fn g2_from_hex(encoded: &str) -> Result<G2Affine, CryptoError> {
    let bytes: [u8; G2_COMPRESSED_LEN] = decode_fixed_hex(encoded)?;
    let point = decompress_g2(&bytes)?;
    if bool::from(point.is_identity()) {
        return Err(CryptoError::IdentityPoint);
    }
    Ok(point)
}

/// Hex encoding of a compressed G1 point.
pub fn g1_to_hex(point: &G1Affine) -> String {
    hex::encode(point.to_compressed())
}

/// Hex encoding of a compressed G2 point.
pub fn g2_to_hex(point: &G2Affine) -> String {
    hex::encode(point.to_compressed())
}

fn decode_fixed_hex<const N: usize>(encoded: &str) -> Result<[u8; N], CryptoError> {
    let bytes = hex::decode(encoded).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidLength { expected: N, got })
}

#[cfg(test)]
mod tests {
    use super::*;
    use group::Group;
    use rand::rngs::OsRng;

    fn setup() -> (Scalar, IbeParams) {
        let master_secret = random_scalar(&mut OsRng);
        let params = IbeParams {
            mpk: master_public_key(&master_secret),
        };
        (master_secret, params)
    }

    #[test]
    fn test_hash_to_g2() {
        let point1 = hash_to_g2(b"test identity 1");
        let point2 = hash_to_g2(b"test identity 2");
        let point3 = hash_to_g2(b"test identity 1");

        assert_ne!(point1, point2);
        assert_eq!(point1, point3);
        assert!(!bool::from(point1.is_identity()));
        assert!(bool::from(point1.is_on_curve()));
        assert!(bool::from(point1.is_torsion_free()));

        // Length-prefix and concatenation ambiguities map to distinct points
        assert_ne!(hash_to_g2(b""), hash_to_g2(b"\0"));
        assert_ne!(hash_to_g2(b"4"), hash_to_g2(b"42"));
    }

    #[test]
    fn test_gt_encoding_is_canonical() {
        let a = random_scalar(&mut OsRng);
        let lhs = pairing(
            &(G1Projective::generator() * a).to_affine(),
            &G2Affine::generator(),
        );
        let rhs = pairing(
            &G1Affine::generator(),
            &(G2Projective::generator() * a).to_affine(),
        );

        let bytes = gt_to_bytes(&lhs);
        assert_eq!(bytes.len(), GT_LEN);
        assert_eq!(bytes, gt_to_bytes(&rhs));
        assert_ne!(bytes, gt_to_bytes(&Gt::generator()));
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let mut rng = OsRng;
        let (master_secret, params) = setup();

        let identity = b"42";
        let plaintext = b"conditional payload";

        let ciphertext = encrypt(&params, identity, plaintext, &mut rng).unwrap();
        let key = extract(&master_secret, identity);

        let decrypted = decrypt(&params, &key, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_identity_key_fails() {
        let mut rng = OsRng;
        let (master_secret, params) = setup();

        let ciphertext = encrypt(&params, b"42", b"conditional payload", &mut rng).unwrap();

        let wrong_key = extract(&master_secret, b"43");
        let result = decrypt(&params, &wrong_key, &ciphertext);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
    }

    #[test]
    fn test_key_under_other_master_fails() {
        let mut rng = OsRng;
        let (_, params) = setup();
        let (other_secret, _) = setup();

        let ciphertext = encrypt(&params, b"42", b"payload", &mut rng).unwrap();

        let foreign_key = extract(&other_secret, b"42");
        assert!(decrypt(&params, &foreign_key, &ciphertext).is_err());
    }

    #[test]
    fn test_identity_ephemeral_key_rejected() {
        let mut rng = OsRng;
        let (master_secret, params) = setup();

        let mut ciphertext = encrypt(&params, b"42", b"payload", &mut rng).unwrap();
        ciphertext.ephemeral_pubkey = compress_g1(&G1Affine::identity());

        let key = extract(&master_secret, b"42");
        assert!(matches!(
            decrypt(&params, &key, &ciphertext),
            Err(CryptoError::InvalidCiphertextFormat)
        ));
    }

    #[test]
    fn test_hex_point_roundtrip() {
        let (master_secret, params) = setup();
        let key = extract(&master_secret, b"epoch-7");

        assert_eq!(g1_from_hex(&g1_to_hex(&params.mpk)).unwrap(), params.mpk);
        assert_eq!(g2_from_hex(&g2_to_hex(&key)).unwrap(), key);
        assert_eq!(g1_to_hex(&params.mpk).len(), G1_COMPRESSED_LEN * 2);
    }

    #[test]
    fn test_hex_decoding_rejects_malformed_input() {
        assert!(matches!(
            g1_from_hex(""),
            Err(CryptoError::InvalidLength { expected: 48, got: 0 })
        ));
        assert!(matches!(g1_from_hex("abc"), Err(CryptoError::InvalidHex(_))));
        assert!(matches!(g2_from_hex("zz"), Err(CryptoError::InvalidHex(_))));
        assert!(matches!(
            g2_from_hex(&"00".repeat(48)),
            Err(CryptoError::InvalidLength { expected: 96, got: 48 })
        ));
        // 0xff.. is not a valid compressed encoding
        assert!(matches!(
            g1_from_hex(&"ff".repeat(48)),
            Err(CryptoError::InvalidG1Point)
        ));
    }

    #[test]
    fn test_hex_decoding_rejects_identity() {
        assert!(matches!(
            g1_from_hex(&g1_to_hex(&G1Affine::identity())),
            Err(CryptoError::IdentityPoint)
        ));
        assert!(matches!(
            g2_from_hex(&g2_to_hex(&G2Affine::identity())),
            Err(CryptoError::IdentityPoint)
        ));
        assert!(matches!(
            IbeParams::from_g1_point(&compress_g1(&G1Affine::identity())),
            Err(CryptoError::IdentityPoint)
        ));
    }
}
