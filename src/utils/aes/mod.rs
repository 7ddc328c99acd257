//! AES-256-GCM payload encryption keyed from a target group element.
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rabe_bn::Gt;
use rand::{CryptoRng, RngCore};
use crate::error::{AbeError, Result};
use crate::utils::{file::encode_element, hash::sha3_key};

const KEY_DOMAIN: &[u8] = b"waters08/aes-256-gcm";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

fn cipher_for(msg: &Gt) -> Result<Aes256Gcm> {
    let encoded = encode_element(msg)?;
    let key = sha3_key(KEY_DOMAIN, &encoded);
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..])))
}

/// Encrypts `plaintext` under a key derived from `msg`.
///
/// The output is `nonce || ciphertext || tag`.
pub fn encrypt_symmetric<R: RngCore + CryptoRng>(
    rng: &mut R,
    msg: &Gt,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let cipher = cipher_for(msg)?;
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);
    let ct = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| AbeError::Decryption("AES-GCM encryption failed".to_string()))?;
    let mut out = Vec::with_capacity(NONCE_LEN + ct.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ct);
    Ok(out)
}

/// Inverse of [`encrypt_symmetric`]. Fails if `msg` is not the element the
/// payload was sealed with or the payload was modified.
pub fn decrypt_symmetric(msg: &Gt, nonce_ct: &[u8]) -> Result<Vec<u8>> {
    if nonce_ct.len() < NONCE_LEN + TAG_LEN {
        return Err(AbeError::Decryption(format!(
            "payload of {} bytes is shorter than nonce and tag",
            nonce_ct.len()
        )));
    }
    let (nonce, ct) = nonce_ct.split_at(NONCE_LEN);
    cipher_for(msg)?
        .decrypt(Nonce::from_slice(nonce), ct)
        .map_err(|_| AbeError::Decryption("AES-GCM authentication failed".to_string()))
}
