//! Symmetric encryption for configuration artifacts
//!
//! Implements the AES-CBC blob format used by existing deployments: a fresh
//! random IV (one cipher block) prepended to the ciphertext, the whole thing
//! base64-encoded. Padding is PKCS#7-style (pad value equals pad count, with
//! a full extra block when the input is already block-aligned).

use crate::{Error, Result};
use aes::cipher::{
    block_padding::{NoPadding, Pkcs7},
    BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::{rngs::OsRng, RngCore};

/// AES block size in bytes; also the IV length in the encoded blob.
pub const BLOCK_SIZE: usize = 16;

/// Fixed passphrase-derived key shared by all components (AES-192).
/// Kept byte-identical to the deployed artifacts' key.
pub const SHARED_KEY: &[u8] = b"frp_connect_password#769";

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

fn check_key(key: &[u8]) -> Result<()> {
    match key.len() {
        16 | 24 | 32 => Ok(()),
        other => Err(Error::KeyLength(other)),
    }
}

/// Encrypt `plaintext` under AES-CBC and return the base64 blob `IV || ct`.
///
/// The IV is freshly generated from the OS CSPRNG for every call, so
/// encrypting the same input twice yields different blobs.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<String> {
    check_key(key)?;

    let mut iv = [0u8; BLOCK_SIZE];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(key, &iv)
            .map_err(|_| Error::KeyLength(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => Aes192CbcEnc::new_from_slices(key, &iv)
            .map_err(|_| Error::KeyLength(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => Aes256CbcEnc::new_from_slices(key, &iv)
            .map_err(|_| Error::KeyLength(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };

    let mut blob = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(blob))
}

/// Decrypt a base64 blob produced by [`encrypt`] back to the original bytes.
///
/// The final plaintext byte is read as the padding count and that many bytes
/// are stripped. Padding bytes are deliberately NOT verified and no
/// authentication tag exists: a corrupted ciphertext can decrypt to garbage
/// undetected. This matches existing encrypted artifacts on disk; only the
/// pad count itself is bounds-checked so malformed input fails cleanly
/// instead of panicking.
pub fn decrypt(blob: &str, key: &[u8]) -> Result<Vec<u8>> {
    check_key(key)?;

    let data = BASE64.decode(blob.trim())?;
    if data.len() < BLOCK_SIZE {
        return Err(Error::TruncatedInput {
            len: data.len(),
            block: BLOCK_SIZE,
        });
    }

    let (iv, ciphertext) = data.split_at(BLOCK_SIZE);

    let mut decrypted = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::KeyLength(key.len()))?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
        24 => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::KeyLength(key.len()))?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
        _ => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::KeyLength(key.len()))?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
    }
    .map_err(|_| Error::decrypt("ciphertext length is not a multiple of the block size"))?;

    let pad = match decrypted.last() {
        Some(&b) => b as usize,
        None => return Err(Error::decrypt("ciphertext is empty")),
    };
    if pad == 0 || pad > BLOCK_SIZE || pad > decrypted.len() {
        return Err(Error::decrypt(format!("invalid padding count {}", pad)));
    }
    decrypted.truncate(decrypted.len() - pad);

    Ok(decrypted)
}

/// Convenience wrapper: decrypt and interpret the result as UTF-8 text.
pub fn decrypt_text(blob: &str, key: &[u8]) -> Result<String> {
    let bytes = decrypt(blob, key)?;
    String::from_utf8(bytes).map_err(|e| Error::decrypt(format!("invalid UTF-8: {}", e)))
}
