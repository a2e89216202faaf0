//! Cryptographic helpers for the AES secret-key format.
use aes::Aes256;
use cbc::{Decryptor, Encryptor};
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{FedMfaError, FedMfaResult};

/// Derives a 32-byte key using HKDF-SHA256 with the given salt and info.
pub fn hkdf_sha256(input: &[u8], salt: &[u8], info: &[u8]) -> [u8; 32] {
  let hk = Hkdf::<Sha256>::new(Some(salt), input);
  let mut okm = [0u8; 32];
  hk.expand(info, &mut okm).expect("HKDF expand");
  okm
}

/// Encrypts a buffer using AES-256-CBC with PKCS#7 padding.
pub fn encrypt_aes256_cbc(data: &[u8], key: &[u8; 32], iv: &[u8; 16]) -> Vec<u8> {
  Encryptor::<Aes256>::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(data)
}

/// Decrypts an AES-256-CBC buffer, validating the PKCS#7 padding.
pub fn decrypt_aes256_cbc(data: &[u8], key: &[u8; 32], iv: &[u8; 16]) -> FedMfaResult<Vec<u8>> {
  Decryptor::<Aes256>::new(key.into(), iv.into())
    .decrypt_padded_vec_mut::<Pkcs7>(data)
    .map_err(|_| FedMfaError::KeyPayload("aes padding check failed".into()))
}
