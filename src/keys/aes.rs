//! AES key format: random material encrypted under a key derived from the
//! host-configured master secret.
//!
//! The plaintext is the owner's lower-cased UPN, a NUL separator, then the
//! material, so a key row copied onto another user fails validation even
//! though it decrypts. Lower-casing matches how the directories behind the
//! repository treat UPNs.

use base64::{Engine as _, engine::general_purpose};
use zeroize::Zeroizing;

use crate::{
  config::KeySize,
  crypto::{decrypt_aes256_cbc, encrypt_aes256_cbc, hkdf_sha256},
  keys::prefix,
  rng,
};

const KDF_SALT: &[u8] = b"fedmfa/keys/aes";
const KDF_INFO: &[u8] = b"secret key encryption";
const IV_LEN: usize = 16;

pub struct AesFormat {
  size: KeySize,
  key:  Zeroizing<[u8; 32]>,
}

impl AesFormat {
  pub fn new(size: KeySize, master_secret: &str) -> Self {
    let key = hkdf_sha256(master_secret.as_bytes(), KDF_SALT, KDF_INFO);
    Self { size, key: Zeroizing::new(key) }
  }

  pub fn generate(&self, upn: &str) -> String {
    let owner = upn.to_lowercase();
    let material = super::random_material(self.size);
    let mut plaintext = Zeroizing::new(Vec::with_capacity(owner.len() + 1 + material.len()));
    plaintext.extend_from_slice(owner.as_bytes());
    plaintext.push(0);
    plaintext.extend_from_slice(&material);

    let mut iv = [0u8; IV_LEN];
    rng::fill_bytes(&mut iv);

    let mut blob = iv.to_vec();
    blob.extend_from_slice(&encrypt_aes256_cbc(&plaintext, &self.key, &iv));
    prefix::add(prefix::AES_PREFIX, &general_purpose::STANDARD.encode(blob))
  }

  pub fn validate(&self, upn: &str, key: &str) -> bool {
    if !prefix::has(prefix::AES_PREFIX, key) {
      return false;
    }
    let Ok(blob) = general_purpose::STANDARD.decode(prefix::strip(prefix::AES_PREFIX, key))
    else {
      return false;
    };
    if blob.len() < IV_LEN + 16 || (blob.len() - IV_LEN) % 16 != 0 {
      return false;
    }

    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&blob[..IV_LEN]);
    let Ok(plaintext) = decrypt_aes256_cbc(&blob[IV_LEN..], &self.key, &iv) else {
      return false;
    };
    let plaintext = Zeroizing::new(plaintext);

    let owner = upn.to_lowercase();
    plaintext.len() > owner.len()
      && plaintext[..owner.len()] == *owner.as_bytes()
      && plaintext[owner.len()] == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_generated_keys_validate_for_their_owner() {
    let format = AesFormat::new(KeySize::Size512, "master secret");
    let key = format.generate("Ada@Example.org");
    assert!(key.starts_with("aes://"));

    // Case only normalizes; another identity does not open.
    assert!(format.validate("ada@example.org", &key));
    assert!(format.validate("ADA@EXAMPLE.ORG", &key));
    assert!(!format.validate("grace@example.org", &key));
  }

  #[test]
  fn test_key_is_bound_to_the_upn() {
    let format = AesFormat::new(KeySize::Default, "master secret");
    let key = format.generate("ada@example.org");
    assert!(!format.validate("grace@example.org", &key));
  }

  #[test]
  fn test_master_secret_mismatch_rejects() {
    let minted = AesFormat::new(KeySize::Default, "master secret");
    let rotated = AesFormat::new(KeySize::Default, "different secret");

    let key = minted.generate("ada@example.org");
    assert!(!rotated.validate("ada@example.org", &key));
  }

  #[test]
  fn test_malformed_blobs_are_rejected() {
    let format = AesFormat::new(KeySize::Default, "master secret");
    assert!(!format.validate("ada@example.org", "rng://AAAA"));
    assert!(!format.validate("ada@example.org", "aes://!!!"));
    // Too short to hold an IV and one block.
    let short = format!("aes://{}", general_purpose::STANDARD.encode([0u8; 20]));
    assert!(!format.validate("ada@example.org", &short));
  }

  #[test]
  fn test_fresh_ivs_make_distinct_keys() {
    let format = AesFormat::new(KeySize::Default, "master secret");
    assert_ne!(format.generate("ada@example.org"), format.generate("ada@example.org"));
  }
}
