//! HOTP/TOTP engine (RFC 4226, RFC 6238).
//!
//! Codes are computed over an 8-byte big-endian counter with dynamic truncation.
//! Time-based verification checks a window of adjacent steps so clock drift on
//! the authenticator side does not lock users out.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use subtle::{Choice, ConstantTimeEq};

/// HMAC digest family used for code generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HashMode {
  #[default]
  Sha1,
  Sha256,
  Sha384,
  Sha512,
}

impl fmt::Display for HashMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HashMode::Sha1 => write!(f, "SHA1"),
      HashMode::Sha256 => write!(f, "SHA256"),
      HashMode::Sha384 => write!(f, "SHA384"),
      HashMode::Sha512 => write!(f, "SHA512"),
    }
  }
}

/// A computed one-time password together with its derivation state.
///
/// The digest and truncation offset are kept so hosts can log and audit how a
/// code came to be without recomputing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
  pub code:    u32,
  pub counter: u64,
  pub digest:  Vec<u8>,
  pub offset:  usize,
  pub digits:  u8,
}

impl fmt::Display for Otp {
  /// Formats the code zero-padded to its digit count.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:0width$}", self.code, width = self.digits as usize)
  }
}

fn hmac_digest(secret: &[u8], message: &[u8], mode: HashMode) -> Vec<u8> {
  match mode {
    HashMode::Sha1 => {
      let mut mac =
        <Hmac<Sha1> as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
      mac.update(message);
      mac.finalize().into_bytes().to_vec()
    }
    HashMode::Sha256 => {
      let mut mac =
        <Hmac<Sha256> as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
      mac.update(message);
      mac.finalize().into_bytes().to_vec()
    }
    HashMode::Sha384 => {
      let mut mac =
        <Hmac<Sha384> as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
      mac.update(message);
      mac.finalize().into_bytes().to_vec()
    }
    HashMode::Sha512 => {
      let mut mac =
        <Hmac<Sha512> as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
      mac.update(message);
      mac.finalize().into_bytes().to_vec()
    }
  }
}

/// Computes an HOTP code for the given counter.
///
/// `digits` must be between 1 and 9; the config layer clamps user input to the
/// 4..=8 range before it reaches this function.
pub fn compute_hotp(secret: &[u8], counter: u64, mode: HashMode, digits: u8) -> Otp {
  let digest = hmac_digest(secret, &counter.to_be_bytes(), mode);
  let offset = (digest[digest.len() - 1] & 0x0f) as usize;
  let code = (u32::from(digest[offset] & 0x7f) << 24)
    | (u32::from(digest[offset + 1]) << 16)
    | (u32::from(digest[offset + 2]) << 8)
    | u32::from(digest[offset + 3]);
  let code = code % 10_u32.pow(u32::from(digits));

  Otp { code, counter, digest, offset, digits }
}

/// Maps a unix timestamp to its TOTP counter. `step` must be nonzero.
pub fn time_step(at: u64, step: u32) -> u64 { at / u64::from(step) }

/// Computes the TOTP code for the step containing `at`.
pub fn compute_totp(secret: &[u8], at: u64, step: u32, mode: HashMode, digits: u8) -> Otp {
  compute_hotp(secret, time_step(at, step), mode, digits)
}

/// Verifies a submitted code against the step containing `at` plus `shadows`
/// steps on either side.
///
/// Every candidate step is computed and compared in constant time; the result
/// does not leak which step matched. Steps before the epoch are skipped.
pub fn verify_totp(
  secret: &[u8],
  candidate: &str,
  at: u64,
  step: u32,
  mode: HashMode,
  digits: u8,
  shadows: u8,
) -> bool {
  if candidate.len() != digits as usize || !candidate.bytes().all(|b| b.is_ascii_digit()) {
    return false;
  }

  let center = time_step(at, step);
  let mut matched = Choice::from(0u8);
  for delta in -i64::from(shadows)..=i64::from(shadows) {
    let Some(counter) = center.checked_add_signed(delta) else { continue };
    let otp = compute_hotp(secret, counter, mode, digits);
    matched |= otp.to_string().as_bytes().ct_eq(candidate.as_bytes());
  }
  bool::from(matched)
}
