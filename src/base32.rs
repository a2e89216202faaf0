//! RFC 4648 Base32 codec, unpadded.
//!
//! Authenticator apps expect shared secrets in this alphabet, so the provisioning
//! path encodes probe material with it. Encoding never pads; decoding accepts
//! lowercase input and treats `=` as end of payload.

use crate::error::{FedMfaError, FedMfaResult};

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Encodes `data` as unpadded Base32. Empty input yields an empty string.
pub fn encode(data: &[u8]) -> String {
  let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
  let mut acc: u32 = 0;
  let mut bits: u32 = 0;

  for &byte in data {
    acc = (acc << 8) | u32::from(byte);
    bits += 8;
    while bits >= 5 {
      bits -= 5;
      out.push(ALPHABET[((acc >> bits) & 0x1f) as usize] as char);
    }
  }
  if bits > 0 {
    out.push(ALPHABET[((acc << (5 - bits)) & 0x1f) as usize] as char);
  }
  out
}

/// Decodes unpadded Base32, case-insensitively.
///
/// Characters outside the alphabet are rejected with their position. Leftover
/// bits past the last full byte are discarded, so any encoder output round-trips.
pub fn decode(text: &str) -> FedMfaResult<Vec<u8>> {
  let mut out = Vec::with_capacity(text.len() * 5 / 8);
  let mut acc: u32 = 0;
  let mut bits: u32 = 0;

  for (offset, ch) in text.chars().enumerate() {
    let value = match ch {
      'A'..='Z' => ch as u32 - 'A' as u32,
      'a'..='z' => ch as u32 - 'a' as u32,
      '2'..='7' => ch as u32 - '2' as u32 + 26,
      '=' => break,
      found => return Err(FedMfaError::InvalidBase32 { found, offset }),
    };
    acc = (acc << 5) | value;
    bits += 5;
    if bits >= 8 {
      bits -= 8;
      out.push((acc >> bits) as u8);
      acc &= (1 << bits) - 1;
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use data_encoding::BASE32_NOPAD;

  use super::*;

  #[test]
  fn test_rfc4648_vectors() {
    assert_eq!(encode(b""), "");
    assert_eq!(encode(b"f"), "MY");
    assert_eq!(encode(b"fo"), "MZXQ");
    assert_eq!(encode(b"foo"), "MZXW6");
    assert_eq!(encode(b"foob"), "MZXW6YQ");
    assert_eq!(encode(b"fooba"), "MZXW6YTB");
    assert_eq!(encode(b"foobar"), "MZXW6YTBOI");
  }

  #[test]
  fn test_authenticator_secret_shapes() {
    assert_eq!(encode(b"12345678901234567890"), "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ");
    assert_eq!(encode(&[0u8; 20]), "A".repeat(32));
    assert_eq!(encode(&[0xff; 5]), "77777777");
  }

  #[test]
  fn test_decode_round_trip() {
    for len in 0..64 {
      let data: Vec<u8> = (0..len as u8).map(|i| i.wrapping_mul(37)).collect();
      assert_eq!(decode(&encode(&data)).unwrap(), data);
    }
  }

  #[test]
  fn test_decode_is_case_insensitive() {
    assert_eq!(decode("mzxw6ytboi").unwrap(), b"foobar");
    assert_eq!(decode("MzXw6YtBoI").unwrap(), b"foobar");
  }

  #[test]
  fn test_decode_stops_at_padding() {
    assert_eq!(decode("MZXW6YQ=").unwrap(), b"foob");
  }

  #[test]
  fn test_decode_rejects_foreign_characters() {
    let err = decode("MZX1").unwrap_err();
    assert!(matches!(err, FedMfaError::InvalidBase32 { found: '1', offset: 3 }));
    let err = decode("M ZX").unwrap_err();
    assert!(matches!(err, FedMfaError::InvalidBase32 { found: ' ', offset: 1 }));
  }

  #[test]
  fn test_matches_reference_codec() {
    for len in [0, 1, 4, 5, 19, 20, 33, 64, 128] {
      let data: Vec<u8> = (0..len as u8).map(|i| i.wrapping_mul(101).wrapping_add(3)).collect();
      assert_eq!(encode(&data), BASE32_NOPAD.encode(&data));
      assert_eq!(decode(&BASE32_NOPAD.encode(&data)).unwrap(), data);
    }
  }
}
