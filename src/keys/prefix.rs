//! Scheme tags on stored key text.
//!
//! Every stored key is tagged with the format that wrote it (`rng://...`),
//! so a row can be validated against the configured format without guessing.
//! One implementation serves all formats; custom formats pick their own tag.

pub const RNG_PREFIX: &str = "rng://";
pub const RSA_PREFIX: &str = "rsa://";
pub const AES_PREFIX: &str = "aes://";

/// Tags `payload` with `prefix`. Already-tagged text passes through unchanged.
pub fn add(prefix: &str, payload: &str) -> String {
  if has(prefix, payload) { payload.to_string() } else { format!("{prefix}{payload}") }
}

/// Removes a leading `prefix`. Text without it passes through unchanged.
pub fn strip<'a>(prefix: &str, key: &'a str) -> &'a str { key.strip_prefix(prefix).unwrap_or(key) }

/// Whether `key` carries `prefix`.
pub fn has(prefix: &str, key: &str) -> bool { key.starts_with(prefix) }
