//! Adapter configuration.
//!
//! Hosts describe what they want through [`MfaOptions`] (every field optional)
//! and convert it into a validated [`MfaConfig`]. Out-of-range OTP parameters
//! are clamped back to their defaults with a warning rather than rejected, so a
//! mistyped admin value degrades to standard behavior instead of locking the
//! whole tenant out. Structurally unusable combinations (a key format missing
//! the material it needs) fail the conversion.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{error::FedMfaError, otp::HashMode};

/// Default values applied where [`MfaOptions`] leaves fields unset.
pub mod defaults {
  /// Issuer shown by authenticator apps and embedded in provisioning URIs.
  pub const ISSUER: &str = "FedMFA";
  /// OTP length in digits.
  pub const DIGITS: u8 = 6;
  /// TOTP period in seconds.
  pub const STEP_SECS: u32 = 30;
  /// Time steps accepted on either side of the current one.
  pub const SHADOWS: u8 = 2;
  /// Seconds a delivered code stays valid.
  pub const DELIVERY_WINDOW_SECS: u32 = 300;
}

/// Size of the random material behind a generated secret key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySize {
  /// GUID-derived material (16 bytes).
  #[default]
  Default,
  Size128,
  Size256,
  Size384,
  Size512,
}

impl KeySize {
  /// Number of secret bytes this size produces.
  pub fn bytes(self) -> usize {
    match self {
      KeySize::Default | KeySize::Size128 => 16,
      KeySize::Size256 => 32,
      KeySize::Size384 => 48,
      KeySize::Size512 => 64,
    }
  }
}

/// Storage format for generated secret keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormatKind {
  /// Random material, Base64 text.
  #[default]
  Rng,
  /// Random material sealed with the certificate provider.
  Rsa,
  /// Random material encrypted under a key derived from the master secret.
  Aes,
  /// An externally registered format.
  Custom,
}

/// Selects and parameterizes an externally registered key format.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CustomFormatOptions {
  /// Registry name of the format implementation.
  pub name:   String,
  /// Opaque parameters handed to the format factory.
  #[serde(default)]
  pub params: serde_json::Value,
}

/// Host-facing adapter options. Every field is optional.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MfaOptions {
  /// Issuer label for provisioning URIs. Defaults to `"FedMFA"`
  pub issuer:          Option<String>,
  /// Number of digits in OTP codes (4-8). Out-of-range values fall back to 6
  pub digits:          Option<u8>,
  /// TOTP period in seconds; must be a multiple of 30 within 30-180, otherwise 30
  pub step:            Option<u32>,
  /// Time steps accepted on either side of the current one (default 2)
  pub shadows:         Option<u8>,
  /// HMAC family for code generation (default SHA-1)
  pub hash:            Option<HashMode>,
  /// Secret-key storage format (default RNG)
  pub key_format:      Option<KeyFormatKind>,
  /// Amount of random material behind each key (default GUID-sized)
  pub key_size:        Option<KeySize>,
  /// Master secret the AES format derives its encryption key from
  pub master_secret:   Option<String>,
  /// Custom format selection, required when `key_format` is `Custom`
  pub custom:          Option<CustomFormatOptions>,
  /// Seconds a delivered code stays valid (default 300)
  pub delivery_window: Option<u32>,
}

impl Default for MfaOptions {
  fn default() -> Self {
    Self {
      issuer:          Some(defaults::ISSUER.to_string()),
      digits:          Some(defaults::DIGITS),
      step:            Some(defaults::STEP_SECS),
      shadows:         Some(defaults::SHADOWS),
      hash:            Some(HashMode::Sha1),
      key_format:      Some(KeyFormatKind::Rng),
      key_size:        Some(KeySize::Default),
      master_secret:   None,
      custom:          None,
      delivery_window: Some(defaults::DELIVERY_WINDOW_SECS),
    }
  }
}

/// Validated adapter configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MfaConfig {
  pub issuer:          String,
  pub digits:          u8,
  pub step:            u32,
  pub shadows:         u8,
  pub hash:            HashMode,
  pub key_format:      KeyFormatKind,
  pub key_size:        KeySize,
  pub master_secret:   Option<String>,
  pub custom:          Option<CustomFormatOptions>,
  pub delivery_window: u32,
}

impl TryFrom<MfaOptions> for MfaConfig {
  type Error = FedMfaError;

  fn try_from(value: MfaOptions) -> Result<Self, Self::Error> {
    // Validation
    let key_format = value.key_format.unwrap_or_default();
    if key_format == KeyFormatKind::Custom
      && !value.custom.as_ref().is_some_and(|c| !c.name.trim().is_empty())
    {
      return Err(FedMfaError::MissingCustomFormat);
    }
    if key_format == KeyFormatKind::Aes
      && !value.master_secret.as_ref().is_some_and(|s| !s.trim().is_empty())
    {
      return Err(FedMfaError::MissingMasterSecret);
    }

    Ok(MfaConfig {
      issuer: value
        .issuer
        .filter(|issuer| !issuer.trim().is_empty())
        .unwrap_or_else(|| defaults::ISSUER.to_string()),
      digits: normalize_digits(value.digits.unwrap_or(defaults::DIGITS)),
      step: normalize_step(value.step.unwrap_or(defaults::STEP_SECS)),
      shadows: value.shadows.unwrap_or(defaults::SHADOWS),
      hash: value.hash.unwrap_or_default(),
      key_format,
      key_size: value.key_size.unwrap_or_default(),
      master_secret: value.master_secret,
      custom: value.custom,
      delivery_window: value.delivery_window.unwrap_or(defaults::DELIVERY_WINDOW_SECS),
    })
  }
}

fn normalize_digits(digits: u8) -> u8 {
  if (4..=8).contains(&digits) {
    digits
  } else {
    warn!("otp digits {digits} outside 4..=8, using {}", defaults::DIGITS);
    defaults::DIGITS
  }
}

fn normalize_step(step: u32) -> u32 {
  if (30..=180).contains(&step) && step % 30 == 0 {
    step
  } else {
    warn!(
      "totp step {step}s is not a multiple of 30 within 30..=180, using {}",
      defaults::STEP_SECS
    );
    defaults::STEP_SECS
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_options_convert() {
    let config = MfaConfig::try_from(MfaOptions::default()).unwrap();
    assert_eq!(config.issuer, "FedMFA");
    assert_eq!(config.digits, 6);
    assert_eq!(config.step, 30);
    assert_eq!(config.shadows, 2);
    assert_eq!(config.hash, HashMode::Sha1);
    assert_eq!(config.key_format, KeyFormatKind::Rng);
    assert_eq!(config.key_size, KeySize::Default);
    assert_eq!(config.delivery_window, 300);
  }

  #[test]
  fn test_digits_clamp_to_default() {
    for digits in [0u8, 3, 9, 200] {
      let options = MfaOptions { digits: Some(digits), ..Default::default() };
      assert_eq!(MfaConfig::try_from(options).unwrap().digits, 6);
    }
    for digits in [4u8, 6, 8] {
      let options = MfaOptions { digits: Some(digits), ..Default::default() };
      assert_eq!(MfaConfig::try_from(options).unwrap().digits, digits);
    }
  }

  #[test]
  fn test_step_normalizes_to_default() {
    for step in [0u32, 15, 45, 181, 210, 300] {
      let options = MfaOptions { step: Some(step), ..Default::default() };
      assert_eq!(MfaConfig::try_from(options).unwrap().step, 30);
    }
    for step in [30u32, 60, 90, 180] {
      let options = MfaOptions { step: Some(step), ..Default::default() };
      assert_eq!(MfaConfig::try_from(options).unwrap().step, step);
    }
  }

  #[test]
  fn test_blank_issuer_falls_back() {
    let options = MfaOptions { issuer: Some("  ".to_string()), ..Default::default() };
    assert_eq!(MfaConfig::try_from(options).unwrap().issuer, "FedMFA");
  }

  #[test]
  fn test_custom_format_requires_name() {
    let options = MfaOptions { key_format: Some(KeyFormatKind::Custom), ..Default::default() };
    assert!(matches!(MfaConfig::try_from(options), Err(FedMfaError::MissingCustomFormat)));

    let options = MfaOptions {
      key_format: Some(KeyFormatKind::Custom),
      custom: Some(CustomFormatOptions { name: " ".to_string(), ..Default::default() }),
      ..Default::default()
    };
    assert!(matches!(MfaConfig::try_from(options), Err(FedMfaError::MissingCustomFormat)));
  }

  #[test]
  fn test_aes_format_requires_master_secret() {
    let options = MfaOptions { key_format: Some(KeyFormatKind::Aes), ..Default::default() };
    assert!(matches!(MfaConfig::try_from(options), Err(FedMfaError::MissingMasterSecret)));

    let options = MfaOptions {
      key_format: Some(KeyFormatKind::Aes),
      master_secret: Some("correct horse battery staple".to_string()),
      ..Default::default()
    };
    assert!(MfaConfig::try_from(options).is_ok());
  }

  #[test]
  fn test_options_parse_from_json() {
    let options: MfaOptions =
      serde_json::from_str(r#"{"digits": 8, "hash": "SHA256", "key_format": "aes",
        "master_secret": "s3cret", "key_size": "size512"}"#)
        .unwrap();
    let config = MfaConfig::try_from(options).unwrap();
    assert_eq!(config.digits, 8);
    assert_eq!(config.hash, HashMode::Sha256);
    assert_eq!(config.key_format, KeyFormatKind::Aes);
    assert_eq!(config.key_size, KeySize::Size512);
    assert_eq!(config.key_size.bytes(), 64);
  }
}
