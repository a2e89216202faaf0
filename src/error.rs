//! Crate-wide error and result types.

use thiserror::Error;

/// Branded result type used by all fallible fedmfa operations.
pub type FedMfaResult<T> = Result<T, FedMfaError>;

#[derive(Error, Debug)]
pub enum FedMfaError {
  /// The storage boundary reported a fault (connection lost, poisoned lock, ...).
  #[error("repository error: {0}")]
  Repository(String),

  /// The certificate boundary reported a fault.
  #[error("certificate provider error: {0}")]
  Certificate(String),

  /// Startup probe of the certificate provider did not round-trip.
  #[error("certificate probe failed: {0}")]
  CertificateProbe(String),

  #[error("rsa error: {0}")]
  Rsa(#[from] rsa::Error),

  #[error("base64 error: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("invalid base32 character {found:?} at offset {offset}")]
  InvalidBase32 { found: char, offset: usize },

  /// A stored key body did not have the shape its format requires.
  #[error("malformed key payload: {0}")]
  KeyPayload(String),

  /// The selected key format needs a certificate provider and none was supplied.
  #[error("key format {0:?} requires a certificate provider")]
  MissingCertificateProvider(String),

  /// The AES key format was selected without a master secret to derive from.
  #[error("aes key format requires a master secret")]
  MissingMasterSecret,

  /// A custom key format was selected without naming a registered implementation.
  #[error("custom key format requires a registered name")]
  MissingCustomFormat,

  /// No factory is registered under the requested custom format name.
  #[error("no custom key format registered under {0:?}")]
  UnknownKeyFormat(String),

  /// PINs are 4 to 9 ASCII digits.
  #[error("pin must be 4 to 9 ascii digits")]
  InvalidPin,

  #[cfg(feature = "qr")]
  #[error("qr encoding failed: {0}")]
  Qr(String),
}
