//! Secret-key management.
//!
//! A [`KeyManager`] is built once at host startup from the validated config,
//! the repository, an optional certificate provider and the custom-format
//! registry. Construction resolves the configured [`SecretKeyFormat`] and
//! fails fast when its prerequisites are missing, so a manager that exists can
//! always mint and validate keys.

use std::sync::Arc;

use log::debug;
use zeroize::Zeroizing;

pub mod aes;
pub mod custom;
pub mod prefix;
pub mod rng;
pub mod rsa;

pub use custom::{CustomKeyFormat, ProviderRegistry};

use crate::{
  base32,
  certs::{self, CertificateProvider},
  config::{KeyFormatKind, KeySize, MfaConfig},
  error::{FedMfaError, FedMfaResult},
  repository::Repository,
};

/// Longest probe text handed to the OTP engine, in bytes.
pub const MAX_PROBE_LEN: usize = 128;

fn random_material(size: KeySize) -> Zeroizing<Vec<u8>> {
  match size {
    KeySize::Default => Zeroizing::new(uuid::Uuid::new_v4().into_bytes().to_vec()),
    sized => {
      let mut material = Zeroizing::new(vec![0u8; sized.bytes()]);
      crate::rng::fill_bytes(&mut material);
      material
    }
  }
}

/// The configured key format, resolved once at construction.
pub enum SecretKeyFormat {
  Rng(rng::RngFormat),
  Rsa(rsa::RsaFormat),
  Aes(aes::AesFormat),
  Custom(Box<dyn CustomKeyFormat>),
}

impl SecretKeyFormat {
  /// Builds the format the config names, checking its prerequisites: the RSA
  /// format probes the certificate provider, the AES format needs the master
  /// secret, custom names must resolve in the registry.
  pub fn from_config(
    config: &MfaConfig,
    certs_provider: Option<Arc<dyn CertificateProvider>>,
    registry: &ProviderRegistry,
  ) -> FedMfaResult<Self> {
    match config.key_format {
      KeyFormatKind::Rng => Ok(Self::Rng(rng::RngFormat::new(config.key_size))),
      KeyFormatKind::Rsa => {
        let Some(provider) = certs_provider else {
          return Err(FedMfaError::MissingCertificateProvider("rsa".to_string()));
        };
        certs::probe(provider.as_ref())?;
        Ok(Self::Rsa(rsa::RsaFormat::new(provider)))
      }
      KeyFormatKind::Aes => {
        let master = config.master_secret.as_deref().ok_or(FedMfaError::MissingMasterSecret)?;
        Ok(Self::Aes(aes::AesFormat::new(config.key_size, master)))
      }
      KeyFormatKind::Custom => {
        let options = config.custom.as_ref().ok_or(FedMfaError::MissingCustomFormat)?;
        Ok(Self::Custom(registry.resolve(&options.name, &options.params)?))
      }
    }
  }

  pub fn generate(&self, upn: &str) -> FedMfaResult<String> {
    match self {
      Self::Rng(format) => Ok(format.generate()),
      Self::Rsa(format) => format.generate(upn),
      Self::Aes(format) => Ok(format.generate(upn)),
      Self::Custom(format) => format.generate(upn),
    }
  }

  pub fn validate(&self, upn: &str, key: &str) -> FedMfaResult<bool> {
    match self {
      Self::Rng(format) => Ok(format.validate(key)),
      Self::Rsa(format) => Ok(format.validate(upn, key)),
      Self::Aes(format) => Ok(format.validate(upn, key)),
      Self::Custom(format) => format.validate(upn, key),
    }
  }

  /// Scheme tag this format writes.
  pub fn prefix(&self) -> &str {
    match self {
      Self::Rng(_) => prefix::RNG_PREFIX,
      Self::Rsa(_) => prefix::RSA_PREFIX,
      Self::Aes(_) => prefix::AES_PREFIX,
      Self::Custom(format) => format.prefix(),
    }
  }
}

/// Mints, validates and serves per-user secret keys through the repository.
pub struct KeyManager {
  repository: Arc<dyn Repository>,
  format:     SecretKeyFormat,
}

impl KeyManager {
  pub fn new(
    config: &MfaConfig,
    repository: Arc<dyn Repository>,
    certs_provider: Option<Arc<dyn CertificateProvider>>,
    registry: &ProviderRegistry,
  ) -> FedMfaResult<Self> {
    let format = SecretKeyFormat::from_config(config, certs_provider, registry)?;
    Ok(Self { repository, format })
  }

  /// Generates and stores a fresh key, replacing any previous one. Returns the
  /// stored text, or `None` for a blank UPN.
  pub fn new_key(&self, upn: &str) -> FedMfaResult<Option<String>> {
    let Some(upn) = checked_upn(upn) else { return Ok(None) };
    let key = self.format.generate(upn)?;
    self.repository.set_user_key(upn, &key)?;
    Ok(Some(key))
  }

  /// The stored key text, tag included.
  pub fn read_key(&self, upn: &str) -> FedMfaResult<Option<String>> {
    let Some(upn) = checked_upn(upn) else { return Ok(None) };
    self.repository.get_user_key(upn)
  }

  /// The user's OTP secret: stored text with this format's tag stripped,
  /// capped at [`MAX_PROBE_LEN`] bytes.
  pub fn probe_key(&self, upn: &str) -> FedMfaResult<Option<String>> {
    Ok(self.read_key(upn)?.map(|key| cap_probe(prefix::strip(self.format.prefix(), &key))))
  }

  /// The probe bytes Base32-encoded, ready for authenticator provisioning.
  pub fn encoded_key(&self, upn: &str) -> FedMfaResult<Option<String>> {
    Ok(self.probe_key(upn)?.map(|probe| base32::encode(probe.as_bytes())))
  }

  /// Whether the stored key is one the configured format accepts.
  pub fn validate_key(&self, upn: &str) -> FedMfaResult<bool> {
    let Some(upn) = checked_upn(upn) else { return Ok(false) };
    match self.repository.get_user_key(upn)? {
      Some(key) => self.format.validate(upn, &key),
      None => Ok(false),
    }
  }

  /// Returns whether a key was present.
  pub fn remove_key(&self, upn: &str) -> FedMfaResult<bool> {
    let Some(upn) = checked_upn(upn) else { return Ok(false) };
    self.repository.remove_user_key(upn)
  }
}

pub(crate) fn checked_upn(upn: &str) -> Option<&str> {
  let trimmed = upn.trim();
  if trimmed.is_empty() {
    debug!("ignoring request with a blank upn");
    None
  } else {
    Some(trimmed)
  }
}

fn cap_probe(stripped: &str) -> String {
  let mut out = String::with_capacity(stripped.len().min(MAX_PROBE_LEN));
  for ch in stripped.chars() {
    if out.len() + ch.len_utf8() > MAX_PROBE_LEN {
      break;
    }
    out.push(ch);
  }
  out
}
