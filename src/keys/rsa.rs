//! RSA key format: the owner's UPN sealed by the certificate provider.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use log::warn;

use crate::{certs::CertificateProvider, error::FedMfaResult, keys::prefix};

pub struct RsaFormat {
  certs: Arc<dyn CertificateProvider>,
}

impl RsaFormat {
  pub fn new(certs: Arc<dyn CertificateProvider>) -> Self { Self { certs } }

  /// The UPN bytes a key for `upn` must decrypt to: lower-cased, and cut to
  /// what one OAEP block under this certificate can seal.
  fn sealed_upn(&self, upn: &str) -> Vec<u8> {
    let mut bytes = upn.to_lowercase().into_bytes();
    let cap = self.certs.max_encrypt_len();
    if bytes.len() > cap {
      warn!(
        "upn of {} bytes exceeds certificate {} capacity, sealing the first {cap}",
        bytes.len(),
        self.certs.thumbprint(),
      );
      bytes.truncate(cap);
    }
    bytes
  }

  pub fn generate(&self, upn: &str) -> FedMfaResult<String> {
    let sealed = self.certs.encrypt(&self.sealed_upn(upn))?;
    Ok(prefix::add(prefix::RSA_PREFIX, &general_purpose::STANDARD.encode(sealed)))
  }

  /// A key is valid when it is tagged, decodes, and decrypts back to the
  /// owner's lower-cased UPN. RSA rows were always written tagged, so bare
  /// text is rejected.
  pub fn validate(&self, upn: &str, key: &str) -> bool {
    if !prefix::has(prefix::RSA_PREFIX, key) {
      return false;
    }
    let Ok(sealed) = general_purpose::STANDARD.decode(prefix::strip(prefix::RSA_PREFIX, key))
    else {
      return false;
    };
    self.certs.decrypt(&sealed).map(|opened| opened == self.sealed_upn(upn)).unwrap_or(false)
  }
}
