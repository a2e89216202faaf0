//! RNG key format: random material stored as tagged Base64 text.

use base64::{Engine as _, engine::general_purpose};

use crate::{config::KeySize, keys::prefix};

pub struct RngFormat {
  size: KeySize,
}

impl RngFormat {
  pub fn new(size: KeySize) -> Self { Self { size } }

  pub fn generate(&self) -> String {
    let material = super::random_material(self.size);
    prefix::add(prefix::RNG_PREFIX, &general_purpose::STANDARD.encode(material.as_slice()))
  }

  /// Accepts tagged keys and, for rows written before tagging existed, bare
  /// Base64 without a scheme.
  pub fn validate(&self, key: &str) -> bool {
    let body = prefix::strip(prefix::RNG_PREFIX, key);
    !body.is_empty() && general_purpose::STANDARD.decode(body).is_ok()
  }
}
