//! Registry for externally implemented key formats.
//!
//! Hosts register factories under a name at startup; the configured name is
//! resolved exactly once, when the key manager is built. There is no runtime
//! discovery: an unknown name is a construction error, not a silent fallback.

use std::collections::HashMap;

use crate::error::{FedMfaError, FedMfaResult};

/// A secret-key format implemented outside this crate.
pub trait CustomKeyFormat: Send + Sync {
  /// Scheme tag this format writes, e.g. `vault://`.
  fn prefix(&self) -> &str;
  fn generate(&self, upn: &str) -> FedMfaResult<String>;
  fn validate(&self, upn: &str, key: &str) -> FedMfaResult<bool>;
}

type FormatFactory =
  Box<dyn Fn(&serde_json::Value) -> FedMfaResult<Box<dyn CustomKeyFormat>> + Send + Sync>;

/// Name → factory table for custom key formats.
#[derive(Default)]
pub struct ProviderRegistry {
  factories: HashMap<String, FormatFactory>,
}

impl ProviderRegistry {
  pub fn new() -> Self { Self::default() }

  /// Registers `factory` under `name`, replacing any previous registration.
  pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
  where
    F: Fn(&serde_json::Value) -> FedMfaResult<Box<dyn CustomKeyFormat>> + Send + Sync + 'static,
  {
    self.factories.insert(name.into(), Box::new(factory));
  }

  /// Builds the format registered under `name` with the host-supplied params.
  pub fn resolve(
    &self,
    name: &str,
    params: &serde_json::Value,
  ) -> FedMfaResult<Box<dyn CustomKeyFormat>> {
    match self.factories.get(name) {
      Some(factory) => factory(params),
      None => Err(FedMfaError::UnknownKeyFormat(name.to_string())),
    }
  }

  pub fn contains(&self, name: &str) -> bool { self.factories.contains_key(name) }
}
