#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fedmfa::{
  config::{MfaConfig, MfaOptions},
  error::{FedMfaError, FedMfaResult},
  keys::ProviderRegistry,
  notification::Notification,
  provider::MfaProvider,
  registration::Registration,
  repository::{MemoryRepository, Repository},
};
use uuid::Uuid;

/// RFC 6238 reference seeds, sized to the digest they exercise.
pub const SEED_20: &[u8] = b"12345678901234567890";
pub const SEED_32: &[u8] = b"12345678901234567890123456789012";
pub const SEED_64: &[u8] =
  b"1234567890123456789012345678901234567890123456789012345678901234";

pub fn init_logs() {
  let _ = env_logger::builder().is_test(true).try_init();
}

pub fn at(secs: i64) -> DateTime<Utc> { DateTime::from_timestamp(secs, 0).unwrap() }

pub fn config_with(options: MfaOptions) -> MfaConfig { MfaConfig::try_from(options).unwrap() }

/// Provider over an in-memory repository with default options.
pub fn memory_provider() -> MfaProvider {
  provider_with(MfaOptions::default(), Arc::new(MemoryRepository::new()))
}

pub fn provider_with(options: MfaOptions, repository: Arc<dyn Repository>) -> MfaProvider {
  MfaProvider::new(config_with(options), repository, None, &ProviderRegistry::new()).unwrap()
}

/// A repository whose every operation reports an outage.
pub struct FaultyRepository;

impl FaultyRepository {
  fn outage<T>() -> FedMfaResult<T> { Err(FedMfaError::Repository("simulated outage".into())) }
}

impl Repository for FaultyRepository {
  fn get_user_key(&self, _upn: &str) -> FedMfaResult<Option<String>> { Self::outage() }

  fn set_user_key(&self, _upn: &str, _key: &str) -> FedMfaResult<()> { Self::outage() }

  fn remove_user_key(&self, _upn: &str) -> FedMfaResult<bool> { Self::outage() }

  fn get_registration(&self, _upn: &str) -> FedMfaResult<Option<Registration>> { Self::outage() }

  fn set_registration(&self, _registration: &Registration) -> FedMfaResult<()> { Self::outage() }

  fn remove_registration(&self, _upn: &str) -> FedMfaResult<bool> { Self::outage() }

  fn get_notification(&self, _registration_id: Uuid) -> FedMfaResult<Option<Notification>> {
    Self::outage()
  }

  fn set_notification(&self, _notification: &Notification) -> FedMfaResult<()> { Self::outage() }
}
