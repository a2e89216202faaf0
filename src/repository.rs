//! Storage boundary.

use std::{collections::HashMap, sync::RwLock};

use uuid::Uuid;

use crate::{
  error::{FedMfaError, FedMfaResult},
  notification::Notification,
  registration::Registration,
};

/// Storage the adapter core reads and writes through.
///
/// Implementations treat UPNs case-insensitively, the way the directories they
/// front do. Faults surface as [`FedMfaError::Repository`]; absent data is
/// `None`/`false`, never an error.
pub trait Repository: Send + Sync {
  /// The stored secret key text for a user, prefix included.
  fn get_user_key(&self, upn: &str) -> FedMfaResult<Option<String>>;
  fn set_user_key(&self, upn: &str, key: &str) -> FedMfaResult<()>;
  /// Returns whether a key was present.
  fn remove_user_key(&self, upn: &str) -> FedMfaResult<bool>;

  fn get_registration(&self, upn: &str) -> FedMfaResult<Option<Registration>>;
  fn set_registration(&self, registration: &Registration) -> FedMfaResult<()>;
  /// Removes the registration and its pending notification, if any.
  fn remove_registration(&self, upn: &str) -> FedMfaResult<bool>;

  /// The pending notification for a registration, if any.
  fn get_notification(&self, registration_id: Uuid) -> FedMfaResult<Option<Notification>>;
  /// Replaces the pending notification of the record's registration.
  fn set_notification(&self, notification: &Notification) -> FedMfaResult<()>;
}

/// In-process store backed by hash maps, for tests and single-node hosts.
#[derive(Default)]
pub struct MemoryRepository {
  keys:          RwLock<HashMap<String, String>>,
  registrations: RwLock<HashMap<String, Registration>>,
  notifications: RwLock<HashMap<Uuid, Notification>>,
}

impl MemoryRepository {
  pub fn new() -> Self { Self::default() }
}

fn poisoned<T>(_: T) -> FedMfaError { FedMfaError::Repository("poisoned lock".into()) }

impl Repository for MemoryRepository {
  fn get_user_key(&self, upn: &str) -> FedMfaResult<Option<String>> {
    Ok(self.keys.read().map_err(poisoned)?.get(&upn.to_lowercase()).cloned())
  }

  fn set_user_key(&self, upn: &str, key: &str) -> FedMfaResult<()> {
    self.keys.write().map_err(poisoned)?.insert(upn.to_lowercase(), key.to_string());
    Ok(())
  }

  fn remove_user_key(&self, upn: &str) -> FedMfaResult<bool> {
    Ok(self.keys.write().map_err(poisoned)?.remove(&upn.to_lowercase()).is_some())
  }

  fn get_registration(&self, upn: &str) -> FedMfaResult<Option<Registration>> {
    Ok(self.registrations.read().map_err(poisoned)?.get(&upn.to_lowercase()).cloned())
  }

  fn set_registration(&self, registration: &Registration) -> FedMfaResult<()> {
    self
      .registrations
      .write()
      .map_err(poisoned)?
      .insert(registration.upn.to_lowercase(), registration.clone());
    Ok(())
  }

  fn remove_registration(&self, upn: &str) -> FedMfaResult<bool> {
    let removed = self.registrations.write().map_err(poisoned)?.remove(&upn.to_lowercase());
    match removed {
      Some(registration) => {
        self.notifications.write().map_err(poisoned)?.remove(&registration.id);
        Ok(true)
      }
      None => Ok(false),
    }
  }

  fn get_notification(&self, registration_id: Uuid) -> FedMfaResult<Option<Notification>> {
    Ok(self.notifications.read().map_err(poisoned)?.get(&registration_id).cloned())
  }

  fn set_notification(&self, notification: &Notification) -> FedMfaResult<()> {
    self
      .notifications
      .write()
      .map_err(poisoned)?
      .insert(notification.registration_id, notification.clone());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  #[test]
  fn test_keys_round_trip_case_insensitively() {
    let repo = MemoryRepository::new();
    assert_eq!(repo.get_user_key("ada@example.org").unwrap(), None);

    repo.set_user_key("Ada@Example.org", "rng://abcd").unwrap();
    assert_eq!(repo.get_user_key("ada@example.org").unwrap().as_deref(), Some("rng://abcd"));

    assert!(repo.remove_user_key("ADA@EXAMPLE.ORG").unwrap());
    assert!(!repo.remove_user_key("ada@example.org").unwrap());
  }

  #[test]
  fn test_registrations_round_trip() {
    let repo = MemoryRepository::new();
    let reg = Registration::new("Ada@Example.org");
    repo.set_registration(&reg).unwrap();

    let loaded = repo.get_registration("ada@example.org").unwrap().unwrap();
    assert_eq!(loaded.id, reg.id);

    assert!(repo.remove_registration("ada@example.org").unwrap());
    assert_eq!(repo.get_registration("ada@example.org").unwrap(), None);
  }

  #[test]
  fn test_one_pending_notification_per_registration() {
    let repo = MemoryRepository::new();
    let reg = Registration::new("ada@example.org");

    let first = Notification::issue(reg.id, "111111", Utc::now(), 300);
    let second = Notification::issue(reg.id, "222222", Utc::now(), 300);
    repo.set_notification(&first).unwrap();
    repo.set_notification(&second).unwrap();

    let pending = repo.get_notification(reg.id).unwrap().unwrap();
    assert_eq!(pending.id, second.id);
    assert_eq!(pending.otp, "222222");
  }

  #[test]
  fn test_removing_registration_drops_its_notification() {
    let repo = MemoryRepository::new();
    let reg = Registration::new("ada@example.org");
    repo.set_registration(&reg).unwrap();
    repo.set_notification(&Notification::issue(reg.id, "333333", Utc::now(), 300)).unwrap();

    assert!(repo.remove_registration("ada@example.org").unwrap());
    assert_eq!(repo.get_notification(reg.id).unwrap(), None);
  }
}
