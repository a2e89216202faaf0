//! The adapter facade.
//!
//! [`MfaProvider`] ties the key manager, the OTP engine and the notification
//! lifecycle together behind the operations a federation host calls: enroll,
//! provision, issue a code, check it, or verify an authenticator code live.
//!
//! Every operation that takes a point in time has an `_at` variant; the plain
//! form uses the system clock. Deterministic hosts and tests use `_at`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::{
  certs::CertificateProvider,
  config::MfaConfig,
  error::FedMfaResult,
  keys::{self, KeyManager, ProviderRegistry},
  notification::Notification,
  otp,
  provisioning,
  registration::Registration,
  repository::Repository,
};

/// Outcome of checking a submitted code against the pending notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
  /// The code matched and the check landed inside the validity window.
  Valid,
  /// The code did not match.
  Invalid,
  /// The check came after the validity window closed.
  Expired,
  /// The pending code had already been checked once; the first check stands.
  Replayed,
  /// Nothing was pending for this user.
  NoPending,
}

pub struct MfaProvider {
  config:     MfaConfig,
  repository: Arc<dyn Repository>,
  keys:       KeyManager,
}

impl MfaProvider {
  /// Builds the provider, resolving the configured key format. Fails when the
  /// format's prerequisites are missing (see [`KeyManager::new`]).
  pub fn new(
    config: MfaConfig,
    repository: Arc<dyn Repository>,
    certs_provider: Option<Arc<dyn CertificateProvider>>,
    registry: &ProviderRegistry,
  ) -> FedMfaResult<Self> {
    let keys = KeyManager::new(&config, repository.clone(), certs_provider, registry)?;
    Ok(Self { config, repository, keys })
  }

  pub fn config(&self) -> &MfaConfig { &self.config }

  /// Key administration surface.
  pub fn keys(&self) -> &KeyManager { &self.keys }

  /// Creates the registration and mints its key. Enrolling an existing user is
  /// idempotent: the record is returned as-is and a missing key is re-minted.
  pub fn enroll(&self, upn: &str) -> FedMfaResult<Option<Registration>> {
    let Some(upn) = keys::checked_upn(upn) else { return Ok(None) };

    if let Some(existing) = self.repository.get_registration(upn)? {
      if self.keys.read_key(upn)?.is_none() {
        self.keys.new_key(upn)?;
      }
      return Ok(Some(existing));
    }

    let registration = Registration::new(upn);
    self.repository.set_registration(&registration)?;
    self.keys.new_key(upn)?;
    debug!("enrolled {upn}");
    Ok(Some(registration))
  }

  /// Removes the registration, its pending notification and its key. Returns
  /// whether anything was removed.
  pub fn deregister(&self, upn: &str) -> FedMfaResult<bool> {
    let Some(upn) = keys::checked_upn(upn) else { return Ok(false) };
    let had_key = self.keys.remove_key(upn)?;
    let had_registration = self.repository.remove_registration(upn)?;
    Ok(had_key || had_registration)
  }

  pub fn registration(&self, upn: &str) -> FedMfaResult<Option<Registration>> {
    let Some(upn) = keys::checked_upn(upn) else { return Ok(None) };
    self.repository.get_registration(upn)
  }

  /// Persists host-side edits to a registration (contact data, PIN, methods).
  pub fn save_registration(&self, registration: &Registration) -> FedMfaResult<()> {
    self.repository.set_registration(registration)
  }

  /// Turns MFA on or off without dropping the record or the key.
  pub fn set_enabled(&self, upn: &str, enabled: bool) -> FedMfaResult<Option<Registration>> {
    let Some(upn) = keys::checked_upn(upn) else { return Ok(None) };
    let Some(mut registration) = self.repository.get_registration(upn)? else { return Ok(None) };
    registration.enabled = enabled;
    self.repository.set_registration(&registration)?;
    Ok(Some(registration))
  }

  /// Replaces the user's key. Codes derived from the old key stop verifying.
  pub fn rotate_key(&self, upn: &str) -> FedMfaResult<Option<String>> {
    self.keys.new_key(upn)
  }

  /// The `otpauth://` URI for the user's current key, if they have one.
  pub fn provisioning_uri(&self, upn: &str) -> FedMfaResult<Option<String>> {
    let Some(upn) = keys::checked_upn(upn) else { return Ok(None) };
    Ok(self.keys.encoded_key(upn)?.map(|encoded| {
      provisioning::provisioning_uri(&self.config.issuer, upn, &encoded, self.config.hash)
    }))
  }

  /// The provisioning URI rendered as an SVG QR code `data:` URI.
  #[cfg(feature = "qr")]
  pub fn provisioning_qr(&self, upn: &str) -> FedMfaResult<Option<String>> {
    match self.provisioning_uri(upn)? {
      Some(uri) => provisioning::provisioning_qr_data_uri(&uri).map(Some),
      None => Ok(None),
    }
  }

  /// Issues a delivery code for the user, replacing any pending one.
  ///
  /// Yields `None` when the user is unknown, disabled or keyless; storage
  /// faults are the only errors.
  pub fn issue_code(&self, upn: &str) -> FedMfaResult<Option<Notification>> {
    self.issue_code_at(upn, Utc::now())
  }

  pub fn issue_code_at(
    &self,
    upn: &str,
    now: DateTime<Utc>,
  ) -> FedMfaResult<Option<Notification>> {
    let Some(upn) = keys::checked_upn(upn) else { return Ok(None) };
    let Some(registration) = self.repository.get_registration(upn)? else {
      debug!("no registration for {upn}, not issuing");
      return Ok(None);
    };
    if !registration.enabled {
      debug!("{upn} is disabled, not issuing");
      return Ok(None);
    }
    let Some(probe) = self.keys.probe_key(upn)? else {
      debug!("no key for {upn}, not issuing");
      return Ok(None);
    };

    let otp = otp::compute_totp(
      probe.as_bytes(),
      unix_time(now),
      self.config.step,
      self.config.hash,
      self.config.digits,
    );
    let notification =
      Notification::issue(registration.id, otp.to_string(), now, self.config.delivery_window);
    self.repository.set_notification(&notification)?;
    Ok(Some(notification))
  }

  /// Checks a submitted delivery code against the pending notification.
  ///
  /// The check timestamp is stamped before the window is evaluated, exactly
  /// once per notification: the first check settles the record and later
  /// attempts report [`CodeStatus::Replayed`].
  pub fn check_code(&self, upn: &str, candidate: &str) -> FedMfaResult<CodeStatus> {
    self.check_code_at(upn, candidate, Utc::now())
  }

  pub fn check_code_at(
    &self,
    upn: &str,
    candidate: &str,
    now: DateTime<Utc>,
  ) -> FedMfaResult<CodeStatus> {
    let Some(upn) = keys::checked_upn(upn) else { return Ok(CodeStatus::NoPending) };
    let Some(registration) = self.repository.get_registration(upn)? else {
      return Ok(CodeStatus::NoPending);
    };
    let Some(mut notification) = self.repository.get_notification(registration.id)? else {
      return Ok(CodeStatus::NoPending);
    };

    if notification.checked_at.is_some() {
      debug!("pending code for {upn} was already checked");
      return Ok(CodeStatus::Replayed);
    }
    notification.checked_at = Some(now);
    self.repository.set_notification(&notification)?;

    if !notification.checked_in_window() {
      return Ok(CodeStatus::Expired);
    }
    if bool::from(notification.otp.as_bytes().ct_eq(candidate.as_bytes())) {
      Ok(CodeStatus::Valid)
    } else {
      Ok(CodeStatus::Invalid)
    }
  }

  /// Verifies an authenticator-app code against the user's key with the
  /// configured shadow window.
  ///
  /// A keyless or unknown user costs the same work as a wrong code: the engine
  /// runs against an ephemeral random secret and the result is `false`.
  pub fn verify_code(&self, upn: &str, candidate: &str) -> FedMfaResult<bool> {
    self.verify_code_at(upn, candidate, Utc::now())
  }

  pub fn verify_code_at(
    &self,
    upn: &str,
    candidate: &str,
    now: DateTime<Utc>,
  ) -> FedMfaResult<bool> {
    let Some(upn) = keys::checked_upn(upn) else { return Ok(false) };
    let at = unix_time(now);

    match self.keys.probe_key(upn)? {
      Some(probe) => Ok(otp::verify_totp(
        probe.as_bytes(),
        candidate,
        at,
        self.config.step,
        self.config.hash,
        self.config.digits,
        self.config.shadows,
      )),
      None => {
        let mut dummy = Zeroizing::new([0u8; 20]);
        crate::rng::fill_bytes(&mut *dummy);
        let _ = otp::verify_totp(
          &*dummy,
          candidate,
          at,
          self.config.step,
          self.config.hash,
          self.config.digits,
          self.config.shadows,
        );
        Ok(false)
      }
    }
  }
}

fn unix_time(now: DateTime<Utc>) -> u64 { now.timestamp().max(0) as u64 }
