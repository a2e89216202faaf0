//! Pending-code notifications.
//!
//! Issuing a code creates one of these records; checking it stamps `checked_at`.
//! A registration has at most one pending record, so issuing again replaces the
//! previous one wholesale.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a notification at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
  /// Delivered, not yet checked, still inside its validity window.
  Issued,
  /// A check was recorded. Terminal.
  Checked,
  /// The validity window elapsed without a check.
  Expired,
}

/// A one-time code issued to a registration, waiting to be checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub id:              Uuid,
  pub registration_id: Uuid,
  /// The delivered code, zero-padded to the configured digit count.
  pub otp:             String,
  pub created_at:      DateTime<Utc>,
  pub valid_until:     DateTime<Utc>,
  pub checked_at:      Option<DateTime<Utc>>,
}

impl Notification {
  /// Issues a fresh code valid for `window_secs` from `now`.
  pub fn issue(
    registration_id: Uuid,
    otp: impl Into<String>,
    now: DateTime<Utc>,
    window_secs: u32,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      registration_id,
      otp: otp.into(),
      created_at: now,
      valid_until: now + Duration::seconds(i64::from(window_secs)),
      checked_at: None,
    }
  }

  /// A recorded check is terminal and wins over expiry; expiry wins over issued.
  pub fn state(&self, now: DateTime<Utc>) -> NotificationState {
    if self.checked_at.is_some() {
      NotificationState::Checked
    } else if now > self.valid_until {
      NotificationState::Expired
    } else {
      NotificationState::Issued
    }
  }

  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now > self.valid_until }

  /// Whether the recorded check landed inside the validity window. False when
  /// no check has been recorded yet.
  pub fn checked_in_window(&self) -> bool {
    self.checked_at.is_some_and(|checked| checked <= self.valid_until)
  }
}
