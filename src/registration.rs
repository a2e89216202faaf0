//! Per-user MFA registrations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FedMfaError, FedMfaResult};

/// Second-factor method a registration selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredMethod {
  /// The user has not picked a method yet.
  #[default]
  Choose,
  /// Code from an authenticator app.
  Code,
  /// Code delivered by mail.
  Email,
  /// Code delivered through an external SMS/voice gateway.
  External,
  Azure,
  Biometrics,
  Pin,
  None,
}

/// One user's MFA state.
///
/// The PIN is reachable only through [`Registration::set_pin`], and wire
/// records are checked on deserialization, so every stored value satisfies
/// the digit rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
  pub id:               Uuid,
  pub upn:              String,
  pub mail:             Option<String>,
  pub phone:            Option<String>,
  pub enabled:          bool,
  pub preferred_method: PreferredMethod,
  pub override_method:  Option<PreferredMethod>,
  #[serde(default, deserialize_with = "deserialize_pin")]
  pin:                  Option<String>,
  pub totp_enabled:     bool,
}

impl Registration {
  /// Creates an enabled registration with nothing configured yet.
  pub fn new(upn: impl Into<String>) -> Self {
    Self {
      id:               Uuid::new_v4(),
      upn:              upn.into(),
      mail:             None,
      phone:            None,
      enabled:          true,
      preferred_method: PreferredMethod::Choose,
      override_method:  None,
      pin:              None,
      totp_enabled:     false,
    }
  }

  /// Sets or clears the PIN. PINs are 4 to 9 ASCII digits; leading zeros are
  /// significant, which is why the value is text and not a number.
  pub fn set_pin(&mut self, pin: Option<&str>) -> FedMfaResult<()> {
    match pin {
      None => {
        self.pin = None;
        Ok(())
      }
      Some(value) if pin_shape_ok(value) => {
        self.pin = Some(value.to_string());
        Ok(())
      }
      Some(_) => Err(FedMfaError::InvalidPin),
    }
  }

  pub fn pin(&self) -> Option<&str> { self.pin.as_deref() }

  /// Whether enrollment produced something usable. Derived from the record so
  /// it can never drift out of sync with the fields that define it: a contact
  /// address, a chosen method, or an enrolled authenticator.
  pub fn is_registered(&self) -> bool {
    self.mail.as_deref().is_some_and(|mail| !mail.trim().is_empty())
      || self.phone.as_deref().is_some_and(|phone| !phone.trim().is_empty())
      || self.preferred_method != PreferredMethod::Choose
      || self.totp_enabled
  }

  /// Method used for the next login. An administrative override beats the
  /// user's own preference.
  pub fn active_method(&self) -> PreferredMethod {
    self.override_method.unwrap_or(self.preferred_method)
  }
}

fn pin_shape_ok(pin: &str) -> bool {
  (4..=9).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit())
}

fn deserialize_pin<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  match Option::<String>::deserialize(deserializer)? {
    Some(pin) if !pin_shape_ok(&pin) => {
      Err(serde::de::Error::custom("pin must be 4 to 9 ascii digits"))
    }
    pin => Ok(pin),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_registration_is_blank() {
    let reg = Registration::new("ada@example.org");
    assert_eq!(reg.upn, "ada@example.org");
    assert!(reg.enabled);
    assert!(!reg.is_registered());
    assert_eq!(reg.active_method(), PreferredMethod::Choose);
    assert!(reg.pin().is_none());
  }

  #[test]
  fn test_pin_keeps_leading_zeros() {
    let mut reg = Registration::new("ada@example.org");
    reg.set_pin(Some("0042")).unwrap();
    assert_eq!(reg.pin(), Some("0042"));

    reg.set_pin(None).unwrap();
    assert!(reg.pin().is_none());
  }

  #[test]
  fn test_pin_rejects_bad_shapes() {
    let mut reg = Registration::new("ada@example.org");
    for bad in ["123", "1234567890", "12a4", "½234", ""] {
      assert!(matches!(reg.set_pin(Some(bad)), Err(FedMfaError::InvalidPin)), "pin {bad:?}");
    }
    assert!(reg.pin().is_none());
  }

  #[test]
  fn test_is_registered_derivation() {
    let mut reg = Registration::new("ada@example.org");
    assert!(!reg.is_registered());

    reg.mail = Some("  ".to_string());
    assert!(!reg.is_registered());

    reg.mail = Some("ada@example.org".to_string());
    assert!(reg.is_registered());

    reg.mail = None;
    reg.totp_enabled = true;
    assert!(reg.is_registered());

    reg.totp_enabled = false;
    reg.preferred_method = PreferredMethod::External;
    assert!(reg.is_registered());
  }

  #[test]
  fn test_override_beats_preference() {
    let mut reg = Registration::new("ada@example.org");
    reg.preferred_method = PreferredMethod::Email;
    assert_eq!(reg.active_method(), PreferredMethod::Email);

    reg.override_method = Some(PreferredMethod::Code);
    assert_eq!(reg.active_method(), PreferredMethod::Code);
  }

  #[test]
  fn test_serde_round_trip() {
    let mut reg = Registration::new("ada@example.org");
    reg.set_pin(Some("031337")).unwrap();
    reg.preferred_method = PreferredMethod::Code;

    let json = serde_json::to_string(&reg).unwrap();
    assert!(json.contains("\"preferred_method\":\"code\""));

    let back: Registration = serde_json::from_str(&json).unwrap();
    assert_eq!(back, reg);
  }

  #[test]
  fn test_wire_records_follow_the_pin_rules() {
    let wire = |pin: serde_json::Value| {
      serde_json::json!({
        "id": Uuid::new_v4(),
        "upn": "ada@example.org",
        "enabled": true,
        "preferred_method": "choose",
        "pin": pin,
        "totp_enabled": false,
      })
    };

    assert!(serde_json::from_value::<Registration>(wire("12".into())).is_err());
    assert!(serde_json::from_value::<Registration>(wire("12a4".into())).is_err());

    let reg: Registration = serde_json::from_value(wire("0042".into())).unwrap();
    assert_eq!(reg.pin(), Some("0042"));

    let reg: Registration = serde_json::from_value(wire(serde_json::Value::Null)).unwrap();
    assert!(reg.pin().is_none());

    // A record written before the field existed still loads.
    let mut bare = wire(serde_json::Value::Null);
    bare.as_object_mut().unwrap().remove("pin");
    let reg: Registration = serde_json::from_value(bare).unwrap();
    assert!(reg.pin().is_none());
  }
}
