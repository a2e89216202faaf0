//! Provisioning URIs for authenticator enrollment.

#[cfg(feature = "qr")]
use crate::error::{FedMfaError, FedMfaResult};
use crate::otp::HashMode;

/// Builds the `otpauth://` URI an authenticator app scans during enrollment.
///
/// Field order is fixed (`secret`, `issuer`, `algorithm`) because deployed
/// clients compare these URIs textually. Values are interpolated as-is; hosts
/// pick issuer labels that are URI-safe.
pub fn provisioning_uri(issuer: &str, upn: &str, encoded_secret: &str, mode: HashMode) -> String {
  format!("otpauth://totp/{issuer}:{upn}?secret={encoded_secret}&issuer={issuer}&algorithm={mode}")
}

/// Renders a provisioning URI as an SVG QR code, returned as a `data:` URI
/// ready to drop into an `img` tag.
#[cfg(feature = "qr")]
pub fn provisioning_qr_data_uri(uri: &str) -> FedMfaResult<String> {
  use base64::{Engine as _, engine::general_purpose};
  use qrcode::{QrCode, render::svg};

  let code = QrCode::new(uri.as_bytes()).map_err(|err| FedMfaError::Qr(err.to_string()))?;
  let svg = code.render::<svg::Color>().min_dimensions(240, 240).build();
  Ok(format!("data:image/svg+xml;base64,{}", general_purpose::STANDARD.encode(svg.as_bytes())))
}
