//! Secret-key and one-time-password lifecycle core for a federation MFA adapter.
//!
//! The host hands in its storage and certificate boundaries; this crate owns
//! secret-key formats and scheme tagging, RFC 4226/6238 code generation with
//! shadow-window verification, authenticator provisioning and the pending-code
//! lifecycle.

pub mod base32;
pub mod certs;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod notification;
pub mod otp;
pub mod provider;
pub mod provisioning;
pub mod registration;
pub mod repository;
pub mod rng;

pub use error::{FedMfaError, FedMfaResult};
pub use provider::{CodeStatus, MfaProvider};
