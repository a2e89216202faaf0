//! Certificate boundary for the RSA key format.

use rsa::{Oaep, RsaPrivateKey, RsaPublicKey, pkcs8::EncodePublicKey, traits::PublicKeyParts};
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::{
  error::{FedMfaError, FedMfaResult},
  rng::GlobalRng,
};

/// Asymmetric sealing the RSA key format builds on.
///
/// Hosts typically wrap a certificate-store handle; [`LocalRsaProvider`] is the
/// self-contained implementation for development and single-node deployments.
pub trait CertificateProvider: Send + Sync {
  /// Identifier of the underlying certificate, for logs and key audits.
  fn thumbprint(&self) -> &str;
  /// Largest plaintext a single [`CertificateProvider::encrypt`] call accepts.
  fn max_encrypt_len(&self) -> usize;
  fn encrypt(&self, plaintext: &[u8]) -> FedMfaResult<Vec<u8>>;
  fn decrypt(&self, ciphertext: &[u8]) -> FedMfaResult<Vec<u8>>;
}

/// Round-trips a fixed sample through the provider.
///
/// Run once at startup: a provider that cannot open what it sealed would
/// otherwise mint keys nobody can ever validate.
pub fn probe(provider: &dyn CertificateProvider) -> FedMfaResult<()> {
  const SAMPLE: &[u8] = b"fedmfa certificate probe";

  let sealed =
    provider.encrypt(SAMPLE).map_err(|err| FedMfaError::CertificateProbe(err.to_string()))?;
  let opened =
    provider.decrypt(&sealed).map_err(|err| FedMfaError::CertificateProbe(err.to_string()))?;
  if opened == SAMPLE {
    Ok(())
  } else {
    Err(FedMfaError::CertificateProbe("round-trip mismatch".to_string()))
  }
}

/// RSA-OAEP-SHA256 provider over a locally held keypair.
pub struct LocalRsaProvider {
  private:    RsaPrivateKey,
  public:     RsaPublicKey,
  thumbprint: String,
}

impl LocalRsaProvider {
  /// Generates a fresh keypair of `bits` modulus size.
  pub fn generate(bits: usize) -> FedMfaResult<Self> {
    let private = RsaPrivateKey::new(&mut GlobalRng, bits)?;
    Self::from_key(private)
  }

  /// Wraps an existing private key, deriving the thumbprint from the SHA-1 of
  /// the public key DER the way certificate stores label their entries.
  pub fn from_key(private: RsaPrivateKey) -> FedMfaResult<Self> {
    let public = RsaPublicKey::from(&private);
    let der =
      public.to_public_key_der().map_err(|err| FedMfaError::Certificate(err.to_string()))?;
    let thumbprint = hex::encode_upper(Sha1::digest(der.as_bytes()));
    Ok(Self { private, public, thumbprint })
  }
}

impl CertificateProvider for LocalRsaProvider {
  fn thumbprint(&self) -> &str { &self.thumbprint }

  fn max_encrypt_len(&self) -> usize {
    // OAEP overhead is 2 * hash length + 2.
    self.public.size().saturating_sub(2 * Sha256::output_size() + 2)
  }

  fn encrypt(&self, plaintext: &[u8]) -> FedMfaResult<Vec<u8>> {
    Ok(self.public.encrypt(&mut GlobalRng, Oaep::new::<Sha256>(), plaintext)?)
  }

  fn decrypt(&self, ciphertext: &[u8]) -> FedMfaResult<Vec<u8>> {
    Ok(self.private.decrypt(Oaep::new::<Sha256>(), ciphertext)?)
  }
}
