//! Process-wide CSPRNG facade.
//!
//! Key material, IVs and dummy verification secrets all draw from here. With the
//! `differential-test` feature the source is a seeded ChaCha20 stream so fixture
//! runs are reproducible; otherwise it is the operating system RNG.

#[cfg(feature = "differential-test")]
mod rng_impl {
  use std::cell::RefCell;

  use rand::{CryptoRng, RngCore, SeedableRng};
  use rand_chacha::ChaCha20Rng;

  const DEFAULT_SEED: [u8; 32] = [7u8; 32];
  thread_local! {
    static RNG: RefCell<ChaCha20Rng> = RefCell::new(ChaCha20Rng::from_seed(DEFAULT_SEED));
  }

  pub struct GlobalRng;

  impl RngCore for GlobalRng {
    fn next_u32(&mut self) -> u32 { RNG.with(|rng| rng.borrow_mut().next_u32()) }

    fn next_u64(&mut self) -> u64 { RNG.with(|rng| rng.borrow_mut().next_u64()) }

    fn fill_bytes(&mut self, dest: &mut [u8]) { RNG.with(|rng| rng.borrow_mut().fill_bytes(dest)) }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
      RNG.with(|rng| rng.borrow_mut().try_fill_bytes(dest))
    }
  }
  impl CryptoRng for GlobalRng {}

  pub fn fill_bytes(dst: &mut [u8]) { RNG.with(|rng| rng.borrow_mut().fill_bytes(dst)); }
}

#[cfg(not(feature = "differential-test"))]
mod rng_impl {
  use rand::{CryptoRng, RngCore, rngs::OsRng};

  pub struct GlobalRng;

  impl RngCore for GlobalRng {
    fn next_u32(&mut self) -> u32 { OsRng.next_u32() }

    fn next_u64(&mut self) -> u64 { OsRng.next_u64() }

    fn fill_bytes(&mut self, dest: &mut [u8]) { OsRng.fill_bytes(dest) }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
      OsRng.try_fill_bytes(dest)
    }
  }
  impl CryptoRng for GlobalRng {}

  pub fn fill_bytes(dst: &mut [u8]) { OsRng.fill_bytes(dst); }
}

pub use rng_impl::*;
