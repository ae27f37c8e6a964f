//! Records shared by the gambit escrow engine and its callers.
//!
//! Everything stored by the engine implements the `commonware-codec`
//! traits so a state backend can persist it byte-for-byte.

pub mod escrow;
pub mod execution;

pub use commonware_cryptography::ed25519::PublicKey;
