pub mod bracket;
pub mod fee;
pub mod vault;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod config;
mod engine;
mod error;
mod ids;
mod layer;
mod state;
mod transfer;

pub use config::{Config, ConfigError, ValidatedConfig};
pub use engine::Engine;
pub use error::Error;
pub use fee::FeePolicy;
pub use ids::{IdGenerator, Sequential};
pub use layer::Layer;
pub use state::{Memory, State};
pub use transfer::{Ledger, Transfer, TransferError};
