pub mod cancel;
pub mod combinatorics;
pub mod counter;
pub mod error;
pub mod filter;
pub mod generator;
pub mod models;
pub mod ranking;
pub mod stats;

pub use error::{LottoError, Result};
