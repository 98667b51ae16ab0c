//! Shared types: identifiers, tariff and power values, the product catalog,
//! billing policy configuration, reference sequences and the error type.

mod catalog;
mod config;
mod error;
mod numbering;
mod types;

pub use catalog::*;
pub use config::*;
pub use error::*;
pub use numbering::*;
pub use types::*;
