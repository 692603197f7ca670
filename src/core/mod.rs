//! Error taxonomy and per-call options shared by the embedding pipeline
//! and the service layer.

mod error;
mod options;

pub use error::*;
pub use options::*;
