//! Ledger primitives and cbor codec for the Conway era

mod model;
mod script_data;

pub use model::*;
pub use script_data::*;
