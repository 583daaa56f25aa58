//! Shared schema types and helpers for the Mosaic editor crates.

pub mod error;
pub mod id_generator;
pub mod result;
pub mod schema;
pub mod visitor;

pub use error::*;
pub use id_generator::*;
pub use result::*;
pub use schema::*;
pub use visitor::*;
