//! Domain models for the drug usage engine.

mod aggregate;
mod record;
mod resolution;

pub use aggregate::*;
pub use record::*;
pub use resolution::*;
