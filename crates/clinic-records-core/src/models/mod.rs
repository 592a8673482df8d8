//! Domain models for the clinic patient register.

mod patient;
mod summary;

pub use patient::*;
pub use summary::*;
