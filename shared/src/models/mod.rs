//! Domain models for the Retail Back-Office Platform

mod closing;
mod receiving;
mod reversal;

pub use closing::*;
pub use receiving::*;
pub use reversal::*;
