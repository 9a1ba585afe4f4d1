//! Messages exchanged between validators, and the certificates built from them.

mod ballot;
mod consensus;
mod fact;
mod hash;
mod manifest;
mod suffrage;
pub mod tally;
mod testonly;
#[cfg(test)]
mod tests;
mod threshold;
mod voteproof;

pub use ballot::*;
pub use consensus::*;
pub use fact::*;
pub use hash::*;
pub use manifest::*;
pub use suffrage::*;
pub use threshold::*;
pub use voteproof::*;
