//! Concurrency primitives shared by the consensus crates.

pub mod ctx;
pub mod sync;
pub mod testonly;
pub mod time;
