//! Small utilities shared by the consensus crates.

pub mod enum_util;
