//! Validator role implementation.

mod keys;
mod messages;
pub mod testonly;

pub use self::{keys::*, messages::*};
