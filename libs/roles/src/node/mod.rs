//! Node role implementation.
//!
//! A node is identified by its `Address`, a short printable string
//! chosen by the operator. Validator keys are bound to addresses by the suffrage.

use std::fmt;

mod testonly;

/// Maximal length of an address in bytes.
pub const MAX_ADDRESS_LEN: usize = 100;

/// Address of a node.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

/// Error returned when constructing an `Address` from an invalid string.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    /// Address is empty.
    #[error("empty address")]
    Empty,
    /// Address is too long.
    #[error("address too long: {len} > {MAX_ADDRESS_LEN}")]
    TooLong {
        /// Length of the rejected address.
        len: usize,
    },
    /// Address contains whitespace or control characters.
    #[error("address {0:?} contains whitespace or control characters")]
    InvalidCharacter(String),
}

impl Address {
    /// Constructs an address, validating its format.
    pub fn new(s: impl Into<String>) -> Result<Self, AddressError> {
        let s = s.into();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        if s.len() > MAX_ADDRESS_LEN {
            return Err(AddressError::TooLong { len: s.len() });
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(AddressError::InvalidCharacter(s));
        }
        Ok(Self(s))
    }

    /// Address as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bytes of the address, as included in the signed ballot envelope.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "node:{}", self.0)
    }
}
