//! Cryptographic keys representing the validator role.
//! A validator signs ballots (their facts and their bodies) with an ed25519 key,
//! always mixing the network id into the signed message to prevent
//! replaying ballots across networks.

mod public_key;
mod secret_key;
mod signature;
mod testonly;
#[cfg(test)]
mod tests;

pub use isaac_consensus_crypto::ed25519::InvalidSignatureError;
pub use public_key::PublicKey;
pub use secret_key::SecretKey;
pub use signature::Signature;
