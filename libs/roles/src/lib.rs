//! Roles of the nodes taking part in the ISAAC consensus, and the messages they exchange.
//!
//! - `node`: identity of a node in the network. Every node has this role.
//! - `validator`: a node of the acting suffrage, which signs ballots and
//!   aggregates them into voteproofs.

pub mod node;
pub mod validator;
