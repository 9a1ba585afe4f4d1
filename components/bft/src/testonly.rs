//! Test-only utilities.
use crate::{Config, LocalState, Policy};
use isaac_consensus_roles::validator::testonly::Setup;

/// Policy matching the suffrage and threshold of `setup`.
pub fn policy(setup: &Setup) -> Policy {
    let mut policy = Policy::default();
    let n = u32::try_from(setup.keys.len()).unwrap();
    policy
        .set_number_of_acting_suffrage_nodes(n)
        .unwrap()
        .set_threshold_ratio(setup.percent)
        .unwrap();
    policy
}

/// Local state of a node which has stored only the genesis block of `setup`.
pub fn local_state(setup: &Setup) -> LocalState {
    LocalState::new(
        setup.genesis.clone(),
        policy(setup),
        setup.suffrage.clone(),
    )
}

/// Config of the `i`-th validator of `setup`.
pub fn config(setup: &Setup, i: usize) -> Config {
    Config {
        network_id: setup.network_id.clone(),
        secret_key: setup.keys[i].clone(),
        address: setup.addresses[i].clone(),
        policy: policy(setup),
    }
}
