//! Local consensus state shared between the ballot handlers.
use crate::policy::Policy;
use isaac_concurrency::sync::{self, watch};
use isaac_consensus_roles::validator::{self, Manifest, Suffrage, Voteproof};
use std::sync::Arc;

/// Consistent copy of the local state, taken by `LocalState::snapshot()`.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Last stored block.
    pub last_block: Arc<Manifest>,
    /// Last finished INIT voteproof.
    pub last_init_voteproof: Option<Arc<Voteproof>>,
    /// Last finished ACCEPT voteproof.
    pub last_accept_voteproof: Option<Arc<Voteproof>>,
    /// Local policy.
    pub policy: Arc<Policy>,
    /// Acting suffrage.
    pub suffrage: Arc<Suffrage>,
}

/// Local consensus state.
///
/// Each value lives in its own watch cell: writers replace it as a whole,
/// readers clone the `Arc`s out without holding any lock afterwards.
#[derive(Debug)]
pub struct LocalState {
    last_block: watch::Sender<Arc<Manifest>>,
    last_init_voteproof: watch::Sender<Option<Arc<Voteproof>>>,
    last_accept_voteproof: watch::Sender<Option<Arc<Voteproof>>>,
    policy: watch::Sender<Arc<Policy>>,
    suffrage: watch::Sender<Arc<Suffrage>>,
}

fn cell<T>(v: T) -> watch::Sender<T> {
    watch::channel(v).0
}

/// Position of a voteproof, in the order in which the consensus advances.
fn position(vp: &Voteproof) -> (validator::Height, validator::Round) {
    (vp.height(), vp.round())
}

impl LocalState {
    /// Constructs the state of a node whose last block is `last_block`.
    pub fn new(last_block: Manifest, policy: Policy, suffrage: Suffrage) -> Self {
        Self {
            last_block: cell(Arc::new(last_block)),
            last_init_voteproof: cell(None),
            last_accept_voteproof: cell(None),
            policy: cell(Arc::new(policy)),
            suffrage: cell(Arc::new(suffrage)),
        }
    }

    /// Takes a snapshot of the state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            last_block: self.last_block.borrow().clone(),
            last_init_voteproof: self.last_init_voteproof.borrow().clone(),
            last_accept_voteproof: self.last_accept_voteproof.borrow().clone(),
            policy: self.policy.borrow().clone(),
            suffrage: self.suffrage.borrow().clone(),
        }
    }

    /// Subscribes to the last block.
    pub fn subscribe_last_block(&self) -> watch::Receiver<Arc<Manifest>> {
        self.last_block.subscribe()
    }

    /// Sets the last block. Blocks below the current one are ignored.
    /// Returns whether the block was set.
    pub fn set_last_block(&self, block: Manifest) -> bool {
        sync::try_replace(&self.last_block, |old| {
            (block.height >= old.height).then(|| Arc::new(block))
        })
    }

    /// Sets the last INIT voteproof, unless it would move the state backwards.
    /// Returns whether the voteproof was set.
    pub fn set_last_init_voteproof(&self, vp: Voteproof) -> bool {
        Self::advance_voteproof(&self.last_init_voteproof, validator::Stage::Init, vp)
    }

    /// Sets the last ACCEPT voteproof, unless it would move the state backwards.
    /// Returns whether the voteproof was set.
    pub fn set_last_accept_voteproof(&self, vp: Voteproof) -> bool {
        Self::advance_voteproof(&self.last_accept_voteproof, validator::Stage::Accept, vp)
    }

    fn advance_voteproof(
        cell: &watch::Sender<Option<Arc<Voteproof>>>,
        stage: validator::Stage,
        vp: Voteproof,
    ) -> bool {
        if vp.stage() != stage || !vp.is_finished() {
            return false;
        }
        sync::try_replace(cell, |old| match old {
            Some(old) if position(old) >= position(&vp) => None,
            _ => Some(Some(Arc::new(vp))),
        })
    }

    /// Replaces the policy. The policy has to be valid.
    pub fn set_policy(&self, policy: Policy) -> Result<(), crate::policy::PolicyError> {
        policy.validate()?;
        self.policy.send_replace(Arc::new(policy));
        Ok(())
    }

    /// Replaces the acting suffrage.
    pub fn set_suffrage(&self, suffrage: Suffrage) {
        self.suffrage.send_replace(Arc::new(suffrage));
    }
}
