//! Synchronization primitives shared between the consensus handlers.
//!
//! Shared consensus state (policy, last block, last voteproofs) is published
//! through `watch` channels: writers replace the whole value, readers take
//! a consistent snapshot by cloning the current value, and no lock is held
//! while the snapshot is being used.
pub use tokio::sync::watch;

/// Takes a snapshot of the current value of a watch channel.
pub fn snapshot<T: Clone>(recv: &watch::Receiver<T>) -> T {
    recv.borrow().clone()
}

/// Replaces the value of a watch channel if `f` returns a new one.
/// Returns whether the value was replaced.
/// The value is replaced even if there are no receivers.
pub fn try_replace<T>(send: &watch::Sender<T>, f: impl FnOnce(&T) -> Option<T>) -> bool {
    send.send_if_modified(|v| match f(v) {
        Some(new) => {
            *v = new;
            true
        }
        None => false,
    })
}
