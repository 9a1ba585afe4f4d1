//! Execution context threaded through the consensus core.
//!
//! The ballot aggregation core never reads the system clock or the OS
//! entropy directly. Instead every operation which needs the current time
//! (ballot signing, voteproof finishing, timespan checks) or randomness
//! receives a `Ctx`. Production code constructs it once via `root()`,
//! tests construct it via `test_root()` with a `ManualClock`, which makes
//! the observable behavior deterministic.
use crate::time;
use std::{fmt, sync::Arc};

mod clock;
mod rng;
mod testonly;

pub use clock::*;
pub use testonly::*;

/// Context of the current computation: the clock it observes
/// and the source of its randomness.
///
/// `Ctx` is cheap to pass by reference and is shared between
/// concurrent handlers of the same node.
pub struct Ctx(Arc<Inner>);

/// Inner representation of the context.
struct Inner {
    clock: Clock,
    rng_provider: rng::Provider,
}

/// Constructs a top-level context.
/// Should be called only at the start of the `main()` function of the binary.
pub fn root() -> Ctx {
    Ctx(Arc::new(Inner {
        clock: RealClock.into(),
        rng_provider: rng::Provider::real(),
    }))
}

impl fmt::Debug for Ctx {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Ctx").finish_non_exhaustive()
    }
}

impl Ctx {
    /// Constructs a context sharing the rng of `self`, but observing `clock`.
    fn with_clock(&self, clock: Clock) -> Self {
        Self(Arc::new(Inner {
            clock,
            rng_provider: self.0.rng_provider.split(),
        }))
    }

    /// Current time according to the monotone clock.
    pub fn now(&self) -> time::Instant {
        self.0.clock.now()
    }

    /// Current time according to the system/walltime clock.
    pub fn now_utc(&self) -> time::Utc {
        self.0.clock.now_utc()
    }

    /// Constructs a new pseudorandom generator.
    /// In tests the generator is derived deterministically from the context,
    /// so that the test runs are reproducible.
    pub fn rng(&self) -> rand::rngs::StdRng {
        self.0.rng_provider.rng()
    }
}
