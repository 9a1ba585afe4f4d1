//! Non-global clock, owned by ctx::Ctx.
//! Functions which use system clock directly are non-hermetic, which
//! makes them effectively non-deterministic and hard to test.
//!
//! Clock provides 2 types of time reads:
//! 1. now() (aka POSIX CLOCK_MONOTONIC, aka std::time::Instant)
//!    should be used for measuring the latency of operations
//!    as observed by the machine.
//! 2. now_utc() (aka POSIX CLOCK_REALTIME, aka std::time::SystemTime)
//!    expected to approximate the (global) UTC time. Ballots are stamped
//!    with it, and peers compare it against their own clocks, so
//!    it should be used whenever a timestamp is communicated over the network.
use crate::time;
use once_cell::sync::Lazy;
use std::{
    fmt,
    sync::{Arc, Mutex},
};

// Instant doesn't have a deterministic constructor.
// However since Instant is not convertible to an unix timestamp,
// we can snapshot Instant::now() once and treat it as a constant.
static FAKE_CLOCK_MONO_START: Lazy<time::Instant> = Lazy::new(time::Instant::now);

// An arbitrary non-trivial deterministic UTC timestamp,
// so that tests using the fake clock have reproducible results.
const FAKE_CLOCK_UTC_START: time::Utc = time::Utc(time::Duration::new(1_589_328_402, 371_000_000));

/// Realtime clock.
#[derive(Clone)]
pub struct RealClock;

impl RealClock {
    /// Current time according to the monotone clock.
    pub fn now(&self) -> time::Instant {
        // We use `now()` from tokio, so that `tokio::time::pause()`
        // works in tests.
        tokio::time::Instant::now().into_std().into()
    }

    /// Current time according to the system/walltime clock.
    pub fn now_utc(&self) -> time::Utc {
        use std::time::SystemTime as T;
        time::Utc(match T::now().duration_since(T::UNIX_EPOCH) {
            Ok(duration) => time::Duration::try_from(duration).unwrap(),
            Err(err) => -time::Duration::try_from(err.duration()).unwrap(),
        })
    }
}

struct ManualState {
    /// Current time of the monotonic clock.
    mono: time::Instant,
    /// Current UTC time.
    utc: time::Utc,
}

impl fmt::Debug for ManualState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ManualState")
            .field("utc", &self.utc)
            .finish_non_exhaustive()
    }
}

/// Fake clock which supports manually advancing the time.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<Mutex<ManualState>>);

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Constructs a manual clock set to a default value of now.
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(ManualState {
            mono: *FAKE_CLOCK_MONO_START,
            utc: FAKE_CLOCK_UTC_START,
        })))
    }

    /// Current time according to the monotone clock.
    pub fn now(&self) -> time::Instant {
        self.0.lock().unwrap().mono
    }

    /// Current time according to the system/walltime clock.
    pub fn now_utc(&self) -> time::Utc {
        self.0.lock().unwrap().utc
    }

    /// Advances monotonic and utc clocks by `d`.
    pub fn advance(&self, d: time::Duration) {
        assert!(d >= time::Duration::ZERO);
        let mut this = self.0.lock().unwrap();
        this.mono += d;
        this.utc += d;
    }

    /// Sets the UTC clock to a specific value.
    /// It doesn't affect the monotone clock.
    /// Use it to simulate a node with a skewed wall clock.
    pub fn set_utc(&self, utc: time::Utc) {
        self.0.lock().unwrap().utc = utc;
    }
}

/// An abstract clock.
/// We use a concrete enum rather than a trait to
/// avoid abstract method call in runtime.
#[derive(Clone)]
pub enum Clock {
    /// Realtime clock.
    Real(RealClock),
    /// Manual clock.
    Manual(ManualClock),
}

impl From<RealClock> for Clock {
    fn from(c: RealClock) -> Self {
        Self::Real(c)
    }
}

impl From<ManualClock> for Clock {
    fn from(c: ManualClock) -> Self {
        Self::Manual(c)
    }
}

impl Clock {
    /// Current time according to the monotone clock.
    pub fn now(&self) -> time::Instant {
        match self {
            Self::Real(c) => c.now(),
            Self::Manual(c) => c.now(),
        }
    }

    /// Current time according to the system/walltime clock.
    pub fn now_utc(&self) -> time::Utc {
        match self {
            Self::Real(c) => c.now_utc(),
            Self::Manual(c) => c.now_utc(),
        }
    }
}
