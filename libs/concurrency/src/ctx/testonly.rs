use super::{rng, Clock, Ctx, Inner};
use std::sync::Arc;

/// Returns a root context with the given `clock`
/// and a deterministic RNG provider.
pub fn test_root<C: Clone + Into<Clock>>(clock: &C) -> Ctx {
    Ctx(Arc::new(Inner {
        clock: clock.clone().into(),
        rng_provider: rng::Provider::test(),
    }))
}

/// Returns a context with the given clock, sharing the rng lineage of `ctx`.
/// Useful for simulating nodes with independent (possibly skewed) clocks.
pub fn test_with_clock<C: Clone + Into<Clock>>(ctx: &Ctx, clock: &C) -> Ctx {
    ctx.with_clock(clock.clone().into())
}
