//! Native stack growth for the recursive parser and evaluator.
//!
//! When less than the red zone remains, `stacker` continues on a
//! heap-allocated segment, so `MAX_CALL_DEPTH` is reached on any host thread.

/// Grow when less than this is left.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const STACK_PER_SEGMENT: usize = 2 * 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
