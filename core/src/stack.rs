//! file: core/src/stack.rs
//! description: run the recursive passes on a thread sized for them.
//!
//! Parsing, reading and lowering each recurse once per level of nesting.
//! They run on a scoped worker whose stack grows with
//! `BuildOptions::max_depth`, so input at the limit is rejected with an error
//! instead of overflowing the caller's stack.
use std::io;
use std::thread;

/// Stack reserved per level of nesting. The heaviest constructs use about
/// half of this in unoptimized builds.
pub const STACK_PER_LEVEL: usize = 64 * 1024;

/// Stack for the worker itself, before any nesting.
const BASE_STACK: usize = 1024 * 1024;

pub fn stack_size_for(max_depth: usize) -> usize {
    BASE_STACK.saturating_add(max_depth.saturating_mul(STACK_PER_LEVEL))
}

/// Run `f` to completion on a worker with room for `max_depth` levels.
/// A panic in `f` is resumed on the calling thread.
pub(crate) fn run_with_stack<T, F>(name: &str, max_depth: usize, f: F) -> io::Result<T>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    let size = stack_size_for(max_depth);
    log::trace!("running {} on a {} byte stack", name, size);
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .stack_size(size)
            .spawn_scoped(scope, f)?;
        match handle.join() {
            Ok(value) => Ok(value),
            Err(payload) => std::panic::resume_unwind(payload),
        }
    })
}
