//! Pipeline contract: a middleware sees each action once and either handles
//! it or passes it to `next`.
//!
//! ```text
//!   dispatch(action) → mw[0] → mw[1] → ... → reducer
//!                        │
//!                        └── dispatcher.dispatch(follow_up)  (re-enters at mw[0])
//! ```

use std::fmt;
use std::sync::Arc;

/// Handle that feeds an action back into the start of the pipeline.
///
/// Cheap to clone and callable from any thread.
pub struct Dispatcher<A> {
    inner: Arc<dyn Fn(A) + Send + Sync>,
}

impl<A> Dispatcher<A> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn dispatch(&self, action: A) {
        (self.inner)(action);
    }
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for Dispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dispatcher")
    }
}

/// A stage in the dispatch pipeline.
pub trait Middleware<A>: Send + Sync {
    /// Handle `action`. Call `next.run(..)` to forward it.
    fn handle(&self, action: A, next: Next<'_, A>);
}

/// The rest of the pipeline after the current middleware.
pub struct Next<'a, A> {
    chain: &'a [Box<dyn Middleware<A>>],
    terminal: &'a dyn Fn(A),
}

impl<'a, A> Next<'a, A> {
    pub fn new(chain: &'a [Box<dyn Middleware<A>>], terminal: &'a dyn Fn(A)) -> Self {
        Self { chain, terminal }
    }

    /// Forward `action` to the next stage.
    pub fn run(self, action: A) {
        match self.chain.split_first() {
            Some((head, rest)) => head.handle(action, Next::new(rest, self.terminal)),
            None => (self.terminal)(action),
        }
    }
}
