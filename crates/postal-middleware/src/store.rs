//! Minimal store: state, a reducer and a middleware chain.
//!
//! Enough pipeline to run [`crate::PostalMiddleware`] end to end. The state
//! lock is held only while the reducer runs, so middleware may dispatch
//! re-entrantly (a publish can deliver to the store's own subscription).

use crate::error::MiddlewareError;
use crate::middleware::{Dispatcher, Middleware, Next};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, warn};

type Reducer<S, A> = Box<dyn Fn(&mut S, &A) + Send + Sync>;
type Factory<A> =
    Box<dyn FnOnce(Dispatcher<A>) -> Result<Box<dyn Middleware<A>>, MiddlewareError>>;

struct StoreInner<S, A> {
    state: Mutex<S>,
    reducer: Reducer<S, A>,
    chain: OnceLock<Vec<Box<dyn Middleware<A>>>>,
}

impl<S, A> StoreInner<S, A> {
    fn dispatch(&self, action: A) {
        let reduce = |action: A| {
            let mut state = self.state.lock();
            (self.reducer)(&mut state, &action);
        };

        match self.chain.get() {
            Some(chain) => Next::new(chain, &reduce).run(action),
            None => {
                warn!("Dispatch during store construction, middleware skipped");
                reduce(action);
            }
        }
    }
}

/// A store. Clones share the same state.
pub struct Store<S, A> {
    inner: Arc<StoreInner<S, A>>,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> Store<S, A>
where
    S: Send + 'static,
    A: Send + 'static,
{
    pub fn builder<R>(initial: S, reducer: R) -> StoreBuilder<S, A>
    where
        R: Fn(&mut S, &A) + Send + Sync + 'static,
    {
        StoreBuilder {
            initial,
            reducer: Box::new(reducer),
            factories: Vec::new(),
        }
    }

    /// Run `action` through the middleware chain, then the reducer.
    pub fn dispatch(&self, action: A) {
        self.inner.dispatch(action);
    }

    /// Handle that dispatches into this store without keeping it alive.
    pub fn dispatcher(&self) -> Dispatcher<A> {
        weak_dispatcher(Arc::downgrade(&self.inner))
    }

    /// Read the state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.inner.state.lock())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.lock().clone()
    }
}

fn weak_dispatcher<S, A>(inner: Weak<StoreInner<S, A>>) -> Dispatcher<A>
where
    S: Send + 'static,
    A: Send + 'static,
{
    Dispatcher::new(move |action| match inner.upgrade() {
        Some(inner) => inner.dispatch(action),
        None => debug!("Store dropped, action discarded"),
    })
}

/// Builder for [`Store`].
pub struct StoreBuilder<S, A> {
    initial: S,
    reducer: Reducer<S, A>,
    factories: Vec<Factory<A>>,
}

impl<S, A> StoreBuilder<S, A>
where
    S: Send + 'static,
    A: Send + 'static,
{
    /// Append a middleware. The factory receives the store's dispatcher.
    ///
    /// Middleware run in the order they are added.
    #[must_use]
    pub fn middleware<F, M>(mut self, factory: F) -> Self
    where
        F: FnOnce(Dispatcher<A>) -> Result<M, MiddlewareError> + 'static,
        M: Middleware<A> + 'static,
    {
        self.factories.push(Box::new(move |dispatcher| {
            factory(dispatcher).map(|m| Box::new(m) as Box<dyn Middleware<A>>)
        }));
        self
    }

    /// Build every middleware and return the store.
    pub fn build(self) -> Result<Store<S, A>, MiddlewareError> {
        let inner = Arc::new(StoreInner {
            state: Mutex::new(self.initial),
            reducer: self.reducer,
            chain: OnceLock::new(),
        });

        let mut chain = Vec::with_capacity(self.factories.len());
        for factory in self.factories {
            chain.push(factory(weak_dispatcher(Arc::downgrade(&inner)))?);
        }
        debug!(middleware = chain.len(), "Store built");

        // Fresh cell: cannot already be set.
        let _ = inner.chain.set(chain);

        Ok(Store { inner })
    }
}
