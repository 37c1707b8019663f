//! Observable state containers.

use std::sync::Arc;

use tokio::sync::watch;

/// A state slice that changes only through its actions.
pub trait Reducer: Clone + Send + Sync + 'static {
    type Action;

    fn reduce(&mut self, action: Self::Action);
}

/// Shared handle to one slice. Clones point at the same state; every
/// dispatch wakes all subscribers.
pub struct StateHandle<S> {
    tx: Arc<watch::Sender<S>>,
}

impl<S> Clone for StateHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<S: Reducer> StateHandle<S> {
    pub fn new(initial: S) -> Self {
        Self {
            tx: Arc::new(watch::channel(initial).0),
        }
    }

    pub fn dispatch(&self, action: S::Action) {
        self.tx.send_modify(|state| state.reduce(action));
    }

    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Read without cloning the whole slice.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}

impl<S: Reducer + Default> Default for StateHandle<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
