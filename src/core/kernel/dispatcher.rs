use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::error;

/// A registered message callback
pub type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered observer registry with synchronous fan-out.
///
/// Cloning yields another handle onto the same registry. `dispatch` runs on
/// the caller's task against a snapshot taken under the read lock, so an
/// observer registered mid-dispatch only sees later messages.
pub struct Dispatcher<T> {
    observers: Arc<RwLock<Vec<Observer<T>>>>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            observers: Arc::clone(&self.observers),
        }
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self {
            observers: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl<T> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("observers", &self.len())
            .finish()
    }
}

impl<T> Dispatcher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer; returns the number of registered observers
    pub fn register<F>(&self, observer: F) -> usize
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        observers.push(Arc::new(observer));
        observers.len()
    }

    /// Deliver `message` to every observer in registration order.
    ///
    /// A panicking observer is logged and skipped; the rest still run.
    pub fn dispatch(&self, message: &T) {
        let snapshot: Vec<Observer<T>> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (index, observer) in snapshot.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| observer(message))).is_err() {
                error!(observer = index, "Message observer panicked; continuing dispatch");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
