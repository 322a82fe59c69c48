//! Interceptor pipeline.
//!
//! Each instance owns two ordered registries: one for request configs and
//! one for responses. A call runs the request stage in reverse registration
//! order, then the dispatcher, then the response stage in registration order.
//! Every stage is a `Result` transition: a fulfilled handler sees successes,
//! a rejected handler sees errors and may recover.
//!
//! # Example
//!
//! ```
//! use axios_fetch::{Interceptor, InterceptorManager, RequestConfig};
//!
//! let manager = InterceptorManager::<RequestConfig>::new();
//! let id = manager.use_interceptor(Interceptor::new().fulfilled(|config: RequestConfig| async move {
//!     Ok(config.header("x-request-id", "abc-123"))
//! }));
//! assert_eq!(manager.len(), 1);
//! assert!(manager.eject(id));
//! assert!(manager.is_empty());
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::RequestConfig;
use crate::error::Error;
use crate::response::Response;

/// Boxed future type for async interceptors and transports.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handler applied to a successful value.
pub type OnFulfilled<V> = Arc<dyn Fn(V) -> BoxFuture<'static, Result<V, Error>> + Send + Sync>;

/// Handler applied to an error. Returning `Ok` recovers the chain.
pub type OnRejected<V> = Arc<dyn Fn(Error) -> BoxFuture<'static, Result<V, Error>> + Send + Sync>;

// ============================================================================
// Interceptor
// ============================================================================

/// A pair of optional handlers registered as one pipeline stage.
///
/// A missing handler passes its input through unchanged.
pub struct Interceptor<V> {
    fulfilled: Option<OnFulfilled<V>>,
    rejected: Option<OnRejected<V>>,
}

impl<V: Send + 'static> Interceptor<V> {
    /// Create a pass-through interceptor.
    pub fn new() -> Self {
        Self {
            fulfilled: None,
            rejected: None,
        }
    }

    /// Set the handler for successful values.
    pub fn fulfilled<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, Error>> + Send + 'static,
    {
        self.fulfilled = Some(Arc::new(move |value: V| -> BoxFuture<'static, Result<V, Error>> {
            Box::pin(handler(value))
        }));
        self
    }

    /// Set the handler for errors.
    pub fn rejected<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, Error>> + Send + 'static,
    {
        self.rejected = Some(Arc::new(move |err: Error| -> BoxFuture<'static, Result<V, Error>> {
            Box::pin(handler(err))
        }));
        self
    }

    /// Apply this stage to the current chain state.
    pub(crate) async fn apply(&self, state: Result<V, Error>) -> Result<V, Error> {
        match state {
            Ok(value) => match &self.fulfilled {
                Some(handler) => handler(value).await,
                None => Ok(value),
            },
            Err(err) => match &self.rejected {
                Some(handler) => handler(err).await,
                None => Err(err),
            },
        }
    }
}

impl<V: Send + 'static> Default for Interceptor<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for Interceptor<V> {
    fn clone(&self) -> Self {
        Self {
            fulfilled: self.fulfilled.clone(),
            rejected: self.rejected.clone(),
        }
    }
}

impl<V> fmt::Debug for Interceptor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("fulfilled", &self.fulfilled.is_some())
            .field("rejected", &self.rejected.is_some())
            .finish()
    }
}

// ============================================================================
// InterceptorManager
// ============================================================================

/// Handle returned by [`InterceptorManager::use_interceptor`].
///
/// Ids are slot indices: they are never reused, even after ejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InterceptorId(usize);

impl InterceptorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// An ordered registry of interceptors.
///
/// Clones share the same registry. Registering or ejecting while a call is
/// in flight does not affect that call: each call takes a snapshot.
pub struct InterceptorManager<V> {
    handlers: Arc<RwLock<Vec<Option<Interceptor<V>>>>>,
}

impl<V: Send + 'static> InterceptorManager<V> {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register an interceptor, returning its id.
    pub fn use_interceptor(&self, interceptor: Interceptor<V>) -> InterceptorId {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.push(Some(interceptor));
        InterceptorId(handlers.len() - 1)
    }

    /// Register only a fulfilled handler.
    pub fn use_fulfilled<F, Fut>(&self, handler: F) -> InterceptorId
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, Error>> + Send + 'static,
    {
        self.use_interceptor(Interceptor::new().fulfilled(handler))
    }

    /// Disable the interceptor at `id`.
    ///
    /// Returns `false` for an unknown or already ejected id.
    pub fn eject(&self, id: InterceptorId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        match handlers.get_mut(id.0) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    /// Eject every interceptor. Previously issued ids stay retired.
    pub fn clear(&self) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        for slot in handlers.iter_mut() {
            *slot = None;
        }
    }

    /// Number of live interceptors.
    pub fn len(&self) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live interceptors in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Interceptor<V>> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.iter().flatten().cloned().collect()
    }
}

impl<V: Send + 'static> Default for InterceptorManager<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for InterceptorManager<V> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
        }
    }
}

impl<V: Send + 'static> fmt::Debug for InterceptorManager<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorManager")
            .field("len", &self.len())
            .finish()
    }
}

/// The request and response registries of one instance.
#[derive(Clone, Debug, Default)]
pub struct Interceptors {
    pub request: InterceptorManager<RequestConfig>,
    pub response: InterceptorManager<Response>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }
}
