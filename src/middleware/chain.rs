//! Immutable middleware chains.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::Constructor;
use crate::adapter::{BindContext, StripContext};
use crate::context::Context;
use crate::handler::{handler_fn, BoxHandler, BoxHttpHandler, Handler, HttpHandler};
use crate::request::Request;
use crate::response::ResponseWriter;
use crate::router::Router;

/// An ordered list of [`Constructor`]s plus the [`Context`] to start
/// requests with.
///
/// A `Chain` never changes after it is built. [`with`](Chain::with),
/// [`append`](Chain::append) and [`with_fallback`](Chain::with_fallback)
/// return a **new** chain and leave the receiver as it was:
///
/// ```rust
/// # use apollo::{Chain, Context};
/// let chain = Chain::default();
/// let cx = Context::background().with_value("user", 42_u32);
///
/// let _ = chain.with(cx.clone());        // result discarded: `chain` is unchanged
/// assert!(chain.context().is_background());
///
/// let chain = chain.with(cx.clone());    // rebind the name instead
/// assert_eq!(chain.context(), &cx);
/// ```
///
/// Cloning a chain is cheap: the constructor list is shared, not copied.
#[derive(Clone)]
#[must_use]
pub struct Chain {
    constructors: Arc<[Constructor]>,
    context: Context,
    fallback: BoxHttpHandler,
}

impl Chain {
    /// Creates a chain from `constructors`, copied into a list of its own.
    ///
    /// Constructors are not called here; they run on every call to
    /// [`then`](Chain::then). The context starts as
    /// [`Context::background`] and the fallback as an empty [`Router`].
    pub fn new(constructors: impl IntoIterator<Item = Constructor>) -> Self {
        Self {
            constructors: constructors.into_iter().collect(),
            context: Context::background(),
            fallback: Router::new().into_boxed(),
        }
    }

    /// Composes the chain around `handler` and returns the result, ready to
    /// install on a transport.
    ///
    /// ```text
    /// Chain::new([m1, m2, m3]).then(h)   ≡   m1(m2(m3(h)))
    /// ```
    ///
    /// A request passes through `m1`, then `m2`, then `m3`, then `h`, as far
    /// as each middleware calls through. The chain's context is handed to
    /// `m1`.
    ///
    /// A chain can be reused for several pipelines:
    ///
    /// ```rust,ignore
    /// let stack = Chain::new([rate_limit, csrf]);
    /// let index = stack.then(index_handler);
    /// let auth  = stack.then(auth_handler);
    /// ```
    ///
    /// Every call runs every constructor again, so each pipeline gets its
    /// own middleware instances.
    pub fn then(&self, handler: impl Handler) -> BindContext {
        self.then_or_fallback(Some(handler.into_boxed()))
    }

    /// Like [`then`](Chain::then), for a plain function.
    pub fn then_func<F>(&self, f: F) -> BindContext
    where
        F: Fn(&Context, &mut ResponseWriter, &mut Request) + Send + Sync + 'static,
    {
        self.then(handler_fn(f))
    }

    /// Composes the chain around the fallback handler.
    pub fn then_fallback(&self) -> BindContext {
        self.then_or_fallback(None)
    }

    /// Composes the chain around `handler`, or around the fallback handler
    /// when `handler` is `None`.
    pub fn then_or_fallback(&self, handler: Option<BoxHandler>) -> BindContext {
        let terminal = match handler {
            Some(handler) => handler,
            None => StripContext::new(Arc::clone(&self.fallback)).into_boxed(),
        };

        let composed = self
            .constructors
            .iter()
            .rev()
            .fold(terminal, |next, constructor| constructor.construct(next));

        trace!(layers = self.constructors.len(), "chain composed");
        BindContext::new(self.context.clone(), composed)
    }

    /// Returns a new chain running `constructors` after this chain's own.
    ///
    /// The receiver is untouched:
    ///
    /// ```rust,ignore
    /// let std_chain = Chain::new([m1, m2]);
    /// let ext_chain = std_chain.append([m3, m4]);
    /// // std_chain: m1 -> m2
    /// // ext_chain: m1 -> m2 -> m3 -> m4
    /// ```
    pub fn append(&self, constructors: impl IntoIterator<Item = Constructor>) -> Self {
        Self {
            constructors: self.constructors.iter().cloned().chain(constructors).collect(),
            context: self.context.clone(),
            fallback: Arc::clone(&self.fallback),
        }
    }

    /// Returns a new chain that starts requests with `cx`.
    ///
    /// The constructor list is shared with the receiver. Middleware may
    /// derive new contexts from `cx` on the way in; the terminal handler
    /// sees whatever reached it.
    pub fn with(&self, cx: Context) -> Self {
        Self {
            constructors: Arc::clone(&self.constructors),
            context: cx,
            fallback: Arc::clone(&self.fallback),
        }
    }

    /// Returns a new chain whose [`then_fallback`](Chain::then_fallback)
    /// ends in `handler`, typically the application's [`Router`].
    pub fn with_fallback(&self, handler: impl HttpHandler) -> Self {
        Self {
            constructors: Arc::clone(&self.constructors),
            context: self.context.clone(),
            fallback: handler.into_boxed(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new([])
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("len", &self.constructors.len())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
