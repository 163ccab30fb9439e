//! Request-scoped value carrier.
//!
//! A [`Context`] is an immutable stack of key/value entries. Attaching a
//! value never changes the receiver: [`Context::with_value`] returns a new
//! context whose newest entry points back at the old one, so every context
//! handed out stays valid and unchanged for as long as anyone holds it.
//!
//! ```text
//! background ← (user, 42) ← (trace, "abc")     ← cx
//!                         ↖ (user, 7)          ← other
//! ```
//!
//! Lookups walk from the newest entry outward. Cloning is one `Arc` clone.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An immutable, cheaply clonable key/value carrier.
///
/// Keys are any `'static + PartialEq` value. A private unit struct or enum
/// keeps a middleware's entries out of everyone else's way. Values are any
/// `'static + Send + Sync` type.
///
/// Equality is identity: two contexts are equal when they are the same
/// entry (or both the empty background context), not when they happen to
/// hold equal values.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Entry>>,
}

struct Entry {
    key: Box<dyn Any + Send + Sync>,
    value: Box<dyn Any + Send + Sync>,
    matches: fn(&(dyn Any + Send + Sync), &dyn Any) -> bool,
    parent: Option<Arc<Entry>>,
}

impl Context {
    /// The empty context. Chains start with this one.
    pub fn background() -> Self {
        Self { head: None }
    }

    /// Returns a new context carrying `value` under `key`, on top of `self`.
    ///
    /// An entry for an equal key further out is shadowed, not replaced.
    #[must_use = "contexts are immutable; `with_value` returns a new Context"]
    pub fn with_value<K, V>(&self, key: K, value: V) -> Self
    where
        K: Any + PartialEq + Send + Sync,
        V: Any + Send + Sync,
    {
        let entry = Entry {
            key: Box::new(key),
            value: Box::new(value),
            matches: key_matches::<K>,
            parent: self.head.clone(),
        };
        Self { head: Some(Arc::new(entry)) }
    }

    /// Looks up the value stored under `key`.
    ///
    /// Stops at the newest entry whose key equals `key`. Returns `None` if
    /// there is no such entry or if its value is not a `V`.
    pub fn value<K, V>(&self, key: &K) -> Option<&V>
    where
        K: Any + PartialEq,
        V: Any,
    {
        let mut cursor = self.head.as_deref();
        while let Some(entry) = cursor {
            if (entry.matches)(entry.key.as_ref(), key) {
                return entry.value.downcast_ref::<V>();
            }
            cursor = entry.parent.as_deref();
        }
        None
    }

    /// Number of entries visible from this context, shadowed ones included.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cursor = self.head.as_deref();
        while let Some(entry) = cursor {
            depth += 1;
            cursor = entry.parent.as_deref();
        }
        depth
    }

    pub fn is_background(&self) -> bool {
        self.head.is_none()
    }
}

fn key_matches<K: Any + PartialEq>(stored: &(dyn Any + Send + Sync), probe: &dyn Any) -> bool {
    match (stored.downcast_ref::<K>(), probe.downcast_ref::<K>()) {
        (Some(stored), Some(probe)) => stored == probe,
        _ => false,
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_background() {
            return f.write_str("Context::background");
        }
        f.debug_struct("Context").field("depth", &self.depth()).finish()
    }
}
