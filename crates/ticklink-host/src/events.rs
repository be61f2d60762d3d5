//! Event dispatch bridge.
//!
//! Subscribers run synchronously on the thread that calls `dispatch`, which
//! for sessions is the network receive loop. A slow subscriber therefore
//! delays every datagram queued behind it. Each call is isolated with
//! `catch_unwind`: a panicking subscriber is logged and the remaining
//! subscribers still run.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, PoisonError, RwLock},
};

use tracing::{trace, warn};

use crate::event_types::Message;

/// Callback invoked for application messages.
pub type EventHandler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Name-keyed, multi-subscriber dispatch table.
#[derive(Default)]
pub struct EventRegistry {
    handlers: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the subscribers of `name`.
    ///
    /// Subscribers of one name run in registration order.
    pub fn subscribe<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.entry(name.into()).or_default().push(Arc::new(handler));
    }

    /// Removes every subscriber of `name`, returning how many were removed.
    pub fn unsubscribe(&self, name: &str) -> usize {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.remove(name).map_or(0, |removed| removed.len())
    }

    /// Number of subscribers registered for `name`.
    pub fn subscriber_count(&self, name: &str) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.get(name).map_or(0, Vec::len)
    }

    /// Invokes every subscriber of the message's name, in order, on this thread.
    ///
    /// Returns the number of subscribers that completed without panicking.
    /// Unknown names are a silent no-op.
    pub fn dispatch(&self, message: &Message) -> usize {
        // Clone the list so subscribers may (un)subscribe without deadlocking.
        let subscribers = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            match handlers.get(message.name()) {
                Some(list) => list.clone(),
                None => {
                    trace!(event = message.name(), "no subscribers");
                    return 0;
                }
            }
        };

        let mut completed = 0;
        for handler in &subscribers {
            if invoke_isolated(message.name(), || handler(message)) {
                completed += 1;
            }
        }
        completed
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> =
            handlers.iter().map(|(name, list)| (name.as_str(), list.len())).collect();
        f.debug_struct("EventRegistry").field("subscribers", &counts).finish()
    }
}

/// A list of lifecycle callbacks (connected, disconnected, closed).
pub struct Notifier<T> {
    callbacks: RwLock<Vec<Arc<dyn Fn(&T) + Send + Sync>>>,
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self { callbacks: RwLock::new(Vec::new()) }
    }
}

impl<T> Notifier<T> {
    /// Adds a callback.
    pub fn add<F>(&self, callback: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut callbacks = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);
        callbacks.push(Arc::new(callback));
    }

    /// Calls every callback with `value`, isolating panics.
    pub fn notify(&self, value: &T) {
        let callbacks = self.callbacks.read().unwrap_or_else(PoisonError::into_inner).clone();
        for callback in callbacks {
            invoke_isolated("notification", || callback(value));
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").field("callbacks", &self.len()).finish()
    }
}

fn invoke_isolated(label: &str, call: impl FnOnce()) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(()) => true,
        Err(payload) => {
            warn!(event = label, "subscriber panicked: {}", panic_message(payload.as_ref()));
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
