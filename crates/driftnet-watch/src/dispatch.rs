//! Event dispatch: one handler slot per lifecycle event kind.

use driftnet_types::{EventKind, LifecycleEvent, RpcError};

/// Callback invoked with each lifecycle event it is registered for.
pub type EventHandler = Box<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// Callback invoked when a poll is skipped because the RPC call failed.
pub type ErrorHandler = Box<dyn Fn(&RpcError) + Send + Sync>;

/// Registry mapping each [`EventKind`] to at most one handler.
///
/// Registering a kind twice replaces the earlier handler. Dispatching an
/// event nobody registered for is a silent no-op.
#[allow(missing_debug_implementations)]
pub struct HandlerRegistry {
    slots: [Option<EventHandler>; EventKind::ALL.len()],
    error_observer: Option<ErrorHandler>,
}

impl HandlerRegistry {
    /// Creates a registry with every slot vacant.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            error_observer: None,
        }
    }

    /// Registers `handler` for `kind`, replacing any previous handler.
    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        self.slots[kind.index()] = Some(Box::new(handler));
    }

    /// Registers the observer notified when a poll fails.
    pub fn on_error<F>(&mut self, observer: F)
    where
        F: Fn(&RpcError) + Send + Sync + 'static,
    {
        self.error_observer = Some(Box::new(observer));
    }

    /// Invokes the handler registered for `event`'s kind, if any.
    pub fn dispatch(&self, event: &LifecycleEvent) {
        if let Some(handler) = &self.slots[event.kind().index()] {
            handler(event);
        }
    }

    /// Notifies the error observer, if one is registered.
    pub fn notify_error(&self, error: &RpcError) {
        if let Some(observer) = &self.error_observer {
            observer(error);
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
