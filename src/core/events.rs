//! Lifecycle event dispatching
//!
//! Listeners are registered under an event type (a dotted tag such as
//! `resource.post_create`) with a priority. Dispatching an event first runs the
//! listeners of its parent type, then those of the specific type, each group in
//! descending priority order. The first listener error stops the dispatch and
//! is returned to the caller.
//!
//! ```text
//! dispatch("resource.pre_create", event)
//!     ├──▶ "resource.action" listeners      (parent, priority desc)
//!     └──▶ "resource.pre_create" listeners  (priority desc)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let dispatcher = EventDispatcher::new();
//! dispatcher.register(Listener::new(PRE_CREATE, 10, |ctx, event| {
//!     if ctx.token().is_none() {
//!         return Err(ScaffoldError::listener("login required"));
//!     }
//!     Ok(())
//! }));
//!
//! let mut event = ResourceActionEvent::new(PRE_CREATE, book);
//! dispatcher.dispatch(&mut ctx, PRE_CREATE, &mut event).await?;
//! ```

use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::context::RequestContext;
use crate::core::error::ScaffoldError;
use crate::core::resource::Resource;

/// Parent type of every resource event
pub const RESOURCE_ACTION: &str = "resource.action";
pub const POST_READ: &str = "resource.post_read";
pub const PRE_CREATE: &str = "resource.pre_create";
pub const POST_CREATE: &str = "resource.post_create";
pub const PRE_UPDATE: &str = "resource.pre_update";
pub const POST_UPDATE: &str = "resource.post_update";
pub const PRE_DELETE: &str = "resource.pre_delete";

pub const REQUEST_START: &str = "request.start";
pub const REQUEST_TERMINATE: &str = "request.terminate";

/// A value passed to listeners
pub trait Event: Any + Send {
    /// Event type dispatched before the specific one
    fn parent_event_type(&self) -> Option<&str> {
        None
    }

    /// Action tag, for events describing a resource action
    fn action(&self) -> Option<&str> {
        None
    }

    /// Name of the resource concerned, if any
    fn resource_name(&self) -> Option<&'static str> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Event {
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    pub fn downcast_mut<E: Event>(&mut self) -> Option<&mut E> {
        self.as_any_mut().downcast_mut::<E>()
    }
}

/// An action performed on a resource by the CRUD handlers
///
/// Listeners may modify `resource`; the handler continues with the
/// modified value.
#[derive(Debug, Clone)]
pub struct ResourceActionEvent<T> {
    pub resource: T,
    pub action: &'static str,
}

impl<T: Resource> ResourceActionEvent<T> {
    pub fn new(action: &'static str, resource: T) -> Self {
        Self { resource, action }
    }

    pub fn into_resource(self) -> T {
        self.resource
    }
}

impl<T: Resource> Event for ResourceActionEvent<T> {
    fn parent_event_type(&self) -> Option<&str> {
        Some(RESOURCE_ACTION)
    }

    fn action(&self) -> Option<&str> {
        Some(self.action)
    }

    fn resource_name(&self) -> Option<&'static str> {
        Some(T::resource_name())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Start or end of an HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEvent {
    pub method: String,
    pub path: String,
    /// Response status, known once the request terminates
    pub status: Option<u16>,
}

impl Event for RequestEvent {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Listener behaviour
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &mut RequestContext,
        event: &mut dyn Event,
    ) -> Result<(), ScaffoldError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&mut RequestContext, &mut dyn Event) -> Result<(), ScaffoldError> + Send + Sync,
{
    async fn handle(
        &self,
        ctx: &mut RequestContext,
        event: &mut dyn Event,
    ) -> Result<(), ScaffoldError> {
        (self.0)(ctx, event)
    }
}

/// A handler registered under an event type
#[derive(Clone)]
pub struct Listener {
    pub event_type: String,
    pub priority: i32,
    pub handler: Arc<dyn EventHandler>,
}

impl Listener {
    /// Listener running a synchronous closure
    pub fn new<F>(event_type: impl Into<String>, priority: i32, handler: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut dyn Event) -> Result<(), ScaffoldError>
            + Send
            + Sync
            + 'static,
    {
        Self::from_handler(event_type, priority, Arc::new(FnHandler(handler)))
    }

    /// Listener running an [`EventHandler`]
    pub fn from_handler(
        event_type: impl Into<String>,
        priority: i32,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            priority,
            handler,
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("event_type", &self.event_type)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Table of listeners keyed by event type
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher preloaded with listeners
    pub fn with_listeners(listeners: impl IntoIterator<Item = Listener>) -> Self {
        let dispatcher = Self::new();
        for listener in listeners {
            dispatcher.register(listener);
        }
        dispatcher
    }

    /// Append a listener under its event type; duplicates all fire
    pub fn register(&self, listener: Listener) {
        let mut table = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        table
            .entry(listener.event_type.clone())
            .or_default()
            .push(listener);
    }

    /// Remove every listener
    pub fn reset(&self) {
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Number of listeners registered under an event type
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(event_type)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .all(Vec::is_empty)
    }

    /// Dispatch an event to the listeners of its parent type, then of `event_type`
    pub async fn dispatch(
        &self,
        ctx: &mut RequestContext,
        event_type: &str,
        event: &mut dyn Event,
    ) -> Result<(), ScaffoldError> {
        if let Some(parent) = event.parent_event_type().map(str::to_owned) {
            self.dispatch_to(ctx, &parent, event).await?;
        }
        self.dispatch_to(ctx, event_type, event).await
    }

    async fn dispatch_to(
        &self,
        ctx: &mut RequestContext,
        event_type: &str,
        event: &mut dyn Event,
    ) -> Result<(), ScaffoldError> {
        let handlers = self.sorted_handlers(event_type);
        if handlers.is_empty() {
            return Ok(());
        }

        tracing::debug!(event_type, listeners = handlers.len(), "dispatching event");
        for handler in handlers {
            if let Err(e) = handler.handle(ctx, event).await {
                tracing::warn!(event_type, error = %e, "listener aborted dispatch");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Sort the listeners of a type by descending priority (stable) and
    /// snapshot their handlers
    fn sorted_handlers(&self, event_type: &str) -> Vec<Arc<dyn EventHandler>> {
        let mut table = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(listeners) = table.get_mut(event_type) else {
            return Vec::new();
        };
        listeners.sort_by(|a, b| b.priority.cmp(&a.priority));
        listeners.iter().map(|l| l.handler.clone()).collect()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f.debug_map()
            .entries(table.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}
