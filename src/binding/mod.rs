//! Reference binding between resources
//!
//! A resource stores references to other resources as UUIDs next to a
//! [`Bound`] slot. The binder looks every identifier up through the
//! [`DataAccessRegistry`](crate::core::service::DataAccessRegistry), fills the
//! slots recursively, and strips them again before the resource is persisted.

pub mod binder;
pub mod slot;

pub use binder::{Binding, DEFAULT_MAX_DEPTH, UuidBinder, resolve_bindings, strip_bindings};
pub use slot::{Bound, BindingSlot};
