//! Recursive resolution and stripping of UUID bindings

use futures::future::BoxFuture;
use uuid::Uuid;

use super::slot::BindingSlot;
use crate::core::error::ScaffoldError;
use crate::core::service::DataAccessRegistry;

/// Default limit on nested binding levels
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// A UUID reference declared by a resource
pub struct Binding<'a> {
    /// Name reported when the reference cannot be found
    pub name: &'static str,
    /// Identifier of the referenced resource; `None` or nil skips the binding
    pub identifier: Option<Uuid>,
    /// Slot receiving the referenced resource
    pub target: &'a mut dyn BindingSlot,
}

impl<'a> Binding<'a> {
    pub fn new(
        name: &'static str,
        identifier: Option<Uuid>,
        target: &'a mut dyn BindingSlot,
    ) -> Self {
        Self {
            name,
            identifier,
            target,
        }
    }

    fn active_identifier(&self) -> Option<Uuid> {
        self.identifier.filter(|id| !id.is_nil())
    }
}

/// Resources declaring UUID references to other resources
///
/// Bindings are rebuilt on every call, borrowing the resource's slots:
///
/// ```rust,ignore
/// impl UuidBinder for Book {
///     fn uuid_bindings(&mut self) -> Vec<Binding<'_>> {
///         vec![Binding::new("author", self.author_id, &mut self.author)]
///     }
/// }
/// ```
pub trait UuidBinder: Send {
    fn uuid_bindings(&mut self) -> Vec<Binding<'_>>;
}

/// Populate every binding of `item`, depth-first
///
/// Bindings are resolved in declaration order and each populated value is
/// resolved in turn before the next sibling. The first reference that cannot
/// be found aborts with [`ScaffoldError::ReferenceNotFound`]; slots populated
/// before it keep their value.
pub async fn resolve_bindings(
    item: &mut dyn UuidBinder,
    registry: &DataAccessRegistry,
    max_depth: usize,
) -> Result<(), ScaffoldError> {
    resolve_level(item, registry, 1, max_depth).await
}

fn resolve_level<'a>(
    item: &'a mut dyn UuidBinder,
    registry: &'a DataAccessRegistry,
    level: usize,
    max_depth: usize,
) -> BoxFuture<'a, Result<(), ScaffoldError>> {
    Box::pin(async move {
        for binding in item.uuid_bindings() {
            let Some(id) = binding.active_identifier() else {
                continue;
            };

            if level > max_depth {
                tracing::warn!(binding = binding.name, max_depth, "binding depth exceeded");
                return Err(ScaffoldError::BindingDepthExceeded { max_depth });
            }

            tracing::debug!(binding = binding.name, %id, level, "resolving binding");
            if !binding.target.populate(id, registry).await? {
                tracing::warn!(binding = binding.name, %id, "bound reference not found");
                return Err(ScaffoldError::ReferenceNotFound {
                    name: binding.name.to_string(),
                });
            }

            if let Some(nested) = binding.target.nested_binder() {
                resolve_level(nested, registry, level + 1, max_depth).await?;
            }
        }
        Ok(())
    })
}

/// Reset every bound slot of `item` to its zero value
///
/// Applied before persisting, so only identifiers reach the data access.
pub fn strip_bindings(item: &mut dyn UuidBinder) {
    for binding in item.uuid_bindings() {
        if binding.active_identifier().is_some() {
            binding.target.strip();
        }
    }
}
