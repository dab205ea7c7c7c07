//! Resource trait defining the core abstraction for every exposed type

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::binding::UuidBinder;
use crate::core::query::{PaginationConfig, QueryFilterSet};
use crate::core::serializer::SerializeAware;
use crate::core::validation::ValidationAware;

/// Base trait for all resources exposed through the CRUD handlers.
///
/// A resource is an application-defined record. The framework only reads it
/// through this trait: its name, its identifier, and a set of optional
/// capabilities. Each capability accessor returns `None` by default; a
/// resource opts in by overriding the accessor to return itself.
///
/// Cloning goes through the resource's own `Clone` implementation, so a
/// handler never shares a value between requests.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Book {
///     #[serde(default)]
///     id: Uuid,
///     title: String,
///     author_id: Option<Uuid>,
///     #[serde(default, skip_serializing_if = "Bound::is_unset")]
///     author: Bound<Author>,
/// }
///
/// impl Resource for Book {
///     fn resource_name() -> &'static str { "book" }
///     fn id(&self) -> Uuid { self.id }
///     fn set_id(&mut self, id: Uuid) { self.id = id }
///     fn as_binder(&mut self) -> Option<&mut dyn UuidBinder> { Some(self) }
/// }
/// ```
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The resource name used in logs and error payloads (e.g., "book")
    fn resource_name() -> &'static str;

    /// Get the unique identifier of this resource (nil until persisted)
    fn id(&self) -> Uuid;

    /// Set the unique identifier, used by data access on creation
    fn set_id(&mut self, id: Uuid);

    // === Capabilities ===

    /// Binding capability: UUID references to other resources
    fn as_binder(&mut self) -> Option<&mut dyn UuidBinder> {
        None
    }

    /// Validation capability: custom rules and messages
    fn as_validation_aware(&self) -> Option<&dyn ValidationAware> {
        None
    }

    /// Serialization capability: field visibility per serialization group
    fn as_serialize_aware(&self) -> Option<&dyn SerializeAware> {
        None
    }

    /// Pagination capability for LIST requests
    fn pagination_config() -> Option<PaginationConfig> {
        None
    }

    /// Filter capability for LIST requests
    fn query_filters() -> Option<QueryFilterSet> {
        None
    }

    /// Check if the resource has been persisted
    fn is_persisted(&self) -> bool {
        !self.id().is_nil()
    }
}
