//! # crudkit
//!
//! Generic CRUD-over-HTTP scaffolding for axum.
//!
//! ## Features
//!
//! - **Resource trait**: any serde type with a UUID becomes a REST resource
//! - **Reference binding**: UUID references resolved recursively into [`binding::Bound`] slots
//! - **Lifecycle events**: prioritized listeners on `pre_create`, `post_read`, ... with a parent `resource.action` tag
//! - **Filters and pagination**: declarative query filters, page links
//! - **Validation**: `validator` rules plus custom rules and messages
//! - **Token security**: HS256 tokens from a cookie or `Authorization` header
//! - **Pluggable storage**: implement [`core::DataAccess`] or use the in-memory store
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crudkit::prelude::*;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Book {
//!     #[serde(default)]
//!     id: Uuid,
//!     title: String,
//!     author_id: Option<Uuid>,
//!     #[serde(default, skip_serializing_if = "Bound::is_unset")]
//!     author: Bound<Author>,
//! }
//!
//! impl Resource for Book {
//!     fn resource_name() -> &'static str { "book" }
//!     fn id(&self) -> Uuid { self.id }
//!     fn set_id(&mut self, id: Uuid) { self.id = id }
//!     fn as_binder(&mut self) -> Option<&mut dyn UuidBinder> { Some(self) }
//! }
//!
//! impl UuidBinder for Book {
//!     fn uuid_bindings(&mut self) -> Vec<Binding<'_>> {
//!         vec![Binding::new("author", self.author_id, &mut self.author)]
//!     }
//! }
//!
//! ApiBuilder::new()
//!     .with_data_access::<Author>(Arc::new(InMemoryDataAccess::new()))
//!     .with_data_access::<Book>(Arc::new(InMemoryDataAccess::new()))
//!     .resource::<Author>("/authors", "")
//!     .resource::<Book>("/books", "")
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod binding;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        context::RequestContext,
        error::{Operation, ScaffoldError},
        events::{
            Event, EventDispatcher, EventHandler, Listener, RequestEvent, ResourceActionEvent,
        },
        query::{
            CollectionItem, FilterFunc, Links, PaginationConfig, PaginationFilter, QueryBuilder,
            QueryFilter, QueryFilterSet, compose_filters, filters,
        },
        resource::Resource,
        security::{Token, TokenInfo, TokenService, TokenSubject},
        serializer::{SerializeAware, SerializeGroups},
        service::{DataAccess, DataAccessRegistry, ResultSet},
        validation::{ValidationAware, ValidationError, field_errors, new_validation_error},
    };

    // === Event types ===
    pub use crate::core::events::{
        POST_CREATE, POST_READ, POST_UPDATE, PRE_CREATE, PRE_DELETE, PRE_UPDATE, REQUEST_START,
        REQUEST_TERMINATE, RESOURCE_ACTION,
    };

    // === Binding ===
    pub use crate::binding::{
        Binding, BindingSlot, Bound, UuidBinder, resolve_bindings, strip_bindings,
    };

    // === Storage ===
    pub use crate::storage::InMemoryDataAccess;

    // === Config ===
    pub use crate::config::CrudConfig;

    // === Server ===
    pub use crate::server::{ApiBuilder, CrudState, RequestScope, crudl, init_tracing};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::{Router, http::StatusCode};
}
