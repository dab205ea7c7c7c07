//! Core module containing fundamental traits and types for the framework

pub mod context;
pub mod error;
pub mod events;
pub mod query;
pub mod resource;
pub mod security;
pub mod serializer;
pub mod service;
pub mod validation;

pub use context::RequestContext;
pub use error::{Operation, ScaffoldError};
pub use events::{Event, EventDispatcher, EventHandler, Listener, RequestEvent, ResourceActionEvent};
pub use query::{
    CollectionItem, FilterFunc, Links, PaginationConfig, PaginationFilter, QueryBuilder,
    QueryFilter, QueryFilterSet,
};
pub use resource::Resource;
pub use security::{Token, TokenInfo, TokenService, TokenSubject};
pub use serializer::{SerializeAware, SerializeGroups};
pub use service::{DataAccess, DataAccessRegistry, ResultSet};
pub use validation::{ValidationAware, ValidationError};
