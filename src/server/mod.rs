//! Server module exposing resources over HTTP
//!
//! - `crud`: generic handlers and the `crudl` route helper
//! - `middleware`: per-request dispatcher scope and token security
//! - `builder`: `ApiBuilder` assembling the router

pub mod builder;
pub mod crud;
pub mod middleware;

pub use builder::{ApiBuilder, init_tracing};
pub use crud::{CrudState, crudl};
pub use middleware::{RequestScope, SecurityGuard, request_scope, security_token_middleware};
