//! Transport context handed to event listeners
//!
//! One context exists per request. The request-scope middleware creates it,
//! and every clone handed to handlers and listeners shares the same token and
//! value bag, so `request.terminate` listeners see what earlier listeners
//! wrote.

use axum::http::{HeaderMap, Method, Uri, request::Parts};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::security::TokenInfo;

#[derive(Debug, Default)]
struct SharedState {
    token: Option<Value>,
    values: HashMap<String, Value>,
}

/// Per-request context shared by the handlers and the listeners they trigger
///
/// Cloning is cheap and clones share the token and the value bag.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    shared: Arc<RwLock<SharedState>>,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
            shared: Arc::default(),
        }
    }

    /// Build a context from request parts, picking up the token information
    /// stored by the security middleware
    pub fn from_parts(parts: &Parts) -> Self {
        let ctx = Self::new(
            parts.method.clone(),
            parts.uri.clone(),
            parts.headers.clone(),
        );
        if let Some(info) = parts.extensions.get::<TokenInfo>() {
            ctx.set_token(info.0.clone());
        }
        ctx
    }

    /// Information carried by the validated security token, if any
    pub fn token(&self) -> Option<Value> {
        self.read(|state| state.token.clone())
    }

    pub fn set_token(&self, token: Value) {
        self.write(|state| state.token = Some(token));
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.write(|state| {
            state.values.insert(key, value);
        });
    }

    pub fn with(self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read(|state| state.values.get(key).cloned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn read<R>(&self, f: impl FnOnce(&SharedState) -> R) -> R {
        let state = self
            .shared
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        let mut state = self
            .shared
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }
}
