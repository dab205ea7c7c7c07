//! Data access traits and the registry resolving them per resource type

use crate::core::error::ScaffoldError;
use crate::core::query::{FilterFunc, PaginationFilter, filters};
use crate::core::resource::Resource;
use anyhow::Result;
use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Results of a filtered query
#[derive(Debug, Clone)]
pub struct ResultSet<T> {
    /// The page of resources matching the filters
    pub items: Vec<T>,

    /// Total number of matching resources, before pagination
    pub total: usize,
}

impl<T> ResultSet<T> {
    pub fn new(items: Vec<T>, total: usize) -> Self {
        Self { items, total }
    }
}

/// Data access trait for a resource type
///
/// Implementations provide persistence for one resource type. The framework
/// is agnostic to the underlying storage mechanism: filters reach the backend
/// as [`FilterFunc`]s to apply on a [`crate::core::query::QueryBuilder`].
#[async_trait]
pub trait DataAccess<T: Resource>: Send + Sync {
    /// Get a resource by ID
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>>;

    /// Get resources matching all filters, optionally paginated
    async fn find_by_filter(
        &self,
        filters: &[FilterFunc],
        pagination: Option<&PaginationFilter>,
    ) -> Result<ResultSet<T>>;

    /// Create a new resource, assigning its ID when unset
    async fn create(&self, resource: T) -> Result<T>;

    /// Replace a stored resource with its updated version
    async fn update_from_previous(&self, previous: &T, next: T) -> Result<T>;

    /// Delete a resource by ID
    async fn delete_by_id(&self, id: &Uuid) -> Result<()>;

    /// Shortcut for `find_by_filter` with exact-match filters
    async fn find_by(
        &self,
        params: &[(String, String)],
        pagination: Option<&PaginationFilter>,
    ) -> Result<ResultSet<T>> {
        let filters: Vec<FilterFunc> = params
            .iter()
            .map(|(field, value)| filters::exact(field, value, &serde_json::Value::Null))
            .collect();
        self.find_by_filter(&filters, pagination).await
    }
}

struct RegistryEntry {
    resource_name: &'static str,
    data_access: Arc<dyn Any + Send + Sync>,
}

/// Registry of data access objects, keyed by resource type
///
/// The binder uses it to look up referenced resources of any type, and the
/// CRUD handlers use it to reach the resource they serve.
#[derive(Default, Clone)]
pub struct DataAccessRegistry {
    entries: HashMap<TypeId, Arc<RegistryEntry>>,
}

impl DataAccessRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register the data access of a resource type
    ///
    /// A second registration for the same type replaces the first one.
    pub fn register<T: Resource>(&mut self, data_access: Arc<dyn DataAccess<T>>) {
        let entry = RegistryEntry {
            resource_name: T::resource_name(),
            data_access: Arc::new(data_access),
        };
        self.entries.insert(TypeId::of::<T>(), Arc::new(entry));
    }

    /// Builder-style variant of [`register`](Self::register)
    pub fn with<T: Resource>(mut self, data_access: Arc<dyn DataAccess<T>>) -> Self {
        self.register(data_access);
        self
    }

    /// Get the data access of a resource type
    pub fn get<T: Resource>(&self) -> Result<Arc<dyn DataAccess<T>>, ScaffoldError> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| {
                entry
                    .data_access
                    .downcast_ref::<Arc<dyn DataAccess<T>>>()
                    .cloned()
            })
            .ok_or_else(|| ScaffoldError::DataAccessMissing {
                resource: T::resource_name().to_string(),
            })
    }

    /// Check whether a resource type has a registered data access
    pub fn contains<T: Resource>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Names of every registered resource
    pub fn resource_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.entries.values().map(|e| e.resource_name).collect();
        names.sort_unstable();
        names
    }
}
