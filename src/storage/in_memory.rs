//! In-memory implementation of DataAccess for testing and development

use crate::core::query::{FilterFunc, PaginationFilter, QueryBuilder};
use crate::core::resource::Resource;
use crate::core::service::{DataAccess, ResultSet};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory data access implementation
///
/// Resources are kept in insertion order. Filters are evaluated against the
/// JSON form of each resource. Uses RwLock for thread-safe access; clones
/// share the same storage.
#[derive(Clone)]
pub struct InMemoryDataAccess<T> {
    items: Arc<RwLock<IndexMap<Uuid, T>>>,
}

impl<T: Resource> InMemoryDataAccess<T> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Number of stored resources
    pub fn len(&self) -> Result<usize> {
        let items = self
            .items
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(items.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T: Resource> Default for InMemoryDataAccess<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Resource> DataAccess<T> for InMemoryDataAccess<T> {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<T>> {
        let items = self
            .items
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(items.get(id).cloned())
    }

    async fn find_by_filter(
        &self,
        filters: &[FilterFunc],
        pagination: Option<&PaginationFilter>,
    ) -> Result<ResultSet<T>> {
        let query = QueryBuilder::from_filters(filters);

        let items = self
            .items
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut matching = Vec::new();
        for item in items.values() {
            let record = serde_json::to_value(item)?;
            if query.matches(&record) {
                matching.push((record, item));
            }
        }

        if !query.orders.is_empty() {
            matching.sort_by(|(a, _), (b, _)| query.compare(a, b));
        }

        let total = matching.len();
        let page: Vec<T> = match pagination {
            Some(p) => matching
                .into_iter()
                .skip(p.offset)
                .take(p.limit)
                .map(|(_, item)| item.clone())
                .collect(),
            None => matching.into_iter().map(|(_, item)| item.clone()).collect(),
        };

        Ok(ResultSet::new(page, total))
    }

    async fn create(&self, mut resource: T) -> Result<T> {
        if resource.id().is_nil() {
            resource.set_id(Uuid::new_v4());
        }

        let mut items = self
            .items
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if items.contains_key(&resource.id()) {
            return Err(anyhow!(
                "{} {} already exists",
                T::resource_name(),
                resource.id()
            ));
        }

        items.insert(resource.id(), resource.clone());

        Ok(resource)
    }

    async fn update_from_previous(&self, previous: &T, mut next: T) -> Result<T> {
        let id = previous.id();
        let mut items = self
            .items
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let slot = items
            .get_mut(&id)
            .ok_or_else(|| anyhow!("{} {} not found", T::resource_name(), id))?;

        next.set_id(id);
        *slot = next.clone();

        Ok(next)
    }

    async fn delete_by_id(&self, id: &Uuid) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        items
            .shift_remove(id)
            .ok_or_else(|| anyhow!("{} {} not found", T::resource_name(), id))?;

        Ok(())
    }
}
