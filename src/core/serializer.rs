//! Group-based response serialization
//!
//! Handlers serialize a single resource in the [`ONE`] group and collection
//! items in the [`LIST`] group. A resource implementing [`SerializeAware`]
//! decides which fields each group exposes; any other resource is rendered
//! with its plain `Serialize` implementation.

use serde::Serialize;
use serde_json::Value;

use crate::core::error::ScaffoldError;
use crate::core::resource::Resource;

/// Group used when a single resource is returned
pub const ONE: &str = "one";

/// Group used for collection items
pub const LIST: &str = "list";

/// Set of active serialization groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SerializeGroups {
    values: Vec<String>,
}

impl SerializeGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups containing a single value
    pub fn of(value: &str) -> Self {
        Self::new().with_value(value)
    }

    /// Add a group
    pub fn with_value(mut self, value: &str) -> Self {
        self.values.push(value.to_string());
        self
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Resources controlling their own representation
pub trait SerializeAware: Send + Sync {
    fn serialize(&self, groups: &SerializeGroups) -> Value;
}

/// Serialize a resource for the given groups
pub fn serialize_resource<T: Resource>(
    item: &T,
    groups: &SerializeGroups,
) -> Result<Value, ScaffoldError> {
    match item.as_serialize_aware() {
        Some(aware) => Ok(aware.serialize(groups)),
        None => Ok(serde_json::to_value(item)?),
    }
}
