//! Slots holding referenced resources

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::binder::{UuidBinder, strip_bindings};
use crate::core::error::ScaffoldError;
use crate::core::resource::Resource;
use crate::core::service::DataAccessRegistry;

/// A referenced resource, populated by the binder
///
/// `Unset` is the zero value: it serializes as `null` and `null` deserializes
/// back to `Unset`, so a slot never has to be part of an incoming payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound<T> {
    Unset,
    Populated(Box<T>),
}

impl<T> Default for Bound<T> {
    fn default() -> Self {
        Bound::Unset
    }
}

impl<T> Bound<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Bound::Unset)
    }

    pub fn is_populated(&self) -> bool {
        matches!(self, Bound::Populated(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Bound::Populated(value) => Some(&**value),
            Bound::Unset => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Bound::Populated(value) => Some(&mut **value),
            Bound::Unset => None,
        }
    }

    pub fn set(&mut self, value: T) {
        *self = Bound::Populated(Box::new(value));
    }

    /// Take the value out, leaving `Unset`
    pub fn take(&mut self) -> Option<T> {
        match std::mem::take(self) {
            Bound::Populated(value) => Some(*value),
            Bound::Unset => None,
        }
    }
}

impl<T> From<T> for Bound<T> {
    fn from(value: T) -> Self {
        Bound::Populated(Box::new(value))
    }
}

impl<T: Serialize> Serialize for Bound<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Bound::Populated(value) => serializer.serialize_some(&**value),
            Bound::Unset => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Bound<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Bound::Populated(Box::new(value)),
            None => Bound::Unset,
        })
    }
}

/// Type-erased view of a slot used by the binder
#[async_trait]
pub trait BindingSlot: Send {
    /// Look the identifier up and store the result
    ///
    /// Returns `Ok(false)` when no resource matches (or the lookup failed);
    /// only a missing data access registration is an error.
    async fn populate(
        &mut self,
        id: Uuid,
        registry: &DataAccessRegistry,
    ) -> Result<bool, ScaffoldError>;

    /// Reset the slot to its zero value, then strip the captured value
    fn strip(&mut self);

    /// The populated value, when it declares bindings of its own
    fn nested_binder(&mut self) -> Option<&mut dyn UuidBinder>;

    fn is_populated(&self) -> bool;
}

#[async_trait]
impl<T: Resource> BindingSlot for Bound<T> {
    async fn populate(
        &mut self,
        id: Uuid,
        registry: &DataAccessRegistry,
    ) -> Result<bool, ScaffoldError> {
        let data_access = registry.get::<T>()?;

        match data_access.find_by_id(&id).await {
            Ok(Some(found)) => {
                self.set(found);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => {
                tracing::warn!(
                    resource = T::resource_name(),
                    %id,
                    error = %e,
                    "reference lookup failed"
                );
                Ok(false)
            }
        }
    }

    fn strip(&mut self) {
        if let Some(mut previous) = self.take() {
            if let Some(binder) = previous.as_binder() {
                strip_bindings(binder);
            }
        }
    }

    fn nested_binder(&mut self) -> Option<&mut dyn UuidBinder> {
        self.get_mut().and_then(|value| value.as_binder())
    }

    fn is_populated(&self) -> bool {
        Bound::is_populated(self)
    }
}
