//! Shared harness for data access backends
//!
//! Provides `Record`, a resource with string, integer, float and boolean
//! fields, and the `data_access_tests!` macro generating a conformance suite
//! for any `DataAccess<Record>` implementation.
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! data_access_tests!(InMemoryDataAccess::<Record>::new());
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod data_access_tests;

use crudkit::prelude::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: i64,
    pub score: f64,
    pub active: bool,
}

impl Resource for Record {
    fn resource_name() -> &'static str {
        "record"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

pub fn record(name: &str, age: i64, score: f64, active: bool) -> Record {
    Record {
        id: Uuid::nil(),
        name: name.to_string(),
        email: format!("{}@test.com", name.to_lowercase()),
        age,
        score,
        active,
    }
}

/// Exact-match filter on a field
pub fn exact(field: &str, value: &str) -> FilterFunc {
    filters::exact(field, value, &serde_json::Value::Null)
}

/// Five records with distinct names, ages 20 to 60
pub fn roster() -> Vec<Record> {
    ["Alice", "Bob", "Carol", "Dave", "Eve"]
        .iter()
        .enumerate()
        .map(|(i, name)| record(name, 20 + 10 * i as i64, i as f64 + 0.5, i % 2 == 0))
        .collect()
}
